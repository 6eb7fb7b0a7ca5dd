//! Page data collector.
//!
//! Runs in the context of an inspected page and only does work when asked:
//! a `collectData` request produces a [`PageSnapshot`], a `ping` is acknowledged.

pub mod dom;
pub mod heuristics;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::messaging::{Handler, Request, Response};
use crate::results::{NetworkEntry, PageSnapshot, StorageData};

/// The live state of a page that a snapshot is built from
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Address of the document
    pub url: String,
    /// Serialized document
    pub html: String,
    /// Local and session storage contents
    pub storage: StorageData,
    /// Resource timing buffer
    pub resources: Vec<NetworkEntry>,
}

/// Provides the current state of a page.
///
/// Implementations degrade each part they cannot read to an empty value
/// instead of failing.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn capture(&self) -> PageContext;
}

/// Build a snapshot from page state. List fields are left unbounded.
pub fn collect(page: &PageContext) -> PageSnapshot {
    let doc = Html::parse_document(&page.html);
    let base = Url::parse(&page.url).ok();

    PageSnapshot {
        url: page.url.clone(),
        title: dom::title(&doc),
        dom_summary: dom::summarize_dom(&doc, base.as_ref()),
        storage_data: page.storage.clone(),
        network_summary: page.resources.clone(),
        heuristic_findings: heuristics::findings(&doc),
    }
}

/// Answers `collectData` and `ping` on behalf of one page
pub struct Collector<P> {
    page: P,
}

impl<P: PageSource> Collector<P> {
    pub fn new(page: P) -> Self {
        Self { page }
    }

    /// Capture the page and build a snapshot from it
    pub async fn snapshot(&self) -> PageSnapshot {
        let context = self.page.capture().await;
        collect(&context)
    }
}

#[async_trait]
impl<P: PageSource> Handler for Collector<P> {
    async fn handle(&self, request: Request) -> Option<Response> {
        match request {
            Request::CollectData => {
                let snapshot = self.snapshot().await;
                ::log::info!("Collected snapshot for {}", snapshot.url);
                Some(Response::Snapshot(Box::new(snapshot)))
            }
            Request::Ping => Some(Response::Pong { pong: true }),
            // Analysis requests are for the background
            Request::AnalyzePage { .. } => None,
        }
    }
}
