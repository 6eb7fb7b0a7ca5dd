//! Background coordinator.
//!
//! Answers on-demand `analyzePage` requests from the popup and, independently,
//! watches page loads to run analyses automatically. Automatic runs persist
//! their result for the next popup open and never let an error escape.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::analysis::SecurityAnalyzer;
use crate::error::{Error, Result};
use crate::filter::NavigationFilter;
use crate::host::{Host, NavigationEvent, NavigationStatus, TabId};
use crate::messaging::{Handler, Request, Response};
use crate::results::{AnalysisResult, PageSnapshot};
use crate::status::StatusStrategy;
use crate::storage::{PersistedState, StateStore};

pub struct Coordinator {
    host: Arc<dyn Host>,
    analyzer: Arc<dyn SecurityAnalyzer>,
    store: Arc<dyn StateStore>,
    filter: NavigationFilter,
}

impl Coordinator {
    pub fn new(
        host: Arc<dyn Host>,
        analyzer: Arc<dyn SecurityAnalyzer>,
        store: Arc<dyn StateStore>,
        filter: NavigationFilter,
    ) -> Self {
        Self {
            host,
            analyzer,
            store,
            filter,
        }
    }

    /// Analyze a snapshot supplied by the popup and return the raw text.
    ///
    /// The result overwrites the stored slot without the auto flag, so it does
    /// not resurface on the next popup open.
    pub async fn analyze_on_demand(&self, snapshot: &PageSnapshot) -> String {
        ::log::info!("On-demand analysis for {}", snapshot.url);
        let screenshot = self.screenshot().await;
        let analysis = self.analyzer.analyze(snapshot, screenshot.as_deref()).await;

        let result = AnalysisResult::new(
            analysis.clone(),
            StatusStrategy::FullText.classify(&analysis),
        );
        if let Err(e) = self.store.save(&PersistedState::manual(result)).await {
            ::log::warn!("Failed to store on-demand analysis: {}", e);
        }

        analysis
    }

    /// Consume navigation events one at a time until the stream ends
    pub async fn watch(self: Arc<Self>, mut events: mpsc::Receiver<NavigationEvent>) {
        ::log::info!("Watching page loads for automatic analysis");
        while let Some(event) = events.recv().await {
            self.handle_navigation(&event).await;
        }
        ::log::info!("Navigation stream closed; automatic analysis stopped");
    }

    /// React to one navigation event. Never fails.
    pub async fn handle_navigation(&self, event: &NavigationEvent) {
        if event.status != NavigationStatus::Complete {
            return;
        }
        if !self.filter.should_analyze(&event.url) {
            ::log::debug!("Skipping automatic analysis for {}", event.url);
            return;
        }

        match self.auto_analyze(event.tab).await {
            Ok(result) => {
                ::log::info!(
                    "Automatic analysis of {} finished: {}",
                    event.url,
                    result.security_status
                );
            }
            Err(e) => {
                ::log::error!("Automatic analysis of {} failed: {}", event.url, e);
            }
        }
    }

    async fn auto_analyze(&self, tab: TabId) -> Result<AnalysisResult> {
        self.ensure_collector(tab).await?;

        let snapshot = match self.host.send_to_tab(tab, Request::CollectData).await? {
            Response::Snapshot(snapshot) => snapshot,
            _ => return Err(Error::UnexpectedResponse("collectData")),
        };

        let screenshot = self.screenshot().await;
        let analysis = self.analyzer.analyze(&snapshot, screenshot.as_deref()).await;
        let status = StatusStrategy::FullText.classify(&analysis);
        let result = AnalysisResult::new(analysis, status);

        self.store
            .save(&PersistedState::automatic(result.clone()))
            .await?;

        if let Err(e) = self.host.open_popup().await {
            // The result stays stored for the next manual open
            ::log::warn!("Could not open popup after automatic analysis: {}", e);
        }

        Ok(result)
    }

    /// Ping the tab's collector, injecting it if it does not answer
    async fn ensure_collector(&self, tab: TabId) -> Result<()> {
        match self.host.send_to_tab(tab, Request::Ping).await {
            Ok(Response::Pong { pong: true }) => Ok(()),
            Ok(_) | Err(_) => {
                ::log::debug!("Collector missing in tab {}; injecting", tab);
                self.host.inject_collector(tab).await
            }
        }
    }

    async fn screenshot(&self) -> Option<String> {
        match self.host.capture_screenshot().await {
            Ok(image) => Some(image),
            Err(e) => {
                ::log::error!("Error capturing screenshot: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Handler for Coordinator {
    async fn handle(&self, request: Request) -> Option<Response> {
        match request {
            Request::AnalyzePage { page_data } => Some(Response::Analysis {
                analysis: self.analyze_on_demand(&page_data).await,
            }),
            // Page-level requests are answered by collectors
            Request::CollectData | Request::Ping => None,
        }
    }
}
