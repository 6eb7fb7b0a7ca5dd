//! Fakes shared by the coordinator, popup and extension tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::analysis::SecurityAnalyzer;
use crate::collector::{PageContext, collect};
use crate::error::{Error, Result};
use crate::host::{Host, TabId};
use crate::messaging::{Request, Response};
use crate::results::PageSnapshot;

pub const TAB: TabId = TabId(7);
pub const PAGE_URL: &str = "http://example.com/login";
pub const SCREENSHOT: &str = "c2NyZWVu";

const LOGIN_PAGE: &str = r#"<html><head><title>Login</title></head><body>
<form action="http://example.com/session" method="post">
  <input type="email" name="email">
  <input type="password" name="password">
</form>
</body></html>"#;

/// Single-tab host whose collector serves a fixed login page
pub struct FakeHost {
    has_tab: bool,
    collector_loaded: AtomicBool,
    injection_fails: bool,
    popup_fails: bool,
    screenshot_fails: bool,
    injections: AtomicUsize,
    popup_opens: AtomicUsize,
}

impl FakeHost {
    fn new(collector_loaded: bool) -> Self {
        Self {
            has_tab: true,
            collector_loaded: AtomicBool::new(collector_loaded),
            injection_fails: false,
            popup_fails: false,
            screenshot_fails: false,
            injections: AtomicUsize::new(0),
            popup_opens: AtomicUsize::new(0),
        }
    }

    pub fn with_collector() -> Self {
        Self::new(true)
    }

    pub fn without_collector() -> Self {
        Self::new(false)
    }

    pub fn without_tab(mut self) -> Self {
        self.has_tab = false;
        self
    }

    pub fn failing_injection(mut self) -> Self {
        self.injection_fails = true;
        self
    }

    pub fn failing_popup(mut self) -> Self {
        self.popup_fails = true;
        self
    }

    pub fn failing_screenshot(mut self) -> Self {
        self.screenshot_fails = true;
        self
    }

    pub fn injections(&self) -> usize {
        self.injections.load(Ordering::SeqCst)
    }

    pub fn popup_opens(&self) -> usize {
        self.popup_opens.load(Ordering::SeqCst)
    }

    pub fn snapshot() -> PageSnapshot {
        collect(&PageContext {
            url: PAGE_URL.to_string(),
            html: LOGIN_PAGE.to_string(),
            ..PageContext::default()
        })
    }
}

#[async_trait]
impl Host for FakeHost {
    async fn active_tab(&self) -> Result<TabId> {
        if self.has_tab {
            Ok(TAB)
        } else {
            Err(Error::NoActiveTab)
        }
    }

    async fn send_to_tab(&self, tab: TabId, request: Request) -> Result<Response> {
        if tab != TAB || !self.collector_loaded.load(Ordering::SeqCst) {
            return Err(Error::CollectorUnavailable(tab));
        }
        match request {
            Request::Ping => Ok(Response::Pong { pong: true }),
            Request::CollectData => Ok(Response::Snapshot(Box::new(Self::snapshot()))),
            Request::AnalyzePage { .. } => Err(Error::NoResponse("analyzePage")),
        }
    }

    async fn inject_collector(&self, tab: TabId) -> Result<()> {
        if self.injection_fails || tab != TAB {
            return Err(Error::CollectorUnavailable(tab));
        }
        self.collector_loaded.store(true, Ordering::SeqCst);
        self.injections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn capture_screenshot(&self) -> Result<String> {
        if self.screenshot_fails {
            return Err(Error::NoActiveTab);
        }
        Ok(SCREENSHOT.to_string())
    }

    async fn open_popup(&self) -> Result<()> {
        if self.popup_fails {
            return Err(Error::PopupUnavailable);
        }
        self.popup_opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Analyzer that records its inputs and answers with a fixed text
pub struct FakeAnalyzer {
    reply: String,
    calls: Mutex<Vec<(PageSnapshot, Option<String>)>>,
}

impl FakeAnalyzer {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<(PageSnapshot, Option<String>)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl SecurityAnalyzer for FakeAnalyzer {
    async fn analyze(&self, snapshot: &PageSnapshot, screenshot: Option<&str>) -> String {
        self.calls
            .lock()
            .await
            .push((snapshot.clone(), screenshot.map(str::to_string)));
        self.reply.clone()
    }
}
