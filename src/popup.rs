//! Popup controller.
//!
//! On mount it reconciles a pending automatic result from storage; otherwise it
//! waits for a manual analysis. Every state it settles on is published through a
//! `watch` channel so a renderer can follow along.

use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::formatter::render;
use crate::host::Host;
use crate::messaging::{Endpoint, Request, Response};
use crate::results::PageSnapshot;
use crate::status::{SecurityStatus, StatusStrategy};
use crate::storage::StateStore;

pub const COLLECT_ERROR: &str = "Could not collect page data. Make sure you are on a valid page.";
pub const ANALYZE_ERROR: &str = "Error analyzing page. Please try again.";

/// A displayed analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisView {
    pub analysis: String,
    pub status: SecurityStatus,
    /// HTML produced by the formatter
    pub markup: String,
}

impl AnalysisView {
    fn new(analysis: String, status: SecurityStatus) -> Self {
        let markup = render::to_html(&analysis);
        Self {
            analysis,
            status,
            markup,
        }
    }
}

/// What the popup shows; exactly one at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupView {
    Initial,
    Loading,
    Error(String),
    Result(AnalysisView),
}

impl PopupView {
    /// Terminal rendering of the view
    pub fn render_text(&self) -> String {
        let mut out = String::from("STRIDE Design Review\n\n");
        match self {
            PopupView::Initial => out.push_str("Analyze Current Page\n"),
            PopupView::Loading => out.push_str("Analyzing page security...\n"),
            PopupView::Error(message) => {
                out.push_str(message);
                out.push('\n');
            }
            PopupView::Result(view) => {
                out.push_str(&format!("[{}]\n\n", view.status.as_str().to_uppercase()));
                out.push_str("Security Analysis\n\n");
                out.push_str(&render::to_text(&view.analysis));
                out.push_str("\n(run again to re-analyze)\n");
            }
        }
        out
    }
}

pub struct PopupController {
    host: Arc<dyn Host>,
    background: Endpoint,
    store: Arc<dyn StateStore>,
    view: watch::Sender<PopupView>,
}

impl PopupController {
    pub fn new(host: Arc<dyn Host>, background: Endpoint, store: Arc<dyn StateStore>) -> Self {
        let (view, _) = watch::channel(PopupView::Initial);
        Self {
            host,
            background,
            store,
            view,
        }
    }

    /// Current view
    pub fn view(&self) -> PopupView {
        self.view.borrow().clone()
    }

    /// Follow view transitions
    pub fn subscribe(&self) -> watch::Receiver<PopupView> {
        self.view.subscribe()
    }

    /// Show a pending automatic result once, clearing it from storage
    pub async fn mount(&self) -> PopupView {
        let state = match self.store.load().await {
            Ok(state) => state,
            Err(e) => {
                ::log::warn!("Could not read stored analysis: {}", e);
                return self.show(PopupView::Initial);
            }
        };

        let Some(result) = state.pending().cloned() else {
            return self.show(PopupView::Initial);
        };

        ::log::info!("Showing automatic analysis ({})", result.security_status);
        if let Err(e) = self.store.clear().await {
            ::log::warn!("Could not clear stored analysis: {}", e);
        }

        self.show(PopupView::Result(AnalysisView::new(
            result.analysis,
            result.security_status,
        )))
    }

    /// Collect the active tab, ask the background for an analysis and show it
    pub async fn analyze(&self) -> PopupView {
        self.show(PopupView::Loading);

        let snapshot = match self.collect().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                ::log::error!("Collection failed: {}", e);
                return self.show(PopupView::Error(COLLECT_ERROR.to_string()));
            }
        };

        match self.request_analysis(snapshot).await {
            Ok(analysis) => {
                let status = StatusStrategy::FirstLine.classify(&analysis);
                self.show(PopupView::Result(AnalysisView::new(analysis, status)))
            }
            Err(e) => {
                ::log::error!("Analysis error: {}", e);
                self.show(PopupView::Error(ANALYZE_ERROR.to_string()))
            }
        }
    }

    async fn collect(&self) -> Result<PageSnapshot> {
        let tab = self.host.active_tab().await?;
        match self.host.send_to_tab(tab, Request::CollectData).await? {
            Response::Snapshot(snapshot) => Ok(*snapshot),
            _ => Err(Error::UnexpectedResponse("collectData")),
        }
    }

    async fn request_analysis(&self, snapshot: PageSnapshot) -> Result<String> {
        let request = Request::AnalyzePage {
            page_data: Box::new(snapshot),
        };
        match self.background.request(request).await? {
            Response::Analysis { analysis } => Ok(analysis),
            _ => Err(Error::UnexpectedResponse("analyzePage")),
        }
    }

    fn show(&self, view: PopupView) -> PopupView {
        self.view.send_replace(view.clone());
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SecurityAnalyzer;
    use crate::coordinator::Coordinator;
    use crate::filter::NavigationFilter;
    use crate::host::NavigationEvent;
    use crate::messaging;
    use crate::results::AnalysisResult;
    use crate::storage::{MemoryStore, PersistedState};
    use crate::testing::{FakeAnalyzer, FakeHost, PAGE_URL, TAB};

    struct Harness {
        host: Arc<FakeHost>,
        analyzer: Arc<FakeAnalyzer>,
        store: Arc<MemoryStore>,
        coordinator: Arc<Coordinator>,
        popup: PopupController,
    }

    fn harness(host: FakeHost, reply: &str) -> Harness {
        let host = Arc::new(host);
        let analyzer = Arc::new(FakeAnalyzer::new(reply));
        let store = Arc::new(MemoryStore::new());
        let coordinator = Arc::new(Coordinator::new(
            host.clone(),
            analyzer.clone() as Arc<dyn SecurityAnalyzer>,
            store.clone(),
            NavigationFilter::default(),
        ));

        let (background, inbox) = messaging::channel(8);
        tokio::spawn(inbox.serve(coordinator.clone()));

        let popup = PopupController::new(host.clone(), background, store.clone());
        Harness {
            host,
            analyzer,
            store,
            coordinator,
            popup,
        }
    }

    #[tokio::test]
    async fn test_mount_without_pending_result() {
        let h = harness(FakeHost::with_collector(), "secure");
        assert_eq!(h.popup.mount().await, PopupView::Initial);
        assert_eq!(h.popup.view(), PopupView::Initial);
    }

    #[tokio::test]
    async fn test_automatic_result_is_shown_exactly_once() {
        let h = harness(FakeHost::with_collector(), "Insecure: the login form posts over HTTP");

        h.coordinator
            .handle_navigation(&NavigationEvent::complete(TAB, PAGE_URL))
            .await;
        assert_eq!(h.host.popup_opens(), 1);

        match h.popup.mount().await {
            PopupView::Result(view) => {
                assert_eq!(view.analysis, "Insecure: the login form posts over HTTP");
                assert_eq!(view.status, SecurityStatus::Insecure);
                assert_eq!(
                    view.markup,
                    "<p>Insecure: the login form posts over HTTP</p>"
                );
            }
            other => panic!("expected stored result, got {:?}", other),
        }
        assert_eq!(h.store.load().await.unwrap(), PersistedState::default());

        assert_eq!(h.popup.mount().await, PopupView::Initial);
    }

    #[tokio::test]
    async fn test_stored_status_is_used_on_mount() {
        let h = harness(FakeHost::with_collector(), "unused");
        h.store
            .save(&PersistedState::automatic(AnalysisResult::new(
                "Looks fine\nsecure".to_string(),
                SecurityStatus::Insecure,
            )))
            .await
            .unwrap();

        match h.popup.mount().await {
            PopupView::Result(view) => assert_eq!(view.status, SecurityStatus::Insecure),
            other => panic!("expected stored result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_manual_result_is_not_reconciled() {
        let h = harness(FakeHost::with_collector(), "Secure");
        h.popup.analyze().await;
        assert!(h.store.load().await.unwrap().last_analysis.is_some());

        assert_eq!(h.popup.mount().await, PopupView::Initial);
    }

    #[tokio::test]
    async fn test_manual_analysis_uses_first_line_status() {
        let h = harness(
            FakeHost::with_collector(),
            "Insecure\n\nSTRIDE Analysis:\n2. **Spoofing**: credentials over HTTP",
        );

        match h.popup.analyze().await {
            PopupView::Result(view) => {
                assert_eq!(view.status, SecurityStatus::Insecure);
                assert!(view.markup.contains("<p><strong>1. Spoofing: credentials over HTTP</strong></p>"));
            }
            other => panic!("expected result, got {:?}", other),
        }

        let calls = h.analyzer.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.url, PAGE_URL);
    }

    #[tokio::test]
    async fn test_prose_verdict_is_unknown_in_popup() {
        let h = harness(
            FakeHost::with_collector(),
            "The page appears insecure.\nForms post over HTTP.",
        );

        match h.popup.analyze().await {
            PopupView::Result(view) => assert_eq!(view.status, SecurityStatus::Unknown),
            other => panic!("expected result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_collection_errors() {
        let h = harness(FakeHost::without_collector(), "secure");
        assert_eq!(
            h.popup.analyze().await,
            PopupView::Error(COLLECT_ERROR.to_string())
        );

        let h = harness(FakeHost::with_collector().without_tab(), "secure");
        assert_eq!(
            h.popup.analyze().await,
            PopupView::Error(COLLECT_ERROR.to_string())
        );
        assert!(h.analyzer.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_background_gone() {
        let host = Arc::new(FakeHost::with_collector());
        let (background, inbox) = messaging::channel(1);
        drop(inbox);
        let popup = PopupController::new(host, background, Arc::new(MemoryStore::new()));

        assert_eq!(
            popup.analyze().await,
            PopupView::Error(ANALYZE_ERROR.to_string())
        );
    }

    #[tokio::test]
    async fn test_views_are_published() {
        let h = harness(FakeHost::with_collector(), "Secure");
        let mut rx = h.popup.subscribe();
        assert_eq!(*rx.borrow_and_update(), PopupView::Initial);

        h.popup.analyze().await;
        assert!(rx.has_changed().unwrap());
        assert!(matches!(*rx.borrow_and_update(), PopupView::Result(_)));
    }

    #[test]
    fn test_render_text() {
        let view = PopupView::Result(AnalysisView::new(
            "Insecure\n- HTTP form".to_string(),
            SecurityStatus::Insecure,
        ));
        let text = view.render_text();
        assert!(text.starts_with("STRIDE Design Review"));
        assert!(text.contains("[INSECURE]"));
        assert!(text.contains("  • HTTP form"));

        assert!(PopupView::Error(COLLECT_ERROR.to_string()).render_text().contains(COLLECT_ERROR));
        assert!(PopupView::Loading.render_text().contains("Analyzing page security..."));
    }
}
