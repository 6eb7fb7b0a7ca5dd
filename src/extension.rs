use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analysis::{AnalysisClient, SecurityAnalyzer};
use crate::config::ExtensionConfig;
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::filter::NavigationFilter;
use crate::host::{Host, NavigationEvent};
use crate::messaging;
use crate::popup::PopupController;
use crate::storage::{FileStore, StateStore};

/// Builder that wires the background coordinator and the popup onto a host
pub struct Extension {
    config: ExtensionConfig,
    store: Option<Arc<dyn StateStore>>,
    analyzer: Option<Arc<dyn SecurityAnalyzer>>,
}

impl Extension {
    /// Create a new Extension builder with the given configuration
    pub fn new(config: ExtensionConfig) -> Self {
        Self {
            config,
            store: None,
            analyzer: None,
        }
    }

    /// Use a specific state store instead of the configured state file
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a specific analyzer instead of the remote completion service
    pub fn with_analyzer(mut self, analyzer: Arc<dyn SecurityAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Start the background contexts. Must be called inside a tokio runtime.
    pub fn launch(self, host: Arc<dyn Host>) -> Result<RunningExtension> {
        let filter = NavigationFilter::new(self.config.auto_analysis.clone())?;
        let store: Arc<dyn StateStore> = match self.store {
            Some(store) => store,
            None => Arc::new(FileStore::new(&self.config.state_file)),
        };
        let analyzer: Arc<dyn SecurityAnalyzer> = match self.analyzer {
            Some(analyzer) => analyzer,
            None => Arc::new(AnalysisClient::new(&self.config)),
        };

        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&host),
            analyzer,
            Arc::clone(&store),
            filter,
        ));

        // Background inbox for popup requests
        let (background, inbox) = messaging::channel(16);
        let background_task = tokio::spawn(inbox.serve(coordinator.clone()));

        // Page-load stream for the automatic trigger
        let (navigation, events) = mpsc::channel(64);
        let watcher_task = tokio::spawn(Arc::clone(&coordinator).watch(events));

        let popup = Arc::new(PopupController::new(host, background, store));
        ::log::debug!("Extension launched");

        Ok(RunningExtension {
            popup,
            navigation,
            coordinator,
            background_task,
            watcher_task,
        })
    }
}

/// Handles to a launched extension
pub struct RunningExtension {
    pub popup: Arc<PopupController>,
    pub navigation: mpsc::Sender<NavigationEvent>,
    coordinator: Arc<Coordinator>,
    background_task: JoinHandle<()>,
    watcher_task: JoinHandle<()>,
}

impl RunningExtension {
    /// Report a finished page load to the automatic trigger
    pub async fn page_loaded(&self, event: NavigationEvent) {
        if self.navigation.send(event).await.is_err() {
            ::log::error!("Automatic analysis watcher is not running");
        }
    }

    /// Run the automatic trigger for a page load and wait for it to finish.
    ///
    /// Used when the same tab navigates again right after, so the collector
    /// must read this page before it goes away.
    pub async fn review_page_load(&self, event: NavigationEvent) {
        self.coordinator.handle_navigation(&event).await;
    }

    /// Stop accepting page loads, wait for queued automatic runs, then stop the background
    pub async fn shutdown(self) {
        drop(self.navigation);
        if let Err(e) = self.watcher_task.await {
            ::log::error!("Automatic analysis watcher failed: {}", e);
        }
        // The popup still holds the background endpoint
        self.background_task.abort();
        ::log::debug!("Extension shut down");
    }
}
