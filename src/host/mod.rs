//! The host platform the extension runs on: tabs, script injection,
//! screenshots and the popup surface.

pub mod webdriver;

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;
use crate::messaging::{Request, Response};

/// Identifies a browser tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStatus {
    Loading,
    Complete,
}

/// A tab navigation progress signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub tab: TabId,
    pub url: String,
    pub status: NavigationStatus,
}

impl NavigationEvent {
    /// A finished page load
    pub fn complete(tab: TabId, url: impl Into<String>) -> Self {
        Self {
            tab,
            url: url.into(),
            status: NavigationStatus::Complete,
        }
    }
}

/// Platform services used by the background and the popup
#[async_trait]
pub trait Host: Send + Sync {
    /// The focused tab of the current window
    async fn active_tab(&self) -> Result<TabId>;

    /// Deliver a message to the collector loaded in a tab
    async fn send_to_tab(&self, tab: TabId, request: Request) -> Result<Response>;

    /// Make sure a collector is loaded in a tab
    async fn inject_collector(&self, tab: TabId) -> Result<()>;

    /// Base64-encoded PNG of the visible tab
    async fn capture_screenshot(&self) -> Result<String>;

    /// Surface the popup UI
    async fn open_popup(&self) -> Result<()>;
}
