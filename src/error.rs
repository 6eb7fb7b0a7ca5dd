use crate::host::TabId;

/// Errors raised across the extension's contexts
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no active tab")]
    NoActiveTab,

    #[error("collector is not loaded in tab {0}")]
    CollectorUnavailable(TabId),

    #[error("message channel closed")]
    ChannelClosed,

    #[error("no response to '{0}'")]
    NoResponse(&'static str),

    #[error("unexpected response to '{0}'")]
    UnexpectedResponse(&'static str),

    #[error("popup surface unavailable")]
    PopupUnavailable,

    #[error("webdriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("webdriver session failed: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
