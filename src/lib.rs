//! Client-side STRIDE security review of web pages.
//!
//! A collector snapshots a page's DOM, storage and network signals; the
//! background coordinator bounds the snapshot, asks a remote model for a STRIDE
//! assessment and relays or stores the verdict; the popup formats it for display.

pub mod analysis;
pub mod collector;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod extension;
pub mod filter;
pub mod formatter;
pub mod host;
pub mod messaging;
pub mod popup;
pub mod results;
pub mod status;
pub mod storage;
pub mod summarizer;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use config::ExtensionConfig;
pub use error::{Error, Result};
pub use extension::{Extension, RunningExtension};
pub use results::{AnalysisResult, PageSnapshot};
pub use status::SecurityStatus;
