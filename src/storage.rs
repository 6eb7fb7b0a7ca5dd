//! The single persisted "last analysis" slot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::results::AnalysisResult;

/// Durable state shared by the background and the popup.
///
/// Both keys are written together and cleared together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub auto_analysis_triggered: bool,
}

impl PersistedState {
    /// State written by an automatic run
    pub fn automatic(result: AnalysisResult) -> Self {
        Self {
            last_analysis: Some(result),
            auto_analysis_triggered: true,
        }
    }

    /// State written by an on-demand run; never resurfaces on its own
    pub fn manual(result: AnalysisResult) -> Self {
        Self {
            last_analysis: Some(result),
            auto_analysis_triggered: false,
        }
    }

    /// The stored result if it came from an automatic run not yet shown
    pub fn pending(&self) -> Option<&AnalysisResult> {
        match (&self.last_analysis, self.auto_analysis_triggered) {
            (Some(result), true) => Some(result),
            _ => None,
        }
    }
}

/// Process-wide durable storage for [`PersistedState`]
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Current state; empty when nothing is stored
    async fn load(&self) -> Result<PersistedState>;
    /// Overwrite the slot
    async fn save(&self, state: &PersistedState) -> Result<()>;
    /// Empty the slot
    async fn clear(&self) -> Result<()>;
}

/// In-memory slot
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<PersistedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<PersistedState> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        *self.slot.lock().await = state.clone();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot.lock().await = PersistedState::default();
        Ok(())
    }
}

/// Slot kept as a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes writers within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn load(&self) -> Result<PersistedState> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        let _guard = self.lock.lock().await;
        let json = serde_json::to_string_pretty(state)?;
        // Readers see either the old slot or the new one, never a partial write
        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                ::log::debug!("Could not remove {}: {}", staging.display(), cleanup);
            }
            return Err(e.into());
        }
        ::log::debug!("Saved analysis state to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
