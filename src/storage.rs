//! Persistence for the monitoring flag

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk form of the session's one persisted value. The field name matches
/// the key the host keeps in its own local storage.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(rename = "isMonitoring", default)]
    is_monitoring: bool,
}

/// Loads and saves the monitoring flag as a small JSON file.
///
/// A missing or unreadable file means monitoring is off; corruption is
/// logged and treated the same way, never escalated.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted monitoring flag
    pub async fn load(&self) -> bool {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No persisted state at {}, monitoring off", self.path.display());
                return false;
            }
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return false;
            }
        };

        match serde_json::from_str::<PersistedState>(&contents) {
            Ok(state) => state.is_monitoring,
            Err(e) => {
                warn!("Corrupt state file {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Persist the monitoring flag, creating parent directories as needed
    pub async fn save(&self, is_monitoring: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let contents = serde_json::to_string(&PersistedState { is_monitoring })?;
        tokio::fs::write(&self.path, contents).await?;

        debug!(
            "Persisted monitoring state {} to {}",
            is_monitoring,
            self.path.display()
        );
        Ok(())
    }
}
