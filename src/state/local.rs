//! Local file-based state storage backend.
//!
//! One pretty-printed JSON file per resource instance, written through a
//! temporary file and renamed into place.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{BridgeError, Result, StateError};

use super::store::StateStore;
use super::types::StateSnapshot;

/// Default state directory name.
pub const STATE_DIR: &str = ".schemabridge";

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "SCHEMABRIDGE_STATE_DIR";

const STATE_EXTENSION: &str = "json";

/// Local file-based state store.
#[derive(Debug)]
pub struct LocalStateStore {
    /// Directory holding the state files.
    base_dir: PathBuf,
}

impl LocalStateStore {
    /// Creates a store in `.schemabridge` under the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new() -> Result<Self> {
        let base_dir = std::env::current_dir()
            .map_err(|e| BridgeError::internal(format!("Cannot determine current directory: {e}")))?
            .join(STATE_DIR);

        Ok(Self::with_base_dir(base_dir))
    }

    /// Creates a store in a custom directory.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding the state files.
    #[must_use]
    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    /// Path of the state file for an instance id.
    fn state_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(BridgeError::State(StateError::storage(format!(
                "Invalid state id '{id}': use letters, digits, '-', '_' and '.'"
            ))));
        }
        Ok(self.base_dir.join(format!("{id}.{STATE_EXTENSION}")))
    }

    /// Ensures the state directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            debug!("Creating state directory: {}", self.base_dir.display());
            fs::create_dir_all(&self.base_dir).await.map_err(|e| {
                BridgeError::State(StateError::storage(format!(
                    "Failed to create state directory: {e}"
                )))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self, id: &str) -> Result<Option<StateSnapshot>> {
        let path = self.state_path(id)?;
        if !path.exists() {
            debug!("State file does not exist: {}", path.display());
            return Ok(None);
        }

        info!("Loading state from: {}", path.display());

        let content = fs::read_to_string(&path).await.map_err(|e| {
            BridgeError::State(StateError::Corrupted {
                message: format!("Failed to read state file: {e}"),
            })
        })?;

        let snapshot: StateSnapshot = serde_json::from_str(&content).map_err(|e| {
            BridgeError::State(StateError::Corrupted {
                message: format!("Failed to parse state file: {e}"),
            })
        })?;
        snapshot.check_version()?;

        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        let path = self.state_path(&snapshot.id)?;
        self.ensure_dir().await?;

        info!("Saving state to: {}", path.display());

        let content = serde_json::to_string_pretty(snapshot).map_err(|e| {
            BridgeError::State(StateError::serialization(format!(
                "Failed to serialize state: {e}"
            )))
        })?;

        let temp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            BridgeError::State(StateError::storage(format!(
                "Failed to create temp state file: {e}"
            )))
        })?;

        file.write_all(content.as_bytes()).await.map_err(|e| {
            BridgeError::State(StateError::storage(format!("Failed to write state file: {e}")))
        })?;

        file.sync_all().await.map_err(|e| {
            BridgeError::State(StateError::storage(format!("Failed to sync state file: {e}")))
        })?;

        fs::rename(&temp_path, &path).await.map_err(|e| {
            BridgeError::State(StateError::storage(format!("Failed to rename state file: {e}")))
        })?;

        debug!("State {} saved at serial {}", snapshot.id, snapshot.serial);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.state_path(id)?;
        if !path.exists() {
            return Ok(false);
        }

        info!("Deleting state file: {}", path.display());
        fs::remove_file(&path).await.map_err(|e| {
            BridgeError::State(StateError::storage(format!("Failed to delete state file: {e}")))
        })?;
        Ok(true)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.state_path(id)?.exists())
    }

    async fn list(&self) -> Result<Vec<String>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.base_dir).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(STATE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}
