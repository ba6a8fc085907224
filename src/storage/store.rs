//! On-disk storage for submitted scripts.

use std::path::{Path, PathBuf};

use super::SubmissionId;
use crate::error::RunnerError;
use crate::Result;

/// Default directory submitted scripts are written to.
pub const DEFAULT_SCRIPT_DIR: &str = "host_code";

/// Default file extension for submitted scripts.
pub const DEFAULT_EXTENSION: &str = "py";

/// Settings for a [`ScriptStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory scripts are written to; created on open.
    pub dir: PathBuf,
    /// File extension without the leading dot.
    pub extension: String,
    /// Keep script files after their run instead of deleting them.
    pub retain: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_SCRIPT_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
            retain: false,
        }
    }
}

/// A submitted script that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredScript {
    pub id: SubmissionId,
    pub path: PathBuf,
}

/// Writes submitted source text to uniquely named files.
#[derive(Debug)]
pub struct ScriptStore {
    config: StoreConfig,
}

impl ScriptStore {
    /// Open the store, creating its directory if needed.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.dir)
            .await
            .map_err(|source| RunnerError::Persist {
                path: config.dir.clone(),
                source,
            })?;
        tracing::debug!(dir = %config.dir.display(), "script store ready");
        Ok(Self { config })
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Path a submission with the given ID is written to.
    pub fn path_for(&self, id: SubmissionId) -> PathBuf {
        let name = format!("submission-{:08x}", id.as_u64());
        let mut path = self.config.dir.join(name);
        if !self.config.extension.is_empty() {
            path.set_extension(&self.config.extension);
        }
        path
    }

    /// Write `code` to a fresh file and return where it went.
    pub async fn persist(&self, code: &str) -> Result<StoredScript> {
        let id = SubmissionId::new();
        let path = self.path_for(id);

        tokio::fs::write(&path, code)
            .await
            .map_err(|source| RunnerError::Persist {
                path: path.clone(),
                source,
            })?;

        tracing::info!(%id, path = %path.display(), bytes = code.len(), "User script saved");
        Ok(StoredScript { id, path })
    }

    /// Remove a stored script unless the store retains scripts.
    ///
    /// Removal failures are logged and otherwise ignored.
    pub async fn discard(&self, script: &StoredScript) {
        if self.config.retain {
            return;
        }

        if let Err(err) = tokio::fs::remove_file(&script.path).await {
            tracing::warn!(
                id = %script.id,
                path = %script.path.display(),
                error = %err,
                "failed to remove user script"
            );
        }
    }
}
