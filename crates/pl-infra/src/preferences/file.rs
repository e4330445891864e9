//! File-based preferences store.
//!
//! Persists the connection flow preferences to a local JSON file in the
//! application data directory.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use pl_core::ports::{PreferencesError, ReaderPreferencesPort, StoredReader};

pub const DEFAULT_PREFS_FILE: &str = "reader_prefs.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrefsFile {
    last_connected: Option<StoredReader>,
    #[serde(default)]
    tutorial_shown: bool,
}

pub struct FileReaderPreferences {
    prefs_file_path: PathBuf,
}

impl FileReaderPreferences {
    /// Create a store with a custom file path.
    pub fn new(prefs_file_path: PathBuf) -> Self {
        Self { prefs_file_path }
    }

    /// Create a store with base dir and filename.
    pub fn with_base_dir(base_dir: PathBuf, filename: impl Into<String>) -> Self {
        Self {
            prefs_file_path: base_dir.join(filename.into()),
        }
    }

    /// Create a store with defaults.
    pub fn with_defaults(base_dir: PathBuf) -> Self {
        Self {
            prefs_file_path: base_dir.join(DEFAULT_PREFS_FILE),
        }
    }

    async fn load(&self) -> anyhow::Result<PrefsFile> {
        if !self.prefs_file_path.exists() {
            return Ok(PrefsFile::default());
        }

        let content = fs::read_to_string(&self.prefs_file_path).await?;
        if content.trim().is_empty() {
            return Ok(PrefsFile::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    async fn store(&self, prefs: &PrefsFile) -> anyhow::Result<()> {
        if let Some(parent) = self.prefs_file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.prefs_file_path, content).await?;
        Ok(())
    }
}

fn storage_error(error: anyhow::Error) -> PreferencesError {
    PreferencesError::Storage(error.to_string())
}

#[async_trait]
impl ReaderPreferencesPort for FileReaderPreferences {
    async fn last_connected_reader(&self) -> Result<Option<StoredReader>, PreferencesError> {
        let prefs = self.load().await.map_err(storage_error)?;
        Ok(prefs.last_connected)
    }

    async fn set_last_connected_reader(
        &self,
        reader: StoredReader,
    ) -> Result<(), PreferencesError> {
        let mut prefs = self.load().await.map_err(storage_error)?;
        prefs.last_connected = Some(reader);
        self.store(&prefs).await.map_err(storage_error)
    }

    async fn tutorial_shown(&self) -> Result<bool, PreferencesError> {
        let prefs = self.load().await.map_err(storage_error)?;
        Ok(prefs.tutorial_shown)
    }

    async fn mark_tutorial_shown(&self) -> Result<(), PreferencesError> {
        let mut prefs = self.load().await.map_err(storage_error)?;
        prefs.tutorial_shown = true;
        self.store(&prefs).await.map_err(storage_error)
    }
}
