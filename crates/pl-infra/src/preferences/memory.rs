use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use pl_core::ids::ReaderId;
use pl_core::ports::{PreferencesError, ReaderPreferencesPort, StoredReader};

#[derive(Debug, Default)]
struct PrefState {
    last_connected: Option<StoredReader>,
    tutorial_shown: bool,
}

/// In-memory preferences store, mainly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryReaderPreferences {
    state: RwLock<PrefState>,
}

impl InMemoryReaderPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a remembered reader, as if a previous flow had connected.
    pub fn with_last_connected(reader_id: impl Into<ReaderId>) -> Self {
        Self {
            state: RwLock::new(PrefState {
                last_connected: Some(StoredReader {
                    id: reader_id.into(),
                    connected_at: Utc::now(),
                }),
                tutorial_shown: true,
            }),
        }
    }

    pub fn with_tutorial_shown(mut self, tutorial_shown: bool) -> Self {
        self.state.get_mut().tutorial_shown = tutorial_shown;
        self
    }
}

#[async_trait]
impl ReaderPreferencesPort for InMemoryReaderPreferences {
    async fn last_connected_reader(&self) -> Result<Option<StoredReader>, PreferencesError> {
        Ok(self.state.read().await.last_connected.clone())
    }

    async fn set_last_connected_reader(
        &self,
        reader: StoredReader,
    ) -> Result<(), PreferencesError> {
        self.state.write().await.last_connected = Some(reader);
        Ok(())
    }

    async fn tutorial_shown(&self) -> Result<bool, PreferencesError> {
        Ok(self.state.read().await.tutorial_shown)
    }

    async fn mark_tutorial_shown(&self) -> Result<(), PreferencesError> {
        self.state.write().await.tutorial_shown = true;
        Ok(())
    }
}
