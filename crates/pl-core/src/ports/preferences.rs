use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::PreferencesError;
use crate::ids::ReaderId;

/// The last reader this device successfully connected to.
///
/// Used for the reconnection affinity: when a discovery batch contains this
/// id, the flow connects to it without offering a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReader {
    pub id: ReaderId,
    pub connected_at: DateTime<Utc>,
}

/// Host application preferences consumed by the connection flow.
#[async_trait]
pub trait ReaderPreferencesPort: Send + Sync {
    async fn last_connected_reader(&self) -> Result<Option<StoredReader>, PreferencesError>;

    async fn set_last_connected_reader(
        &self,
        reader: StoredReader,
    ) -> Result<(), PreferencesError>;

    /// Whether the post-connection tutorial has already been shown once.
    async fn tutorial_shown(&self) -> Result<bool, PreferencesError>;

    async fn mark_tutorial_shown(&self) -> Result<(), PreferencesError>;
}
