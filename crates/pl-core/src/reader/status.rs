use serde::{Deserialize, Serialize};

use super::ConnectedReader;

/// Connection status reported by the vendor reader SDK.
///
/// The SDK is the only writer; the connection flow merely observes
/// transitions. A `Connecting -> NotConnected` transition without an
/// intervening `Connected` is a failed connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardReaderStatus {
    NotConnected { error: Option<String> },
    Connecting,
    Connected(ConnectedReader),
}

impl CardReaderStatus {
    pub fn not_connected() -> Self {
        CardReaderStatus::NotConnected { error: None }
    }
}

/// Firmware update status reported by the vendor reader SDK.
///
/// A mandatory update can start in the middle of a connection attempt; the
/// flow surfaces it to the host once per update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoftwareUpdateStatus {
    Idle,
    InProgress,
}
