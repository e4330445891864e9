use serde::{Deserialize, Serialize};

use crate::ids::{LocationId, ReaderId};
use crate::reader::DiscoveredReader;
use crate::telemetry::TelemetryEvent;

/// Side effects produced by state transitions, executed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectAction {
    CheckOnboarding,

    // Gate plumbing: checks and prompts dispatched to the host.
    CheckLocationPermission,
    RequestLocationPermission,
    CheckLocationEnabled,
    OpenLocationSettings,
    OpenPermissionSettings,
    CheckBluetoothPermission,
    RequestBluetoothPermission,
    CheckBluetoothEnabled,
    RequestEnableBluetooth,

    // Discovery and connection.
    StartDiscovery,
    ResolveLocation { reader: DiscoveredReader },
    Connect { reader: DiscoveredReader, location_id: LocationId },

    // Persistence and host navigation.
    PersistConnectedReader { reader_id: ReaderId },
    MarkTutorialShown,
    ShowTutorial,
    NavigateToOnboarding,
    OpenUrl { url: String },
    OpenAuthenticatedUrl { url: String },
    NotifyError { message: String },

    Track(TelemetryEvent),
    Exit { connected: bool },
}
