use serde::{Deserialize, Serialize};

use crate::reader::DiscoveredReader;

/// Capability gates checked before discovery can start, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    LocationPermission,
    LocationServices,
    BluetoothPermission,
    BluetoothAdapter,
}

/// Connection flow state.
///
/// Exactly one state is active at a time; the view state the host renders is
/// a projection of this (see [`super::ConnectViewState`]). `Finished` is
/// terminal: every event received there is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectState {
    /// Flow constructed, not started yet.
    Idle,
    /// Waiting for the onboarding checker's verdict.
    CheckingOnboarding,
    /// Waiting for the host to answer a gate check.
    CheckingGate(Gate),
    /// Waiting for the outcome of a permission/enable prompt.
    RequestingGate(Gate),
    /// User went to the system location settings; re-check on return.
    WaitingLocationSettings,
    /// Discovery session active, nothing selectable yet.
    Scanning,
    /// Exactly one selectable reader discovered.
    ReaderFound { reader: DiscoveredReader },
    /// Several selectable readers discovered.
    MultipleReadersFound { readers: Vec<DiscoveredReader> },
    /// Fetching the merchant's default location before connecting.
    ResolvingLocation { reader: DiscoveredReader },
    /// Connection attempt in flight.
    Connecting,
    /// Location permission refused.
    MissingLocationPermissions,
    /// Location services switched off.
    LocationDisabled,
    /// Bluetooth permission refused.
    MissingBluetoothPermissions,
    /// Bluetooth adapter switched off.
    BluetoothDisabled,
    /// Discovery reported a failure.
    ScanningFailed,
    /// Connection attempt failed.
    ConnectingFailed,
    /// Merchant has no registered address; carries the form deep link.
    MissingMerchantAddress { url: String },
    /// Merchant address has an unusable postal code.
    InvalidPostalCode,
    /// Flow over (terminal).
    Finished { connected: bool },
}

impl ConnectState {
    /// States during which a discovery subscription may be held open.
    pub fn is_scanning_family(&self) -> bool {
        matches!(
            self,
            ConnectState::Scanning
                | ConnectState::ReaderFound { .. }
                | ConnectState::MultipleReadersFound { .. }
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ConnectState::Finished { .. })
    }
}
