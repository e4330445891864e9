use serde::{Deserialize, Serialize};

use crate::ids::{LocationId, ReaderId};
use crate::location::LocationFetchError;
use crate::onboarding::OnboardingState;
use crate::reader::{CardReaderStatus, DiscoveredReader};

/// Events that drive the connection flow.
///
/// Gate results and user clicks arrive from the host; discovery, location
/// and status results from the orchestrator's subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectEvent {
    Start,
    OnboardingChecked(OnboardingState),

    // Gate results, in gate order.
    LocationPermissionChecked { granted: bool },
    LocationPermissionRequested { granted: bool },
    LocationEnabledChecked { enabled: bool },
    LocationSettingsClosed,
    BluetoothPermissionChecked { granted: bool },
    BluetoothPermissionRequested { granted: bool },
    BluetoothEnabledChecked { enabled: bool },
    BluetoothEnableRequested { enabled: bool },

    // Discovery and connection progress.
    ReadersDiscovered { readers: Vec<DiscoveredReader> },
    DiscoveryFailed { reason: String },
    LocationResolved { location_id: LocationId },
    LocationResolutionFailed { error: LocationFetchError },
    StatusChanged { status: CardReaderStatus },

    // User actions.
    ConnectClicked { reader_id: ReaderId },
    KeepSearchingClicked,
    RetryClicked,
    CancelClicked,
    OpenSettingsClicked,
    OpenLocationSettingsClicked,
    EnableBluetoothClicked,
    UpdateAddressClicked,
    ScreenResumed,
}
