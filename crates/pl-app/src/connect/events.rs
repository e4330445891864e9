use serde::{Deserialize, Serialize};

use pl_core::connect::ConnectEvent;
use pl_core::ReaderId;

use super::completion::Completion;

/// One-shot events the host platform must handle.
///
/// Gate events carry a [`Completion`] the host invokes with the outcome; the
/// flow suspends until the answer arrives (no polling). Everything else is
/// fire-and-forget navigation.
#[derive(Debug)]
pub enum HostEvent {
    CheckLocationPermission { respond: Completion<bool> },
    RequestLocationPermission { respond: Completion<bool> },
    CheckLocationEnabled { respond: Completion<bool> },
    OpenLocationSettings { on_closed: Completion<()> },
    OpenPermissionSettings,
    CheckBluetoothPermission { respond: Completion<bool> },
    RequestBluetoothPermission { respond: Completion<bool> },
    CheckBluetoothEnabled { respond: Completion<bool> },
    RequestEnableBluetooth { respond: Completion<bool> },
    NavigateToOnboarding,
    OpenUrl { url: String },
    OpenAuthenticatedUrl { url: String },
    ShowTutorial,
    UpdateInProgress,
    ErrorNotice { message: String },
    /// Terminal outcome of the flow; emitted exactly once.
    Finished { connected: bool },
}

/// User actions reported back by the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserCommand {
    ConnectToReader(ReaderId),
    KeepSearching,
    Retry,
    Cancel,
    OpenSettings,
    OpenLocationSettings,
    EnableBluetooth,
    UpdateAddress,
    ScreenResumed,
}

impl UserCommand {
    pub(crate) fn into_event(self) -> ConnectEvent {
        match self {
            UserCommand::ConnectToReader(reader_id) => ConnectEvent::ConnectClicked { reader_id },
            UserCommand::KeepSearching => ConnectEvent::KeepSearchingClicked,
            UserCommand::Retry => ConnectEvent::RetryClicked,
            UserCommand::Cancel => ConnectEvent::CancelClicked,
            UserCommand::OpenSettings => ConnectEvent::OpenSettingsClicked,
            UserCommand::OpenLocationSettings => ConnectEvent::OpenLocationSettingsClicked,
            UserCommand::EnableBluetooth => ConnectEvent::EnableBluetoothClicked,
            UserCommand::UpdateAddress => ConnectEvent::UpdateAddressClicked,
            UserCommand::ScreenResumed => ConnectEvent::ScreenResumed,
        }
    }
}
