//! View-state projection of the connection flow.
//!
//! The host renders exactly one of these at a time. Variants carry data and
//! declare which user actions they offer; the host reports clicks back
//! through the orchestrator's command API.

use serde::{Deserialize, Serialize};

use super::state::ConnectState;
use crate::ids::ReaderId;
use crate::reader::ReaderType;

/// Actions a view state can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserAction {
    ConnectToReader,
    KeepSearching,
    Retry,
    Cancel,
    OpenPermissionSettings,
    OpenLocationSettings,
    EnableBluetooth,
    UpdateAddress,
}

/// Row of the multiple-readers selection list.
///
/// The list always ends with a `ScanningInProgress` row: discovery keeps
/// running while the user chooses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReaderListItem {
    Reader {
        reader_id: ReaderId,
        reader_type: ReaderType,
    },
    ScanningInProgress,
}

/// The closed set of mutually exclusive UI states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectViewState {
    Scanning,
    ReaderFound { reader_id: ReaderId },
    MultipleReadersFound { items: Vec<ReaderListItem> },
    Connecting,
    ScanningFailed,
    ConnectingFailed,
    MissingLocationPermissions,
    LocationDisabled,
    MissingBluetoothPermissions,
    BluetoothDisabled,
    MissingMerchantAddress,
    InvalidPostalCode,
}

impl ConnectViewState {
    pub fn primary_action(&self) -> Option<UserAction> {
        match self {
            ConnectViewState::Scanning => None,
            ConnectViewState::ReaderFound { .. } => Some(UserAction::ConnectToReader),
            ConnectViewState::MultipleReadersFound { .. } => None,
            ConnectViewState::Connecting => None,
            ConnectViewState::ScanningFailed => Some(UserAction::Retry),
            ConnectViewState::ConnectingFailed => Some(UserAction::Retry),
            ConnectViewState::MissingLocationPermissions => {
                Some(UserAction::OpenPermissionSettings)
            }
            ConnectViewState::LocationDisabled => Some(UserAction::OpenLocationSettings),
            ConnectViewState::MissingBluetoothPermissions => {
                Some(UserAction::OpenPermissionSettings)
            }
            ConnectViewState::BluetoothDisabled => Some(UserAction::EnableBluetooth),
            ConnectViewState::MissingMerchantAddress => Some(UserAction::UpdateAddress),
            ConnectViewState::InvalidPostalCode => Some(UserAction::Retry),
        }
    }

    pub fn secondary_action(&self) -> Option<UserAction> {
        match self {
            ConnectViewState::ReaderFound { .. } => Some(UserAction::KeepSearching),
            // Retry is the only way out: the merchant has to fix the postal
            // code remotely and try again.
            ConnectViewState::InvalidPostalCode => None,
            _ => Some(UserAction::Cancel),
        }
    }

    pub fn tertiary_action(&self) -> Option<UserAction> {
        match self {
            ConnectViewState::ReaderFound { .. } => Some(UserAction::Cancel),
            _ => None,
        }
    }
}

impl ConnectState {
    /// Project the machine state into what the host renders. `None` once the
    /// flow has finished: the last published view stays on screen while the
    /// host tears the surface down.
    pub fn view(&self) -> Option<ConnectViewState> {
        let view = match self {
            ConnectState::Idle
            | ConnectState::CheckingOnboarding
            | ConnectState::CheckingGate(_)
            | ConnectState::RequestingGate(_)
            | ConnectState::WaitingLocationSettings
            | ConnectState::Scanning => ConnectViewState::Scanning,
            ConnectState::ReaderFound { reader } => ConnectViewState::ReaderFound {
                reader_id: reader
                    .id
                    .clone()
                    .unwrap_or_else(|| ReaderId::from("")),
            },
            ConnectState::MultipleReadersFound { readers } => {
                let mut items: Vec<ReaderListItem> = readers
                    .iter()
                    .filter_map(|r| {
                        r.id.clone().map(|reader_id| ReaderListItem::Reader {
                            reader_id,
                            reader_type: r.reader_type,
                        })
                    })
                    .collect();
                items.push(ReaderListItem::ScanningInProgress);
                ConnectViewState::MultipleReadersFound { items }
            }
            ConnectState::ResolvingLocation { .. } | ConnectState::Connecting => {
                ConnectViewState::Connecting
            }
            ConnectState::MissingLocationPermissions => {
                ConnectViewState::MissingLocationPermissions
            }
            ConnectState::LocationDisabled => ConnectViewState::LocationDisabled,
            ConnectState::MissingBluetoothPermissions => {
                ConnectViewState::MissingBluetoothPermissions
            }
            ConnectState::BluetoothDisabled => ConnectViewState::BluetoothDisabled,
            ConnectState::ScanningFailed => ConnectViewState::ScanningFailed,
            ConnectState::ConnectingFailed => ConnectViewState::ConnectingFailed,
            ConnectState::MissingMerchantAddress { .. } => {
                ConnectViewState::MissingMerchantAddress
            }
            ConnectState::InvalidPostalCode => ConnectViewState::InvalidPostalCode,
            ConnectState::Finished { .. } => return None,
        };
        Some(view)
    }
}
