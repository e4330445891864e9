//! Connection flow state machine.
//!
//! Pure state transitions in the form `(state, event) -> (new_state,
//! actions[])`. The orchestrator in `pl-app` feeds events in and executes
//! the returned actions against the ports; nothing in here performs I/O.
//!
//! Gate checks are strictly sequential: location permission, location
//! services, Bluetooth permission, Bluetooth adapter, then discovery. A
//! later gate is never evaluated before an earlier one has passed, and no
//! failure is retried without an explicit user action.

use serde::{Deserialize, Serialize};

use super::action::ConnectAction;
use super::event::ConnectEvent;
use super::state::{ConnectState, Gate};
use crate::ids::ReaderId;
use crate::location::LocationFetchError;
use crate::reader::{CardReaderStatus, DiscoveredReader};
use crate::site::SiteHosting;
use crate::telemetry::TelemetryEvent;

/// Per-flow inputs captured once at start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowParams {
    /// Skip the onboarding verdict, e.g. when the flow was entered from the
    /// onboarding screens themselves.
    pub skip_onboarding_check: bool,
    /// Reader this device connected to last; its reappearance in a
    /// discovery batch triggers the automatic reconnect.
    pub last_connected_reader: Option<ReaderId>,
    /// Whether the post-connection tutorial has been shown before.
    pub tutorial_shown: bool,
    /// Drives the web-view choice for the missing-address remediation link.
    pub site_hosting: SiteHosting,
}

/// Connection flow state machine.
pub struct ConnectStateMachine {
    state: ConnectState,
    params: FlowParams,
    /// Set once a connection attempt has been initiated or observed. A
    /// `NotConnected` status before that point is the SDK's idle baseline,
    /// not a failure.
    connection_started: bool,
}

impl ConnectStateMachine {
    pub fn new(params: FlowParams) -> Self {
        Self {
            state: ConnectState::Idle,
            params,
            connection_started: false,
        }
    }

    pub fn state(&self) -> &ConnectState {
        &self.state
    }

    pub fn handle_event(&mut self, event: ConnectEvent) -> (ConnectState, Vec<ConnectAction>) {
        let current = std::mem::replace(&mut self.state, ConnectState::Idle);
        let (next, actions) = self.transition(current, event);
        tracing::debug!(state = ?next, actions = actions.len(), "connect flow transition");
        self.state = next.clone();
        (next, actions)
    }

    fn transition(
        &mut self,
        state: ConnectState,
        event: ConnectEvent,
    ) -> (ConnectState, Vec<ConnectAction>) {
        use ConnectAction as A;
        use ConnectEvent as E;
        use ConnectState as S;

        // The terminal state absorbs everything, cancellation included, so
        // the exit event fires at most once per flow.
        if state.is_finished() {
            return (state, Vec::new());
        }

        match event {
            E::CancelClicked => {
                return (
                    S::Finished { connected: false },
                    vec![A::Exit { connected: false }],
                );
            }
            E::StatusChanged { status } => return self.on_status(state, status),
            E::ScreenResumed => {
                // Permissions can change while the app is backgrounded;
                // re-validate, but only from the permission error screens.
                return match state {
                    error @ (S::MissingLocationPermissions | S::MissingBluetoothPermissions) => {
                        (error, vec![A::CheckLocationPermission])
                    }
                    other => (other, Vec::new()),
                };
            }
            _ => {}
        }

        match (state, event) {
            (S::Idle, E::Start) => (S::CheckingOnboarding, vec![A::CheckOnboarding]),

            (S::CheckingOnboarding, E::OnboardingChecked(onboarding)) => {
                if onboarding.is_completed() || self.params.skip_onboarding_check {
                    (
                        S::CheckingGate(Gate::LocationPermission),
                        vec![A::CheckLocationPermission],
                    )
                } else {
                    (
                        S::Finished { connected: false },
                        vec![
                            A::Track(TelemetryEvent::OnboardingIncomplete),
                            A::NavigateToOnboarding,
                            A::Exit { connected: false },
                        ],
                    )
                }
            }

            // Location permission. A re-check while already on the error
            // screen must not re-open the prompt.
            (
                S::MissingLocationPermissions,
                E::LocationPermissionChecked { granted: false },
            ) => (S::MissingLocationPermissions, Vec::new()),
            (
                S::CheckingGate(Gate::LocationPermission)
                | S::MissingLocationPermissions
                | S::MissingBluetoothPermissions,
                E::LocationPermissionChecked { granted },
            ) => {
                if granted {
                    (
                        S::CheckingGate(Gate::LocationServices),
                        vec![A::CheckLocationEnabled],
                    )
                } else {
                    (
                        S::RequestingGate(Gate::LocationPermission),
                        vec![A::RequestLocationPermission],
                    )
                }
            }
            (
                S::RequestingGate(Gate::LocationPermission),
                E::LocationPermissionRequested { granted },
            ) => {
                if granted {
                    (
                        S::CheckingGate(Gate::LocationServices),
                        vec![A::CheckLocationEnabled],
                    )
                } else {
                    (S::MissingLocationPermissions, Vec::new())
                }
            }

            // Location services.
            (S::CheckingGate(Gate::LocationServices), E::LocationEnabledChecked { enabled }) => {
                if enabled {
                    (
                        S::CheckingGate(Gate::BluetoothPermission),
                        vec![A::CheckBluetoothPermission],
                    )
                } else {
                    (S::LocationDisabled, Vec::new())
                }
            }
            (S::LocationDisabled, E::OpenLocationSettingsClicked) => {
                (S::WaitingLocationSettings, vec![A::OpenLocationSettings])
            }
            (S::WaitingLocationSettings, E::LocationSettingsClosed) => (
                S::CheckingGate(Gate::LocationServices),
                vec![A::CheckLocationEnabled],
            ),

            // Bluetooth permission.
            (
                S::CheckingGate(Gate::BluetoothPermission),
                E::BluetoothPermissionChecked { granted },
            ) => {
                if granted {
                    (
                        S::CheckingGate(Gate::BluetoothAdapter),
                        vec![A::CheckBluetoothEnabled],
                    )
                } else {
                    (
                        S::RequestingGate(Gate::BluetoothPermission),
                        vec![A::RequestBluetoothPermission],
                    )
                }
            }
            (
                S::RequestingGate(Gate::BluetoothPermission),
                E::BluetoothPermissionRequested { granted },
            ) => {
                if granted {
                    (
                        S::CheckingGate(Gate::BluetoothAdapter),
                        vec![A::CheckBluetoothEnabled],
                    )
                } else {
                    (S::MissingBluetoothPermissions, Vec::new())
                }
            }

            // Bluetooth adapter.
            (S::CheckingGate(Gate::BluetoothAdapter), E::BluetoothEnabledChecked { enabled }) => {
                if enabled {
                    (S::Scanning, vec![A::StartDiscovery])
                } else {
                    (
                        S::RequestingGate(Gate::BluetoothAdapter),
                        vec![A::RequestEnableBluetooth],
                    )
                }
            }
            (
                S::RequestingGate(Gate::BluetoothAdapter),
                E::BluetoothEnableRequested { enabled },
            ) => {
                if enabled {
                    (S::Scanning, vec![A::StartDiscovery])
                } else {
                    (S::BluetoothDisabled, Vec::new())
                }
            }
            (S::BluetoothDisabled, E::EnableBluetoothClicked) => (
                S::RequestingGate(Gate::BluetoothAdapter),
                vec![A::RequestEnableBluetooth],
            ),

            (
                state @ (S::MissingLocationPermissions | S::MissingBluetoothPermissions),
                E::OpenSettingsClicked,
            ) => (state, vec![A::OpenPermissionSettings]),

            // Discovery results. Ignored outside the scanning family: a
            // late batch while connecting must not flip the view back.
            (
                S::Scanning | S::ReaderFound { .. } | S::MultipleReadersFound { .. },
                E::ReadersDiscovered { readers },
            ) => self.on_readers_discovered(readers),
            (
                S::Scanning | S::ReaderFound { .. } | S::MultipleReadersFound { .. },
                E::DiscoveryFailed { reason },
            ) => (
                S::ScanningFailed,
                vec![A::Track(TelemetryEvent::DiscoveryFailed { reason })],
            ),

            // Reader selection.
            (S::ReaderFound { reader }, E::ConnectClicked { reader_id })
                if reader.id.as_ref() == Some(&reader_id) =>
            {
                let mut actions = vec![A::Track(TelemetryEvent::ConnectTapped)];
                let (next, connect) = self.connect_to(reader);
                actions.extend(connect);
                (next, actions)
            }
            (S::MultipleReadersFound { readers }, E::ConnectClicked { reader_id }) => {
                let selected = readers
                    .iter()
                    .find(|r| r.id.as_ref() == Some(&reader_id))
                    .cloned();
                match selected {
                    Some(reader) => {
                        let mut actions = vec![A::Track(TelemetryEvent::ConnectTapped)];
                        let (next, connect) = self.connect_to(reader);
                        actions.extend(connect);
                        (next, actions)
                    }
                    None => (S::MultipleReadersFound { readers }, Vec::new()),
                }
            }
            (S::ReaderFound { .. }, E::KeepSearchingClicked) => (S::Scanning, Vec::new()),

            // Location resolution results.
            (S::ResolvingLocation { reader }, E::LocationResolved { location_id }) => {
                self.connection_started = true;
                (
                    S::Connecting,
                    vec![
                        A::Track(TelemetryEvent::LocationFetchSucceeded),
                        A::Connect {
                            reader,
                            location_id,
                        },
                    ],
                )
            }
            (S::ResolvingLocation { .. }, E::LocationResolutionFailed { error }) => {
                let reason = error.to_string();
                match error {
                    LocationFetchError::MissingAddress { url } => (
                        S::MissingMerchantAddress { url },
                        vec![A::Track(TelemetryEvent::LocationFetchFailed { reason })],
                    ),
                    LocationFetchError::InvalidPostalCode => (
                        S::InvalidPostalCode,
                        vec![A::Track(TelemetryEvent::LocationFetchFailed { reason })],
                    ),
                    LocationFetchError::Other(_) => (
                        S::ConnectingFailed,
                        vec![
                            A::Track(TelemetryEvent::LocationFetchFailed { reason }),
                            A::Track(TelemetryEvent::ConnectionFailed),
                        ],
                    ),
                }
            }

            (S::MissingMerchantAddress { url }, E::UpdateAddressClicked) => {
                let mut actions = vec![A::Track(TelemetryEvent::MissingAddressTapped)];
                match self.params.site_hosting {
                    SiteHosting::Platform => {
                        // Authenticated web view; the merchant comes back to
                        // the flow after saving the address.
                        actions.push(A::OpenAuthenticatedUrl { url: url.clone() });
                        (S::MissingMerchantAddress { url }, actions)
                    }
                    SiteHosting::SelfHosted => {
                        actions.push(A::OpenUrl { url });
                        actions.push(A::Exit { connected: false });
                        (S::Finished { connected: false }, actions)
                    }
                }
            }

            (
                S::ScanningFailed | S::ConnectingFailed | S::InvalidPostalCode,
                E::RetryClicked,
            ) => (
                S::CheckingGate(Gate::LocationPermission),
                vec![A::CheckLocationPermission],
            ),

            (state, _event) => (state, Vec::new()),
        }
    }

    fn on_readers_discovered(
        &mut self,
        readers: Vec<DiscoveredReader>,
    ) -> (ConnectState, Vec<ConnectAction>) {
        use ConnectAction as A;
        use ConnectState as S;

        let mut actions = vec![A::Track(TelemetryEvent::ReadersDiscovered {
            count: readers.len(),
        })];

        // Readers the SDK has not resolved an id for yet are not offered.
        let mut available: Vec<DiscoveredReader> =
            readers.into_iter().filter(|r| r.id.is_some()).collect();

        if let Some(last) = self.params.last_connected_reader.clone() {
            let known = available
                .iter()
                .find(|r| r.id.as_ref() == Some(&last))
                .cloned();
            if let Some(reader) = known {
                // Reconnection affinity: the previously paired reader wins
                // over any manual selection.
                actions.push(A::Track(TelemetryEvent::AutoConnectionStarted));
                let (next, connect) = self.connect_to(reader);
                actions.extend(connect);
                return (next, actions);
            }
        }

        let next = if available.is_empty() {
            S::Scanning
        } else if available.len() == 1 {
            S::ReaderFound {
                reader: available.remove(0),
            }
        } else {
            S::MultipleReadersFound { readers: available }
        };
        (next, actions)
    }

    fn connect_to(&mut self, reader: DiscoveredReader) -> (ConnectState, Vec<ConnectAction>) {
        use ConnectAction as A;
        use ConnectState as S;

        match reader.location_id.clone() {
            // A reader that remembers its prior pairing keeps that location
            // over the merchant's resolved default.
            Some(location_id) => {
                self.connection_started = true;
                (
                    S::Connecting,
                    vec![A::Connect {
                        reader,
                        location_id,
                    }],
                )
            }
            None => (
                S::ResolvingLocation {
                    reader: reader.clone(),
                },
                vec![A::ResolveLocation { reader }],
            ),
        }
    }

    fn on_status(
        &mut self,
        state: ConnectState,
        status: CardReaderStatus,
    ) -> (ConnectState, Vec<ConnectAction>) {
        use ConnectAction as A;
        use ConnectState as S;

        match status {
            CardReaderStatus::Connecting => {
                self.connection_started = true;
                (S::Connecting, Vec::new())
            }
            CardReaderStatus::Connected(reader) => {
                let mut actions = vec![
                    A::PersistConnectedReader {
                        reader_id: reader.id.clone(),
                    },
                    A::Track(TelemetryEvent::ConnectionSucceeded),
                ];
                if !self.params.tutorial_shown {
                    actions.push(A::MarkTutorialShown);
                    actions.push(A::ShowTutorial);
                }
                actions.push(A::Exit { connected: true });
                (S::Finished { connected: true }, actions)
            }
            CardReaderStatus::NotConnected { error } => {
                if self.connection_started {
                    let mut actions = Vec::new();
                    if let Some(message) = error {
                        actions.push(A::NotifyError { message });
                    }
                    actions.push(A::Track(TelemetryEvent::ConnectionFailed));
                    (S::ConnectingFailed, actions)
                } else {
                    // The SDK's idle baseline, not a failed attempt.
                    (state, Vec::new())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::OnboardingState;
    use crate::reader::{ConnectedReader, ReaderType};

    fn params() -> FlowParams {
        FlowParams {
            skip_onboarding_check: false,
            last_connected_reader: None,
            tutorial_shown: true,
            site_hosting: SiteHosting::SelfHosted,
        }
    }

    fn machine() -> ConnectStateMachine {
        ConnectStateMachine::new(params())
    }

    fn completed() -> OnboardingState {
        OnboardingState::Completed {
            country_code: "us".to_string(),
        }
    }

    fn reader(id: &str) -> DiscoveredReader {
        DiscoveredReader::new(id, ReaderType::Chipper2X)
    }

    /// Drive a fresh machine through onboarding and all four gates.
    fn advance_to_scanning(sm: &mut ConnectStateMachine) {
        sm.handle_event(ConnectEvent::Start);
        sm.handle_event(ConnectEvent::OnboardingChecked(completed()));
        sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: true });
        sm.handle_event(ConnectEvent::LocationEnabledChecked { enabled: true });
        sm.handle_event(ConnectEvent::BluetoothPermissionChecked { granted: true });
        let (state, actions) =
            sm.handle_event(ConnectEvent::BluetoothEnabledChecked { enabled: true });
        assert_eq!(state, ConnectState::Scanning);
        assert!(actions.contains(&ConnectAction::StartDiscovery));
    }

    #[test]
    fn connect_state_machine_start_checks_onboarding() {
        let mut sm = machine();
        let (state, actions) = sm.handle_event(ConnectEvent::Start);
        assert_eq!(state, ConnectState::CheckingOnboarding);
        assert_eq!(actions, vec![ConnectAction::CheckOnboarding]);
    }

    #[test]
    fn connect_state_machine_onboarding_completed_checks_location_permission() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        let (state, actions) = sm.handle_event(ConnectEvent::OnboardingChecked(completed()));
        assert_eq!(state, ConnectState::CheckingGate(Gate::LocationPermission));
        assert_eq!(actions, vec![ConnectAction::CheckLocationPermission]);
    }

    #[test]
    fn connect_state_machine_onboarding_incomplete_navigates_to_onboarding() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        let (state, actions) =
            sm.handle_event(ConnectEvent::OnboardingChecked(OnboardingState::SetupNotCompleted));
        assert_eq!(state, ConnectState::Finished { connected: false });
        assert_eq!(
            actions,
            vec![
                ConnectAction::Track(TelemetryEvent::OnboardingIncomplete),
                ConnectAction::NavigateToOnboarding,
                ConnectAction::Exit { connected: false },
            ]
        );
    }

    #[test]
    fn connect_state_machine_skip_flag_bypasses_incomplete_onboarding() {
        let mut sm = ConnectStateMachine::new(FlowParams {
            skip_onboarding_check: true,
            ..params()
        });
        sm.handle_event(ConnectEvent::Start);
        let (state, actions) =
            sm.handle_event(ConnectEvent::OnboardingChecked(OnboardingState::GenericError));
        assert_eq!(state, ConnectState::CheckingGate(Gate::LocationPermission));
        assert_eq!(actions, vec![ConnectAction::CheckLocationPermission]);
    }

    #[test]
    fn connect_state_machine_denied_location_check_requests_permission() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        sm.handle_event(ConnectEvent::OnboardingChecked(completed()));
        let (state, actions) =
            sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: false });
        assert_eq!(state, ConnectState::RequestingGate(Gate::LocationPermission));
        assert_eq!(actions, vec![ConnectAction::RequestLocationPermission]);
    }

    #[test]
    fn connect_state_machine_refused_location_prompt_shows_error() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        sm.handle_event(ConnectEvent::OnboardingChecked(completed()));
        sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: false });
        let (state, actions) =
            sm.handle_event(ConnectEvent::LocationPermissionRequested { granted: false });
        assert_eq!(state, ConnectState::MissingLocationPermissions);
        assert!(actions.is_empty());
    }

    #[test]
    fn connect_state_machine_resume_on_permission_error_rechecks() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        sm.handle_event(ConnectEvent::OnboardingChecked(completed()));
        sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: false });
        sm.handle_event(ConnectEvent::LocationPermissionRequested { granted: false });

        let (state, actions) = sm.handle_event(ConnectEvent::ScreenResumed);
        assert_eq!(state, ConnectState::MissingLocationPermissions);
        assert_eq!(actions, vec![ConnectAction::CheckLocationPermission]);
    }

    #[test]
    fn connect_state_machine_recheck_denied_does_not_reprompt() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        sm.handle_event(ConnectEvent::OnboardingChecked(completed()));
        sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: false });
        sm.handle_event(ConnectEvent::LocationPermissionRequested { granted: false });
        sm.handle_event(ConnectEvent::ScreenResumed);

        let (state, actions) =
            sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: false });
        assert_eq!(state, ConnectState::MissingLocationPermissions);
        assert!(actions.is_empty());
    }

    #[test]
    fn connect_state_machine_resume_elsewhere_is_ignored() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        let (state, actions) = sm.handle_event(ConnectEvent::ScreenResumed);
        assert_eq!(state, ConnectState::Scanning);
        assert!(actions.is_empty());
    }

    #[test]
    fn connect_state_machine_gates_run_in_order() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        sm.handle_event(ConnectEvent::OnboardingChecked(completed()));

        let (_, actions) =
            sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: true });
        assert_eq!(actions, vec![ConnectAction::CheckLocationEnabled]);

        let (_, actions) = sm.handle_event(ConnectEvent::LocationEnabledChecked { enabled: true });
        assert_eq!(actions, vec![ConnectAction::CheckBluetoothPermission]);

        let (_, actions) =
            sm.handle_event(ConnectEvent::BluetoothPermissionChecked { granted: true });
        assert_eq!(actions, vec![ConnectAction::CheckBluetoothEnabled]);

        let (state, actions) =
            sm.handle_event(ConnectEvent::BluetoothEnabledChecked { enabled: true });
        assert_eq!(state, ConnectState::Scanning);
        assert_eq!(actions, vec![ConnectAction::StartDiscovery]);
    }

    #[test]
    fn connect_state_machine_location_disabled_roundtrip_through_settings() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        sm.handle_event(ConnectEvent::OnboardingChecked(completed()));
        sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: true });

        let (state, _) = sm.handle_event(ConnectEvent::LocationEnabledChecked { enabled: false });
        assert_eq!(state, ConnectState::LocationDisabled);

        let (state, actions) = sm.handle_event(ConnectEvent::OpenLocationSettingsClicked);
        assert_eq!(state, ConnectState::WaitingLocationSettings);
        assert_eq!(actions, vec![ConnectAction::OpenLocationSettings]);

        let (state, actions) = sm.handle_event(ConnectEvent::LocationSettingsClosed);
        assert_eq!(state, ConnectState::CheckingGate(Gate::LocationServices));
        assert_eq!(actions, vec![ConnectAction::CheckLocationEnabled]);
    }

    #[test]
    fn connect_state_machine_refused_bluetooth_enable_shows_error() {
        let mut sm = machine();
        sm.handle_event(ConnectEvent::Start);
        sm.handle_event(ConnectEvent::OnboardingChecked(completed()));
        sm.handle_event(ConnectEvent::LocationPermissionChecked { granted: true });
        sm.handle_event(ConnectEvent::LocationEnabledChecked { enabled: true });
        sm.handle_event(ConnectEvent::BluetoothPermissionChecked { granted: true });
        sm.handle_event(ConnectEvent::BluetoothEnabledChecked { enabled: false });

        let (state, _) = sm.handle_event(ConnectEvent::BluetoothEnableRequested { enabled: false });
        assert_eq!(state, ConnectState::BluetoothDisabled);

        let (state, actions) = sm.handle_event(ConnectEvent::EnableBluetoothClicked);
        assert_eq!(state, ConnectState::RequestingGate(Gate::BluetoothAdapter));
        assert_eq!(actions, vec![ConnectAction::RequestEnableBluetooth]);
    }

    #[test]
    fn connect_state_machine_single_unknown_reader_waits_for_selection() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);

        let (state, actions) = sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        assert_eq!(
            state,
            ConnectState::ReaderFound {
                reader: reader("Dummy1")
            }
        );
        // No connect: the reader does not match the remembered one.
        assert_eq!(
            actions,
            vec![ConnectAction::Track(TelemetryEvent::ReadersDiscovered { count: 1 })]
        );
    }

    #[test]
    fn connect_state_machine_last_connected_reader_autoconnects() {
        let mut sm = ConnectStateMachine::new(FlowParams {
            last_connected_reader: Some(ReaderId::from("Dummy1")),
            ..params()
        });
        advance_to_scanning(&mut sm);

        let (state, actions) = sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        assert_eq!(
            state,
            ConnectState::ResolvingLocation {
                reader: reader("Dummy1")
            }
        );
        assert_eq!(
            actions,
            vec![
                ConnectAction::Track(TelemetryEvent::ReadersDiscovered { count: 1 }),
                ConnectAction::Track(TelemetryEvent::AutoConnectionStarted),
                ConnectAction::ResolveLocation {
                    reader: reader("Dummy1")
                },
            ]
        );
    }

    #[test]
    fn connect_state_machine_unresolved_readers_are_dropped() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);

        let unresolved = DiscoveredReader {
            id: None,
            reader_type: ReaderType::StripeM2,
            location_id: None,
        };
        let (state, _) = sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![unresolved.clone()],
        });
        assert_eq!(state, ConnectState::Scanning);

        let (state, _) = sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![unresolved, reader("Dummy1")],
        });
        assert_eq!(
            state,
            ConnectState::ReaderFound {
                reader: reader("Dummy1")
            }
        );
    }

    #[test]
    fn connect_state_machine_multiple_readers_offer_selection() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);

        let (state, _) = sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1"), reader("Dummy2")],
        });
        assert_eq!(
            state,
            ConnectState::MultipleReadersFound {
                readers: vec![reader("Dummy1"), reader("Dummy2")]
            }
        );
    }

    #[test]
    fn connect_state_machine_reader_advertised_location_wins() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1").with_location("tml_CACHED")],
        });

        let (state, actions) = sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy1"),
        });
        assert_eq!(state, ConnectState::Connecting);
        assert_eq!(
            actions,
            vec![
                ConnectAction::Track(TelemetryEvent::ConnectTapped),
                ConnectAction::Connect {
                    reader: reader("Dummy1").with_location("tml_CACHED"),
                    location_id: "tml_CACHED".into(),
                },
            ]
        );
    }

    #[test]
    fn connect_state_machine_selection_resolves_location_first() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1"), reader("Dummy2")],
        });

        let (state, actions) = sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy2"),
        });
        assert_eq!(
            state,
            ConnectState::ResolvingLocation {
                reader: reader("Dummy2")
            }
        );
        assert_eq!(
            actions,
            vec![
                ConnectAction::Track(TelemetryEvent::ConnectTapped),
                ConnectAction::ResolveLocation {
                    reader: reader("Dummy2")
                },
            ]
        );
    }

    #[test]
    fn connect_state_machine_keep_searching_returns_to_scanning() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });

        let (state, actions) = sm.handle_event(ConnectEvent::KeepSearchingClicked);
        assert_eq!(state, ConnectState::Scanning);
        assert!(actions.is_empty());
    }

    #[test]
    fn connect_state_machine_resolved_location_starts_connection() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy1"),
        });

        let (state, actions) = sm.handle_event(ConnectEvent::LocationResolved {
            location_id: "tml_123".into(),
        });
        assert_eq!(state, ConnectState::Connecting);
        assert_eq!(
            actions,
            vec![
                ConnectAction::Track(TelemetryEvent::LocationFetchSucceeded),
                ConnectAction::Connect {
                    reader: reader("Dummy1"),
                    location_id: "tml_123".into(),
                },
            ]
        );
    }

    #[test]
    fn connect_state_machine_missing_address_shows_error_state() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy1"),
        });

        let (state, _) = sm.handle_event(ConnectEvent::LocationResolutionFailed {
            error: LocationFetchError::MissingAddress {
                url: "https://example.com/store-address".to_string(),
            },
        });
        assert_eq!(
            state,
            ConnectState::MissingMerchantAddress {
                url: "https://example.com/store-address".to_string()
            }
        );
    }

    #[test]
    fn connect_state_machine_update_address_self_hosted_opens_url_and_exits() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy1"),
        });
        sm.handle_event(ConnectEvent::LocationResolutionFailed {
            error: LocationFetchError::MissingAddress {
                url: "https://example.com/store-address".to_string(),
            },
        });

        let (state, actions) = sm.handle_event(ConnectEvent::UpdateAddressClicked);
        assert_eq!(state, ConnectState::Finished { connected: false });
        assert_eq!(
            actions,
            vec![
                ConnectAction::Track(TelemetryEvent::MissingAddressTapped),
                ConnectAction::OpenUrl {
                    url: "https://example.com/store-address".to_string()
                },
                ConnectAction::Exit { connected: false },
            ]
        );
    }

    #[test]
    fn connect_state_machine_update_address_platform_hosted_stays_in_flow() {
        let mut sm = ConnectStateMachine::new(FlowParams {
            site_hosting: SiteHosting::Platform,
            ..params()
        });
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy1"),
        });
        sm.handle_event(ConnectEvent::LocationResolutionFailed {
            error: LocationFetchError::MissingAddress {
                url: "https://example.com/store-address".to_string(),
            },
        });

        let (state, actions) = sm.handle_event(ConnectEvent::UpdateAddressClicked);
        assert_eq!(
            state,
            ConnectState::MissingMerchantAddress {
                url: "https://example.com/store-address".to_string()
            }
        );
        assert_eq!(
            actions,
            vec![
                ConnectAction::Track(TelemetryEvent::MissingAddressTapped),
                ConnectAction::OpenAuthenticatedUrl {
                    url: "https://example.com/store-address".to_string()
                },
            ]
        );
    }

    #[test]
    fn connect_state_machine_invalid_postal_code_offers_retry() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy1"),
        });

        let (state, _) = sm.handle_event(ConnectEvent::LocationResolutionFailed {
            error: LocationFetchError::InvalidPostalCode,
        });
        assert_eq!(state, ConnectState::InvalidPostalCode);

        let (state, actions) = sm.handle_event(ConnectEvent::RetryClicked);
        assert_eq!(state, ConnectState::CheckingGate(Gate::LocationPermission));
        assert_eq!(actions, vec![ConnectAction::CheckLocationPermission]);
    }

    #[test]
    fn connect_state_machine_opaque_location_error_fails_connection() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy1"),
        });

        let (state, actions) = sm.handle_event(ConnectEvent::LocationResolutionFailed {
            error: LocationFetchError::Other("server exploded".to_string()),
        });
        assert_eq!(state, ConnectState::ConnectingFailed);
        assert_eq!(
            actions
                .iter()
                .filter(|a| matches!(a, ConnectAction::Track(TelemetryEvent::ConnectionFailed)))
                .count(),
            1
        );
    }

    #[test]
    fn connect_state_machine_discovery_failure_is_retryable() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);

        let (state, actions) = sm.handle_event(ConnectEvent::DiscoveryFailed {
            reason: "bluetooth stack gone".to_string(),
        });
        assert_eq!(state, ConnectState::ScanningFailed);
        assert_eq!(
            actions,
            vec![ConnectAction::Track(TelemetryEvent::DiscoveryFailed {
                reason: "bluetooth stack gone".to_string()
            })]
        );

        let (state, actions) = sm.handle_event(ConnectEvent::RetryClicked);
        assert_eq!(state, ConnectState::CheckingGate(Gate::LocationPermission));
        assert_eq!(actions, vec![ConnectAction::CheckLocationPermission]);
    }

    #[test]
    fn connect_state_machine_connecting_then_not_connected_is_failure() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::StatusChanged {
            status: CardReaderStatus::Connecting,
        });

        let (state, actions) = sm.handle_event(ConnectEvent::StatusChanged {
            status: CardReaderStatus::not_connected(),
        });
        assert_eq!(state, ConnectState::ConnectingFailed);
        assert_eq!(
            actions,
            vec![ConnectAction::Track(TelemetryEvent::ConnectionFailed)]
        );
    }

    #[test]
    fn connect_state_machine_initial_not_connected_is_ignored() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);

        let (state, actions) = sm.handle_event(ConnectEvent::StatusChanged {
            status: CardReaderStatus::not_connected(),
        });
        assert_eq!(state, ConnectState::Scanning);
        assert!(actions.is_empty());
    }

    #[test]
    fn connect_state_machine_failure_message_is_surfaced() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::StatusChanged {
            status: CardReaderStatus::Connecting,
        });

        let (_, actions) = sm.handle_event(ConnectEvent::StatusChanged {
            status: CardReaderStatus::NotConnected {
                error: Some("reader battery too low".to_string()),
            },
        });
        assert_eq!(
            actions,
            vec![
                ConnectAction::NotifyError {
                    message: "reader battery too low".to_string()
                },
                ConnectAction::Track(TelemetryEvent::ConnectionFailed),
            ]
        );
    }

    #[test]
    fn connect_state_machine_connected_persists_and_exits() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);

        let (state, actions) = sm.handle_event(ConnectEvent::StatusChanged {
            status: CardReaderStatus::Connected(ConnectedReader {
                id: ReaderId::from("Dummy1"),
                reader_type: ReaderType::Chipper2X,
            }),
        });
        assert_eq!(state, ConnectState::Finished { connected: true });
        assert_eq!(
            actions,
            vec![
                ConnectAction::PersistConnectedReader {
                    reader_id: ReaderId::from("Dummy1")
                },
                ConnectAction::Track(TelemetryEvent::ConnectionSucceeded),
                ConnectAction::Exit { connected: true },
            ]
        );
    }

    #[test]
    fn connect_state_machine_first_connection_shows_tutorial() {
        let mut sm = ConnectStateMachine::new(FlowParams {
            tutorial_shown: false,
            ..params()
        });
        advance_to_scanning(&mut sm);

        let (_, actions) = sm.handle_event(ConnectEvent::StatusChanged {
            status: CardReaderStatus::Connected(ConnectedReader {
                id: ReaderId::from("Dummy1"),
                reader_type: ReaderType::Chipper2X,
            }),
        });
        assert_eq!(
            actions,
            vec![
                ConnectAction::PersistConnectedReader {
                    reader_id: ReaderId::from("Dummy1")
                },
                ConnectAction::Track(TelemetryEvent::ConnectionSucceeded),
                ConnectAction::MarkTutorialShown,
                ConnectAction::ShowTutorial,
                ConnectAction::Exit { connected: true },
            ]
        );
    }

    #[test]
    fn connect_state_machine_cancel_exits_exactly_once() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);

        let (state, actions) = sm.handle_event(ConnectEvent::CancelClicked);
        assert_eq!(state, ConnectState::Finished { connected: false });
        assert_eq!(actions, vec![ConnectAction::Exit { connected: false }]);

        let (state, actions) = sm.handle_event(ConnectEvent::CancelClicked);
        assert_eq!(state, ConnectState::Finished { connected: false });
        assert!(actions.is_empty());
    }

    #[test]
    fn connect_state_machine_late_discovery_batch_is_ignored_while_connecting() {
        let mut sm = machine();
        advance_to_scanning(&mut sm);
        sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1")],
        });
        sm.handle_event(ConnectEvent::ConnectClicked {
            reader_id: ReaderId::from("Dummy1"),
        });
        sm.handle_event(ConnectEvent::LocationResolved {
            location_id: "tml_123".into(),
        });

        let (state, actions) = sm.handle_event(ConnectEvent::ReadersDiscovered {
            readers: vec![reader("Dummy1"), reader("Dummy2")],
        });
        assert_eq!(state, ConnectState::Connecting);
        assert!(actions.is_empty());
    }
}
