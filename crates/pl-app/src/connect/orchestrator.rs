//! Connection flow orchestrator.
//!
//! Drives the `pl-core` state machine against the injected ports. The whole
//! flow is one spawned task around a `tokio::select!` loop; gate answers,
//! user commands, discovery events and SDK status changes are funnelled into
//! machine events, and the machine's actions are executed here.
//!
//! At most one gate answer is outstanding at any time (gates are strictly
//! sequential), and the discovery subscription lives only while the machine
//! is in a scanning-family state.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use pl_core::connect::{
    ConnectAction, ConnectEvent, ConnectState, ConnectStateMachine, ConnectViewState, FlowParams,
};
use pl_core::ports::{
    CardReaderPort, DiscoveryEvent, DiscoveryRequest, LocationProviderPort, OnboardingCheckerPort,
    ReaderPreferencesPort, StoredReader, TelemetryPort,
};
use pl_core::{
    CardReaderStatus, CountryConfig, MerchantSite, OnboardingState, SoftwareUpdateStatus,
};

use super::completion::Completion;
use super::events::{HostEvent, UserCommand};

/// Collaborators the flow is wired against.
#[derive(Clone)]
pub struct ConnectDeps {
    pub card_reader: Arc<dyn CardReaderPort>,
    pub onboarding: Arc<dyn OnboardingCheckerPort>,
    pub locations: Arc<dyn LocationProviderPort>,
    pub preferences: Arc<dyn ReaderPreferencesPort>,
    pub telemetry: Arc<dyn TelemetryPort>,
}

/// Per-flow inputs supplied by the host.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub site: MerchantSite,
    /// ISO country code of the store; selects the supported hardware.
    /// Refined by the onboarding verdict when that carries a country.
    pub country_code: String,
    pub skip_onboarding_check: bool,
}

/// Running flow: the host renders `view_state`, consumes `events` and
/// reports user actions through the command methods.
pub struct ConnectHandle {
    commands: mpsc::Sender<UserCommand>,
    pub view_state: watch::Receiver<ConnectViewState>,
    pub events: mpsc::Receiver<HostEvent>,
}

impl ConnectHandle {
    pub fn current_view(&self) -> ConnectViewState {
        self.view_state.borrow().clone()
    }

    pub async fn connect_to_reader(&self, reader_id: pl_core::ReaderId) {
        self.send(UserCommand::ConnectToReader(reader_id)).await;
    }

    pub async fn keep_searching(&self) {
        self.send(UserCommand::KeepSearching).await;
    }

    pub async fn retry(&self) {
        self.send(UserCommand::Retry).await;
    }

    pub async fn cancel(&self) {
        self.send(UserCommand::Cancel).await;
    }

    pub async fn open_settings(&self) {
        self.send(UserCommand::OpenSettings).await;
    }

    pub async fn open_location_settings(&self) {
        self.send(UserCommand::OpenLocationSettings).await;
    }

    pub async fn enable_bluetooth(&self) {
        self.send(UserCommand::EnableBluetooth).await;
    }

    pub async fn update_address(&self) {
        self.send(UserCommand::UpdateAddress).await;
    }

    pub async fn screen_resumed(&self) {
        self.send(UserCommand::ScreenResumed).await;
    }

    async fn send(&self, command: UserCommand) {
        if let Err(error) = self.commands.send(command).await {
            tracing::debug!(command = ?error.0, "connection flow already finished");
        }
    }
}

pub struct ConnectOrchestrator;

impl ConnectOrchestrator {
    /// Spawn the connection flow and hand its channels to the host.
    pub fn start(deps: ConnectDeps, params: ConnectParams) -> ConnectHandle {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (host_tx, host_rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(ConnectViewState::Scanning);

        let span = info_span!("reader_connect", flow_id = %Uuid::new_v4());
        tokio::spawn(
            run_flow(deps, params, view_tx, host_tx, command_rx).instrument(span),
        );

        ConnectHandle {
            commands: command_tx,
            view_state: view_rx,
            events: host_rx,
        }
    }
}

/// Which gate answer the flow is suspended on.
#[derive(Debug, Clone, Copy)]
enum PendingKind {
    LocationPermissionCheck,
    LocationPermissionRequest,
    LocationEnabledCheck,
    BluetoothPermissionCheck,
    BluetoothPermissionRequest,
    BluetoothEnabledCheck,
    BluetoothEnableRequest,
}

impl PendingKind {
    fn event(self, value: bool) -> ConnectEvent {
        match self {
            PendingKind::LocationPermissionCheck => {
                ConnectEvent::LocationPermissionChecked { granted: value }
            }
            PendingKind::LocationPermissionRequest => {
                ConnectEvent::LocationPermissionRequested { granted: value }
            }
            PendingKind::LocationEnabledCheck => {
                ConnectEvent::LocationEnabledChecked { enabled: value }
            }
            PendingKind::BluetoothPermissionCheck => {
                ConnectEvent::BluetoothPermissionChecked { granted: value }
            }
            PendingKind::BluetoothPermissionRequest => {
                ConnectEvent::BluetoothPermissionRequested { granted: value }
            }
            PendingKind::BluetoothEnabledCheck => {
                ConnectEvent::BluetoothEnabledChecked { enabled: value }
            }
            PendingKind::BluetoothEnableRequest => {
                ConnectEvent::BluetoothEnableRequested { enabled: value }
            }
        }
    }
}

enum PendingGate {
    Answer(PendingKind, oneshot::Receiver<bool>),
    SettingsReturn(oneshot::Receiver<()>),
}

enum LoopInput {
    Event(ConnectEvent),
    Update(SoftwareUpdateStatus),
    DiscoveryClosed,
    UpdateWatchClosed,
    /// Host or SDK went away; wind the flow down.
    Shutdown,
}

async fn run_flow(
    deps: ConnectDeps,
    params: ConnectParams,
    view_tx: watch::Sender<ConnectViewState>,
    host_tx: mpsc::Sender<HostEvent>,
    command_rx: mpsc::Receiver<UserCommand>,
) {
    let last_connected_reader = match deps.preferences.last_connected_reader().await {
        Ok(stored) => stored.map(|s| s.id),
        Err(error) => {
            tracing::warn!(%error, "reading last connected reader failed");
            None
        }
    };
    let tutorial_shown = match deps.preferences.tutorial_shown().await {
        Ok(shown) => shown,
        Err(error) => {
            tracing::warn!(%error, "reading tutorial flag failed");
            false
        }
    };

    let machine = ConnectStateMachine::new(FlowParams {
        skip_onboarding_check: params.skip_onboarding_check,
        last_connected_reader,
        tutorial_shown,
        site_hosting: params.site.hosting,
    });

    let status_rx = deps.card_reader.status();
    let update_rx = deps.card_reader.update_status();
    let (internal_tx, internal_rx) = mpsc::channel(8);
    let country_code = params.country_code.clone();

    let mut task = FlowTask {
        deps,
        params,
        machine,
        country_code,
        view_tx,
        host_tx,
        command_rx,
        internal_tx,
        internal_rx,
        status_rx,
        update_rx,
        update_watch_open: true,
        update_notified: false,
        pending: None,
        discovery_rx: None,
        finished: None,
    };

    task.dispatch(ConnectEvent::Start).await;

    while task.finished.is_none() {
        match task.next_input().await {
            LoopInput::Event(event) => task.dispatch(event).await,
            LoopInput::Update(status) => task.on_update_status(status).await,
            LoopInput::DiscoveryClosed => task.discovery_rx = None,
            LoopInput::UpdateWatchClosed => task.update_watch_open = false,
            LoopInput::Shutdown => task.dispatch(ConnectEvent::CancelClicked).await,
        }
    }

    task.teardown().await;
}

struct FlowTask {
    deps: ConnectDeps,
    params: ConnectParams,
    machine: ConnectStateMachine,
    country_code: String,
    view_tx: watch::Sender<ConnectViewState>,
    host_tx: mpsc::Sender<HostEvent>,
    command_rx: mpsc::Receiver<UserCommand>,
    /// Results of spawned port calls (onboarding, location, connect errors).
    internal_tx: mpsc::Sender<ConnectEvent>,
    internal_rx: mpsc::Receiver<ConnectEvent>,
    status_rx: watch::Receiver<CardReaderStatus>,
    update_rx: watch::Receiver<SoftwareUpdateStatus>,
    update_watch_open: bool,
    update_notified: bool,
    pending: Option<PendingGate>,
    discovery_rx: Option<mpsc::Receiver<DiscoveryEvent>>,
    finished: Option<bool>,
}

impl FlowTask {
    async fn next_input(&mut self) -> LoopInput {
        let has_pending = self.pending.is_some();
        let has_discovery = self.discovery_rx.is_some();
        let update_watch_open = self.update_watch_open;

        tokio::select! {
            biased;

            event = await_pending(self.pending.as_mut()), if has_pending => {
                self.pending = None;
                LoopInput::Event(event)
            }

            command = self.command_rx.recv() => match command {
                Some(command) => LoopInput::Event(command.into_event()),
                None => LoopInput::Shutdown,
            },

            Some(event) = self.internal_rx.recv() => LoopInput::Event(event),

            discovery = recv_discovery(self.discovery_rx.as_mut()), if has_discovery => {
                match discovery {
                    Some(DiscoveryEvent::ReadersFound(readers)) => {
                        LoopInput::Event(ConnectEvent::ReadersDiscovered { readers })
                    }
                    Some(DiscoveryEvent::Failed(reason)) => {
                        LoopInput::Event(ConnectEvent::DiscoveryFailed { reason })
                    }
                    None => LoopInput::DiscoveryClosed,
                }
            }

            changed = self.status_rx.changed() => match changed {
                Ok(()) => {
                    let status = self.status_rx.borrow_and_update().clone();
                    LoopInput::Event(ConnectEvent::StatusChanged { status })
                }
                Err(_) => LoopInput::Shutdown,
            },

            changed = self.update_rx.changed(), if update_watch_open => match changed {
                Ok(()) => LoopInput::Update(*self.update_rx.borrow_and_update()),
                Err(_) => LoopInput::UpdateWatchClosed,
            },
        }
    }

    async fn dispatch(&mut self, event: ConnectEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            if let ConnectEvent::OnboardingChecked(OnboardingState::Completed { country_code }) =
                &event
            {
                // The verdict knows the store's country better than the
                // caller-supplied default.
                self.country_code = country_code.clone();
            }

            let (state, actions) = self.machine.handle_event(event);
            self.publish_view(&state);
            if !state.is_scanning_family() && self.discovery_rx.is_some() {
                self.close_discovery().await;
            }

            for action in actions {
                if let Some(follow_up) = self.execute(action).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn publish_view(&self, state: &ConnectState) {
        if let Some(view) = state.view() {
            self.view_tx.send_if_modified(|current| {
                if *current == view {
                    false
                } else {
                    *current = view;
                    true
                }
            });
        }
    }

    async fn execute(&mut self, action: ConnectAction) -> Option<ConnectEvent> {
        match action {
            ConnectAction::CheckOnboarding => {
                let onboarding = self.deps.onboarding.clone();
                let site = self.params.site.clone();
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    let state = onboarding.onboarding_state(&site).await;
                    let _ = tx.send(ConnectEvent::OnboardingChecked(state)).await;
                });
                None
            }

            ConnectAction::CheckLocationPermission => {
                self.send_gate(PendingKind::LocationPermissionCheck, |respond| {
                    HostEvent::CheckLocationPermission { respond }
                })
                .await
            }
            ConnectAction::RequestLocationPermission => {
                self.send_gate(PendingKind::LocationPermissionRequest, |respond| {
                    HostEvent::RequestLocationPermission { respond }
                })
                .await
            }
            ConnectAction::CheckLocationEnabled => {
                self.send_gate(PendingKind::LocationEnabledCheck, |respond| {
                    HostEvent::CheckLocationEnabled { respond }
                })
                .await
            }
            ConnectAction::CheckBluetoothPermission => {
                self.send_gate(PendingKind::BluetoothPermissionCheck, |respond| {
                    HostEvent::CheckBluetoothPermission { respond }
                })
                .await
            }
            ConnectAction::RequestBluetoothPermission => {
                self.send_gate(PendingKind::BluetoothPermissionRequest, |respond| {
                    HostEvent::RequestBluetoothPermission { respond }
                })
                .await
            }
            ConnectAction::CheckBluetoothEnabled => {
                self.send_gate(PendingKind::BluetoothEnabledCheck, |respond| {
                    HostEvent::CheckBluetoothEnabled { respond }
                })
                .await
            }
            ConnectAction::RequestEnableBluetooth => {
                self.send_gate(PendingKind::BluetoothEnableRequest, |respond| {
                    HostEvent::RequestEnableBluetooth { respond }
                })
                .await
            }

            ConnectAction::OpenLocationSettings => {
                let (on_closed, rx) = Completion::new();
                self.pending = Some(PendingGate::SettingsReturn(rx));
                self.send_host(HostEvent::OpenLocationSettings { on_closed })
                    .await;
                None
            }
            ConnectAction::OpenPermissionSettings => {
                self.send_host(HostEvent::OpenPermissionSettings).await;
                None
            }

            ConnectAction::StartDiscovery => self.start_discovery().await,

            ConnectAction::ResolveLocation { reader: _ } => {
                let locations = self.deps.locations.clone();
                let site = self.params.site.clone();
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    let event = match locations.default_location(&site).await {
                        Ok(location_id) => ConnectEvent::LocationResolved { location_id },
                        Err(error) => ConnectEvent::LocationResolutionFailed { error },
                    };
                    let _ = tx.send(event).await;
                });
                None
            }

            ConnectAction::Connect {
                reader,
                location_id,
            } => {
                let card_reader = self.deps.card_reader.clone();
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    if let Err(error) = card_reader.connect(reader, location_id).await {
                        tracing::error!(%error, "starting reader connection failed");
                        let status = CardReaderStatus::NotConnected {
                            error: Some(error.to_string()),
                        };
                        let _ = tx.send(ConnectEvent::StatusChanged { status }).await;
                    }
                });
                None
            }

            ConnectAction::PersistConnectedReader { reader_id } => {
                let stored = StoredReader {
                    id: reader_id,
                    connected_at: Utc::now(),
                };
                if let Err(error) = self.deps.preferences.set_last_connected_reader(stored).await {
                    tracing::warn!(%error, "persisting connected reader failed");
                }
                None
            }
            ConnectAction::MarkTutorialShown => {
                if let Err(error) = self.deps.preferences.mark_tutorial_shown().await {
                    tracing::warn!(%error, "persisting tutorial flag failed");
                }
                None
            }

            ConnectAction::ShowTutorial => {
                self.send_host(HostEvent::ShowTutorial).await;
                None
            }
            ConnectAction::NavigateToOnboarding => {
                self.send_host(HostEvent::NavigateToOnboarding).await;
                None
            }
            ConnectAction::OpenUrl { url } => {
                self.send_host(HostEvent::OpenUrl { url }).await;
                None
            }
            ConnectAction::OpenAuthenticatedUrl { url } => {
                self.send_host(HostEvent::OpenAuthenticatedUrl { url }).await;
                None
            }
            ConnectAction::NotifyError { message } => {
                self.send_host(HostEvent::ErrorNotice { message }).await;
                None
            }

            ConnectAction::Track(event) => {
                self.deps.telemetry.track(event);
                None
            }

            ConnectAction::Exit { connected } => {
                self.finished = Some(connected);
                None
            }
        }
    }

    async fn send_gate<F>(&mut self, kind: PendingKind, build: F) -> Option<ConnectEvent>
    where
        F: FnOnce(Completion<bool>) -> HostEvent,
    {
        let (respond, rx) = Completion::new();
        self.pending = Some(PendingGate::Answer(kind, rx));
        self.send_host(build(respond)).await;
        None
    }

    async fn start_discovery(&mut self) -> Option<ConnectEvent> {
        if !self.deps.card_reader.is_initialized() {
            if let Err(error) = self.deps.card_reader.initialize().await {
                return Some(ConnectEvent::DiscoveryFailed {
                    reason: error.to_string(),
                });
            }
        }

        // The SDK may still be mid-connection from a previous flow; the
        // status subscription takes over in that case.
        if matches!(*self.status_rx.borrow(), CardReaderStatus::Connecting) {
            tracing::debug!("reader already connecting, skipping discovery");
            return None;
        }

        let config = match CountryConfig::for_country(&self.country_code) {
            Some(config) => config,
            None => {
                return Some(ConnectEvent::DiscoveryFailed {
                    reason: format!(
                        "in-person payments are not supported in '{}'",
                        self.country_code
                    ),
                });
            }
        };

        let request = DiscoveryRequest {
            continuous: true,
            allowed: config.supported_readers,
        };
        match self.deps.card_reader.discover(request).await {
            Ok(rx) => {
                self.discovery_rx = Some(rx);
                None
            }
            Err(error) => Some(ConnectEvent::DiscoveryFailed {
                reason: error.to_string(),
            }),
        }
    }

    async fn on_update_status(&mut self, status: SoftwareUpdateStatus) {
        match status {
            SoftwareUpdateStatus::InProgress => {
                if !self.update_notified {
                    self.update_notified = true;
                    self.send_host(HostEvent::UpdateInProgress).await;
                }
            }
            SoftwareUpdateStatus::Idle => {
                self.update_notified = false;
            }
        }
    }

    async fn close_discovery(&mut self) {
        self.discovery_rx = None;
        if let Err(error) = self.deps.card_reader.stop_discovery().await {
            tracing::warn!(%error, "stopping discovery failed");
        }
    }

    async fn send_host(&self, event: HostEvent) {
        if self.host_tx.send(event).await.is_err() {
            tracing::debug!("host event receiver dropped");
        }
    }

    async fn teardown(mut self) {
        if self.discovery_rx.is_some() {
            self.close_discovery().await;
        }
        let connected = self.finished.unwrap_or(false);
        tracing::info!(connected, "connection flow finished");
        self.send_host(HostEvent::Finished { connected }).await;
    }
}

/// Await the outstanding gate answer. A dropped token counts as a denial.
async fn await_pending(pending: Option<&mut PendingGate>) -> ConnectEvent {
    match pending {
        Some(PendingGate::Answer(kind, rx)) => {
            let value = rx.await.unwrap_or(false);
            kind.event(value)
        }
        Some(PendingGate::SettingsReturn(rx)) => {
            let _ = rx.await;
            ConnectEvent::LocationSettingsClosed
        }
        None => std::future::pending().await,
    }
}

async fn recv_discovery(
    rx: Option<&mut mpsc::Receiver<DiscoveryEvent>>,
) -> Option<DiscoveryEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
