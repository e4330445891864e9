//! Simulated card reader SDK.
//!
//! Scriptable stand-in for the vendor SDK, used by integration tests and as
//! the development-mode reader. Discovery replays a configured list of
//! events; `connect` resolves to a configured outcome through the status
//! channel, exactly like the real SDK does.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};

use pl_core::ids::LocationId;
use pl_core::ports::{CardReaderPort, DiscoveryEvent, DiscoveryRequest, ReaderSdkError};
use pl_core::reader::{
    CardReaderStatus, ConnectedReader, DiscoveredReader, SoftwareUpdateStatus,
};

/// What a simulated `connect` call does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// `Connecting` then `Connected`.
    Succeed,
    /// `Connecting` then `NotConnected` with the given message.
    Fail { error: Option<String> },
    /// `Connecting` and nothing more; the flow has to be cancelled.
    Stall,
}

/// Scripted behavior of a [`SimulatedCardReader`].
#[derive(Debug, Clone)]
pub struct SimScript {
    /// Discovery events replayed, in order, to every new session.
    pub discovery: Vec<DiscoveryEvent>,
    pub connect: ConnectOutcome,
}

impl Default for SimScript {
    fn default() -> Self {
        Self {
            discovery: Vec::new(),
            connect: ConnectOutcome::Succeed,
        }
    }
}

struct SimInner {
    script: SimScript,
    /// Kept while a discovery session is open so late events can be pushed.
    discovery_keepalive: Option<mpsc::Sender<DiscoveryEvent>>,
    last_connection: Option<(DiscoveredReader, LocationId)>,
}

pub struct SimulatedCardReader {
    initialized: AtomicBool,
    stop_calls: AtomicUsize,
    status_tx: watch::Sender<CardReaderStatus>,
    update_tx: watch::Sender<SoftwareUpdateStatus>,
    inner: Mutex<SimInner>,
}

impl SimulatedCardReader {
    pub fn new(script: SimScript) -> Self {
        let (status_tx, _) = watch::channel(CardReaderStatus::not_connected());
        let (update_tx, _) = watch::channel(SoftwareUpdateStatus::Idle);
        Self {
            initialized: AtomicBool::new(false),
            stop_calls: AtomicUsize::new(0),
            status_tx,
            update_tx,
            inner: Mutex::new(SimInner {
                script,
                discovery_keepalive: None,
                last_connection: None,
            }),
        }
    }

    /// Push a discovery event into the open session, or queue it for the
    /// next one.
    pub async fn emit_discovery(&self, event: DiscoveryEvent) {
        let keepalive = {
            let mut inner = self.inner.lock().await;
            match inner.discovery_keepalive.clone() {
                Some(tx) => Some(tx),
                None => {
                    inner.script.discovery.push(event.clone());
                    None
                }
            }
        };
        if let Some(tx) = keepalive {
            if tx.send(event).await.is_err() {
                tracing::debug!("simulated discovery session already closed");
            }
        }
    }

    pub async fn set_connect_outcome(&self, outcome: ConnectOutcome) {
        self.inner.lock().await.script.connect = outcome;
    }

    /// Drive the status channel directly, e.g. to replay an SDK-side
    /// disconnect.
    pub fn set_status(&self, status: CardReaderStatus) {
        self.status_tx.send_replace(status);
    }

    pub fn set_update_status(&self, status: SoftwareUpdateStatus) {
        self.update_tx.send_replace(status);
    }

    pub async fn last_connection(&self) -> Option<(DiscoveredReader, LocationId)> {
        self.inner.lock().await.last_connection.clone()
    }

    pub async fn discovery_active(&self) -> bool {
        self.inner.lock().await.discovery_keepalive.is_some()
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardReaderPort for SimulatedCardReader {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn initialize(&self) -> Result<(), ReaderSdkError> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn status(&self) -> watch::Receiver<CardReaderStatus> {
        self.status_tx.subscribe()
    }

    fn update_status(&self) -> watch::Receiver<SoftwareUpdateStatus> {
        self.update_tx.subscribe()
    }

    async fn discover(
        &self,
        request: DiscoveryRequest,
    ) -> Result<mpsc::Receiver<DiscoveryEvent>, ReaderSdkError> {
        if !self.is_initialized() {
            return Err(ReaderSdkError::NotInitialized);
        }

        let (tx, rx) = mpsc::channel(16);
        let events = {
            let mut inner = self.inner.lock().await;
            if inner.discovery_keepalive.is_some() {
                return Err(ReaderSdkError::DiscoveryInProgress);
            }
            inner.discovery_keepalive = Some(tx.clone());
            inner.script.discovery.clone()
        };

        tracing::debug!(
            allowed = ?request.allowed,
            continuous = request.continuous,
            "simulated discovery started"
        );
        let continuous = request.continuous;
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            if continuous {
                // Stay "still scanning" until the session is torn down.
                tx.closed().await;
            }
        });

        Ok(rx)
    }

    async fn stop_discovery(&self) -> Result<(), ReaderSdkError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().await.discovery_keepalive = None;
        Ok(())
    }

    async fn connect(
        &self,
        reader: DiscoveredReader,
        location_id: LocationId,
    ) -> Result<(), ReaderSdkError> {
        let reader_id = reader
            .id
            .clone()
            .ok_or(ReaderSdkError::UnresolvedReader)?;

        let outcome = {
            let mut inner = self.inner.lock().await;
            inner.last_connection = Some((reader.clone(), location_id));
            inner.script.connect.clone()
        };

        self.status_tx.send_replace(CardReaderStatus::Connecting);
        // Give observers a chance to see the intermediate status.
        tokio::task::yield_now().await;

        match outcome {
            ConnectOutcome::Succeed => {
                self.status_tx
                    .send_replace(CardReaderStatus::Connected(ConnectedReader {
                        id: reader_id,
                        reader_type: reader.reader_type,
                    }));
            }
            ConnectOutcome::Fail { error } => {
                self.status_tx
                    .send_replace(CardReaderStatus::NotConnected { error });
            }
            ConnectOutcome::Stall => {}
        }
        Ok(())
    }
}
