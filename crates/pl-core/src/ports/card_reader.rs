//! Vendor reader SDK port.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use super::errors::ReaderSdkError;
use crate::ids::LocationId;
use crate::reader::{CardReaderStatus, DiscoveredReader, ReaderType, SoftwareUpdateStatus};

/// Parameters of a discovery session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    /// Keep scanning after the first batch of readers instead of stopping.
    pub continuous: bool,
    /// Hardware models to look for; anything else is filtered by the SDK.
    pub allowed: Vec<ReaderType>,
}

/// Events emitted by an active discovery session.
///
/// `ReadersFound` carries the cumulative list of readers seen so far; an
/// empty batch means "still scanning", never failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    ReadersFound(Vec<DiscoveredReader>),
    Failed(String),
}

/// Access to the vendor card-reader SDK.
///
/// The SDK exclusively owns connection and update status; the flow only
/// observes them through the watch channels. `connect` initiates an attempt,
/// its outcome arrives on the status channel.
#[async_trait]
pub trait CardReaderPort: Send + Sync {
    fn is_initialized(&self) -> bool;

    async fn initialize(&self) -> Result<(), ReaderSdkError>;

    fn status(&self) -> watch::Receiver<CardReaderStatus>;

    fn update_status(&self) -> watch::Receiver<SoftwareUpdateStatus>;

    /// Open a discovery session. The stream stays alive until
    /// `stop_discovery` is called or the receiver is dropped.
    async fn discover(
        &self,
        request: DiscoveryRequest,
    ) -> Result<mpsc::Receiver<DiscoveryEvent>, ReaderSdkError>;

    async fn stop_discovery(&self) -> Result<(), ReaderSdkError>;

    async fn connect(
        &self,
        reader: DiscoveredReader,
        location_id: LocationId,
    ) -> Result<(), ReaderSdkError>;
}
