//! Reader domain models.
mod model;
mod status;

pub use model::{ConnectedReader, DiscoveredReader, ReaderType};
pub use status::{CardReaderStatus, SoftwareUpdateStatus};
