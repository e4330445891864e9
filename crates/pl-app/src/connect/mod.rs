//! Connection flow orchestration.

mod completion;
mod events;
mod orchestrator;

pub use completion::Completion;
pub use events::{HostEvent, UserCommand};
pub use orchestrator::{ConnectDeps, ConnectHandle, ConnectOrchestrator, ConnectParams};
