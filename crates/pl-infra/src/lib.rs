//! # pl-infra
//!
//! Infrastructure adapters for PayLink: the simulated reader SDK, the
//! preferences stores and the analytics sinks.

pub mod preferences;
pub mod reader;
pub mod telemetry;

pub use preferences::{FileReaderPreferences, InMemoryReaderPreferences};
pub use reader::{ConnectOutcome, SimScript, SimulatedCardReader};
pub use telemetry::{NullTelemetry, TracingTelemetry};
