//! Reader SDK adapters.
mod simulated;

pub use simulated::{ConnectOutcome, SimScript, SimulatedCardReader};
