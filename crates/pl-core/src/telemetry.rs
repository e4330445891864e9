//! Analytics event taxonomy for the connection flow.
//!
//! Mirrored to the analytics sink as a side effect of state transitions;
//! never part of functional correctness.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    OnboardingIncomplete,
    ReadersDiscovered { count: usize },
    DiscoveryFailed { reason: String },
    AutoConnectionStarted,
    ConnectTapped,
    LocationFetchSucceeded,
    LocationFetchFailed { reason: String },
    MissingAddressTapped,
    ConnectionSucceeded,
    ConnectionFailed,
}
