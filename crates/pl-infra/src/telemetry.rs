//! Analytics sink adapters.

use pl_core::ports::TelemetryPort;
use pl_core::telemetry::TelemetryEvent;

/// Logs every analytics event through `tracing`.
///
/// Stands in for the real analytics pipeline during development; events are
/// fire-and-forget either way.
#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl TelemetryPort for TracingTelemetry {
    fn track(&self, event: TelemetryEvent) {
        tracing::info!(?event, "analytics event");
    }
}

/// Drops every event.
#[derive(Debug, Default)]
pub struct NullTelemetry;

impl TelemetryPort for NullTelemetry {
    fn track(&self, _event: TelemetryEvent) {}
}
