use crate::telemetry::TelemetryEvent;

/// Fire-and-forget analytics sink.
///
/// Recording must never block or fail the flow; implementations queue or
/// drop internally.
pub trait TelemetryPort: Send + Sync {
    fn track(&self, event: TelemetryEvent);
}
