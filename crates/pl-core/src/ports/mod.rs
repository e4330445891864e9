//! Port interfaces for the application layer.
//!
//! Ports define the contract between the connection flow and its
//! collaborators (vendor reader SDK, onboarding checker, location provider,
//! preferences store, analytics sink). The flow stays independent of every
//! external dependency; implementations live in the infrastructure layer or
//! in the host application.

pub mod card_reader;
pub mod errors;
pub mod location;
pub mod onboarding;
pub mod preferences;
pub mod telemetry;

pub use card_reader::{CardReaderPort, DiscoveryEvent, DiscoveryRequest};
pub use errors::{PreferencesError, ReaderSdkError};
pub use location::LocationProviderPort;
pub use onboarding::OnboardingCheckerPort;
pub use preferences::{ReaderPreferencesPort, StoredReader};
pub use telemetry::TelemetryPort;
