//! # pl-core
//!
//! Core domain models and business logic for PayLink.
//!
//! This crate contains pure business logic without any infrastructure
//! dependencies: the reader domain model, the connection state machine and
//! the port contracts the application layer is wired against.

// Public module exports
pub mod config;
pub mod connect;
pub mod ids;
pub mod location;
pub mod onboarding;
pub mod ports;
pub mod reader;
pub mod site;
pub mod telemetry;

// Re-export commonly used types at the crate root
pub use config::CountryConfig;
pub use connect::{ConnectAction, ConnectEvent, ConnectState, ConnectStateMachine, FlowParams};
pub use connect::{ConnectViewState, ReaderListItem, UserAction};
pub use ids::{LocationId, ReaderId, SiteId};
pub use location::LocationFetchError;
pub use onboarding::OnboardingState;
pub use reader::{
    CardReaderStatus, ConnectedReader, DiscoveredReader, ReaderType, SoftwareUpdateStatus,
};
pub use site::{MerchantSite, SiteHosting};
pub use telemetry::TelemetryEvent;
