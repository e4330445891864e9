//! # pl-app
//!
//! Application layer for PayLink: the connection flow orchestrator that
//! drives the `pl-core` state machine against the injected ports and talks
//! to the host through view states, one-shot events and user commands.

pub mod connect;

pub use connect::{
    Completion, ConnectDeps, ConnectHandle, ConnectOrchestrator, ConnectParams, HostEvent,
    UserCommand,
};
