//! # Chat relay
//!
//! Monitors a messaging session, keeps a per-partner conversation log and forwards it to a
//! downstream HTTP service. Wires relay-core types, handler-chain and the storage identity
//! store; loads config from env and runs the event loop next to an operator console.

pub mod bridge;
pub mod classifier;
pub mod cli;
pub mod commands;
pub mod components;
pub mod config;
pub mod console;
pub mod handlers;
pub mod history;
pub mod notifier;
pub mod processor;
pub mod resolver;
pub mod runner;
pub mod selector;
pub mod triggers;

pub use cli::{load_config, Cli, Commands, RunArgs};

pub use bridge::BridgeTransport;
pub use classifier::{Classification, EventClassifier, SkipReason};
pub use commands::{apply_command, parse_command, run_command_loop, InputEnd, OperatorCommand};
pub use components::{
    build_event_processor, build_handler_chain, build_relay_components, RelayComponents,
};
pub use config::{BaseConfig, EndpointConfig, RelayConfig};
pub use handlers::{ContextForwardHandler, MonitorHandler, TriggerHandler};
pub use history::ConversationHistory;
pub use notifier::{
    ContextForward, DryRunNotifier, HttpNotifier, InvoiceSubmit, JobKind, Notifier, OutboundJob,
};
pub use processor::{EventProcessor, ProcessOutcome};
pub use resolver::IdentityResolver;
pub use runner::{drive_events, run_relay, run_relay_with, LoopEnd, LoopStats, RelayReport};
pub use selector::{normalize_phone, TargetMode, TargetSelector};
pub use triggers::{ConversationState, Trigger};
