//! Handler implementations: console monitor, context forwarding, trigger dispatch.

mod context_forward_handler;
mod monitor_handler;
mod trigger_handler;

pub use context_forward_handler::ContextForwardHandler;
pub use monitor_handler::{format_monitor_line, MonitorHandler};
pub use trigger_handler::TriggerHandler;
