//! Prints each relayed message to the operator console in before() and logs it.

use async_trait::async_trait;
use chrono::Local;
use relay_core::{ClassifiedMessage, Handler, RelayMessage, Result};
use tracing::{info, instrument};

use crate::console;

/// Always continues.
pub struct MonitorHandler;

/// `HH:MM:SS - <name> - <sender address> - <sender phone> to <receiver phone> : <text>`
pub fn format_monitor_line(message: &ClassifiedMessage) -> String {
    format!(
        "{} - {} - {} - {} to {} : {}",
        message.received_at.with_timezone(&Local).format("%H:%M:%S"),
        message.display_name,
        message.sender_address,
        message.sender_phone,
        message.receiver_phone,
        message.text
    )
}

#[async_trait]
impl Handler for MonitorHandler {
    #[instrument(skip(self, message))]
    async fn before(&self, message: &RelayMessage) -> Result<bool> {
        let msg = &message.message;
        info!(
            partner = %msg.partner,
            sender = %msg.sender_phone,
            direction = ?msg.direction,
            message_content = %msg.text,
            "Relayed message"
        );
        console::notice(&format_monitor_line(msg));
        Ok(true)
    }
}
