//! Watches self-authored messages for the order trigger phrases.
//!
//! Placed: submit the partner's full history for invoicing, keep the history.
//! Cancelled: drop the partner's history, submit nothing.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{Handler, HandlerResponse, RelayMessage, Result};
use tracing::{info, instrument};

use crate::console;
use crate::history::ConversationHistory;
use crate::notifier::{InvoiceSubmit, Notifier, OutboundJob};
use crate::triggers::{self, Trigger};

pub struct TriggerHandler {
    history: ConversationHistory,
    notifier: Arc<dyn Notifier>,
}

impl TriggerHandler {
    pub fn new(history: ConversationHistory, notifier: Arc<dyn Notifier>) -> Self {
        Self { history, notifier }
    }
}

#[async_trait]
impl Handler for TriggerHandler {
    #[instrument(skip(self, message), fields(partner = %message.message.partner))]
    async fn handle(&self, message: &RelayMessage) -> Result<HandlerResponse> {
        let msg = &message.message;
        if !msg.is_from_self() {
            return Ok(HandlerResponse::Continue);
        }
        let Some(trigger) = triggers::detect(&msg.text) else {
            return Ok(HandlerResponse::Continue);
        };

        info!(
            trigger = ?trigger,
            next_state = ?trigger.next_state(),
            history_len = message.history.len(),
            "step: trigger phrase detected"
        );

        match trigger {
            Trigger::OrderPlaced => {
                self.notifier
                    .dispatch(OutboundJob::InvoiceSubmit(InvoiceSubmit {
                        chats: message.history.clone(),
                        customer_name: msg.partner_name.clone(),
                        customer_phone: msg.partner.to_string(),
                    }));
                console::notice(&format!(
                    "[System] Order placed. Requesting invoice for {} ({})...",
                    msg.partner_name, msg.partner
                ));
            }
            Trigger::OrderCancelled => {
                self.history.clear(&msg.partner).await;
                console::notice(&format!(
                    "[System] Chat history cleared for {}",
                    msg.partner
                ));
            }
        }

        Ok(HandlerResponse::Continue)
    }
}
