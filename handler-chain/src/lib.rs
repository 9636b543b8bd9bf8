//! # Handler chain
//!
//! Runs a sequence of handlers for each relayed message: every handler's before in order (any
//! may stop the chain), then handle until one returns Stop, then after in reverse order.

use relay_core::{Handler, HandlerResponse, RelayMessage, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Ordered chain of handlers.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends a handler.
    pub fn add_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs before, handle, then after (reverse). Returns Stop if a before or handle stopped the chain, else Continue.
    #[instrument(skip(self, message), fields(message_id = %message.message.id))]
    pub async fn handle(&self, message: &RelayMessage) -> Result<HandlerResponse> {
        let partner = message.message.partner.as_str();
        info!(
            partner = %partner,
            history_len = message.history.len(),
            "step: handler_chain started"
        );

        for handler in &self.handlers {
            let name = std::any::type_name_of_val(handler.as_ref());
            let should_continue = handler.before(message).await?;
            if !should_continue {
                info!(
                    partner = %partner,
                    handler = %name,
                    "step: handler before returned false, chain stopped"
                );
                return Ok(HandlerResponse::Stop);
            }
        }

        let mut final_response = HandlerResponse::Continue;
        for handler in &self.handlers {
            let name = std::any::type_name_of_val(handler.as_ref());
            let response = handler.handle(message).await?;
            debug!(handler = %name, response = ?response, "Handler processed");

            match response {
                HandlerResponse::Stop => {
                    info!(partner = %partner, handler = %name, "step: handler chain stopped by handler");
                    final_response = response;
                    break;
                }
                HandlerResponse::Continue | HandlerResponse::Ignore => continue,
            }
        }

        for handler in self.handlers.iter().rev() {
            handler.after(message, &final_response).await?;
        }

        info!(partner = %partner, "step: handler_chain finished");
        Ok(final_response)
    }
}

// Tests live in tests/handler_chain_test.rs
