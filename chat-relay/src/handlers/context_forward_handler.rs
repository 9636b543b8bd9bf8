//! Forwards every relayed message with its history snapshot for downstream context tracking.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{Handler, HandlerResponse, RelayMessage, Result};
use tracing::instrument;

use crate::notifier::{ContextForward, Notifier, OutboundJob};

pub struct ContextForwardHandler {
    notifier: Arc<dyn Notifier>,
}

impl ContextForwardHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Handler for ContextForwardHandler {
    #[instrument(skip(self, message))]
    async fn handle(&self, message: &RelayMessage) -> Result<HandlerResponse> {
        self.notifier
            .dispatch(OutboundJob::ContextForward(ContextForward {
                sender: message.message.sender_phone.to_string(),
                message: message.message.text.clone(),
                history: message.history.clone(),
            }));
        Ok(HandlerResponse::Continue)
    }
}
