//! Per-event pipeline: classify, append to history, run the handler chain.
//!
//! Runs on the serial event-delivery path. History is mutated here, before any handler hands a
//! job to the notifier, so abandoning in-flight dispatches never leaves the cache inconsistent.

use handler_chain::HandlerChain;
use relay_core::{CanonicalId, InboundEvent, RelayMessage};
use tracing::{error, instrument};

use crate::classifier::{Classification, EventClassifier, SkipReason};
use crate::history::ConversationHistory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Relayed {
        partner: CanonicalId,
        history_len: usize,
    },
    Skipped(SkipReason),
}

pub struct EventProcessor {
    classifier: EventClassifier,
    history: ConversationHistory,
    chain: HandlerChain,
}

impl EventProcessor {
    pub fn new(
        classifier: EventClassifier,
        history: ConversationHistory,
        chain: HandlerChain,
    ) -> Self {
        Self {
            classifier,
            history,
            chain,
        }
    }

    /// Processes one event. Handler errors are logged and never abort the caller's loop.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn process(&self, event: &InboundEvent) -> ProcessOutcome {
        let message = match self.classifier.classify(event).await {
            Classification::Relay(message) => message,
            Classification::Skip(reason) => return ProcessOutcome::Skipped(reason),
        };

        let partner = message.partner.clone();
        let snapshot = self.history.append(&partner, &message.entry()).await;
        let history_len = snapshot.len();
        let relay = RelayMessage {
            message,
            history: snapshot,
        };

        if let Err(e) = self.chain.handle(&relay).await {
            error!(error = %e, partner = %partner, "Handler chain failed");
        }

        ProcessOutcome::Relayed {
            partner,
            history_len,
        }
    }
}
