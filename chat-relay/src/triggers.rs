//! Trigger phrases in self-authored messages and the conversation lifecycle they drive.
//!
//! ```text
//! Open --"Your order has been placed!"--> Submitted   (history kept, conversation may continue)
//! Open --"Order has been cancelled!"----> Cleared     (history deleted; next message reopens)
//! ```

pub const ORDER_PLACED_PHRASE: &str = "Your order has been placed!";
pub const ORDER_CANCELLED_PHRASE: &str = "Order has been cancelled!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    OrderPlaced,
    OrderCancelled,
}

/// State a conversation leaves `Open` for when a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Submitted,
    Cleared,
}

impl Trigger {
    /// State the conversation moves to when this trigger fires.
    pub fn next_state(self) -> ConversationState {
        match self {
            Trigger::OrderPlaced => ConversationState::Submitted,
            Trigger::OrderCancelled => ConversationState::Cleared,
        }
    }
}

/// Case-sensitive substring match; the placed phrase wins if both appear.
pub fn detect(text: &str) -> Option<Trigger> {
    if text.contains(ORDER_PLACED_PHRASE) {
        Some(Trigger::OrderPlaced)
    } else if text.contains(ORDER_CANCELLED_PHRASE) {
        Some(Trigger::OrderCancelled)
    } else {
        None
    }
}
