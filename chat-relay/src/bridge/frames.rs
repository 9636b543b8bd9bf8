//! Wire frames sent by the session bridge, one JSON object per line.

use chrono::{DateTime, Utc};
use relay_core::{InboundEvent, MessagePayload, ParticipantAddress, RelayError, Result};
use serde::Deserialize;

/// One line from the bridge, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeFrame {
    /// Session established; carries the local account.
    Ready {
        jid: String,
        #[serde(default)]
        push_name: Option<String>,
    },
    /// Linking required; the operator enters this code on the phone.
    PairingCode { code: String },
    Message(MessageFrame),
    Disconnected {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Frame types this relay does not consume (receipts, presence, history sync).
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageFrame {
    pub id: String,
    pub sender: String,
    pub chat: String,
    #[serde(default)]
    pub is_from_me: bool,
    #[serde(default)]
    pub push_name: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub message: PayloadFrame,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadFrame {
    #[serde(default)]
    pub conversation: Option<String>,
    #[serde(default)]
    pub extended_text_message: Option<ExtendedTextFrame>,
    /// Set by the bridge for non-text payloads ("image", "reaction", ...).
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtendedTextFrame {
    #[serde(default)]
    pub text: Option<String>,
}

pub fn parse_frame(line: &str) -> Result<BridgeFrame> {
    serde_json::from_str(line).map_err(|e| RelayError::Transport(format!("malformed frame: {}", e)))
}

impl PayloadFrame {
    pub fn into_payload(self) -> MessagePayload {
        if let Some(text) = self.conversation {
            return MessagePayload::Conversation(text);
        }
        if let Some(extended) = self.extended_text_message {
            return MessagePayload::ExtendedText {
                text: extended.text.unwrap_or_default(),
            };
        }
        MessagePayload::Unsupported {
            kind: self.kind.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

impl TryFrom<MessageFrame> for InboundEvent {
    type Error = RelayError;

    fn try_from(frame: MessageFrame) -> Result<Self> {
        let sender: ParticipantAddress = frame.sender.parse()?;
        let chat: ParticipantAddress = frame.chat.parse()?;
        let received_at = frame
            .timestamp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        Ok(InboundEvent {
            id: frame.id,
            sender,
            chat,
            is_from_self: frame.is_from_me,
            push_name: frame.push_name,
            received_at,
            payload: frame.message.into_payload(),
        })
    }
}
