//! Core types: participant addresses, inbound events, classified messages, and the Handler trait.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Server part of a phone-number address.
pub const DIRECT_SERVER: &str = "s.whatsapp.net";
/// Server part of an aliased (linked-identity) address.
pub const ALIAS_SERVER: &str = "lid";

/// Addressing scheme of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressScheme {
    /// The user part is already the stable phone-number identity.
    Direct,
    /// Opaque identifier that must be mapped to a direct identity.
    Aliased,
}

/// Participant address as delivered by the transport (`user[:device]@server`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantAddress {
    pub scheme: AddressScheme,
    pub raw_id: String,
    pub server: String,
    pub device: Option<u16>,
}

impl ParticipantAddress {
    /// Phone-number address on the default server.
    pub fn direct(raw_id: impl Into<String>) -> Self {
        Self {
            scheme: AddressScheme::Direct,
            raw_id: raw_id.into(),
            server: DIRECT_SERVER.to_string(),
            device: None,
        }
    }

    /// Aliased address on the alias server.
    pub fn aliased(raw_id: impl Into<String>) -> Self {
        Self {
            scheme: AddressScheme::Aliased,
            raw_id: raw_id.into(),
            server: ALIAS_SERVER.to_string(),
            device: None,
        }
    }

    pub fn is_aliased(&self) -> bool {
        self.scheme == AddressScheme::Aliased
    }

    /// Address without the device suffix; this is the form identity stores are keyed by.
    pub fn to_non_device(&self) -> Self {
        Self {
            device: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for ParticipantAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device {
            Some(device) => write!(f, "{}:{}@{}", self.raw_id, device, self.server),
            None => write!(f, "{}@{}", self.raw_id, self.server),
        }
    }
}

impl FromStr for ParticipantAddress {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (user, server) = s
            .split_once('@')
            .ok_or_else(|| RelayError::InvalidAddress(format!("missing server in '{}'", s)))?;
        if server.is_empty() {
            return Err(RelayError::InvalidAddress(format!("empty server in '{}'", s)));
        }

        let (raw_id, device) = match user.split_once(':') {
            Some((raw_id, device)) => {
                let device = device.parse::<u16>().map_err(|_| {
                    RelayError::InvalidAddress(format!("bad device suffix in '{}'", s))
                })?;
                (raw_id, Some(device))
            }
            None => (user, None),
        };
        if raw_id.is_empty() {
            return Err(RelayError::InvalidAddress(format!("empty user in '{}'", s)));
        }

        let scheme = if server == ALIAS_SERVER {
            AddressScheme::Aliased
        } else {
            AddressScheme::Direct
        };

        Ok(Self {
            scheme,
            raw_id: raw_id.to_string(),
            server: server.to_string(),
            device,
        })
    }
}

/// Stable phone-number-shaped identifier; the history cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalId(String);

impl CanonicalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CanonicalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Payload variants carried by a transport message event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessagePayload {
    /// Plain conversation text.
    Conversation(String),
    /// Extended text (links, quotes, mentions); only the text body is relayed.
    ExtendedText { text: String },
    /// Anything else (media, reactions, protocol messages).
    Unsupported { kind: String },
}

impl MessagePayload {
    /// Plain text of the payload; `None` for non-text variants and empty bodies.
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            MessagePayload::Conversation(text) => text.as_str(),
            MessagePayload::ExtendedText { text } => text.as_str(),
            MessagePayload::Unsupported { .. } => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// A message event as delivered by the transport, before any filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub id: String,
    pub sender: ParticipantAddress,
    /// The chat the message belongs to; for one-to-one chats this is the counterpart.
    pub chat: ParticipantAddress,
    pub is_from_self: bool,
    pub push_name: Option<String>,
    pub received_at: DateTime<Utc>,
    pub payload: MessagePayload,
}

/// Direction of the message relative to the local account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageDirection {
    /// Sent by the counterpart.
    Incoming,
    /// Authored by the local account.
    Outgoing,
}

/// One history line before formatting. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    /// Label written into the log line (display name, or the self label for outgoing messages).
    pub display_name: String,
    pub phone_number: CanonicalId,
    pub text: String,
    pub direction: MessageDirection,
}

impl ConversationEntry {
    /// `[HH:MM:SS] <name> (<phone>): <text>`, time in local time.
    pub fn log_line(&self) -> String {
        format!(
            "[{}] {} ({}): {}",
            self.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            self.display_name,
            self.phone_number,
            self.text
        )
    }
}

/// A message that passed the target selector, with every identity resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedMessage {
    pub id: String,
    /// Sender address as delivered (for the monitor line).
    pub sender_address: ParticipantAddress,
    pub sender_phone: CanonicalId,
    pub receiver_phone: CanonicalId,
    /// The other party of the conversation regardless of direction.
    pub partner: CanonicalId,
    /// Best known name of the partner, used for invoice submission.
    pub partner_name: String,
    /// Best known name of the sender: contact name, push name, then phone.
    pub display_name: String,
    /// Label used in the history line.
    pub author: String,
    pub text: String,
    pub direction: MessageDirection,
    pub received_at: DateTime<Utc>,
}

impl ClassifiedMessage {
    pub fn is_from_self(&self) -> bool {
        self.direction == MessageDirection::Outgoing
    }

    /// History entry for this message.
    pub fn entry(&self) -> ConversationEntry {
        ConversationEntry {
            timestamp: self.received_at,
            display_name: self.author.clone(),
            phone_number: self.sender_phone.clone(),
            text: self.text.clone(),
            direction: self.direction,
        }
    }
}

/// Unit passed through the handler chain: the classified message and the partner's history
/// snapshot taken right after this message was appended.
#[derive(Debug, Clone)]
pub struct RelayMessage {
    pub message: ClassifiedMessage,
    pub history: Vec<String>,
}

/// Handler result for the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain.
    Stop,
    /// Skip this handler, try next.
    Ignore,
}

/// Single handler concept: optional before / handle / after. Chain runs all before → handle until Stop → all after (reverse).
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _message: &RelayMessage) -> crate::error::Result<bool> {
        Ok(true)
    }
    /// Processes the message. Return Stop to end the handle phase. Default: Continue.
    async fn handle(&self, _message: &RelayMessage) -> crate::error::Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }
    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(
        &self,
        _message: &RelayMessage,
        _response: &HandlerResponse,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}
