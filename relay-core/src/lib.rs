//! # relay-core
//!
//! Core types and traits for the chat relay: participant addresses and canonical ids, transport
//! events, classified messages, [`Handler`] and [`Transport`], and tracing initialization.
//! Transport-agnostic; used by storage, handler-chain and chat-relay.

pub mod error;
pub mod logger;
pub mod transport;
pub mod types;

pub use error::{HandlerError, RelayError, Result};
pub use logger::init_tracing;
pub use transport::{Connection, DeviceIdentity, Transport, TransportEvent};
pub use types::{
    AddressScheme, CanonicalId, ClassifiedMessage, ConversationEntry, Handler, HandlerResponse,
    InboundEvent, MessageDirection, MessagePayload, ParticipantAddress, RelayMessage,
    ALIAS_SERVER, DIRECT_SERVER,
};
