//! Transport abstraction for the messaging session.
//!
//! [`Transport`] is session-agnostic; chat-relay ships a bridge implementation and tests
//! substitute an in-process one.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::{InboundEvent, ParticipantAddress};

/// Identity of the local account, known once the session is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub address: ParticipantAddress,
    /// Push name of the local profile, if the session has one.
    pub push_name: Option<String>,
}

/// Events delivered by an established session.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Message(InboundEvent),
    /// The session ended; no further events follow.
    Disconnected { reason: String },
}

/// An established session: the device identity and the serial event stream.
pub struct Connection {
    pub device: DeviceIdentity,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Connects to the messaging session. Pairing, if required, is a side effect of `connect`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> Result<Connection>;
}
