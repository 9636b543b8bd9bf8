//! Transport over the session bridge: a local process that owns the messaging session and
//! streams newline-delimited JSON frames over TCP.

mod frames;
mod transport;

pub use frames::{parse_frame, BridgeFrame, ExtendedTextFrame, MessageFrame, PayloadFrame};
pub use transport::{BridgeTransport, EVENT_BUFFER};
