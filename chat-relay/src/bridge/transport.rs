use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use relay_core::{
    Connection, DeviceIdentity, InboundEvent, ParticipantAddress, RelayError, Result, Transport,
    TransportEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::frames::{parse_frame, BridgeFrame};
use crate::config::BaseConfig;

/// Capacity of the event channel between the socket reader and the event loop.
pub const EVENT_BUFFER: usize = 256;

type FrameLines = Lines<BufReader<TcpStream>>;

/// Connects to the session bridge and turns its frames into [`TransportEvent`]s.
pub struct BridgeTransport {
    addr: String,
    ready_timeout: Duration,
    pairing_code_file: PathBuf,
}

impl BridgeTransport {
    pub fn new(
        addr: impl Into<String>,
        ready_timeout: Duration,
        pairing_code_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            addr: addr.into(),
            ready_timeout,
            pairing_code_file: pairing_code_file.into(),
        }
    }

    pub fn from_config(config: &BaseConfig) -> Self {
        Self::new(
            config.bridge_addr.clone(),
            config.bridge_connect_timeout(),
            config.pairing_code_file.clone(),
        )
    }

    /// Reads frames until `ready`. Pairing codes are shown along the way.
    ///
    /// The bridge must produce `ready` within `ready_timeout`; each pairing code restarts that
    /// window so the operator has the full timeout to enter it.
    async fn await_ready(&self, lines: &mut FrameLines) -> Result<DeviceIdentity> {
        let mut deadline = Instant::now() + self.ready_timeout;
        loop {
            let next = tokio::time::timeout_at(deadline, lines.next_line())
                .await
                .map_err(|_| {
                    RelayError::Transport(format!(
                        "no device identity within {}s",
                        self.ready_timeout.as_secs()
                    ))
                })?;
            let Some(line) = next? else {
                return Err(RelayError::Transport(
                    "bridge closed the connection before the session was ready".to_string(),
                ));
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_frame(&line) {
                Ok(BridgeFrame::Ready { jid, push_name }) => {
                    let address: ParticipantAddress = jid.parse()?;
                    return Ok(DeviceIdentity { address, push_name });
                }
                Ok(BridgeFrame::PairingCode { code }) => {
                    self.show_pairing_code(&code).await;
                    deadline = Instant::now() + self.ready_timeout;
                }
                Ok(BridgeFrame::Disconnected { reason }) => {
                    return Err(RelayError::Transport(format!(
                        "bridge disconnected before ready: {}",
                        reason.unwrap_or_else(|| "no reason given".to_string())
                    )));
                }
                Ok(other) => debug!(frame = ?other, "Ignoring frame before ready"),
                Err(e) => warn!(error = %e, "Skipping malformed frame"),
            }
        }
    }

    async fn show_pairing_code(&self, code: &str) {
        info!("step: pairing code received");
        println!("\n--- PAIRING CODE ---");
        println!("{}", code);
        println!("Open WhatsApp > Linked Devices > Link with phone number and enter the code.");

        match tokio::fs::write(&self.pairing_code_file, code).await {
            Ok(()) => println!(
                "Pairing code saved to '{}'.",
                self.pairing_code_file.display()
            ),
            Err(e) => {
                warn!(
                    error = %e,
                    path = %self.pairing_code_file.display(),
                    "Failed to save pairing code"
                );
                println!("Failed to save pairing code: {}", e);
            }
        }
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn connect(&self) -> Result<Connection> {
        info!("step: connecting to session bridge");
        let stream = tokio::time::timeout(self.ready_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| RelayError::Transport(format!("timed out connecting to {}", self.addr)))?
            .map_err(|e| RelayError::Transport(format!("cannot connect to {}: {}", self.addr, e)))?;

        let mut lines = BufReader::new(stream).lines();
        let device = self.await_ready(&mut lines).await?;
        info!(device = %device.address, "step: session ready");

        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(pump_events(lines, tx));

        Ok(Connection { device, events })
    }
}

/// Forwards frames in arrival order until the bridge goes away or the receiver is dropped.
async fn pump_events(mut lines: FrameLines, tx: mpsc::Sender<TransportEvent>) {
    let reason = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break "bridge closed the connection".to_string(),
            Err(e) => {
                error!(error = %e, "Bridge read failed");
                break format!("read failed: {}", e);
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_frame(&line) {
            Ok(BridgeFrame::Message(frame)) => match InboundEvent::try_from(frame) {
                Ok(event) => TransportEvent::Message(event),
                Err(e) => {
                    warn!(error = %e, "Skipping message frame with bad address");
                    continue;
                }
            },
            Ok(BridgeFrame::Disconnected { reason }) => {
                break reason.unwrap_or_else(|| "bridge reported disconnect".to_string());
            }
            Ok(other) => {
                debug!(frame = ?other, "Ignoring frame");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed frame");
                continue;
            }
        };

        if tx.send(event).await.is_err() {
            debug!("Event receiver dropped, stopping bridge reader");
            return;
        }
    };

    info!(reason = %reason, "Bridge session ended");
    let _ = tx.send(TransportEvent::Disconnected { reason }).await;
}
