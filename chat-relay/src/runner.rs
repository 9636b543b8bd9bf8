//! Relay lifecycle: open the identity store, connect the transport, run the event loop until
//! `exit`, Ctrl-C or disconnect, then drain in-flight dispatches.

use std::future::Future;

use anyhow::Result;
use relay_core::{init_tracing, Connection, DeviceIdentity, Transport, TransportEvent};
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, instrument, warn};

use crate::bridge::BridgeTransport;
use crate::commands::{run_command_loop, InputEnd};
use crate::components::{
    build_event_processor, build_relay_components, open_identity_store, RelayComponents,
};
use crate::config::RelayConfig;
use crate::processor::{EventProcessor, ProcessOutcome};
use crate::selector::TargetMode;

/// Why the event loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEnd {
    /// `exit` or Ctrl-C.
    ShutdownRequested,
    Disconnected(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub relayed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    pub end: LoopEnd,
    pub stats: LoopStats,
    /// Dispatches still in flight when the grace period ran out.
    pub abandoned: usize,
}

/// Main entry: validate config, init logging, open the session database, then run the relay
/// against the session bridge with stdin as the command input.
#[instrument(skip(config))]
pub async fn run_relay(config: RelayConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file())?;

    info!(
        bridge_addr = %config.bridge_addr(),
        session_db_path = %config.session_db_path(),
        dry_run = config.dry_run,
        "Initializing relay"
    );

    let identity_store = open_identity_store(&config).await?;
    let components = build_relay_components(&config, identity_store)?;
    let transport = BridgeTransport::from_config(config.base());
    let input = BufReader::new(tokio::io::stdin());

    let report = run_relay_with(&config, components, &transport, input, ctrl_c()).await?;
    match report.end {
        LoopEnd::ShutdownRequested => Ok(()),
        LoopEnd::Disconnected(reason) => Err(anyhow::anyhow!("session ended: {}", reason)),
    }
}

/// Runs the relay with injected components, transport, command input and shutdown signal.
/// Used by `run_relay` and by integration tests.
pub async fn run_relay_with<T, R, S>(
    config: &RelayConfig,
    components: RelayComponents,
    transport: &T,
    input: R,
    signal: S,
) -> Result<RelayReport>
where
    T: Transport + ?Sized,
    R: AsyncBufRead + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    if let Some(phone) = config.target_phone() {
        components
            .selector
            .set_specific(phone)
            .await
            .map_err(|e| anyhow::anyhow!("invalid TARGET_PHONE: {}", e))?;
    }

    let Connection { device, mut events } = transport.connect().await.map_err(|e| {
        error!(error = %e, "Failed to connect transport");
        anyhow::anyhow!("Failed to connect transport: {}", e)
    })?;
    print_banner(&device, &components.selector.current().await);

    let processor = build_event_processor(&components, device);

    let (exit_tx, exit_rx) = oneshot::channel::<()>();
    let selector = components.selector.clone();
    let command_task = tokio::spawn(async move {
        if run_command_loop(input, selector).await == InputEnd::ExitRequested {
            let _ = exit_tx.send(());
        }
    });

    // A closed input drops `exit_tx`; that branch is then disabled and only `signal` remains.
    let shutdown = async move {
        tokio::select! {
            _ = signal => {}
            Ok(()) = exit_rx => {}
        }
    };

    let (end, stats) = drive_events(&processor, &mut events, shutdown).await;
    command_task.abort();
    info!(end = ?end, relayed = stats.relayed, skipped = stats.skipped, "Event loop stopped");
    println!("\nShutting down...");

    let abandoned = components
        .notifier
        .drain(config.endpoints().shutdown_grace())
        .await;
    if abandoned > 0 {
        warn!(abandoned, "Exited with dispatches still in flight");
    }
    info!("Relay stopped");

    Ok(RelayReport {
        end,
        stats,
        abandoned,
    })
}

/// Feeds events to the processor one at a time, in delivery order, until `shutdown`
/// completes or the transport disconnects.
pub async fn drive_events<F>(
    processor: &EventProcessor,
    events: &mut mpsc::Receiver<TransportEvent>,
    shutdown: F,
) -> (LoopEnd, LoopStats)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stats = LoopStats::default();

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return (LoopEnd::ShutdownRequested, stats),
            event = events.recv() => match event {
                Some(TransportEvent::Message(event)) => match processor.process(&event).await {
                    ProcessOutcome::Relayed { .. } => stats.relayed += 1,
                    ProcessOutcome::Skipped(_) => stats.skipped += 1,
                },
                Some(TransportEvent::Disconnected { reason }) => {
                    warn!(reason = %reason, "Transport disconnected");
                    return (LoopEnd::Disconnected(reason), stats);
                }
                None => return (LoopEnd::Disconnected("event stream closed".to_string()), stats),
            },
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received");
}

fn print_banner(device: &DeviceIdentity, mode: &TargetMode) {
    println!("\nSuccessfully connected to WhatsApp!");
    println!("Logged in as: {}", device.address.raw_id);
    println!("\n--- MONITORING ACTIVE ---");
    println!("Commands:");
    println!("  'set <phone>' - Change the number to monitor (e.g., set 919876543210)");
    println!("  'all'         - Monitor all messages");
    println!("  'exit'        - Close the application");
    println!("--------------------------");
    match mode {
        TargetMode::All => println!("Monitoring: ALL messages"),
        TargetMode::Specific(partner) => println!("Monitoring: {}", partner),
    }
}
