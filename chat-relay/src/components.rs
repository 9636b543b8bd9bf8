//! Component factory: builds RelayComponents from config. Isolates assembly logic from runner.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use handler_chain::HandlerChain;
use relay_core::DeviceIdentity;
use storage::{IdentityStore, SqliteIdentityStore};
use tracing::{error, info, instrument};

use crate::classifier::EventClassifier;
use crate::config::RelayConfig;
use crate::handlers::{ContextForwardHandler, MonitorHandler, TriggerHandler};
use crate::history::ConversationHistory;
use crate::notifier::{DryRunNotifier, HttpNotifier, Notifier};
use crate::processor::EventProcessor;
use crate::resolver::IdentityResolver;
use crate::selector::TargetSelector;

/// Shared services for the relay. Clones share state.
#[derive(Clone)]
pub struct RelayComponents {
    pub selector: TargetSelector,
    pub history: ConversationHistory,
    pub resolver: Arc<IdentityResolver>,
    pub notifier: Arc<dyn Notifier>,
}

impl RelayComponents {
    /// Fresh selector (all) and empty history around the given store and notifier.
    pub fn new(
        identity_store: Arc<dyn IdentityStore>,
        notifier: Arc<dyn Notifier>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            selector: TargetSelector::new(),
            history: ConversationHistory::new(),
            resolver: Arc::new(IdentityResolver::new(identity_store, lookup_timeout)),
            notifier,
        }
    }
}

/// Opens the session database read-only. Failure is fatal for the relay.
#[instrument(skip(config))]
pub async fn open_identity_store(config: &RelayConfig) -> Result<Arc<dyn IdentityStore>> {
    let path = config.session_db_path();
    let store = SqliteIdentityStore::open(path).await.map_err(|e| {
        error!(error = %e, session_db_path = %path, "Failed to open session database");
        anyhow::anyhow!("Failed to open session database at {}: {}", path, e)
    })?;
    info!(session_db_path = %path, "step: identity store opened");
    Ok(Arc::new(store))
}

/// HTTP notifier, or a log-only one when `dry_run` is set.
pub fn create_notifier(config: &RelayConfig) -> Result<Arc<dyn Notifier>> {
    if config.dry_run {
        info!("Dry run: outbound jobs are logged, not sent");
        return Ok(Arc::new(DryRunNotifier::logging_only()));
    }
    let notifier =
        HttpNotifier::new(config.endpoints()).context("failed to build outbound HTTP client")?;
    info!(
        context_forward_path = %config.endpoints().context_forward_path,
        invoice_submit_path = %config.endpoints().invoice_submit_path,
        "step: outbound notifier ready"
    );
    Ok(Arc::new(notifier))
}

#[instrument(skip(config, identity_store))]
pub fn build_relay_components(
    config: &RelayConfig,
    identity_store: Arc<dyn IdentityStore>,
) -> Result<RelayComponents> {
    let notifier = create_notifier(config)?;
    Ok(RelayComponents::new(
        identity_store,
        notifier,
        config.base().identity_lookup_timeout(),
    ))
}

/// Monitor, then context forward, then trigger detection.
pub fn build_handler_chain(components: &RelayComponents) -> HandlerChain {
    HandlerChain::new()
        .add_handler(Arc::new(MonitorHandler))
        .add_handler(Arc::new(ContextForwardHandler::new(
            components.notifier.clone(),
        )))
        .add_handler(Arc::new(TriggerHandler::new(
            components.history.clone(),
            components.notifier.clone(),
        )))
}

/// The per-event pipeline for an established session.
pub fn build_event_processor(
    components: &RelayComponents,
    device: DeviceIdentity,
) -> EventProcessor {
    let classifier = EventClassifier::new(
        components.resolver.clone(),
        components.selector.clone(),
        device,
    );
    EventProcessor::new(
        classifier,
        components.history.clone(),
        build_handler_chain(components),
    )
}
