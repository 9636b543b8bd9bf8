//! Target selector: which conversation partner is monitored, or everyone.
//!
//! Written by operator commands, read once per event. Backed by a read-write lock so a reader
//! never observes a half-applied change.

use std::sync::Arc;

use relay_core::{CanonicalId, HandlerError};
use tokio::sync::RwLock;
use tracing::info;

/// Monitoring mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetMode {
    /// Every event matches, including self-authored ones.
    #[default]
    All,
    /// Only the conversation with this partner matches.
    Specific(CanonicalId),
}

/// Shared handle to the current target. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct TargetSelector {
    mode: Arc<RwLock<TargetMode>>,
}

impl TargetSelector {
    /// Starts in [`TargetMode::All`].
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_all(&self) {
        *self.mode.write().await = TargetMode::All;
        info!("Target selector set to all");
    }

    /// Switches to a single partner. The phone is normalized first; on error the mode is unchanged.
    pub async fn set_specific(&self, phone: &str) -> Result<CanonicalId, HandlerError> {
        let partner = normalize_phone(phone)?;
        *self.mode.write().await = TargetMode::Specific(partner.clone());
        info!(partner = %partner, "Target selector set to specific partner");
        Ok(partner)
    }

    pub async fn current(&self) -> TargetMode {
        self.mode.read().await.clone()
    }

    /// Whether an event whose conversation partner resolved to `partner` is monitored.
    pub async fn matches(&self, partner: &CanonicalId) -> bool {
        match &*self.mode.read().await {
            TargetMode::All => true,
            TargetMode::Specific(target) => target == partner,
        }
    }
}

/// Normalizes operator input to a canonical phone id: drops a leading `+` and the separators
/// ` `, `-`, `(`, `)`; what remains must be ASCII digits.
pub fn normalize_phone(input: &str) -> Result<CanonicalId, HandlerError> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if digits.is_empty() {
        return Err(HandlerError::InvalidPhone("empty phone number".to_string()));
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(HandlerError::InvalidPhone(input.trim().to_string()));
    }
    Ok(CanonicalId::new(digits))
}
