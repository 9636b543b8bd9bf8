//! Per-partner conversation history.
//!
//! One mutex guards the whole map. Every operation is a short append, copy or delete, and the
//! lock is never held across I/O: callers get owned snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use relay_core::{CanonicalId, ConversationEntry};
use tokio::sync::Mutex;
use tracing::{debug, info};

type HistoryMap = HashMap<CanonicalId, Vec<String>>;

/// Shared history cache. Clones share state.
///
/// There is no eviction: a partner's log only shrinks when it is cleared.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    entries: Arc<Mutex<HistoryMap>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the formatted entry to `partner`'s log and returns a copy of the whole log.
    pub async fn append(&self, partner: &CanonicalId, entry: &ConversationEntry) -> Vec<String> {
        let line = entry.log_line();
        let mut entries = self.entries.lock().await;
        let log = entries.entry(partner.clone()).or_default();
        log.push(line);
        let snapshot = log.clone();
        drop(entries);

        debug!(partner = %partner, history_len = snapshot.len(), "Appended history entry");
        snapshot
    }

    /// Removes `partner`'s log entirely. Returns how many lines were dropped.
    pub async fn clear(&self, partner: &CanonicalId) -> usize {
        let removed = self.entries.lock().await.remove(partner);
        let count = removed.map(|log| log.len()).unwrap_or(0);
        info!(partner = %partner, removed = count, "Cleared conversation history");
        count
    }

    /// Copy of `partner`'s log; empty when there is none.
    pub async fn snapshot(&self, partner: &CanonicalId) -> Vec<String> {
        self.entries
            .lock()
            .await
            .get(partner)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn len(&self, partner: &CanonicalId) -> usize {
        self.entries
            .lock()
            .await
            .get(partner)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of partners with a live log.
    pub async fn partner_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}
