//! Identity resolution: participant address → canonical phone id.
//!
//! Resolution runs an ordered list of [`ResolutionStrategy`]; the first one that finds an id
//! wins and the raw id is the final fallback. Store lookups are bounded by a timeout and
//! failures degrade to the fallback, so resolution never fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relay_core::{CanonicalId, ParticipantAddress};
use storage::IdentityStore;
use tracing::{debug, warn};

/// One way of turning an address into a canonical id.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when this strategy does not apply or found nothing.
    async fn resolve(&self, address: &ParticipantAddress) -> Option<CanonicalId>;
}

/// Direct-scheme addresses are already canonical.
pub struct DirectScheme;

#[async_trait]
impl ResolutionStrategy for DirectScheme {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn resolve(&self, address: &ParticipantAddress) -> Option<CanonicalId> {
        if address.is_aliased() {
            None
        } else {
            Some(CanonicalId::new(address.raw_id.clone()))
        }
    }
}

/// Aliased addresses are looked up in the identity store's alias map.
pub struct AliasMapping {
    store: Arc<dyn IdentityStore>,
    timeout: Duration,
}

impl AliasMapping {
    pub fn new(store: Arc<dyn IdentityStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl ResolutionStrategy for AliasMapping {
    fn name(&self) -> &'static str {
        "alias_mapping"
    }

    async fn resolve(&self, address: &ParticipantAddress) -> Option<CanonicalId> {
        if !address.is_aliased() {
            return None;
        }
        let key = address.to_non_device();
        match tokio::time::timeout(self.timeout, self.store.direct_for_alias(&key)).await {
            Ok(Ok(Some(direct))) if !direct.raw_id.is_empty() => {
                Some(CanonicalId::new(direct.raw_id))
            }
            Ok(Ok(_)) => {
                debug!(address = %address, "No direct identity mapped to alias");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, address = %address, "Alias lookup failed, keeping raw id");
                None
            }
            Err(_) => {
                warn!(
                    address = %address,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Alias lookup timed out, keeping raw id"
                );
                None
            }
        }
    }
}

/// Resolves addresses and contact names against the identity store.
pub struct IdentityResolver {
    strategies: Vec<Arc<dyn ResolutionStrategy>>,
    store: Arc<dyn IdentityStore>,
    timeout: Duration,
}

impl IdentityResolver {
    /// Default strategy order: direct scheme, then alias mapping.
    pub fn new(store: Arc<dyn IdentityStore>, timeout: Duration) -> Self {
        let strategies: Vec<Arc<dyn ResolutionStrategy>> = vec![
            Arc::new(DirectScheme),
            Arc::new(AliasMapping::new(store.clone(), timeout)),
        ];
        Self::with_strategies(strategies, store, timeout)
    }

    pub fn with_strategies(
        strategies: Vec<Arc<dyn ResolutionStrategy>>,
        store: Arc<dyn IdentityStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            strategies,
            store,
            timeout,
        }
    }

    /// Canonical id of `address`; falls back to the raw id when no strategy finds one.
    pub async fn resolve(&self, address: &ParticipantAddress) -> CanonicalId {
        for strategy in &self.strategies {
            if let Some(id) = strategy.resolve(address).await {
                debug!(address = %address, strategy = strategy.name(), id = %id, "Resolved address");
                return id;
            }
        }
        CanonicalId::new(address.raw_id.clone())
    }

    /// Saved contact name, if any. Lookup failures and timeouts count as absent.
    pub async fn contact_name(&self, address: &ParticipantAddress) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.store.contact_name(address)).await {
            Ok(Ok(name)) => name.filter(|n| !n.trim().is_empty()),
            Ok(Err(e)) => {
                warn!(error = %e, address = %address, "Contact lookup failed");
                None
            }
            Err(_) => {
                warn!(address = %address, "Contact lookup timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::{InMemoryIdentityStore, StorageError};

    mockall::mock! {
        Store {}

        #[async_trait]
        impl IdentityStore for Store {
            async fn contact_name(
                &self,
                address: &ParticipantAddress,
            ) -> Result<Option<String>, StorageError>;

            async fn direct_for_alias(
                &self,
                address: &ParticipantAddress,
            ) -> Result<Option<ParticipantAddress>, StorageError>;
        }
    }

    /// Store whose lookups never answer within any reasonable timeout.
    struct StalledStore;

    #[async_trait]
    impl IdentityStore for StalledStore {
        async fn contact_name(
            &self,
            _address: &ParticipantAddress,
        ) -> Result<Option<String>, StorageError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Some("never".to_string()))
        }

        async fn direct_for_alias(
            &self,
            _address: &ParticipantAddress,
        ) -> Result<Option<ParticipantAddress>, StorageError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Some(ParticipantAddress::direct("000")))
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_direct_address_is_returned_verbatim_without_lookup() {
        let mut store = MockStore::new();
        store.expect_direct_for_alias().never();
        let resolver = IdentityResolver::new(Arc::new(store), TIMEOUT);

        let id = resolver
            .resolve(&ParticipantAddress::direct("919800000001"))
            .await;

        assert_eq!(id, CanonicalId::from("919800000001"));
    }

    #[tokio::test]
    async fn test_aliased_address_uses_mapping() {
        let store = InMemoryIdentityStore::new();
        store.insert_alias("20000000000001", "919800000001").await;
        let resolver = IdentityResolver::new(Arc::new(store), TIMEOUT);

        let mut alias = ParticipantAddress::aliased("20000000000001");
        alias.device = Some(2);
        let id = resolver.resolve(&alias).await;

        assert_eq!(id, CanonicalId::from("919800000001"));
    }

    #[tokio::test]
    async fn test_aliased_address_without_mapping_falls_back_to_raw() {
        let resolver = IdentityResolver::new(Arc::new(InMemoryIdentityStore::new()), TIMEOUT);

        let id = resolver
            .resolve(&ParticipantAddress::aliased("20000000000001"))
            .await;

        assert_eq!(id, CanonicalId::from("20000000000001"));
    }

    #[tokio::test]
    async fn test_store_error_falls_back_to_raw() {
        let mut store = MockStore::new();
        store
            .expect_direct_for_alias()
            .times(1)
            .returning(|_| Err(StorageError::Database("locked".to_string())));
        let resolver = IdentityResolver::new(Arc::new(store), TIMEOUT);

        let id = resolver
            .resolve(&ParticipantAddress::aliased("20000000000001"))
            .await;

        assert_eq!(id, CanonicalId::from("20000000000001"));
    }

    #[tokio::test]
    async fn test_stalled_store_falls_back_within_timeout() {
        let resolver = IdentityResolver::new(Arc::new(StalledStore), TIMEOUT);

        let started = std::time::Instant::now();
        let id = resolver
            .resolve(&ParticipantAddress::aliased("20000000000001"))
            .await;
        let name = resolver
            .contact_name(&ParticipantAddress::direct("919800000001"))
            .await;

        assert_eq!(id, CanonicalId::from("20000000000001"));
        assert_eq!(name, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let store = InMemoryIdentityStore::new();
        store.insert_alias("20000000000001", "919800000001").await;
        let resolver = IdentityResolver::new(Arc::new(store), TIMEOUT);
        let alias = ParticipantAddress::aliased("20000000000001");

        let first = resolver.resolve(&alias).await;
        let second = resolver.resolve(&alias).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_contact_name_ignores_blank_names() {
        let mut store = MockStore::new();
        store
            .expect_contact_name()
            .returning(|_| Ok(Some("   ".to_string())));
        let resolver = IdentityResolver::new(Arc::new(store), TIMEOUT);

        let name = resolver
            .contact_name(&ParticipantAddress::direct("919800000001"))
            .await;

        assert_eq!(name, None);
    }
}
