//! In-memory implementation of the IdentityStore trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::ParticipantAddress;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::identity_store::IdentityStore;

/// Identity store held in memory; contacts keyed by non-device address, aliases by raw alias id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityStore {
    contacts: Arc<RwLock<HashMap<String, String>>>,
    aliases: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves a contact's full name.
    pub async fn insert_contact(&self, address: &ParticipantAddress, full_name: &str) {
        let mut contacts = self.contacts.write().await;
        contacts.insert(address.to_non_device().to_string(), full_name.to_string());
    }

    /// Maps an alias id to a phone number.
    pub async fn insert_alias(&self, alias_id: &str, phone: &str) {
        let mut aliases = self.aliases.write().await;
        aliases.insert(alias_id.to_string(), phone.to_string());
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn contact_name(
        &self,
        address: &ParticipantAddress,
    ) -> Result<Option<String>, StorageError> {
        let contacts = self.contacts.read().await;
        Ok(contacts.get(&address.to_non_device().to_string()).cloned())
    }

    async fn direct_for_alias(
        &self,
        address: &ParticipantAddress,
    ) -> Result<Option<ParticipantAddress>, StorageError> {
        if !address.is_aliased() {
            return Ok(None);
        }
        let aliases = self.aliases.read().await;
        Ok(aliases
            .get(&address.raw_id)
            .map(|phone| ParticipantAddress::direct(phone.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_contact_lookup_ignores_device_suffix() {
        let store = InMemoryIdentityStore::new();
        store
            .insert_contact(&ParticipantAddress::direct("919800000001"), "Asha")
            .await;

        let mut with_device = ParticipantAddress::direct("919800000001");
        with_device.device = Some(3);

        assert_eq!(
            store.contact_name(&with_device).await.unwrap(),
            Some("Asha".to_string())
        );
    }

    #[tokio::test]
    async fn test_alias_lookup_only_for_aliased_addresses() {
        let store = InMemoryIdentityStore::new();
        store.insert_alias("555", "919800000001").await;

        let mapped = store
            .direct_for_alias(&ParticipantAddress::aliased("555"))
            .await
            .unwrap();
        assert_eq!(mapped, Some(ParticipantAddress::direct("919800000001")));

        let direct = store
            .direct_for_alias(&ParticipantAddress::direct("555"))
            .await
            .unwrap();
        assert_eq!(direct, None);
    }
}
