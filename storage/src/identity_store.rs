use async_trait::async_trait;
use relay_core::ParticipantAddress;

use crate::error::StorageError;

/// Local contact and identity store of the messaging session.
///
/// Both lookups return `Ok(None)` when the store simply has no entry; `Err` means the store
/// could not be queried.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Full name of a saved contact.
    async fn contact_name(
        &self,
        address: &ParticipantAddress,
    ) -> Result<Option<String>, StorageError>;

    /// Direct (phone-number) address mapped to an aliased address.
    async fn direct_for_alias(
        &self,
        address: &ParticipantAddress,
    ) -> Result<Option<ParticipantAddress>, StorageError>;
}
