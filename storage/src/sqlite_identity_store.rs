//! Identity store over the session database.
//!
//! The session database is owned by the transport; this store only reads the contact and
//! alias-map tables.

use async_trait::async_trait;
use relay_core::ParticipantAddress;
use tracing::{debug, instrument};

use crate::error::StorageError;
use crate::identity_store::IdentityStore;
use crate::sqlite_pool::SqlitePoolManager;

/// Contacts table of the session database (`their_jid`, `full_name`, ...).
pub const CONTACTS_TABLE: &str = "whatsmeow_contacts";
/// Alias map table of the session database (`lid`, `pn`), keyed by user parts.
pub const LID_MAP_TABLE: &str = "whatsmeow_lid_map";

#[derive(Clone)]
pub struct SqliteIdentityStore {
    pool_manager: SqlitePoolManager,
}

impl SqliteIdentityStore {
    /// Opens the session database at `path` read-only.
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::open_read_only(path).await?;
        Ok(Self { pool_manager })
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    #[instrument(skip(self), fields(address = %address))]
    async fn contact_name(
        &self,
        address: &ParticipantAddress,
    ) -> Result<Option<String>, StorageError> {
        let key = address.to_non_device().to_string();
        let sql = format!(
            "SELECT full_name FROM {} WHERE their_jid = ? AND full_name IS NOT NULL AND full_name <> '' LIMIT 1",
            CONTACTS_TABLE
        );
        let name: Option<String> = sqlx::query_scalar(&sql)
            .bind(&key)
            .fetch_optional(self.pool_manager.pool())
            .await?;

        debug!(found = name.is_some(), "Contact lookup");
        Ok(name)
    }

    #[instrument(skip(self), fields(address = %address))]
    async fn direct_for_alias(
        &self,
        address: &ParticipantAddress,
    ) -> Result<Option<ParticipantAddress>, StorageError> {
        if !address.is_aliased() {
            return Ok(None);
        }
        let sql = format!("SELECT pn FROM {} WHERE lid = ? LIMIT 1", LID_MAP_TABLE);
        let phone: Option<String> = sqlx::query_scalar(&sql)
            .bind(&address.raw_id)
            .fetch_optional(self.pool_manager.pool())
            .await?;

        match phone {
            Some(phone) if phone.is_empty() => Err(StorageError::InvalidValue(format!(
                "empty phone mapped to {}",
                address.raw_id
            ))),
            Some(phone) => {
                debug!(phone = %phone, "Alias mapped");
                Ok(Some(ParticipantAddress::direct(phone)))
            }
            None => Ok(None),
        }
    }
}
