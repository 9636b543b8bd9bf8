//! Storage crate: read access to the session's identity store.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`identity_store`] – IdentityStore trait (contact lookup, alias mapping)
//! - [`sqlite_identity_store`] – SqliteIdentityStore over the session database
//! - [`inmemory_identity_store`] – InMemoryIdentityStore for tests and tooling
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod identity_store;
mod inmemory_identity_store;
mod sqlite_identity_store;
mod sqlite_pool;

pub use error::StorageError;
pub use identity_store::IdentityStore;
pub use inmemory_identity_store::InMemoryIdentityStore;
pub use sqlite_identity_store::{SqliteIdentityStore, CONTACTS_TABLE, LID_MAP_TABLE};
pub use sqlite_pool::SqlitePoolManager;
