//! Storage layer
//!
//! Entity stores for the simulated ledger, key vaults, and the encryption
//! used to keep secrets at rest.

pub mod entity_store;
pub mod keys;
pub mod models;
pub mod sqlite_store;
pub mod vault;

pub use entity_store::{EntityStore, MemoryEntityStore, StorageError};
pub use models::{AddressRecord, RecordFilter};
pub use sqlite_store::SqliteEntityStore;
pub use vault::{secret_key, FileKeyVault, KeyVault, MemoryKeyVault, VaultError};
