//! Persistence layer.
//!
//! Stores the single last-known `BalanceSnapshot`. The record is addressed
//! by a fixed partition/row key pair so there is only ever one of it.
//! SQLite is the default backend; a JSON file works for single-host setups
//! without a database.

pub mod json;
pub mod sqlite;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{BalanceSnapshot, NotifierError};

pub use json::JsonFileStateStore;
pub use sqlite::SqliteStateStore;

/// Partition key of the singleton snapshot record.
pub fn partition_key() -> String {
    Uuid::nil().to_string()
}

/// Row key of the singleton snapshot record.
pub fn row_key() -> String {
    Uuid::nil().to_string()
}

/// Read/write access to the persisted snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    /// The last written snapshot, or `None` if nothing was ever stored.
    async fn read_last(&self) -> Result<Option<BalanceSnapshot>, NotifierError>;

    /// Insert or replace the snapshot. Both fields are always written.
    async fn write_last(&self, snapshot: &BalanceSnapshot) -> Result<(), NotifierError>;
}

/// Open the configured backend.
pub async fn open(cfg: &StorageConfig) -> Result<Box<dyn StateStore>, NotifierError> {
    match cfg.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStateStore::connect(&cfg.database_url).await?;
            match store.updated_at().await? {
                Some(updated_at) => info!(
                    url = %cfg.database_url,
                    %updated_at,
                    "Using SQLite state store"
                ),
                None => info!(url = %cfg.database_url, "Using SQLite state store, no snapshot yet"),
            }
            Ok(Box::new(store))
        }
        StorageBackend::Json => {
            info!(path = %cfg.json_path, "Using JSON file state store");
            Ok(Box::new(JsonFileStateStore::new(&cfg.json_path)))
        }
    }
}
