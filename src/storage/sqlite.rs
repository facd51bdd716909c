//! SQLite-backed snapshot store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

use super::{partition_key, row_key, StateStore};
use crate::types::{BalanceSnapshot, NotifierError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS balance_snapshots (
    partition_key               TEXT NOT NULL,
    row_key                     TEXT NOT NULL,
    depository_account_balance  TEXT,
    credit_card_account_balance TEXT,
    updated_at                  TEXT NOT NULL,
    PRIMARY KEY (partition_key, row_key)
)";

const SELECT_SNAPSHOT: &str = "
SELECT depository_account_balance, credit_card_account_balance
FROM balance_snapshots
WHERE partition_key = ?1 AND row_key = ?2";

const UPSERT_SNAPSHOT: &str = "
INSERT INTO balance_snapshots
    (partition_key, row_key, depository_account_balance, credit_card_account_balance, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT (partition_key, row_key) DO UPDATE SET
    depository_account_balance  = excluded.depository_account_balance,
    credit_card_account_balance = excluded.credit_card_account_balance,
    updated_at                  = excluded.updated_at";

fn storage_err(context: &str, e: sqlx::Error) -> NotifierError {
    NotifierError::Storage(format!("{context}: {e}"))
}

pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Connect (creating the database file if needed) and ensure the schema.
    ///
    /// A single connection is kept open so `sqlite::memory:` databases
    /// survive between calls.
    pub async fn connect(url: &str) -> Result<Self, NotifierError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| storage_err("Invalid database URL", e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| storage_err("Failed to open database", e))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| storage_err("Failed to create schema", e))?;

        Ok(Self { pool })
    }

    /// When the snapshot was last written (RFC 3339), if ever.
    pub async fn updated_at(&self) -> Result<Option<String>, NotifierError> {
        let row = sqlx::query(
            "SELECT updated_at FROM balance_snapshots WHERE partition_key = ?1 AND row_key = ?2",
        )
        .bind(partition_key())
        .bind(row_key())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to read snapshot", e))?;

        row.map(|r| r.try_get::<String, _>("updated_at"))
            .transpose()
            .map_err(|e| storage_err("Malformed snapshot row", e))
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn read_last(&self) -> Result<Option<BalanceSnapshot>, NotifierError> {
        let row = sqlx::query(SELECT_SNAPSHOT)
            .bind(partition_key())
            .bind(row_key())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("Failed to read snapshot", e))?;

        let Some(row) = row else {
            debug!("No stored snapshot");
            return Ok(None);
        };

        let snapshot = BalanceSnapshot::new(
            row.try_get("depository_account_balance")
                .map_err(|e| storage_err("Malformed snapshot row", e))?,
            row.try_get("credit_card_account_balance")
                .map_err(|e| storage_err("Malformed snapshot row", e))?,
        );
        Ok(Some(snapshot))
    }

    async fn write_last(&self, snapshot: &BalanceSnapshot) -> Result<(), NotifierError> {
        sqlx::query(UPSERT_SNAPSHOT)
            .bind(partition_key())
            .bind(row_key())
            .bind(snapshot.depository_balance.as_deref())
            .bind(snapshot.credit_balance.as_deref())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("Failed to write snapshot", e))?;

        debug!(%snapshot, "Snapshot stored");
        Ok(())
    }
}
