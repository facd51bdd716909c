//! JSON file snapshot store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{partition_key, row_key, StateStore};
use crate::types::{BalanceSnapshot, NotifierError};

/// On-disk shape: the snapshot plus its key pair.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    partition_key: String,
    row_key: String,
    #[serde(flatten)]
    snapshot: BalanceSnapshot,
}

pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn read_last(&self) -> Result<Option<BalanceSnapshot>, NotifierError> {
        let path = self.path.display();

        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(%path, "No saved snapshot found, starting fresh");
                return Ok(None);
            }
            Err(e) => {
                return Err(NotifierError::Storage(format!(
                    "Failed to read snapshot from {path}: {e}"
                )))
            }
        };

        let record: SnapshotRecord = serde_json::from_str(&json)
            .map_err(|e| NotifierError::Storage(format!("Failed to parse snapshot from {path}: {e}")))?;

        Ok(Some(record.snapshot))
    }

    async fn write_last(&self, snapshot: &BalanceSnapshot) -> Result<(), NotifierError> {
        let path = self.path.display();
        let record = SnapshotRecord {
            partition_key: partition_key(),
            row_key: row_key(),
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| NotifierError::Storage(format!("Failed to serialise snapshot: {e}")))?;

        // Write-then-rename so a crash never leaves a torn file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| NotifierError::Storage(format!("Failed to write snapshot to {path}: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| NotifierError::Storage(format!("Failed to write snapshot to {path}: {e}")))?;

        debug!(%path, %snapshot, "Snapshot saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
