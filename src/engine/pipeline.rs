//! Change-detection pipeline.
//!
//! One run: fetch current balances, read the stored snapshot, compare the
//! formatted strings, and on any difference write the new snapshot and
//! then send the text. With no stored snapshot the run always counts as a
//! change, even when every balance is absent. The write always happens before the send, so a
//! send that fails after retries leaves the change recorded but
//! un-notified; the next run sees no difference.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::banking::BalanceSource;
use crate::sms::NotificationSink;
use crate::storage::StateStore;
use crate::types::{BalanceSnapshot, NotifierError};

/// What a single run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Balances match the stored snapshot; nothing written or sent.
    Unchanged,
    /// A change was stored and the notification sent.
    Notified(BalanceSnapshot),
    /// Another run was already in flight.
    Skipped,
}

pub struct Pipeline {
    source: Box<dyn BalanceSource>,
    store: Box<dyn StateStore>,
    sink: Box<dyn NotificationSink>,
    /// Serializes read-compare-write-notify within this process.
    run_guard: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn BalanceSource>,
        store: Box<dyn StateStore>,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        Self {
            source,
            store,
            sink,
            run_guard: Mutex::new(()),
        }
    }

    /// Execute one run. Overlapping calls are skipped, not queued.
    pub async fn run(&self) -> Result<RunOutcome, NotifierError> {
        let Ok(_guard) = self.run_guard.try_lock() else {
            warn!("Previous run still in progress, skipping");
            return Ok(RunOutcome::Skipped);
        };

        // Fetching
        let current = self.source.fetch().await?;

        // Comparing
        match self.store.read_last().await? {
            None => info!(%current, "No stored snapshot, treating first run as a change"),
            Some(previous) if current.differs_from(&previous) => {
                info!(%previous, %current, "Balance change detected");
            }
            Some(_) => {
                debug!(%current, "Balances unchanged");
                return Ok(RunOutcome::Unchanged);
            }
        }

        // Persisting-and-notifying
        self.store.write_last(&current).await?;
        self.sink.send(&current.notification_body()).await.map_err(|e| {
            warn!(error = %e, "Snapshot stored but notification failed; change will not be re-sent");
            e
        })?;

        info!(%current, "Notification sent");
        Ok(RunOutcome::Notified(current))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
