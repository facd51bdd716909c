//! Interval loop that triggers pipeline runs until shutdown.

use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::pipeline::{Pipeline, RunOutcome};

/// Tally of runs over the lifetime of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub runs: u64,
    pub unchanged: u64,
    pub notified: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl ScheduleReport {
    fn record(&mut self, outcome: &Result<RunOutcome, crate::types::NotifierError>) {
        self.runs += 1;
        match outcome {
            Ok(RunOutcome::Unchanged) => self.unchanged += 1,
            Ok(RunOutcome::Notified(_)) => self.notified += 1,
            Ok(RunOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Run the pipeline every `interval` until `shutdown` resolves.
///
/// A failed run is logged and abandoned; the next tick starts fresh.
/// Ticks missed while a run is slow are dropped rather than bursted.
pub async fn run_schedule<S>(
    pipeline: &Pipeline,
    interval: Duration,
    run_on_start: bool,
    shutdown: S,
) -> ScheduleReport
where
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    if !run_on_start {
        // The first tick completes immediately; consume it.
        ticker.tick().await;
    }

    tokio::pin!(shutdown);
    let mut report = ScheduleReport::default();

    info!(
        interval_secs = interval.as_secs(),
        "Entering schedule loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = pipeline.run().await;
                report.record(&outcome);
                match outcome {
                    Ok(RunOutcome::Notified(snapshot)) => {
                        info!(run = report.runs, %snapshot, "Run complete: notified");
                    }
                    Ok(RunOutcome::Unchanged) => {
                        info!(run = report.runs, "Run complete: unchanged");
                    }
                    Ok(RunOutcome::Skipped) => {
                        info!(run = report.runs, "Run skipped");
                    }
                    Err(e) => {
                        error!(run = report.runs, error = %e, "Run failed, continuing to next");
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    report
}
