//! Balance Notifier entry point.
//!
//! Loads configuration, initialises structured logging, resolves
//! credentials, wires the Plaid source, snapshot store and Twilio sink into
//! a pipeline, and runs it on a fixed interval until Ctrl+C.

use anyhow::{Context, Result};
use tracing::info;

use balance_notifier::banking::plaid::PlaidClient;
use balance_notifier::config::{self, AppConfig};
use balance_notifier::engine::{run_schedule, Pipeline};
use balance_notifier::secrets::EnvSecrets;
use balance_notifier::sms::twilio::TwilioClient;
use balance_notifier::storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("BALANCE_NOTIFIER_CONFIG")
        .unwrap_or_else(|_| config::DEFAULT_CONFIG_FILE.to_string());
    let cfg = AppConfig::load_or_default(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        interval_secs = cfg.schedule.interval_secs,
        max_retries = cfg.retry.max_retries,
        storage = ?cfg.storage.backend,
        "Balance notifier starting up"
    );

    // -- Initialise components -------------------------------------------
    // Missing credentials fail here, before the first run.

    let http = cfg.http_client()?;
    let retry = cfg.retry.policy();
    let secrets = EnvSecrets;

    let source = PlaidClient::from_config(http.clone(), &cfg.banking, &secrets, retry)
        .context("Failed to configure banking source")?;
    let sink = TwilioClient::from_config(http, &cfg.sms, &secrets, retry)
        .context("Failed to configure SMS sink")?;
    let store = storage::open(&cfg.storage)
        .await
        .context("Failed to open state store")?;

    let pipeline = Pipeline::new(Box::new(source), store, Box::new(sink));

    // -- Main loop -------------------------------------------------------

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let report = run_schedule(&pipeline, cfg.interval(), cfg.schedule.run_on_start, shutdown).await;

    info!(
        runs = report.runs,
        notified = report.notified,
        unchanged = report.unchanged,
        skipped = report.skipped,
        failed = report.failed,
        "Balance notifier shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("balance_notifier=info"));

    let json_logging = std::env::var("BALANCE_NOTIFIER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
