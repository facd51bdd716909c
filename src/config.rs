//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so an empty or missing table is valid.
//! Credentials are referenced by env-var name and resolved once at startup
//! through a `SecretsProvider`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::retry::{RetryPolicy, DEFAULT_DELAY_MS, DEFAULT_MAX_RETRIES, MAX_RETRIES_CAP};

/// Default config file path.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub schedule: ScheduleConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    pub banking: BankingConfig,
    pub sms: SmsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
    /// Run once immediately instead of waiting for the first interval.
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            run_on_start: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl RetryConfig {
    /// Build the policy, clamping `max_retries` to the hard cap.
    pub fn policy(&self) -> RetryPolicy {
        if self.max_retries > MAX_RETRIES_CAP {
            warn!(
                configured = self.max_retries,
                cap = MAX_RETRIES_CAP,
                "retry.max_retries above cap, clamping"
            );
        }
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.delay_ms))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BankingConfig {
    pub base_url: String,
    pub client_id_env: String,
    pub secret_env: String,
    pub access_token_env: String,
}

impl Default for BankingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://development.plaid.com".to_string(),
            client_id_env: "PLAID_CLIENT_ID".to_string(),
            secret_env: "PLAID_SECRET".to_string(),
            access_token_env: "PLAID_ACCESS_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SmsConfig {
    pub base_url: String,
    pub account_sid_env: String,
    pub auth_token_env: String,
    pub from_number_env: String,
    pub to_number_env: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twilio.com".to_string(),
            account_sid_env: "TWILIO_ACCOUNT_SID".to_string(),
            auth_token_env: "TWILIO_AUTH_TOKEN".to_string(),
            from_number_env: "TWILIO_FROM_NUMBER".to_string(),
            to_number_env: "TWILIO_TO_NUMBER".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
    pub json_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_url: "sqlite://balance_notifier.db".to_string(),
            json_path: "balance_snapshot.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs.max(1))
    }

    /// The shared HTTP transport handed to every upstream client.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .user_agent(concat!("balance-notifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")
    }
}
