//! Shared types for the balance notifier.
//!
//! The snapshot model and the error taxonomy used by every component.
//! Kept free of I/O so the banking, SMS, storage and engine modules can
//! all depend on it without circular references.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Balance snapshot
// ---------------------------------------------------------------------------

/// Last-known balances for the two tracked account categories.
///
/// Values are pre-formatted currency strings (e.g. `"$1,234.56"`), and
/// comparison is textual: two balances that render identically are equal
/// even if the underlying amounts differ past the second decimal.
/// `None` means the category was not present upstream and is distinct
/// from an empty string or a zero balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    #[serde(rename = "depositoryAccountBalance")]
    pub depository_balance: Option<String>,
    #[serde(rename = "creditCardAccountBalance")]
    pub credit_balance: Option<String>,
}

impl BalanceSnapshot {
    pub fn new(depository_balance: Option<String>, credit_balance: Option<String>) -> Self {
        Self {
            depository_balance,
            credit_balance,
        }
    }

    /// Whether neither category has a balance.
    pub fn is_empty(&self) -> bool {
        self.depository_balance.is_none() && self.credit_balance.is_none()
    }

    /// Field-by-field string comparison against a previously stored snapshot.
    pub fn differs_from(&self, previous: &BalanceSnapshot) -> bool {
        self.depository_balance != previous.depository_balance
            || self.credit_balance != previous.credit_balance
    }

    /// Text message body announcing these balances.
    pub fn notification_body(&self) -> String {
        format!(
            "Balance update\nDepository: {}\nCredit: {}",
            display_balance(&self.depository_balance),
            display_balance(&self.credit_balance),
        )
    }
}

fn display_balance(balance: &Option<String>) -> &str {
    balance.as_deref().unwrap_or("unavailable")
}

impl fmt::Display for BalanceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "depository={} credit={}",
            display_balance(&self.depository_balance),
            display_balance(&self.credit_balance),
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by the notifier components.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// A required credential or endpoint value is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An upstream HTTP dependency did not succeed.
    #[error("Upstream error ({service}) after {attempts} attempt(s): {message}")]
    Upstream {
        service: String,
        attempts: u32,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl NotifierError {
    pub fn is_upstream(&self) -> bool {
        matches!(self, NotifierError::Upstream { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, NotifierError::Configuration(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
