//! Banking data sources.
//!
//! Defines the `BalanceSource` trait, the account payload shared by
//! aggregator integrations, and the currency formatting that turns raw
//! balances into snapshot strings.

pub mod plaid;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::types::{BalanceSnapshot, NotifierError};

pub const DEPOSITORY: &str = "depository";
pub const CREDIT: &str = "credit";

/// Abstraction over a remote source of account balances.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fetch the current depository and credit balances.
    async fn fetch(&self) -> Result<BalanceSnapshot, NotifierError>;
}

// ---------------------------------------------------------------------------
// Account payload
// ---------------------------------------------------------------------------

/// Top-level balances response: a list of accounts.
#[derive(Debug, Default, Deserialize)]
pub struct AccountsResponse {
    #[serde(default)]
    pub accounts: Option<Vec<Account>>,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
    #[serde(default)]
    pub balances: Option<Balances>,
}

#[derive(Debug, Deserialize)]
pub struct Balances {
    /// Total funds in, or owed by, the account.
    #[serde(default)]
    pub current: Option<Decimal>,
}

impl AccountsResponse {
    /// First account of the given type, by upstream order.
    pub fn first_of_type(&self, account_type: &str) -> Option<&Account> {
        self.accounts
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|a| a.account_type.as_deref() == Some(account_type))
    }

    fn formatted_balance(&self, account_type: &str) -> Option<String> {
        self.first_of_type(account_type)
            .and_then(|a| a.balances.as_ref())
            .and_then(|b| b.current)
            .map(format_currency)
    }

    /// Reduce the account list to a snapshot of the two tracked categories.
    pub fn to_snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot::new(
            self.formatted_balance(DEPOSITORY),
            self.formatted_balance(CREDIT),
        )
    }
}

// ---------------------------------------------------------------------------
// Currency formatting
// ---------------------------------------------------------------------------

/// Format an amount as en-US currency: `$1,234.56`, negatives as `-$1,234.56`.
///
/// Rounds half away from zero to two decimals.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
