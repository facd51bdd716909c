//! Balance Notifier: polls bank balances and texts on change.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod retry;
pub mod secrets;
pub mod banking;
pub mod sms;
pub mod storage;
pub mod engine;
