//! End-to-end runs: real clients, fake upstreams, file-backed stores.

use std::path::PathBuf;

use balance_notifier::engine::{Pipeline, RunOutcome};
use balance_notifier::storage::{JsonFileStateStore, SqliteStateStore, StateStore};
use balance_notifier::types::BalanceSnapshot;

use crate::mock_upstream::MockUpstream;

fn temp_path(ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bn_it_{}.{ext}", uuid::Uuid::new_v4()))
}

fn pipeline(upstream: &MockUpstream, store: Box<dyn StateStore>) -> Pipeline {
    Pipeline::new(
        Box::new(upstream.plaid_client()),
        store,
        Box::new(upstream.twilio_client()),
    )
}

fn snap(depository: &str, credit: &str) -> BalanceSnapshot {
    BalanceSnapshot::new(Some(depository.into()), Some(credit.into()))
}

#[tokio::test]
async fn test_first_run_then_idempotent_second_run() {
    let upstream = MockUpstream::start().await;
    upstream.set_balances(100.0, 50.0);
    let path = temp_path("json");
    let pipeline = pipeline(&upstream, Box::new(JsonFileStateStore::new(&path)));

    let first = pipeline.run().await.unwrap();
    assert_eq!(first, RunOutcome::Notified(snap("$100.00", "$50.00")));

    let second = pipeline.run().await.unwrap();
    assert_eq!(second, RunOutcome::Unchanged);
    assert_eq!(upstream.messages().len(), 1);

    let stored = JsonFileStateStore::new(&path).read_last().await.unwrap();
    assert_eq!(stored, Some(snap("$100.00", "$50.00")));
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_credit_change_notifies_with_both_values() {
    let upstream = MockUpstream::start().await;
    let path = temp_path("json");
    let store = JsonFileStateStore::new(&path);
    store.write_last(&snap("$100.00", "$50.00")).await.unwrap();
    upstream.set_balances(100.0, 75.0);

    let outcome = pipeline(&upstream, Box::new(JsonFileStateStore::new(&path)))
        .run()
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::Notified(snap("$100.00", "$75.00")));

    let messages = upstream.messages();
    assert_eq!(messages.len(), 1);
    let body = &messages[0].form["Body"];
    assert!(body.contains("$100.00"));
    assert!(body.contains("$75.00"));

    assert_eq!(store.read_last().await.unwrap(), Some(snap("$100.00", "$75.00")));
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_sub_cent_change_is_not_a_change() {
    let upstream = MockUpstream::start().await;
    let path = temp_path("json");
    let store = JsonFileStateStore::new(&path);
    store.write_last(&snap("$100.00", "$50.00")).await.unwrap();
    upstream.set_balances(100.001, 50.004);

    let outcome = pipeline(&upstream, Box::new(JsonFileStateStore::new(&path)))
        .run()
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::Unchanged);
    assert!(upstream.messages().is_empty());
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_fetch_outage_leaves_store_untouched() {
    let upstream = MockUpstream::start().await;
    upstream.set_balances(100.0, 75.0);
    upstream.fail_balance_calls(4);
    let path = temp_path("json");
    let store = JsonFileStateStore::new(&path);
    store.write_last(&snap("$100.00", "$50.00")).await.unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let err = pipeline(&upstream, Box::new(JsonFileStateStore::new(&path)))
        .run()
        .await
        .unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(upstream.balance_calls(), 4);
    assert_eq!(upstream.sms_calls(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_fetch_outage_on_bootstrap_creates_nothing() {
    let upstream = MockUpstream::start().await;
    upstream.fail_balance_calls(4);
    let path = temp_path("json");

    let result = pipeline(&upstream, Box::new(JsonFileStateStore::new(&path)))
        .run()
        .await;
    assert!(result.is_err());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_failed_send_is_not_retried_next_run() {
    let upstream = MockUpstream::start().await;
    upstream.set_balances(100.0, 50.0);
    upstream.fail_sms_calls(4);
    let path = temp_path("json");
    let pipeline = pipeline(&upstream, Box::new(JsonFileStateStore::new(&path)));

    let err = pipeline.run().await.unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(upstream.sms_calls(), 4);

    // Snapshot was written before the send, so the change is now "known".
    let stored = JsonFileStateStore::new(&path).read_last().await.unwrap();
    assert_eq!(stored, Some(snap("$100.00", "$50.00")));

    assert_eq!(pipeline.run().await.unwrap(), RunOutcome::Unchanged);
    assert_eq!(upstream.sms_calls(), 4);
    assert!(upstream.messages().is_empty());
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_transient_send_failures_still_notify_once() {
    let upstream = MockUpstream::start().await;
    upstream.set_balances(1.0, 2.0);
    upstream.fail_sms_calls(3);
    let store = SqliteStateStore::connect("sqlite::memory:").await.unwrap();

    let outcome = pipeline(&upstream, Box::new(store)).run().await.unwrap();
    assert!(matches!(outcome, RunOutcome::Notified(_)));
    assert_eq!(upstream.messages().len(), 1);
}

#[tokio::test]
async fn test_sqlite_store_across_pipeline_instances() {
    let upstream = MockUpstream::start().await;
    upstream.set_balances(250.0, -12.5);
    let path = temp_path("db");
    let url = format!("sqlite://{}", path.display());

    let first = pipeline(&upstream, Box::new(SqliteStateStore::connect(&url).await.unwrap()));
    assert_eq!(
        first.run().await.unwrap(),
        RunOutcome::Notified(snap("$250.00", "-$12.50"))
    );
    drop(first);

    let second = pipeline(&upstream, Box::new(SqliteStateStore::connect(&url).await.unwrap()));
    assert_eq!(second.run().await.unwrap(), RunOutcome::Unchanged);
    assert_eq!(upstream.messages().len(), 1);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_missing_category_then_appearing_is_a_change() {
    let upstream = MockUpstream::start().await;
    upstream.set_accounts(serde_json::json!([
        {"type": "depository", "balances": {"current": 10}}
    ]));
    let store = SqliteStateStore::connect("sqlite::memory:").await.unwrap();
    let pipeline = pipeline(&upstream, Box::new(store));

    assert_eq!(
        pipeline.run().await.unwrap(),
        RunOutcome::Notified(BalanceSnapshot::new(Some("$10.00".into()), None))
    );

    upstream.set_balances(10.0, 0.0);
    assert_eq!(
        pipeline.run().await.unwrap(),
        RunOutcome::Notified(snap("$10.00", "$0.00"))
    );
    let body = &upstream.messages()[1].form["Body"];
    assert!(body.contains("Credit: $0.00"));
}

#[tokio::test]
async fn test_empty_accounts_on_first_run_creates_record() {
    let upstream = MockUpstream::start().await;
    upstream.set_accounts(serde_json::json!([]));
    let store = SqliteStateStore::connect("sqlite::memory:").await.unwrap();
    let pipeline = pipeline(&upstream, Box::new(store));

    assert_eq!(
        pipeline.run().await.unwrap(),
        RunOutcome::Notified(BalanceSnapshot::default())
    );
    assert_eq!(pipeline.run().await.unwrap(), RunOutcome::Unchanged);
    assert_eq!(upstream.messages().len(), 1);
}
