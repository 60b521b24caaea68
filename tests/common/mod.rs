// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;
use wallet_ledger::application::{FixedClock, LedgerEngine};
use wallet_ledger::domain::{Cents, Wallet};
use wallet_ledger::storage::{LedgerStore, StoreConfig};

/// Config pointing at a fresh database inside `dir`.
pub fn test_config(dir: &TempDir) -> StoreConfig {
    StoreConfig::for_path(&dir.path().join("test.db"))
}

/// Helper to create a test engine with a temporary database
pub async fn test_engine() -> Result<(LedgerEngine, TempDir)> {
    let temp_dir = TempDir::new()?;
    let engine = LedgerEngine::init(&test_config(&temp_dir)).await?;
    Ok((engine, temp_dir))
}

/// Helper to create a test engine whose clock the test controls
pub async fn test_engine_with_clock(
    now: DateTime<Utc>,
) -> Result<(LedgerEngine, Arc<FixedClock>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = LedgerStore::init(&test_config(&temp_dir)).await?;
    let clock = Arc::new(FixedClock::new(now));
    let engine = LedgerEngine::with_clock(store, clock.clone());
    Ok((engine, clock, temp_dir))
}

/// Helper to build a UTC timestamp
pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, min, sec)
        .unwrap()
        .and_utc()
}

/// Create a wallet and fund it with a top-up (skipped when `amount` is 0)
pub async fn funded_wallet(
    engine: &LedgerEngine,
    firstname: &str,
    amount: Cents,
) -> Result<Wallet> {
    let wallet = engine.create_wallet(firstname, "Tester").await?;
    if amount > 0 {
        engine.top_up(&wallet.id, amount).await?;
    }
    Ok(engine.wallet(&wallet.id).await?)
}

/// Assert that every balance still equals its replayed history
pub async fn assert_reconciled(engine: &LedgerEngine) -> Result<()> {
    let report = engine.reconcile().await?;
    assert!(
        report.is_consistent(),
        "ledger out of balance: {:?}",
        report
    );
    Ok(())
}
