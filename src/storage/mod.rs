mod config;
mod store;
mod unit_of_work;

pub use config::*;
pub use store::*;
pub use unit_of_work::*;

/// SQL migration for the wallet and transaction tables
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
