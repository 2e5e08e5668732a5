//! Database operations for the marketplace SQLite store.
//!
//! # Tables
//!
//! - `userinfo` - accounts, password hashes and balances
//! - `cardinfo` - card attributes mirrored from the catalog
//! - `user_to_card` - owned-card counts per (user, card)
//! - `trade` - sell-side listings and cart staging trades
//! - `cart` - buyer-side staging links (user, trade)
//! - `user_to_trade` - seller links for browsable listings
//! - `sessions` - tower-sessions storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are embedded from `crates/market/migrations/` and run at
//! startup via [`MIGRATOR`].

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub mod cards;
pub mod trades;
pub mod users;

pub use cards::CardRepository;
pub use trades::{CartAdd, CheckoutError, CheckoutReceipt, TradeRepository};
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a SQLite connection pool with sensible defaults.
///
/// The database file is created if it does not exist.
///
/// # Arguments
///
/// * `database_url` - SQLite connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options =
        SqliteConnectOptions::from_str(database_url.expose_secret())?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
