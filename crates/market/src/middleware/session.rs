//! Session middleware configuration.
//!
//! Sets up SQLite-backed sessions using tower-sessions, and the one-shot
//! flash message stored alongside the login snapshot.

use sqlx::SqlitePool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::MarketConfig;
use crate::models::session::keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "rhystic_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with SQLite store.
///
/// The store's `sessions` table must exist; call
/// [`SqliteStore::migrate`] once at startup.
///
/// # Arguments
///
/// * `pool` - SQLite connection pool
/// * `config` - Marketplace configuration (for cookie security)
#[must_use]
pub fn create_session_layer(
    pool: &SqlitePool,
    config: &MarketConfig,
) -> SessionManagerLayer<SqliteStore> {
    let store = SqliteStore::new(pool.clone());

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Store a one-shot flash message shown on the next page load.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(
    session: &Session,
    message: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::FLASH, message).await
}

/// Take the pending flash message, clearing it from the session.
pub async fn take_flash(session: &Session) -> Option<String> {
    session.remove::<String>(keys::FLASH).await.ok().flatten()
}
