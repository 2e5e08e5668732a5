//! Session-related types.
//!
//! The session holds a minimal identity snapshot plus a one-shot flash
//! message. Everything else (balance, profile fields) is re-fetched from the
//! store on each request - the session is a cache of identity, not of state.

use serde::{Deserialize, Serialize};

use rhystic_core::{UserId, Username};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's login name.
    pub username: Username,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the one-shot flash message shown on the next page load.
    pub const FLASH: &str = "flash";
}
