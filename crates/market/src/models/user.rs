//! User domain types.

use chrono::{DateTime, Utc};

use rhystic_core::{Email, Money, UserId, Username};

/// A marketplace user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login name (unique).
    pub username: Username,
    /// Contact email address.
    pub email: Email,
    /// Account balance available for checkout.
    pub balance: Money,
    /// Optional avatar image reference.
    pub avatar_url: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated data for creating a user at signup.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: Username,
    pub email: Email,
    pub password_hash: String,
    pub balance: Money,
}
