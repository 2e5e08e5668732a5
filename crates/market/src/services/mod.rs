//! Business logic services for the marketplace.
//!
//! # Services
//!
//! - `auth` - Account registration, login, and profile updates

pub mod auth;
