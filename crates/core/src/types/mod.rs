//! Core types for Rhystic.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use username::{Username, UsernameError};
