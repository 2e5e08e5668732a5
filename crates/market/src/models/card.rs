//! Card domain types.
//!
//! A [`Card`] is the attribute bundle keyed by the external catalog
//! identifier. The same shape is used for catalog lookups and for rows read
//! back from `cardinfo` - card rows are immutable once inserted.

use serde::Serialize;

use rhystic_core::Money;

/// Card attributes keyed by the external catalog identifier.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Card {
    /// External catalog identifier (stable, primary key).
    pub id: String,
    /// Card name.
    pub name: String,
    /// Rules text.
    pub oracle_text: String,
    /// Image reference.
    pub image_url: String,
    /// Cost symbol string, e.g. `{2}{U}` (`{}` when the card has no cost).
    pub mana_cost: String,
    /// Reference price quoted by the catalog.
    pub price: Money,
    /// Printed rarity.
    pub rarity: String,
}

/// A card in a user's collection, with its owned count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OwnedCard {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub card: Card,
    /// How many copies the user owns.
    pub owned_count: i64,
}
