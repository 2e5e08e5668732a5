//! Trade and cart view types.
//!
//! These are joined views over `trade`, `cardinfo`, `cart`, `user_to_trade`
//! and `userinfo`, shaped for the trade-browse and cart pages.

use chrono::{DateTime, Utc};
use serde::Serialize;

use rhystic_core::{Money, TradeId, Username};

/// A browsable sell-side listing with card name and seller identity.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TradeListing {
    pub id: TradeId,
    pub card_id: String,
    pub card_name: String,
    pub quantity: i64,
    /// Unit price.
    pub price: Money,
    /// Login name of the user who listed the trade.
    pub seller: Username,
    pub created_at: DateTime<Utc>,
}

/// A trade staged in a user's cart.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub trade_id: TradeId,
    pub card_id: String,
    pub card_name: String,
    pub quantity: i64,
    /// Unit price quoted when the trade entered the cart.
    pub unit_price: Money,
}

impl CartLine {
    /// Quantity times unit price.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity).unwrap_or(Money::ZERO)
    }
}
