//! Trade repository: listings, cart staging and checkout.
//!
//! Every multi-statement operation here runs inside a single transaction.
//! The cart scan in [`TradeRepository::add_to_cart`] and the balance check in
//! [`TradeRepository::checkout`] are re-validated inside the transaction, so
//! concurrent requests cannot double-insert a cart slot or drive a balance
//! below zero.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;

use rhystic_core::{Money, TradeId, UserId};

use super::RepositoryError;
use crate::models::trade::{CartLine, TradeListing};

/// Outcome of staging a card into a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAdd {
    /// A new staging trade and cart link were created.
    Created(TradeId),
    /// The existing staging trade for this (user, card) pair was incremented.
    Incremented {
        trade_id: TradeId,
        quantity: i64,
    },
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub card_id: String,
    pub quantity: i64,
    pub total: Money,
    pub new_balance: Money,
}

/// Errors specific to the checkout workflow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The trade does not exist or is not in the caller's cart.
    #[error("trade is not in this user's cart")]
    NotInCart,

    /// The buyer's balance does not cover the trade total.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Money, required: Money },

    /// Underlying repository failure; no state was changed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Row type for the checkout trade/cart join.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutLineRow {
    card_id: String,
    quantity: i64,
    price: Money,
}

/// Repository for trade, cart and checkout database operations.
pub struct TradeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TradeRepository<'a> {
    /// Create a new trade repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all browsable trades with card name and seller, newest first.
    ///
    /// Cart staging trades have no seller link and are excluded by the join,
    /// so every returned listing has a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_sellers(&self) -> Result<Vec<TradeListing>, RepositoryError> {
        let listings: Vec<TradeListing> = sqlx::query_as(
            "SELECT t.id, t.card_id, ci.name AS card_name, t.quantity, t.price,
                    ui.username AS seller, t.created_at
             FROM trade t
             JOIN cardinfo ci ON ci.id = t.card_id
             JOIN user_to_trade ut ON ut.trade_id = t.id
             JOIN userinfo ui ON ui.id = ut.user_id
             ORDER BY t.created_at DESC, t.id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(listings)
    }

    /// List the trades staged in a user's cart, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines: Vec<CartLine> = sqlx::query_as(
            "SELECT t.id AS trade_id, t.card_id, ci.name AS card_name, t.quantity,
                    t.price AS unit_price
             FROM cart c
             JOIN trade t ON t.id = c.trade_id
             JOIN cardinfo ci ON ci.id = t.card_id
             WHERE c.user_id = ?1
             ORDER BY t.created_at DESC, t.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Stage a card into a user's cart.
    ///
    /// If the user already has a staging trade for this card, its quantity is
    /// incremented and the original price is kept (a later search quote does
    /// not retroactively change an already-queued line). Otherwise a new
    /// trade (quantity 1, the given unit price) and cart link are created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction rolls back and nothing is staged.
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        card_id: &str,
        unit_price: Money,
    ) -> Result<CartAdd, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(TradeId, i64)> = sqlx::query_as(
            "SELECT t.id, t.quantity
             FROM trade t
             JOIN cart c ON c.trade_id = t.id
             WHERE c.user_id = ?1 AND t.card_id = ?2",
        )
        .bind(user_id)
        .bind(card_id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = if let Some((trade_id, quantity)) = existing {
            sqlx::query("UPDATE trade SET quantity = quantity + 1 WHERE id = ?1")
                .bind(trade_id)
                .execute(&mut *tx)
                .await?;

            CartAdd::Incremented {
                trade_id,
                quantity: quantity + 1,
            }
        } else {
            let trade_id = insert_trade(&mut tx, card_id, 1, unit_price).await?;

            sqlx::query("INSERT INTO cart (user_id, trade_id, count) VALUES (?1, ?2, 1)")
                .bind(user_id)
                .bind(trade_id)
                .execute(&mut *tx)
                .await?;

            CartAdd::Created(trade_id)
        };

        tx.commit().await?;

        Ok(outcome)
    }

    /// Remove a trade from a user's cart and delete the trade itself.
    ///
    /// The trade is only deleted when the caller actually had it in their
    /// cart; a trade id belonging to someone else's cart is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if a cart entry was removed, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        trade_id: TradeId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM cart WHERE user_id = ?1 AND trade_id = ?2")
            .bind(user_id)
            .bind(trade_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM trade WHERE id = ?1")
            .bind(trade_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    /// Convert a cart-staged trade into owned inventory and debit the buyer.
    ///
    /// Runs as one transaction: load the trade via the caller's cart link,
    /// re-read the balance, verify funds, upsert the owned count, delete the
    /// cart link and trade, and write the debited balance. Any failure rolls
    /// the whole operation back.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotInCart` if the trade is not staged in the
    /// caller's cart, `CheckoutError::InsufficientFunds` if the balance does
    /// not cover quantity times unit price, and `CheckoutError::Repository`
    /// for persistence failures. In every error case no rows are changed.
    pub async fn checkout(
        &self,
        user_id: UserId,
        trade_id: TradeId,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let line: Option<CheckoutLineRow> = sqlx::query_as(
            "SELECT t.card_id, t.quantity, t.price
             FROM trade t
             JOIN cart c ON c.trade_id = t.id
             WHERE t.id = ?1 AND c.user_id = ?2",
        )
        .bind(trade_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(line) = line else {
            return Err(CheckoutError::NotInCart);
        };

        let balance: Money = sqlx::query_scalar("SELECT balance FROM userinfo WHERE id = ?1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        let required = line.price.times(line.quantity).ok_or_else(|| {
            RepositoryError::DataCorruption("trade total overflows".to_owned())
        })?;

        let Some(new_balance) = balance.checked_sub(&required) else {
            return Err(CheckoutError::InsufficientFunds { balance, required });
        };

        sqlx::query(
            "INSERT INTO user_to_card (user_id, card_id, owned_count)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, card_id)
             DO UPDATE SET owned_count = owned_count + excluded.owned_count",
        )
        .bind(user_id)
        .bind(&line.card_id)
        .bind(line.quantity)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart WHERE user_id = ?1 AND trade_id = ?2")
            .bind(user_id)
            .bind(trade_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM trade WHERE id = ?1")
            .bind(trade_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE userinfo SET balance = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(new_balance)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CheckoutReceipt {
            card_id: line.card_id,
            quantity: line.quantity,
            total: required,
            new_balance,
        })
    }

    /// Create a sell-side listing: a trade plus its seller link.
    ///
    /// The two inserts share a transaction - a trade with no seller link
    /// would be unbrowsable and unremovable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either insert fails; neither
    /// row is kept.
    pub async fn create_listing(
        &self,
        seller_id: UserId,
        card_id: &str,
        quantity: i64,
        price: Money,
    ) -> Result<TradeId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let trade_id = insert_trade(&mut tx, card_id, quantity, price).await?;

        sqlx::query("INSERT INTO user_to_trade (trade_id, user_id) VALUES (?1, ?2)")
            .bind(trade_id)
            .bind(seller_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(trade_id)
    }
}

/// Insert a trade row and return its id.
async fn insert_trade(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    card_id: &str,
    quantity: i64,
    price: Money,
) -> Result<TradeId, RepositoryError> {
    let (id,): (TradeId,) = sqlx::query_as(
        "INSERT INTO trade (card_id, quantity, price, created_at)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id",
    )
    .bind(card_id)
    .bind(quantity)
    .bind(price)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}
