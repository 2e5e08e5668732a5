//! Card repository: catalog mirror and owned-card counts.

use sqlx::SqlitePool;

use rhystic_core::UserId;

use super::RepositoryError;
use crate::models::card::{Card, OwnedCard};

/// Repository for card and collection database operations.
pub struct CardRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CardRepository<'a> {
    /// Create a new card repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a card if its identifier has not been seen before.
    ///
    /// Idempotent: an existing row is left untouched, so the first-seen
    /// attributes win and repeated calls never error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn ensure_known(&self, card: &Card) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cardinfo (id, name, oracle_text, image_url, mana_cost, price, rarity)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&card.id)
        .bind(&card.name)
        .bind(&card.oracle_text)
        .bind(&card.image_url)
        .bind(&card.mana_cost)
        .bind(card.price)
        .bind(&card.rarity)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get a card by its catalog identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, card_id: &str) -> Result<Option<Card>, RepositoryError> {
        let card: Option<Card> = sqlx::query_as(
            "SELECT id, name, oracle_text, image_url, mana_cost, price, rarity
             FROM cardinfo WHERE id = ?1",
        )
        .bind(card_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(card)
    }

    /// List a user's collection with owned counts, ordered by card name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owned_by(&self, user_id: UserId) -> Result<Vec<OwnedCard>, RepositoryError> {
        let cards: Vec<OwnedCard> = sqlx::query_as(
            "SELECT ci.id, ci.name, ci.oracle_text, ci.image_url, ci.mana_cost, ci.price,
                    ci.rarity, uc.owned_count
             FROM user_to_card uc
             JOIN cardinfo ci ON ci.id = uc.card_id
             WHERE uc.user_id = ?1
             ORDER BY ci.name ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(cards)
    }

    /// Add copies of a card to a user's collection.
    ///
    /// Inserts the (user, card) pair on first acquisition and increments the
    /// owned count on subsequent ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add_owned(
        &self,
        user_id: UserId,
        card_id: &str,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_to_card (user_id, card_id, owned_count)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, card_id)
             DO UPDATE SET owned_count = owned_count + excluded.owned_count",
        )
        .bind(user_id)
        .bind(card_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
