//! Store route handlers: catalog search and add-to-cart.

use axum::{
    Form, Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use rhystic_core::Money;

use super::flash;
use crate::db::{CardRepository, CartAdd, TradeRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::card::Card;
use crate::state::AppState;

/// Query parameters for `/store/search`.
///
/// `sort_by` and `dir` only take effect as a pair; the catalog decides the
/// default ordering otherwise.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub sort_by: Option<String>,
    pub dir: Option<String>,
}

/// Add-to-cart form data: the card attribute bundle captured from a search
/// result plus the quoted unit price.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub card_id: Option<String>,
    pub name: Option<String>,
    pub oracle_text: Option<String>,
    pub image_url: Option<String>,
    pub mana_cost: Option<String>,
    pub price: Option<String>,
    pub rarity: Option<String>,
}

/// Proxied catalog search. Open to unauthenticated users (read-only).
///
/// Catalog failures (down, slow, no match) surface as an empty result set
/// with a message - never as a server error.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response> {
    let Some(q) = params.q.filter(|q| !q.trim().is_empty()) else {
        return Err(AppError::BadRequest("Invalid input".to_owned()));
    };

    match state
        .scryfall()
        .search(&q, params.sort_by.as_deref(), params.dir.as_deref())
        .await
    {
        Ok(results) => Ok(Json(json!({
            "status": "success",
            "query": q,
            "sort_by": params.sort_by,
            "dir": params.dir,
            "results": results,
        }))
        .into_response()),
        Err(e) => {
            tracing::warn!(query = %q, "Catalog search failed: {e}");
            Ok(Json(json!({
                "status": "success",
                "query": q,
                "results": [],
                "message": "Card not found",
            }))
            .into_response())
        }
    }
}

/// Stage a searched card into the caller's cart.
///
/// The card is recorded in the catalog mirror if unseen, then either a new
/// staging trade is created or the existing one for this card is incremented.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let (Some(card_id), Some(name), Some(price_raw)) = (
        form.card_id.filter(|v| !v.trim().is_empty()),
        form.name.filter(|v| !v.trim().is_empty()),
        form.price.filter(|v| !v.trim().is_empty()),
    ) else {
        flash(&session, "Invalid input.").await;
        return Ok(Redirect::to("/cart").into_response());
    };

    let Ok(price) = Money::parse(&price_raw) else {
        flash(&session, "Invalid input.").await;
        return Ok(Redirect::to("/cart").into_response());
    };

    let card = Card {
        id: card_id,
        name,
        oracle_text: form.oracle_text.unwrap_or_default(),
        image_url: form.image_url.unwrap_or_default(),
        mana_cost: form
            .mana_cost
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "{}".to_owned()),
        price,
        rarity: form.rarity.unwrap_or_default(),
    };

    CardRepository::new(state.pool()).ensure_known(&card).await?;

    let outcome = TradeRepository::new(state.pool())
        .add_to_cart(current.id, &card.id, price)
        .await?;

    let message = match outcome {
        CartAdd::Created(_) => format!("Added {} to your cart.", card.name),
        CartAdd::Incremented { quantity, .. } => {
            format!("{} in your cart x{quantity}.", card.name)
        }
    };
    flash(&session, &message).await;

    Ok(Redirect::to("/cart").into_response())
}
