//! Trade route handlers: browse listings and create new ones.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use rhystic_core::Money;

use super::flash;
use crate::db::{CardRepository, TradeRepository};
use crate::error::Result;
use crate::middleware::{RequireAuth, take_flash};
use crate::state::AppState;

/// Create-listing form data: a card name resolved through the catalog, plus
/// optional quantity (default 1) and asking price (default: the catalog's
/// reference price).
#[derive(Debug, Deserialize)]
pub struct CreateTradeForm {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<String>,
}

/// Browse all listings, newest first, with card names and seller identity.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    session: Session,
) -> Result<Response> {
    let listings = TradeRepository::new(state.pool()).list_with_sellers().await?;
    let flash_message = take_flash(&session).await;

    Ok(Json(json!({
        "status": "success",
        "trades": listings,
        "flash": flash_message,
    }))
    .into_response())
}

/// List a card for sale.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<CreateTradeForm>,
) -> Result<Response> {
    let Some(name) = form.name.filter(|v| !v.trim().is_empty()) else {
        flash(&session, "Invalid input.").await;
        return Ok(Redirect::to("/trade").into_response());
    };

    let quantity = form.quantity.unwrap_or(1);
    if quantity < 1 {
        flash(&session, "Invalid input.").await;
        return Ok(Redirect::to("/trade").into_response());
    }

    let card = match state.scryfall().find_by_name(&name).await {
        Ok(card) => card,
        Err(e) => {
            tracing::warn!(card = %name, "Catalog lookup failed: {e}");
            flash(&session, "Card not found.").await;
            return Ok(Redirect::to("/trade").into_response());
        }
    };

    let price = match form.price.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => match Money::parse(raw) {
            Ok(price) => price,
            Err(_) => {
                flash(&session, "Invalid input.").await;
                return Ok(Redirect::to("/trade").into_response());
            }
        },
        None => card.price,
    };

    CardRepository::new(state.pool()).ensure_known(&card).await?;

    let trade_id = TradeRepository::new(state.pool())
        .create_listing(current.id, &card.id, quantity, price)
        .await?;

    tracing::info!(
        user_id = %current.id,
        trade_id = %trade_id,
        card_id = %card.id,
        "trade listed"
    );
    flash(
        &session,
        &format!("Listed {quantity} x {} at {price}.", card.name),
    )
    .await;

    Ok(Redirect::to("/trade").into_response())
}
