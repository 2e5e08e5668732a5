//! Cart route handlers: contents, removal, and checkout.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use rhystic_core::{Money, TradeId};

use super::flash;
use crate::db::{CheckoutError, TradeRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, take_flash};
use crate::state::AppState;

/// Remove-from-cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub trade_id: Option<i32>,
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct BuyForm {
    pub trade_id: Option<i32>,
}

/// Display the cart page.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
) -> Result<Response> {
    let lines = TradeRepository::new(state.pool())
        .cart_for_user(current.id)
        .await?;

    let total = lines.iter().fold(Money::ZERO, |acc, line| {
        acc.checked_add(&line.line_total()).unwrap_or(acc)
    });

    let lines_json: Vec<_> = lines
        .iter()
        .map(|line| {
            json!({
                "trade_id": line.trade_id,
                "card_id": line.card_id,
                "card_name": line.card_name,
                "quantity": line.quantity,
                "unit_price": line.unit_price.to_string(),
                "line_total": line.line_total().to_string(),
            })
        })
        .collect();

    let flash_message = take_flash(&session).await;

    Ok(Json(json!({
        "status": "success",
        "lines": lines_json,
        "total": total.to_string(),
        "flash": flash_message,
    }))
    .into_response())
}

/// Remove a staged trade from the caller's cart.
///
/// The trade itself is only deleted when it actually sat in the caller's
/// cart, so guessing someone else's trade id does nothing.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let Some(trade_id) = form.trade_id else {
        flash(&session, "Invalid input.").await;
        return Ok(Redirect::to("/cart").into_response());
    };

    let removed = TradeRepository::new(state.pool())
        .remove_from_cart(current.id, TradeId::new(trade_id))
        .await?;

    if removed {
        flash(&session, "Removed from your cart.").await;
    } else {
        flash(&session, "That trade is not in your cart.").await;
    }

    Ok(Redirect::to("/cart").into_response())
}

/// Checkout a staged trade: move it into the collection and debit the buyer.
pub async fn buy(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<BuyForm>,
) -> Result<Response> {
    let Some(trade_id) = form.trade_id else {
        flash(&session, "Invalid input.").await;
        return Ok(Redirect::to("/cart").into_response());
    };

    match TradeRepository::new(state.pool())
        .checkout(current.id, TradeId::new(trade_id))
        .await
    {
        Ok(receipt) => {
            tracing::info!(
                user_id = %current.id,
                card_id = %receipt.card_id,
                total = %receipt.total,
                "checkout complete"
            );
            flash(
                &session,
                &format!(
                    "Purchased {} card(s) for {}. New balance: {}.",
                    receipt.quantity, receipt.total, receipt.new_balance
                ),
            )
            .await;
        }
        Err(CheckoutError::NotInCart) => {
            flash(&session, "That trade is not in your cart.").await;
        }
        Err(CheckoutError::InsufficientFunds { balance, required }) => {
            flash(
                &session,
                &format!("Insufficient funds: {required} needed, {balance} available."),
            )
            .await;
        }
        Err(CheckoutError::Repository(e)) => return Err(AppError::Database(e)),
    }

    Ok(Redirect::to("/cart").into_response())
}
