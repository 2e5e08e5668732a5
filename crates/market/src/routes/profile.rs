//! Profile route handlers: view, edit, and collection additions.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use super::flash;
use crate::db::CardRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, set_current_user, take_flash};
use crate::models::session::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Profile edit form data.
#[derive(Debug, Deserialize)]
pub struct EditProfileForm {
    pub name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Add-card form data: a fuzzy card name resolved through the catalog.
#[derive(Debug, Deserialize)]
pub struct AddCardForm {
    pub name: Option<String>,
}

/// Display the profile page: authoritative user data plus the collection.
///
/// Balance and profile fields come from the store, not the session snapshot.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
) -> Result<Response> {
    let user = AuthService::new(state.pool())
        .get_user(current.id)
        .await
        .map_err(|e| match e {
            // A session pointing at a deleted account is not logged in
            AuthError::UserNotFound => AppError::Unauthenticated,
            other => other.into(),
        })?;

    let cards = CardRepository::new(state.pool()).owned_by(current.id).await?;
    let flash_message = take_flash(&session).await;

    Ok(Json(json!({
        "status": "success",
        "profile": {
            "name": user.name,
            "username": user.username,
            "email": user.email,
            "balance": user.balance.to_string(),
            "avatar_url": user.avatar_url,
        },
        "cards": cards,
        "flash": flash_message,
    }))
    .into_response())
}

/// Handle profile edit form submission.
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<EditProfileForm>,
) -> Result<Response> {
    let (Some(name), Some(username)) = (
        form.name.filter(|v| !v.trim().is_empty()),
        form.username.filter(|v| !v.trim().is_empty()),
    ) else {
        flash(&session, "Invalid input.").await;
        return Ok(Redirect::to("/profile").into_response());
    };

    let avatar_url = form.avatar_url.filter(|v| !v.trim().is_empty());

    match AuthService::new(state.pool())
        .update_profile(current.id, &name, &username, avatar_url.as_deref())
        .await
    {
        Ok(user) => {
            // Keep the session snapshot in step with the new login name
            let refreshed = CurrentUser {
                id: user.id,
                username: user.username.clone(),
            };
            if let Err(e) = set_current_user(&session, &refreshed).await {
                tracing::error!("Failed to refresh session snapshot: {e}");
            }

            flash(&session, "Profile updated.").await;
        }
        Err(AuthError::UserAlreadyExists) => {
            flash(&session, "Username is already taken.").await;
        }
        Err(AuthError::InvalidUsername(_)) => {
            flash(&session, "Invalid input.").await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/profile").into_response())
}

/// Resolve a card by name through the catalog and add one copy to the
/// caller's collection.
pub async fn add_card(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<AddCardForm>,
) -> Result<Response> {
    let Some(name) = form.name.filter(|v| !v.trim().is_empty()) else {
        flash(&session, "Invalid input.").await;
        return Ok(Redirect::to("/profile").into_response());
    };

    match state.scryfall().find_by_name(&name).await {
        Ok(card) => {
            let cards = CardRepository::new(state.pool());
            cards.ensure_known(&card).await?;
            cards.add_owned(current.id, &card.id, 1).await?;

            flash(&session, &format!("Added {} to your collection.", card.name)).await;
        }
        Err(e) => {
            tracing::warn!(card = %name, "Catalog lookup failed: {e}");
            flash(&session, "Card not found.").await;
        }
    }

    Ok(Redirect::to("/profile").into_response())
}
