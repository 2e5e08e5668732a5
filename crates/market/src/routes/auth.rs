//! Account lifecycle route handlers: signup, login, logout.
//!
//! Signup and login answer with JSON status documents (they are exercised by
//! API-level smoke tests); logout clears the session and redirects.

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_user, set_current_user, take_flash};
use crate::models::session::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Signup form data. Fields are optional so that missing input surfaces as a
/// validation failure instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the signup page.
pub async fn signup_page(session: Session) -> impl IntoResponse {
    let flash = take_flash(&session).await;
    Json(json!({ "page": "signup", "flash": flash }))
}

/// Handle signup form submission.
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let (Some(name), Some(username), Some(email), Some(password)) = (
        non_empty(form.name),
        non_empty(form.username),
        non_empty(form.email),
        non_empty(form.password),
    ) else {
        return Err(AppError::BadRequest("Invalid input".to_owned()));
    };

    let user = AuthService::new(state.pool())
        .register(&name, &username, &email, &password)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "User registered successfully",
        })),
    )
        .into_response())
}

/// Display the login page.
pub async fn login_page(session: Session) -> impl IntoResponse {
    let flash = take_flash(&session).await;
    Json(json!({ "page": "login", "flash": flash }))
}

/// Handle login form submission.
///
/// On success the session receives the identity snapshot; authoritative user
/// data (balance, profile) is always re-fetched from the store per request.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let (Some(username), Some(password)) = (non_empty(form.username), non_empty(form.password))
    else {
        return Err(AppError::BadRequest("Invalid input".to_owned()));
    };

    let user = AuthService::new(state.pool())
        .login(&username, &password)
        .await?;

    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("failed to write session: {e}")))?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Login successful",
        })),
    )
        .into_response())
}

/// Handle logout.
///
/// Clears the identity snapshot and destroys the whole session.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }

    Redirect::to("/login").into_response()
}

/// Collapse absent and blank form fields into `None`.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
