//! HTTP route handlers for the marketplace.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /welcome                - Smoke-test endpoint (fixed JSON acknowledgement)
//!
//! # Auth
//! GET  /signup                 - Signup page
//! POST /signup                 - Register a new account
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /logout                 - Logout action
//!
//! # Profile (requires auth)
//! GET  /profile                - Profile, balance and collection
//! POST /profile/edit           - Update display name / login name / avatar
//! POST /profile/add_card       - Resolve a card by name and add it to the collection
//!
//! # Store
//! GET  /store/search           - Proxied catalog search (?q=..[&sort_by=..&dir=..])
//! POST /store/search/add       - Stage a searched card into the cart (requires auth)
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart contents
//! POST /cart/remove            - Remove a staged trade
//! POST /cart/buy               - Checkout a staged trade
//!
//! # Trades (requires auth)
//! GET  /trade                  - Browse listings (newest first)
//! POST /trade/create           - List a card for sale
//! ```

pub mod auth;
pub mod cart;
pub mod home;
pub mod profile;
pub mod store;
pub mod trade;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show))
        .route("/edit", post(profile::edit))
        .route("/add_card", post(profile::add_card))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(store::search))
        .route("/search/add", post(store::add))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/remove", post(cart::remove))
        .route("/buy", post(cart::buy))
}

/// Create the trade routes router.
pub fn trade_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(trade::index))
        .route("/create", post(trade::create))
}

/// Create all routes for the marketplace.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/welcome", get(home::welcome))
        .merge(auth_routes())
        .nest("/profile", profile_routes())
        .nest("/store", store_routes())
        .nest("/cart", cart_routes())
        .nest("/trade", trade_routes())
}

/// Store a flash message, logging (but not failing the request) if the
/// session write goes wrong.
pub(crate) async fn flash(session: &Session, message: &str) {
    if let Err(e) = crate::middleware::set_flash(session, message).await {
        tracing::error!("Failed to store flash message: {e}");
    }
}
