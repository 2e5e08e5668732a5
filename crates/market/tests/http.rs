//! HTTP contract tests driven through the real router.
//!
//! The catalog base URL points at an unroutable address, so every catalog
//! lookup fails fast; routes must surface that as "card not found" rather
//! than a server error.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use tower_sessions_sqlx_store::SqliteStore;

use rhystic_market::config::{MarketConfig, ScryfallConfig};
use rhystic_market::db::MIGRATOR;
use rhystic_market::middleware::create_session_layer;
use rhystic_market::routes;
use rhystic_market::state::AppState;

fn test_config() -> MarketConfig {
    MarketConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().expect("valid ip"),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from("k".repeat(32)),
        // Unroutable catalog: lookups fail fast and must read as "not found"
        scryfall: ScryfallConfig {
            base_url: "http://127.0.0.1:1".to_owned(),
            timeout_secs: 1,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory database");

    MIGRATOR.run(&pool).await.expect("run migrations");

    let store = SqliteStore::new(pool.clone());
    store.migrate().await.expect("migrate session store");

    let config = test_config();
    let session_layer = create_session_layer(&pool, &config);
    let state = AppState::new(config, pool).expect("build state");

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .with_state(state)
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).expect("build request"))
        .await
        .expect("send request")
}

async fn post_form(app: &Router, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(builder.body(Body::from(body.to_owned())).expect("build request"))
        .await
        .expect("send request")
}

fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("session cookie present")
        .to_owned()
}

fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header present")
        .to_owned()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Register johndoe and log in, returning the session cookie.
async fn register_and_login(app: &Router) -> String {
    let response = post_form(
        app,
        "/signup",
        "name=John+Doe&username=johndoe&email=john%40example.com&password=password123",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_form(
        app,
        "/login",
        "username=johndoe&password=password123",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    session_cookie(&response)
}

// =============================================================================
// Smoke endpoint
// =============================================================================

#[tokio::test]
async fn welcome_returns_default_message() {
    let app = test_app().await;

    let response = get(&app, "/welcome", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Welcome!");
}

// =============================================================================
// Signup
// =============================================================================

#[tokio::test]
async fn signup_registers_a_user() {
    let app = test_app().await;

    let response = post_form(
        &app,
        "/signup",
        "name=John+Doe&username=johndoe&email=john%40example.com&password=password123",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "User registered successfully");
}

#[tokio::test]
async fn signup_with_missing_password_is_invalid_input() {
    let app = test_app().await;

    let response = post_form(
        &app,
        "/signup",
        "name=Jane+Doe&username=janedoe&email=jane%40example.com",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Invalid input");
}

#[tokio::test]
async fn signup_with_taken_username_conflicts() {
    let app = test_app().await;

    let form = "name=John+Doe&username=johndoe&email=john%40example.com&password=password123";
    let response = post_form(&app, "/signup", form, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_form(&app, "/signup", form, None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Username is already taken");
}

// =============================================================================
// Login / logout
// =============================================================================

#[tokio::test]
async fn login_succeeds_with_valid_credentials() {
    let app = test_app().await;

    let response = post_form(
        &app,
        "/signup",
        "name=John+Doe&username=johndoe&email=john%40example.com&password=password123",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_form(
        &app,
        "/login",
        "username=johndoe&password=password123",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));
    let body = json_body(response).await;
    assert_eq!(body["message"], "Login successful");
}

#[tokio::test]
async fn login_rejects_a_wrong_password() {
    let app = test_app().await;

    let response = post_form(
        &app,
        "/signup",
        "name=John+Doe&username=johndoe&email=john%40example.com&password=password123",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_form(
        &app,
        "/login",
        "username=johndoe&password=wrongpassword",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn protected_pages_redirect_anonymous_users_to_login() {
    let app = test_app().await;

    for uri in ["/profile", "/cart", "/trade"] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login", "{uri}");
    }
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = test_app().await;
    let cookie = register_and_login(&app).await;

    let response = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    // The old cookie no longer authenticates
    let response = get(&app, "/profile", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

// =============================================================================
// Store search
// =============================================================================

#[tokio::test]
async fn search_without_a_query_is_invalid_input() {
    let app = test_app().await;

    let response = get(&app, "/store/search", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Invalid input");
}

#[tokio::test]
async fn search_surfaces_catalog_failure_as_not_found() {
    let app = test_app().await;

    // The test catalog is unreachable; the page must still answer 200
    let response = get(&app, "/store/search?q=lightning+bolt", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["results"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["message"], "Card not found");
}

// =============================================================================
// Cart and checkout
// =============================================================================

#[tokio::test]
async fn full_cart_checkout_flow() {
    let app = test_app().await;
    let cookie = register_and_login(&app).await;

    // Stage a searched card into the cart (attributes come from the form)
    let response = post_form(
        &app,
        "/store/search/add",
        "card_id=bolt-1&name=Lightning+Bolt&oracle_text=Deal+3+damage.&mana_cost=%7BR%7D&price=7.50&rarity=common",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");

    // The cart shows one line and the flash from the add
    let body = json_body(get(&app, "/cart", Some(&cookie)).await).await;
    assert_eq!(body["flash"], "Added Lightning Bolt to your cart.");
    let lines = body["lines"].as_array().expect("lines array").clone();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["card_name"], "Lightning Bolt");
    assert_eq!(lines[0]["unit_price"], "7.50");
    assert_eq!(body["total"], "7.50");
    let trade_id = lines[0]["trade_id"].as_i64().expect("trade id");

    // Buy it
    let response = post_form(
        &app,
        "/cart/buy",
        &format!("trade_id={trade_id}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Cart drained, purchase acknowledged
    let body = json_body(get(&app, "/cart", Some(&cookie)).await).await;
    assert_eq!(body["lines"].as_array().map(Vec::len), Some(0));
    let flash = body["flash"].as_str().expect("flash message");
    assert!(flash.starts_with("Purchased 1 card(s) for 7.50"), "{flash}");

    // Signup credits 100.00; the card cost 7.50
    let body = json_body(get(&app, "/profile", Some(&cookie)).await).await;
    assert_eq!(body["profile"]["balance"], "92.50");
    let cards = body["cards"].as_array().expect("cards array");
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["name"], "Lightning Bolt");
    assert_eq!(cards[0]["owned_count"], 1);
}

#[tokio::test]
async fn removing_a_cart_line_deletes_the_staging_trade() {
    let app = test_app().await;
    let cookie = register_and_login(&app).await;

    let response = post_form(
        &app,
        "/store/search/add",
        "card_id=elf-1&name=Llanowar+Elves&price=0.25",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = json_body(get(&app, "/cart", Some(&cookie)).await).await;
    let trade_id = body["lines"][0]["trade_id"].as_i64().expect("trade id");

    let response = post_form(
        &app,
        "/cart/remove",
        &format!("trade_id={trade_id}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = json_body(get(&app, "/cart", Some(&cookie)).await).await;
    assert_eq!(body["flash"], "Removed from your cart.");
    assert_eq!(body["lines"].as_array().map(Vec::len), Some(0));
}

// =============================================================================
// Trades
// =============================================================================

#[tokio::test]
async fn trade_create_with_unresolvable_card_flashes_not_found() {
    let app = test_app().await;
    let cookie = register_and_login(&app).await;

    let response = post_form(&app, "/trade/create", "name=Island", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/trade");

    let body = json_body(get(&app, "/trade", Some(&cookie)).await).await;
    assert_eq!(body["flash"], "Card not found.");
    assert_eq!(body["trades"].as_array().map(Vec::len), Some(0));
}
