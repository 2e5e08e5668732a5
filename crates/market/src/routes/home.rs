//! Home page and smoke-test endpoints.

use axum::{Json, response::IntoResponse};
use serde_json::json;

/// Home page.
pub async fn home() -> impl IntoResponse {
    Json(json!({
        "status": "success",
        "page": "home",
    }))
}

/// Fixed acknowledgement used by deployment smoke tests.
pub async fn welcome() -> impl IntoResponse {
    Json(json!({
        "status": "success",
        "message": "Welcome!",
    }))
}
