pub mod payment;
pub mod user;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/payment", payment::router())
        .nest("/users", user::router())
}

/// Routes mounted outside `/api`.
pub fn root_router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Digital Life Lessons Server is running" }))
}
