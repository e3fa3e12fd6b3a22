pub mod chat;
pub mod cors;

use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the API routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat::chat))
}

/// The full application: routes, CORS, request tracing, and state.
pub fn app(state: AppState) -> Router {
    let cors_layer = cors::build_cors_layer(&state.config.server.cors);
    router()
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
