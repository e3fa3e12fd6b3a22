//! `POST /api/chat` — one completion for a conversation.
//!
//! Request: `{ "turns": [{role, content}], "mode": "fast"|"default"|"full"|"friend" }`
//! (`messages` is accepted for `turns`; `mode` defaults to `default`).
//! Response: `200 { "message": "..." }`, or `{ "error": "..." }` with a
//! 400 (malformed body) or 500 (completion failed).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use parley_providers::http::{CompletionRequestBody, CompletionResponseBody, ErrorBody};

use crate::state::AppState;

/// Message returned for every upstream failure; details stay in the logs.
pub const FAILURE_BODY: &str = "Failed to process chat request";

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<CompletionRequestBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected chat request body");
            return api_error(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let Some(gateway) = state.gateway.as_ref() else {
        tracing::error!("chat request received but no upstream provider is configured");
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY);
    };

    match gateway.complete(&body.turns, body.mode).await {
        Ok(turn) => (
            StatusCode::OK,
            Json(CompletionResponseBody {
                message: turn.content,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(mode = %body.mode, turns = body.turns.len(), error = %e, "chat completion failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY)
        }
    }
}
