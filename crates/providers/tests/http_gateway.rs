//! `HttpGateway` against a stub `/api/chat` server bound to an ephemeral port.

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use parley_domain::error::Error;
use parley_domain::{CompletionGateway, ResponseMode, Turn};
use parley_providers::http::CompletionRequestBody;
use parley_providers::HttpGateway;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/chat")
}

fn gateway(url: String) -> HttpGateway {
    HttpGateway::new(url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn success_returns_assistant_turn() {
    let app = Router::new().route(
        "/api/chat",
        post(|Json(body): Json<CompletionRequestBody>| async move {
            Json(json!({
                "message": format!("{} turns in {} mode", body.turns.len(), body.mode)
            }))
        }),
    );
    let gw = gateway(spawn(app).await);

    let turn = gw
        .complete(&[Turn::user("hi")], ResponseMode::Friend)
        .await
        .unwrap();

    assert_eq!(turn, Turn::assistant("1 turns in friend mode"));
}

#[tokio::test]
async fn server_error_is_reported() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process chat request" })),
            )
        }),
    );
    let gw = gateway(spawn(app).await);

    let err = gw
        .complete(&[Turn::user("hi")], ResponseMode::Default)
        .await
        .unwrap_err();

    match err {
        Error::Http(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("Failed to process chat request"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn body_without_message_is_an_error() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { Json(json!({ "text": "wrong field" })) }),
    );
    let gw = gateway(spawn(app).await);

    let err = gw
        .complete(&[Turn::user("hi")], ResponseMode::Default)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error() {
    // Bind then drop to get a port nobody is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gw = gateway(format!("http://{addr}/api/chat"));
    let result = gw.complete(&[Turn::user("hi")], ResponseMode::Fast).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn request_carries_turns_and_mode() {
    let app = Router::new().route(
        "/api/chat",
        post(|Json(body): Json<Value>| async move {
            Json(json!({ "message": body.to_string() }))
        }),
    );
    let gw = gateway(spawn(app).await);

    let turn = gw
        .complete(&[Turn::user("a"), Turn::assistant("b")], ResponseMode::Full)
        .await
        .unwrap();
    let echoed: Value = serde_json::from_str(&turn.content).unwrap();

    assert_eq!(echoed["mode"], "full");
    assert_eq!(echoed["turns"][1]["role"], "assistant");
}
