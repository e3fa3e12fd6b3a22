//! Client for a Parley `/api/chat` completion endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use parley_domain::error::{Error, Result};
use parley_domain::turn::Turn;
use parley_domain::{CompletionGateway, ResponseMode};

use crate::util::from_reqwest;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire types (shared with the server)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `POST /api/chat` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequestBody {
    #[serde(alias = "messages")]
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub mode: ResponseMode,
}

/// `200` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponseBody {
    pub message: String,
}

/// Non-2xx response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Gateway
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct HttpGateway {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpGateway {
    /// `endpoint` is the full URL of the chat route,
    /// e.g. `http://127.0.0.1:3210/api/chat`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(&self, turns: &[Turn], mode: ResponseMode) -> Result<Turn> {
        let body = CompletionRequestBody {
            turns: turns.to_vec(),
            mode,
        };

        tracing::debug!(endpoint = %self.endpoint, %mode, turns = turns.len(), "chat request");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(Error::Http(format!("HTTP {} - {detail}", status.as_u16())));
        }

        let parsed: CompletionResponseBody = serde_json::from_str(&text)?;
        Ok(Turn::assistant(parsed.message))
    }
}
