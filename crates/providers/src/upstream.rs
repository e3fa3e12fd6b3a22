//! Completion gateway that talks to the upstream provider directly.
//!
//! Applies the response-mode table: the mode's system prompt is prepended
//! to the conversation and its temperature / output length are sent as
//! sampling parameters.

use std::sync::Arc;
use std::time::Instant;

use parley_domain::config::ModesConfig;
use parley_domain::error::Result;
use parley_domain::trace::TraceEvent;
use parley_domain::turn::{Role, Turn};
use parley_domain::{CompletionGateway, ResponseMode};

use crate::traits::{ChatRequest, LlmProvider};

/// Reply used when the model returns no text.
pub const EMPTY_REPLY: &str = "I apologize, but I could not generate a response.";

pub struct UpstreamGateway {
    provider: Arc<dyn LlmProvider>,
    modes: ModesConfig,
}

impl UpstreamGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, modes: ModesConfig) -> Self {
        Self { provider, modes }
    }

    /// Build the provider request for `turns` in `mode`.
    ///
    /// Client-supplied system turns are dropped; the mode's system prompt is
    /// the only one sent.
    pub fn build_request(&self, turns: &[Turn], mode: ResponseMode) -> ChatRequest {
        let profile = self.modes.profile(mode);

        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(Turn::system(profile.system_prompt.clone()));
        messages.extend(turns.iter().filter(|t| t.role != Role::System).cloned());

        ChatRequest {
            messages,
            temperature: Some(profile.temperature),
            max_tokens: Some(profile.max_tokens),
            top_p: Some(1.0),
            model: None,
        }
    }
}

#[async_trait::async_trait]
impl CompletionGateway for UpstreamGateway {
    async fn complete(&self, turns: &[Turn], mode: ResponseMode) -> Result<Turn> {
        let req = self.build_request(turns, mode);
        let started = Instant::now();
        let resp = self.provider.chat(&req).await?;

        TraceEvent::CompletionRequest {
            provider: self.provider.provider_id().to_owned(),
            model: resp.model.clone(),
            mode: mode.to_string(),
            turns: turns.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
            completion_tokens: resp.usage.map(|u| u.completion_tokens),
            finish_reason: resp.finish_reason.clone(),
        }
        .emit();

        if resp.content.trim().is_empty() {
            return Ok(Turn::assistant(EMPTY_REPLY));
        }
        Ok(Turn::assistant(resp.content))
    }
}
