use serde::Serialize;

/// Structured trace events emitted across all Parley crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionSaved {
        session_id: String,
        messages: usize,
        is_new: bool,
    },
    SessionDeleted {
        session_id: String,
        existed: bool,
    },
    HistoryCleared {
        sessions_removed: usize,
    },
    ExchangeResolved {
        exchange_id: u64,
        session_id: Option<String>,
        failed: bool,
    },
    ExchangeDiscarded {
        exchange_id: u64,
        reason: String,
    },
    CompletionRequest {
        provider: String,
        model: String,
        mode: String,
        turns: usize,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
        finish_reason: Option<String>,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "parley_event");
    }
}
