use serde::{Deserialize, Serialize};

use crate::mode::ResponseMode;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Full URL of a running `/api/chat` endpoint.  When unset, the client
    /// talks to the upstream provider directly.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub default_mode: ResponseMode,
    #[serde(default = "d_60000")]
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            default_mode: ResponseMode::Default,
            timeout_ms: 60_000,
        }
    }
}

fn d_60000() -> u64 {
    60_000
}
