mod client;
mod llm;
mod modes;
mod server;
mod storage;

pub use client::*;
pub use llm::*;
pub use modes::*;
pub use server::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub modes: ModesConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut error = |field: String, message: &str| {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field,
                message: message.into(),
            })
        };

        if self.server.port == 0 {
            error("server.port".into(), "port must be greater than 0");
        }
        if self.server.host.is_empty() {
            error("server.host".into(), "host must not be empty");
        }
        if self.llm.base_url.is_empty() {
            error("llm.base_url".into(), "base_url must not be empty");
        }
        if self.llm.model.is_empty() {
            error("llm.model".into(), "model must not be empty");
        }

        for mode in crate::ResponseMode::ALL {
            let profile = self.modes.profile(mode);
            if !(0.0..=2.0).contains(&profile.temperature) {
                error(
                    format!("modes.{mode}.temperature"),
                    "temperature must be between 0.0 and 2.0",
                );
            }
            if profile.max_tokens == 0 {
                error(
                    format!("modes.{mode}.max_tokens"),
                    "max_tokens must be greater than 0",
                );
            }
        }

        if self.llm.auth.key.is_some() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.auth.key".into(),
                message: "plaintext API key in config (prefer llm.auth.env)".into(),
            });
        }

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)".into(),
            });
        }

        errors
    }
}
