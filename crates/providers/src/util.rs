//! Shared utility functions for provider adapters.

use parley_domain::config::AuthConfig;
use parley_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext — warn)
/// 2. `env` field (reads environment variable)
/// 3. Error
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key' — prefer 'env' instead"
        );
        return Ok(key.clone());
    }

    if let Some(ref env_var) = auth.env {
        return std::env::var(env_var)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::Auth(format!(
                    "environment variable '{env_var}' not set or empty"
                ))
            });
    }

    Err(Error::Auth(
        "no API key configured: set 'key' or 'env' in [llm.auth]".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_key_wins() {
        let auth = AuthConfig {
            key: Some("sk-inline".into()),
            env: Some("PARLEY_TEST_UNSET_VAR".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "sk-inline");
    }

    #[test]
    fn missing_env_var_is_auth_error() {
        let auth = AuthConfig {
            key: None,
            env: Some("PARLEY_TEST_DEFINITELY_UNSET".into()),
            ..Default::default()
        };
        assert!(matches!(resolve_api_key(&auth), Err(Error::Auth(_))));
    }

    #[test]
    fn no_source_is_auth_error() {
        let auth = AuthConfig {
            key: None,
            env: None,
            ..Default::default()
        };
        assert!(matches!(resolve_api_key(&auth), Err(Error::Auth(_))));
    }
}
