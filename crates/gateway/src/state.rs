use std::sync::Arc;

use parley_domain::config::Config;
use parley_domain::CompletionGateway;
use parley_providers::{OpenAiCompatProvider, UpstreamGateway};

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when the upstream provider could not be initialized (e.g. the
    /// API key is missing).  The server still boots; chat requests fail
    /// until it is configured.
    pub gateway: Option<Arc<dyn CompletionGateway>>,
}

impl AppState {
    /// Build state from config, wiring the upstream provider.
    pub fn from_config(config: Arc<Config>) -> Self {
        let gateway = match OpenAiCompatProvider::from_config(&config.llm) {
            Ok(provider) => {
                tracing::info!(
                    provider = %config.llm.id,
                    model = %config.llm.model,
                    "upstream provider ready"
                );
                let gw = UpstreamGateway::new(Arc::new(provider), config.modes.clone());
                Some(Arc::new(gw) as Arc<dyn CompletionGateway>)
            }
            Err(e) => {
                tracing::warn!(
                    provider = %config.llm.id,
                    error = %e,
                    "upstream provider unavailable, chat requests will fail"
                );
                None
            }
        };
        Self { config, gateway }
    }

    pub fn with_gateway(config: Arc<Config>, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            config,
            gateway: Some(gateway),
        }
    }
}
