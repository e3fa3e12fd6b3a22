pub mod http;
pub mod openai_compat;
pub mod traits;
pub mod upstream;
pub(crate) mod util;

// Re-exports for convenience.
pub use http::HttpGateway;
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{ChatRequest, ChatResponse, LlmProvider, Usage};
pub use upstream::UpstreamGateway;
pub use util::resolve_api_key;
