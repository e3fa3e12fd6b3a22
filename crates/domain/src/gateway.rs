use crate::error::Result;
use crate::mode::ResponseMode;
use crate::turn::Turn;

/// Anything that turns a conversation plus a response mode into the next
/// assistant turn.
///
/// Implementations live in `parley-providers` (HTTP client for the
/// `/api/chat` endpoint, direct upstream adapter).  Any failure, transport or
/// upstream, is reported as an `Err`; callers do not distinguish between
/// them.
#[async_trait::async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, turns: &[Turn], mode: ResponseMode) -> Result<Turn>;
}
