#![deny(missing_docs)]
//! LLM completion capability.
//!
//! [`Provider`] uses RPITIT (return-position `impl Future` in traits) and
//! is deliberately not object-safe — it mirrors how the rest of the
//! runtime separates a generic provider trait from the dyn-compatible
//! trait object boundary one layer up ([`ravelin_tool::ToolDyn`] plays
//! that role for tools). A ReAct engine generic over `P: Provider` picks
//! its concrete provider at compile time; nothing upstream needs `Provider`
//! to be object-safe.

use std::future::Future;

use ravelin_core::{Message, ModelConfig, ToolDescriptor};
use thiserror::Error;

/// Errors from LLM providers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request failed at the transport level (network, HTTP).
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication or authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// The provider's response could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::RequestFailed(_))
    }
}

/// Token accounting for one completion call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u64,
    /// Tokens in the completion.
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Total tokens consumed by the call.
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// LLM provider interface: free-form text in, free-form text out.
///
/// The engine relies on textual parsing of the action grammar rather than
/// a provider's native structured function calling, but still passes
/// `tools_hint` through so a provider that supports function calling can
/// use it to bias sampling — the engine does not require it to.
pub trait Provider: Send + Sync {
    /// Send a completion request to the provider.
    fn complete(
        &self,
        model_config: &ModelConfig,
        messages: &[Message],
        tools_hint: Option<&[ToolDescriptor]>,
    ) -> impl Future<Output = Result<(String, TokenUsage), ProviderError>> + Send;
}
