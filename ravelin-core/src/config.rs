//! Configuration surface shared by a foreground episode and a background
//! agent's per-tick episode.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Model selection and sampling parameters for one LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider id (e.g. `"anthropic"`, `"openai"`, `"ollama"`).
    pub provider_id: String,
    /// Model id understood by that provider.
    pub model_id: String,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter.
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Maximum output tokens per call.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider_id: "local".into(),
            model_id: "default".into(),
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }
}

/// Budgets bounding a single ReAct episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeLimits {
    /// Maximum number of reasoning steps.
    pub max_steps: u32,
    /// Maximum number of LLM requests.
    pub request_limit: u32,
    /// Maximum cumulative token usage.
    pub total_tokens_limit: u64,
    /// Per-tool-call timeout.
    #[serde(with = "duration_secs")]
    pub tool_call_timeout: Duration,
    /// Ceiling applied to context reads from the memory router.
    pub max_context_tokens: u64,
    /// How many consecutive parse failures are tolerated before the
    /// episode terminates with `ParseFailure`.
    pub parse_retry_budget: u32,
}

impl Default for EpisodeLimits {
    fn default() -> Self {
        Self {
            max_steps: 25,
            request_limit: 25,
            total_tokens_limit: 200_000,
            tool_call_timeout: Duration::from_secs(30),
            max_context_tokens: 8_000,
            parse_retry_budget: 2,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
