//! CompletionTransport trait — the abstraction over LLM endpoints.
//!
//! A transport knows how to send a transcript plus a tool catalogue to a
//! completion endpoint and decode the response into an assistant turn.
//! It never mutates the transcript and never retries on its own; retry
//! policy belongs to the caller or to the endpoint client itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::turn::Turn;

/// How the endpoint is asked to select tools.
///
/// `Required` backs the final-tool termination convention: every round
/// must pick at least one tool, so plain free-text replies are never a
/// terminal state. `Auto` backs the structured-reply convention, where a
/// reply without tool calls carries the terminal payload itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Required,
    Auto,
}

/// A tool definition sent to the endpoint so the model knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// One generation-step request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g. "gpt-4o-mini")
    pub model: String,

    /// The full transcript, oldest turn first
    pub turns: Vec<Turn>,

    /// The complete tool catalogue
    pub tools: Vec<ToolDefinition>,

    /// Tool selection policy for this round
    pub tool_choice: ToolChoice,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// The decoded response to one generation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The assistant turn, carrying zero or more invocation requests
    pub assistant: Turn,

    /// Token usage, when the endpoint reports it
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage for one round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core transport trait.
///
/// Every completion endpoint (OpenAI, OpenRouter, Ollama, custom) sits
/// behind this trait. The orchestration loop calls `complete()` once per
/// round without knowing which backend is in play.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// A human-readable name for this transport (e.g. "openai", "ollama").
    fn name(&self) -> &str;

    /// Issue exactly one completion request and decode the result.
    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, TransportError>;

    /// Health check: can we reach the endpoint?
    async fn health_check(&self) -> std::result::Result<bool, TransportError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_choice_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ToolChoice::Required).unwrap(),
            "\"required\""
        );
        assert_eq!(serde_json::to_string(&ToolChoice::Auto).unwrap(), "\"auto\"");
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "get_weather".into(),
            description: "Look up the weather for a city".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "city": { "type": "string", "description": "The city to look up" }
                },
                "required": ["city"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("get_weather"));
        assert!(json.contains("city"));
    }

    #[test]
    fn generation_request_defaults() {
        let req = GenerationRequest {
            model: "gpt-4o-mini".into(),
            turns: vec![],
            tools: vec![],
            tool_choice: ToolChoice::Required,
            temperature: default_temperature(),
            max_tokens: None,
        };
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.tool_choice, ToolChoice::Required);
    }
}
