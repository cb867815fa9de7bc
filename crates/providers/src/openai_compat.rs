//! OpenAI-compatible transport implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, Fireworks
//! AI, and any other endpoint exposing the `/v1/chat/completions` shape.
//!
//! Supports chat completions with tool use under both tool-choice
//! policies. Streaming is out of scope: the loop consumes one complete
//! response per round.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use toolweave_core::error::TransportError;
use toolweave_core::transport::{
    CompletionTransport, GenerationRequest, GenerationResponse, ToolChoice, ToolDefinition, Usage,
};
use toolweave_core::turn::{InvocationRequest, Role, Turn};

/// An OpenAI-compatible completion transport.
///
/// This handles the vast majority of providers since most expose an
/// OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatTransport {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatTransport {
    /// Create a new OpenAI-compatible transport.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenAI transport (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, TransportError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an OpenRouter transport (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Result<Self, TransportError> {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an Ollama transport (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Result<Self, TransportError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Convert our Turn types to OpenAI API format.
    fn to_api_messages(turns: &[Turn]) -> Vec<ApiMessage> {
        turns
            .iter()
            .map(|t| ApiMessage {
                role: match t.role {
                    Role::System => "system".into(),
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(t.content.clone()),
                tool_calls: if t.invocations.is_empty() {
                    None
                } else {
                    Some(
                        t.invocations
                            .iter()
                            .map(|inv| ApiToolCall {
                                id: inv.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: inv.tool_name.clone(),
                                    arguments: inv.raw_arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: t.answers.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn tool_choice_value(choice: ToolChoice) -> &'static str {
        match choice {
            ToolChoice::Required => "required",
            ToolChoice::Auto => "auto",
        }
    }
}

#[async_trait]
impl CompletionTransport for OpenAiCompatTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, TransportError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.turns),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
            body["tool_choice"] = serde_json::json!(Self::tool_choice_value(request.tool_choice));
        }

        debug!(transport = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(TransportError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(TransportError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Endpoint returned error");
            return Err(TransportError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            TransportError::MalformedResponse(format!("Failed to parse response: {e}"))
        })?;

        let choice = api_response.choices.into_iter().next().ok_or_else(|| {
            TransportError::MalformedResponse("No choices in response".into())
        })?;

        let invocations: Vec<InvocationRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| InvocationRequest {
                id: tc.id,
                tool_name: tc.function.name,
                raw_arguments: tc.function.arguments,
            })
            .collect();

        let assistant = Turn::assistant(choice.message.content.unwrap_or_default(), invocations);

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(GenerationResponse {
            assistant,
            usage,
            model: api_response.model,
        })
    }

    async fn health_check(&self) -> Result<bool, TransportError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
