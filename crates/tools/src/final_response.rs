//! Final response tool — the designated terminal entry.
//!
//! When the model calls `respond`, the loop treats its arguments as the
//! final answer instead of feeding a result back into the transcript.
//! `invoke` therefore just validates and echoes the arguments; the loop
//! extracts the returned value as the run's payload.

use async_trait::async_trait;
use tracing::warn;

use toolweave_core::error::ToolError;
use toolweave_core::tool::Tool;

pub struct FinalResponseTool;

#[async_trait]
impl Tool for FinalResponseTool {
    fn name(&self) -> &str {
        "respond"
    }

    fn description(&self) -> &str {
        "Deliver the final answer to the user. Call this once you have everything you need; no further tools run after it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Brief reasoning behind the answer (optional)"
                },
                "answer": {
                    "type": "string",
                    "description": "The final answer to the user's question"
                }
            },
            "required": ["answer"]
        })
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        if !arguments["answer"].is_string() {
            warn!("Final response called without an 'answer' string");
            return Err(ToolError::InvalidArguments(
                "Missing 'answer' argument".into(),
            ));
        }
        Ok(arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_its_arguments() {
        let tool = FinalResponseTool;
        let args = serde_json::json!({
            "reasoning": "Looked it up",
            "answer": "It is sunny in Paris."
        });
        let out = tool.invoke(args.clone()).await.unwrap();
        assert_eq!(out, args);
    }

    #[tokio::test]
    async fn reasoning_is_optional() {
        let tool = FinalResponseTool;
        let out = tool
            .invoke(serde_json::json!({"answer": "42"}))
            .await
            .unwrap();
        assert_eq!(out["answer"], "42");
    }

    #[tokio::test]
    async fn missing_answer_rejected() {
        let tool = FinalResponseTool;
        let result = tool.invoke(serde_json::json!({"reasoning": "hm"})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn tool_definition() {
        let tool = FinalResponseTool;
        let def = tool.definition();
        assert_eq!(def.name, "respond");
        assert_eq!(def.parameters["required"][0], "answer");
    }
}
