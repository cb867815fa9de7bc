//! Turn and transcript domain types.
//!
//! A transcript is an append-only, ordered log of turns: the user asks,
//! the assistant requests tool invocations, tool results come back, and
//! eventually the assistant produces a final answer. Turns are immutable
//! once appended; nothing in the system edits or removes one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a turn in a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (fixed per run)
    System,
    /// The end user
    User,
    /// The model
    Assistant,
    /// A tool invocation result
    Tool,
}

/// A model-issued instruction to call a registered tool.
///
/// Created by one generation step, consumed by exactly one dispatcher
/// execution within the same round, then immutable history. The `id` is
/// opaque and supplied by the completion endpoint; `raw_arguments` stays
/// an undecoded JSON string until the dispatcher matches it against the
/// tool's declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Provider-supplied call ID, unique within the round
    pub id: String,

    /// Name of the requested tool
    pub tool_name: String,

    /// Serialized arguments, opaque until decoded
    pub raw_arguments: String,
}

/// A single turn in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool invocations requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<InvocationRequest>,

    /// If this is a tool result, which invocation request it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::System,
            content: content.into(),
            invocations: Vec::new(),
            answers: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            invocations: Vec::new(),
            answers: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant turn with optional invocation requests.
    pub fn assistant(content: impl Into<String>, invocations: Vec<InvocationRequest>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            invocations,
            answers: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a tool-result turn answering one invocation request.
    pub fn tool_result(answers: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Tool,
            content: content.into(),
            invocations: Vec::new(),
            answers: Some(answers.into()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Hello, agent!");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Hello, agent!");
        assert!(turn.invocations.is_empty());
        assert!(turn.answers.is_none());
    }

    #[test]
    fn assistant_turn_carries_invocations() {
        let turn = Turn::assistant(
            "",
            vec![InvocationRequest {
                id: "call_1".into(),
                tool_name: "get_weather".into(),
                raw_arguments: r#"{"city":"Paris"}"#.into(),
            }],
        );
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.invocations.len(), 1);
        assert_eq!(turn.invocations[0].tool_name, "get_weather");
    }

    #[test]
    fn tool_result_references_invocation() {
        let turn = Turn::tool_result("call_1", r#"{"city":"Paris","weather":"sunny"}"#);
        assert_eq!(turn.role, Role::Tool);
        assert_eq!(turn.answers.as_deref(), Some("call_1"));
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = Turn::user("Test turn");
        let json = serde_json::to_string(&turn).unwrap();
        let deserialized: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "Test turn");
        assert_eq!(deserialized.role, Role::User);
    }

    #[test]
    fn empty_invocations_omitted_from_json() {
        let turn = Turn::user("hi");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(!json.contains("invocations"));
        assert!(!json.contains("answers"));
    }
}
