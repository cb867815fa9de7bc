//! Termination conventions.
//!
//! Two conventions exist in the wild and neither subsumes the other, so
//! the deployment picks one explicitly:
//!
//! - [`TerminationMode::FinalTool`]: tool choice is mandatory every
//!   round; the loop ends only when the designated terminal tool is
//!   invoked. A reply with zero tool calls is a protocol violation.
//! - [`TerminationMode::StructuredReply`]: tool choice is optional; a
//!   reply with zero tool calls must itself carry the final payload as
//!   a JSON document.

use std::str::FromStr;

use toolweave_core::transport::ToolChoice;

use crate::error::AgentError;

/// Which termination convention a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationMode {
    /// A dedicated terminal tool ends the loop; tool choice is mandatory.
    #[default]
    FinalTool,
    /// A structured reply without tool calls ends the loop.
    StructuredReply,
}

impl TerminationMode {
    /// The tool-selection policy this convention requires per round.
    pub fn tool_choice(self) -> ToolChoice {
        match self {
            Self::FinalTool => ToolChoice::Required,
            Self::StructuredReply => ToolChoice::Auto,
        }
    }
}

impl FromStr for TerminationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "final_tool" => Ok(Self::FinalTool),
            "structured_reply" => Ok(Self::StructuredReply),
            other => Err(format!(
                "unknown termination mode '{other}' (expected 'final_tool' or 'structured_reply')"
            )),
        }
    }
}

/// Decode the terminal payload from a tool-call-free assistant reply.
///
/// Only meaningful under [`TerminationMode::StructuredReply`]; a reply
/// that is not a JSON document is a protocol violation.
pub(crate) fn terminal_from_reply(
    content: &str,
    round: u32,
) -> Result<serde_json::Value, AgentError> {
    serde_json::from_str(content).map_err(|e| AgentError::MissingTerminalPayload {
        round,
        reason: e.to_string(),
    })
}
