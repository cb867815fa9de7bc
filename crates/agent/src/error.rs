//! Failure taxonomy for one `run` invocation.
//!
//! Every fatal condition aborts the whole run with a typed error naming
//! the offending round and, where one exists, the offending invocation
//! id. Nothing is silently swallowed: the caller gets exactly one
//! terminal payload or exactly one of these.

use thiserror::Error;
use toolweave_core::error::{StoreError, TransportError};

#[derive(Debug, Error)]
pub enum AgentError {
    /// Transport failures pass through unmodified so callers can apply
    /// their own retry policy.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unknown tool '{tool_name}' requested in round {round} (call {call_id})")]
    UnknownTool {
        round: u32,
        call_id: String,
        tool_name: String,
    },

    #[error(
        "Arguments for tool '{tool_name}' failed to decode in round {round} (call {call_id}): {reason}"
    )]
    ArgumentDecode {
        round: u32,
        call_id: String,
        tool_name: String,
        reason: String,
    },

    #[error("Model returned no tool calls in round {round} under mandatory tool choice")]
    NoToolCalls { round: u32 },

    #[error("Model reply in round {round} carried no structured terminal payload: {reason}")]
    MissingTerminalPayload { round: u32, reason: String },

    #[error("Terminal tool failed in round {round} (call {call_id}): {reason}")]
    TerminalTool {
        round: u32,
        call_id: String,
        reason: String,
    },

    #[error("Iteration budget of {budget} exhausted without a terminal answer")]
    IterationBudgetExceeded { budget: u32 },
}
