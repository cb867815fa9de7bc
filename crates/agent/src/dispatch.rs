//! Tool dispatch: resolve one round's invocation requests, execute them
//! in request order, and produce the corresponding result turns.
//!
//! Dispatch runs in two phases. The resolution phase maps every
//! requested name to a registry entry and decodes every raw argument
//! string before anything executes, so an unknown tool (or, under the
//! default policy, undecodable arguments) fails the round before any of
//! its turns reach the transcript. The execution phase then runs the
//! resolved calls strictly in sequence.

use tracing::warn;

use toolweave_core::tool::{Tool, ToolRegistry};
use toolweave_core::turn::{InvocationRequest, Turn};
use toolweave_core::ToolError;

use crate::error::AgentError;

/// What to do when a round's raw arguments fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentErrorPolicy {
    /// Abort the whole run (reference behavior).
    #[default]
    Fail,
    /// Hand the decode error back to the model as a tool-result turn
    /// and let it retry.
    Report,
}

impl std::str::FromStr for ArgumentErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(Self::Fail),
            "report" => Ok(Self::Report),
            other => Err(format!(
                "unknown argument error policy '{other}' (expected 'fail' or 'report')"
            )),
        }
    }
}

/// One resolved invocation, ready to execute.
pub(crate) enum PlannedCall<'a> {
    /// A general registry entry.
    Invoke {
        request: &'a InvocationRequest,
        tool: &'a dyn Tool,
        arguments: serde_json::Value,
    },
    /// The designated terminal entry.
    Terminal {
        request: &'a InvocationRequest,
        tool: &'a dyn Tool,
        arguments: serde_json::Value,
    },
    /// A decode failure kept for the model to see (Report policy only).
    ReportDecodeFailure {
        request: &'a InvocationRequest,
        message: String,
    },
}

impl std::fmt::Debug for PlannedCall<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invoke {
                request,
                tool,
                arguments,
            } => f
                .debug_struct("Invoke")
                .field("request", request)
                .field("tool", &tool.name())
                .field("arguments", arguments)
                .finish(),
            Self::Terminal {
                request,
                tool,
                arguments,
            } => f
                .debug_struct("Terminal")
                .field("request", request)
                .field("tool", &tool.name())
                .field("arguments", arguments)
                .finish(),
            Self::ReportDecodeFailure { request, message } => f
                .debug_struct("ReportDecodeFailure")
                .field("request", request)
                .field("message", message)
                .finish(),
        }
    }
}

/// Resolve every invocation of one round against the registry.
pub(crate) fn resolve_round<'a>(
    registry: &'a ToolRegistry,
    invocations: &'a [InvocationRequest],
    policy: ArgumentErrorPolicy,
    round: u32,
) -> Result<Vec<PlannedCall<'a>>, AgentError> {
    let mut plan = Vec::with_capacity(invocations.len());

    for request in invocations {
        let resolved: Option<(&dyn Tool, bool)> = match registry
            .terminal()
            .filter(|t| t.name() == request.tool_name)
        {
            Some(term) => Some((term, true)),
            None => registry.get(&request.tool_name).map(|t| (t, false)),
        };

        let Some((tool, is_terminal)) = resolved else {
            return Err(AgentError::UnknownTool {
                round,
                call_id: request.id.clone(),
                tool_name: request.tool_name.clone(),
            });
        };

        match serde_json::from_str::<serde_json::Value>(&request.raw_arguments) {
            Ok(arguments) => plan.push(if is_terminal {
                PlannedCall::Terminal {
                    request,
                    tool,
                    arguments,
                }
            } else {
                PlannedCall::Invoke {
                    request,
                    tool,
                    arguments,
                }
            }),
            Err(e) => match policy {
                ArgumentErrorPolicy::Fail => {
                    return Err(AgentError::ArgumentDecode {
                        round,
                        call_id: request.id.clone(),
                        tool_name: request.tool_name.clone(),
                        reason: e.to_string(),
                    });
                }
                ArgumentErrorPolicy::Report => plan.push(PlannedCall::ReportDecodeFailure {
                    request,
                    message: e.to_string(),
                }),
            },
        }
    }

    Ok(plan)
}

/// The outcome of executing one round's plan.
#[derive(Debug)]
pub(crate) struct RoundExecution {
    /// One tool-result turn per non-terminal invocation, request order.
    pub results: Vec<Turn>,
    /// The terminal payload, if the terminal entry was invoked.
    pub terminal: Option<serde_json::Value>,
}

/// Execute a resolved round strictly in request order.
///
/// Every non-terminal invocation yields exactly one tool-result turn;
/// the terminal invocation yields none, its decoded result becomes the
/// round's terminal payload instead.
pub(crate) async fn execute_round(
    plan: Vec<PlannedCall<'_>>,
    policy: ArgumentErrorPolicy,
    round: u32,
) -> Result<RoundExecution, AgentError> {
    let mut results = Vec::new();
    let mut terminal: Option<serde_json::Value> = None;

    for call in plan {
        match call {
            PlannedCall::Invoke {
                request,
                tool,
                arguments,
            } => match tool.invoke(arguments).await {
                Ok(value) => {
                    results.push(Turn::tool_result(&request.id, value.to_string()));
                }
                Err(ToolError::InvalidArguments(reason))
                    if policy == ArgumentErrorPolicy::Fail =>
                {
                    return Err(AgentError::ArgumentDecode {
                        round,
                        call_id: request.id.clone(),
                        tool_name: request.tool_name.clone(),
                        reason,
                    });
                }
                Err(e) => {
                    warn!(tool = %request.tool_name, call_id = %request.id, error = %e, "Tool execution failed");
                    results.push(Turn::tool_result(&request.id, format!("Error: {e}")));
                }
            },
            PlannedCall::Terminal {
                request,
                tool,
                arguments,
            } => {
                if terminal.is_some() {
                    warn!(call_id = %request.id, "Ignoring duplicate terminal invocation in one round");
                    continue;
                }
                match tool.invoke(arguments).await {
                    Ok(payload) => terminal = Some(payload),
                    Err(ToolError::InvalidArguments(reason))
                        if policy == ArgumentErrorPolicy::Fail =>
                    {
                        return Err(AgentError::ArgumentDecode {
                            round,
                            call_id: request.id.clone(),
                            tool_name: request.tool_name.clone(),
                            reason,
                        });
                    }
                    Err(e) => {
                        return Err(AgentError::TerminalTool {
                            round,
                            call_id: request.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
            PlannedCall::ReportDecodeFailure { request, message } => {
                warn!(tool = %request.tool_name, call_id = %request.id, "Reporting argument decode failure to the model");
                results.push(Turn::tool_result(&request.id, format!("Error: {message}")));
            }
        }
    }

    Ok(RoundExecution { results, terminal })
}
