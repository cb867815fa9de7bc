//! The toolweave orchestration loop — the heart of the system.
//!
//! The loop drives a completion endpoint through repeated rounds:
//!
//! 1. **Generate**: one transport call with the full transcript and tool
//!    catalogue
//! 2. **Account**: forward the round's usage record, best-effort
//! 3. **Dispatch**: resolve and execute the requested invocations,
//!    strictly in request order
//! 4. **Append**: one tool-result turn per non-terminal invocation
//! 5. **Terminate or repeat**: the terminal tool (or, in structured-reply
//!    deployments, a JSON reply without tool calls) ends the loop with a
//!    payload; otherwise the next round starts, up to the iteration
//!    budget.
//!
//! All transcript mutation funnels through the loop; generation and
//! dispatch never write turns themselves.

mod dispatch;
mod runner;
mod termination;

pub mod error;

pub use dispatch::ArgumentErrorPolicy;
pub use error::AgentError;
pub use runner::Agent;
pub use termination::TerminationMode;
