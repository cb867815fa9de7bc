//! # toolweave Core
//!
//! Domain types, traits, and error definitions for the toolweave
//! agent-orchestration loop. This crate has **zero framework
//! dependencies**; it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the loop is defined as a trait here: the
//! completion transport, the transcript store, the usage sink, and the
//! tools themselves. Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod session;
pub mod tool;
pub mod transport;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, RegistryError, Result, StoreError, ToolError, TransportError};
pub use session::{TranscriptStore, UsageSink};
pub use tool::{BlockingFnTool, FnTool, Tool, ToolRegistry};
pub use transport::{
    CompletionTransport, GenerationRequest, GenerationResponse, ToolChoice, ToolDefinition, Usage,
};
pub use turn::{InvocationRequest, Role, Turn};
