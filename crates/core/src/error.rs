//! Error types for the toolweave domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

/// The top-level error type for toolweave operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors raised while building a tool registry.
///
/// These fire at construction time, before any round has run.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),
}

/// Errors raised by a tool during invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

/// Errors raised by the completion transport.
///
/// The orchestration loop passes these through unmodified so callers can
/// apply their own retry policy.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised by transcript stores and usage sinks.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Append failed: {0}")]
    Append(String),

    #[error("Read failed: {0}")]
    Read(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_displays_correctly() {
        let err = Error::Transport(TransportError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn registry_error_displays_correctly() {
        let err = Error::Registry(RegistryError::DuplicateName("respond".into()));
        assert!(err.to_string().contains("respond"));
        assert!(err.to_string().contains("Duplicate"));
    }
}
