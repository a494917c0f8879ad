//! Error types for the agent runtime

use lux_protocol::ActionType;
use thiserror::Error;

/// Errors from the remote model backend.
#[derive(Debug, Error, Clone)]
pub enum BackendError {
    /// Client-side configuration problem (missing key, bad base URL)
    #[error("Backend configuration error: {0}")]
    Config(String),

    /// Server replied with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection-level failure before a reply was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded its deadline
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Reply did not match the expected wire shape
    #[error("Schema error: {0}")]
    Schema(String),
}

impl BackendError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(_) | BackendError::Timeout { .. } => true,
            BackendError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors raised while replaying actions against the desktop.
#[derive(Debug, Error, Clone)]
pub enum ExecutionError {
    /// Action argument failed coordinate or field validation
    #[error("Invalid argument for {action}: {detail}")]
    InvalidArgument { action: String, detail: String },

    /// Executor does not implement this action kind
    #[error("Unsupported action: {0}")]
    Unsupported(ActionType),

    /// Backend-specific replay failure
    #[error("Execution failed: {0}")]
    Failed(String),
}

impl ExecutionError {
    pub fn invalid_argument(action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidArgument {
            action: action.into(),
            detail: detail.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors from screenshot sources.
#[derive(Debug, Error, Clone)]
pub enum ScreenshotError {
    /// Capture backend failed to produce an image
    #[error("Screenshot capture failed: {0}")]
    Capture(String),

    /// Source has no more screenshots to serve
    #[error("Screenshot source exhausted")]
    Exhausted,
}

impl ScreenshotError {
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }
}

/// Top-level error type for agent runs.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Invalid configuration detected before any remote call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Component used outside its valid lifecycle
    #[error("Invalid state: {0}")]
    State(String),

    /// Remote backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Local action replay failure
    #[error(transparent)]
    Executor(#[from] ExecutionError),

    /// Screenshot source failure
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    /// Run was cancelled between steps
    #[error("Run interrupted")]
    Interrupted,
}

impl AgentError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }

    /// True for failures that must abort a whole workflow rather than a
    /// single todo.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AgentError::Executor(_) | AgentError::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_backend_errors() {
        assert!(BackendError::transport("reset").is_retryable());
        assert!(BackendError::Timeout { timeout_ms: 5000 }.is_retryable());
        assert!(BackendError::http(503, "unavailable").is_retryable());
        assert!(BackendError::http(429, "slow down").is_retryable());
        assert!(!BackendError::http(401, "bad key").is_retryable());
        assert!(!BackendError::config("no key").is_retryable());
    }

    #[test]
    fn fatal_classification() {
        assert!(AgentError::from(ExecutionError::failed("no display")).is_fatal());
        assert!(AgentError::Interrupted.is_fatal());
        assert!(!AgentError::from(BackendError::http(500, "boom")).is_fatal());
        assert!(!AgentError::state("no task").is_fatal());
    }
}
