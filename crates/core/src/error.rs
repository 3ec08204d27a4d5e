//! Error types for the dispatch and query bridge.
//!
//! All errors are represented by the [`Error`] enum. They fall into two groups:
//! - **Validation** errors are raised synchronously, before the engine sees the request
//! - **Engine** errors are reported asynchronously through the completion path
//!
//! Both groups are structured and serializable so callers can match on fields
//! instead of parsing messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Category of a failure reported by the cluster engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    /// The operation did not complete before its timeout
    Timeout,
    /// Connection-level failure
    Network,
    /// The server rejected or failed the request
    Server,
    /// The reply did not have the expected shape
    Protocol,
    /// The engine released the operation without ever replying
    Dropped,
    /// Anything else the engine could not classify
    Internal,
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EngineErrorKind::Timeout => "timeout",
            EngineErrorKind::Network => "network",
            EngineErrorKind::Server => "server",
            EngineErrorKind::Protocol => "protocol",
            EngineErrorKind::Dropped => "dropped",
            EngineErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// A failure reported by the engine after a request was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind} error: {message}")]
pub struct EngineError {
    /// Failure category
    pub kind: EngineErrorKind,
    /// Human readable message
    pub message: String,
    /// Optional extra context (server error body, request id, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl EngineError {
    /// Create an engine error without context.
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        EngineError {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to this error.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Shorthand for a timeout failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Timeout, message)
    }

    /// Shorthand for a reply-shape failure.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Protocol, message)
    }

    /// Shorthand for an operation the engine released without a reply.
    pub fn dropped(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Dropped, message)
    }
}

/// Bridge errors.
///
/// | Category | Variants | Raised |
/// |----------|----------|--------|
/// | Validation | `UnrecognizedOperation`, `InvalidEnumString`, `MalformedMutationToken`, `InvalidArguments` | synchronously |
/// | Remote | `Engine` | through the completion path or the row stream |
/// | Usage | `AlreadyQueried` | synchronously |
/// | Setup | `Config` | while loading configuration |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Error {
    // ==================== Validation ====================
    /// Operation type is the `UNKNOWN` sentinel or outside the closed set
    #[error("unrecognized operation: {operation}")]
    UnrecognizedOperation { operation: String },

    /// A canonical enum was given a string outside its canonical set
    #[error("invalid {kind} type {value}")]
    InvalidEnumString { kind: String, value: String },

    /// A caller-supplied mutation token lacks a causal-position field
    #[error("malformed mutation token at index {index}: {reason}")]
    MalformedMutationToken { index: usize, reason: String },

    /// Arguments do not fit the requested operation
    #[error("invalid arguments for {operation}: {reason}")]
    InvalidArguments { operation: String, reason: String },

    // ==================== Remote ====================
    /// Failure reported by the engine after submission
    #[error("engine failure: {0}")]
    Engine(EngineError),

    // ==================== Usage ====================
    /// The streamed result has already been consumed, closed or failed
    #[error("query result has already been iterated")]
    AlreadyQueried,

    // ==================== Setup ====================
    /// Configuration could not be read or is invalid
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        Error::Engine(err)
    }
}

impl Error {
    /// Returns the engine error kind if this error came from the engine.
    pub fn engine_kind(&self) -> Option<EngineErrorKind> {
        match self {
            Error::Engine(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Returns true for errors raised before any engine interaction.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnrecognizedOperation { .. }
                | Error::InvalidEnumString { .. }
                | Error::MalformedMutationToken { .. }
                | Error::InvalidArguments { .. }
        )
    }
}
