//! Compile failure taxonomy.

use thiserror::Error;

/// Errors aborting a compile.
///
/// Every stage propagates the first failure to the orchestrator; a failed
/// compile produces no partial script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// A job/mapping/filter field the compile needs is missing or empty.
    #[error("incomplete input: {0}")]
    InputIncomplete(String),
    /// An embedded payload could not be decoded (malformed JSON, unknown
    /// expression type, unexpected payload shape).
    #[error("conversion failed: {0}")]
    Conversion(String),
    /// A component is wired incorrectly (e.g. a required parameter mapping
    /// is absent).
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// An empty value at a point the model guarantees non-emptiness; a
    /// defect, not a user error.
    #[error("invariant violated: {0}")]
    Invariant(String),
    /// The serializer failed while rendering the finished document.
    #[error("rendering failed: {0}")]
    Render(String),
}

impl CompileError {
    pub fn input_incomplete(message: impl Into<String>) -> Self {
        CompileError::InputIncomplete(message.into())
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        CompileError::Conversion(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        CompileError::Configuration(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        CompileError::Invariant(message.into())
    }

    pub fn render(message: impl Into<String>) -> Self {
        CompileError::Render(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
