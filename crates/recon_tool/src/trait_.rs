//! The uniform tool contract.
//!
//! A tool wraps one external scanner. It takes a structured input document
//! and returns a structured output document; how it gets there (argument
//! building, subprocess execution, stdout parsing) is its own business.

use serde_json::Value;

/// Error from executing a tool
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// Input was rejected by the tool
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
    /// The wrapped binary failed
    #[error("execution failed: {reason}")]
    ExecutionFailed { reason: String },
    /// The wrapped binary exceeded its time budget
    #[error("timed out after {seconds}s")]
    Timeout { seconds: u64 },
    /// The wrapped binary is not installed
    #[error("binary not found: {binary}")]
    BinaryNotFound { binary: String },
    /// The wrapped binary's output could not be parsed
    #[error("failed to parse output: {reason}")]
    OutputParse { reason: String },
}

/// A tool adapter
pub trait Tool: Send + Sync {
    /// Tool name, unique within a registry
    fn name(&self) -> &str;

    /// Tool version (semver)
    fn version(&self) -> &str;

    /// Run the tool on an input document
    ///
    /// # Errors
    ///
    /// Returns error if the tool cannot produce an output document
    fn execute(&self, input: &Value) -> Result<Value, ToolError>;
}
