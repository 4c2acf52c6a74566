//! Error types for node contracts

use thiserror::Error;

/// Result type alias using ContractError
pub type Result<T> = std::result::Result<T, ContractError>;

/// Errors raised while declaring, validating, or executing node types
#[derive(Debug, Error)]
pub enum ContractError {
    /// A node type is missing a required operation or was invoked through
    /// the wrong entry point
    #[error("Authoring error: {0}")]
    Authoring(String),

    /// Schema validation failed (duplicate ids, bad price badge, ...)
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// A node returned a shape that cannot be normalized
    #[error("Execution contract violation: {0}")]
    ExecutionContractViolation(String),

    /// A node's input validation hook rejected the named inputs
    #[error("Input validation failed: {0}")]
    InputValidation(String),

    /// The node body itself reported a failure
    #[error("Node execution failed: {0}")]
    ExecutionFailed(String),

    /// A port references a type tag that was never registered
    #[error("Unknown port type '{tag}' on port '{port}'")]
    UnknownPortType { tag: String, port: String },

    /// A port type registration was rejected
    #[error("Invalid port type registration for '{tag}': {reason}")]
    PortTypeRegistration { tag: String, reason: String },

    /// A node type id was looked up but never registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ContractError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a schema validation error with a message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::SchemaValidation(msg.into())
    }

    /// Create a contract violation error with a message
    pub fn violation(msg: impl Into<String>) -> Self {
        Self::ExecutionContractViolation(msg.into())
    }
}
