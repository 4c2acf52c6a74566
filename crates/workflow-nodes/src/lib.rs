//! Workflow Nodes
//!
//! Built-in node types written against the node contract. Every node here
//! submits its constructor through `inventory`, so
//! `NodeRegistry::with_builtins()` picks all of them up.
//!
//! # Categories
//!
//! - **Input**: Widget-backed primitive values and combo choices
//! - **Control**: Nodes that block downstream execution
//! - **Processing**: Nodes that transform values (math, completions)
//! - **Output**: Nodes that publish results to the UI

pub mod control;
pub mod input;
pub mod output;
pub mod processing;

// Re-export all nodes for convenience
pub use control::*;
pub use input::*;
pub use output::*;
pub use processing::*;

use node_contracts::{ContractError, NodeInputs, Result};
use serde_json::Value;

/// Fetch a required input value
pub(crate) fn required<'a>(inputs: &'a NodeInputs, port: &str) -> Result<&'a Value> {
    inputs
        .get(port)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ContractError::failed(format!("Missing required input '{}'", port)))
}

pub(crate) fn required_i64(inputs: &NodeInputs, port: &str) -> Result<i64> {
    required(inputs, port)?
        .as_i64()
        .ok_or_else(|| ContractError::failed(format!("Input '{}' must be an integer", port)))
}

pub(crate) fn required_str<'a>(inputs: &'a NodeInputs, port: &str) -> Result<&'a str> {
    required(inputs, port)?
        .as_str()
        .ok_or_else(|| ContractError::failed(format!("Input '{}' must be a string", port)))
}
