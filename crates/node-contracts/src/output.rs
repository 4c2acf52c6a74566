//! Canonical node output and return-shape normalization
//!
//! Node bodies return an [`ExecutionResult`]; [`ExecutionResult::into_output`]
//! is the one total conversion into the canonical [`NodeOutput`] handed to
//! the executor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ContractError, Result};

/// Marker key identifying a serialized [`ExecutionBlock`] inside JSON
pub const EXECUTION_BLOCKER_KEY: &str = "__execution_blocker__";

/// Cooperative signal that downstream consumers must not use this output
///
/// A block without a message blocks silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionBlock {
    pub message: Option<String>,
}

impl ExecutionBlock {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn silent() -> Self {
        Self { message: None }
    }

    /// JSON form used by dynamic (callback-backed) nodes
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(EXECUTION_BLOCKER_KEY.into(), Value::Bool(true));
        map.insert(
            "message".into(),
            self.message.clone().map(Value::String).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }

    /// Recognize the JSON form produced by `to_value`
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::from_map(value.as_object()?)
    }

    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        if map.get(EXECUTION_BLOCKER_KEY) != Some(&Value::Bool(true)) {
            return None;
        }
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self { message })
    }
}

/// A side-channel UI payload a node can attach to its output
pub trait UiOutput {
    fn as_value(&self) -> Value;
}

impl UiOutput for Value {
    fn as_value(&self) -> Value {
        self.clone()
    }
}

/// Canonical result of one node invocation
///
/// Check [`NodeOutput::block`] first: a block takes precedence over any
/// result values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
    pub values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<ExecutionBlock>,
}

impl NodeOutput {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            ui: None,
            block: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn blocked(block: ExecutionBlock) -> Self {
        Self {
            values: Vec::new(),
            ui: None,
            block: Some(block),
        }
    }

    pub fn with_ui(mut self, ui: &dyn UiOutput) -> Self {
        self.ui = Some(ui.as_value());
        self
    }

    /// The positional result values, or `None` when there are none
    pub fn result(&self) -> Option<&[Value]> {
        if self.values.is_empty() {
            None
        } else {
            Some(&self.values)
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn is_blocked(&self) -> bool {
        self.block.is_some()
    }

    pub fn block_message(&self) -> Option<&str> {
        self.block.as_ref().and_then(|b| b.message.as_deref())
    }

    /// Build from a keyed mapping with optional `result` and `ui` entries
    pub fn from_keyed(mut map: Map<String, Value>) -> Result<Self> {
        let ui = map.remove("ui").filter(|v| !v.is_null());
        let values = match map.remove("result") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => values,
            Some(other) => {
                if let Some(block) = ExecutionBlock::from_value(&other) {
                    return Ok(Self::blocked(block));
                }
                return Err(ContractError::violation(format!(
                    "keyed result must be an array or an execution blocker, got {}",
                    json_type_name(&other)
                )));
            }
        };
        Ok(Self {
            values,
            ui,
            block: None,
        })
    }
}

impl std::ops::Index<usize> for NodeOutput {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

/// Every shape a node body may return
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Nothing returned
    Empty,
    /// Positional result values
    Values(Vec<Value>),
    /// Mapping with optional `result` and `ui` keys
    Keyed(Map<String, Value>),
    Blocked(ExecutionBlock),
    /// Already canonical
    Canonical(NodeOutput),
    /// Untyped JSON from an external or FFI-backed node
    Dynamic(Value),
}

impl ExecutionResult {
    pub fn into_output(self) -> Result<NodeOutput> {
        match self {
            Self::Empty => Ok(NodeOutput::empty()),
            Self::Values(values) => Ok(NodeOutput::new(values)),
            Self::Keyed(map) => NodeOutput::from_keyed(map),
            Self::Blocked(block) => Ok(NodeOutput::blocked(block)),
            Self::Canonical(output) => Ok(output),
            Self::Dynamic(value) => match value {
                Value::Null => Ok(NodeOutput::empty()),
                Value::Array(values) => Ok(NodeOutput::new(values)),
                Value::Object(map) => match ExecutionBlock::from_map(&map) {
                    Some(block) => Ok(NodeOutput::blocked(block)),
                    None => NodeOutput::from_keyed(map),
                },
                other => Err(ContractError::violation(format!(
                    "Invalid return type from node: {}",
                    json_type_name(&other)
                ))),
            },
        }
    }
}

impl From<NodeOutput> for ExecutionResult {
    fn from(output: NodeOutput) -> Self {
        Self::Canonical(output)
    }
}

impl From<ExecutionBlock> for ExecutionResult {
    fn from(block: ExecutionBlock) -> Self {
        Self::Blocked(block)
    }
}

impl From<Vec<Value>> for ExecutionResult {
    fn from(values: Vec<Value>) -> Self {
        Self::Values(values)
    }
}

impl From<()> for ExecutionResult {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
