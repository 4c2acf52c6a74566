//! Hidden execution context
//!
//! Hidden values are not declared as ordinary inputs; a schema requests them
//! by [`HiddenKey`] and the executor supplies them per invocation. A
//! [`HiddenContext`] is resolved once when an invocation is prepared and is
//! read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hidden values a schema can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HiddenKey {
    /// Identifier of the node instance in the originating graph
    #[serde(rename = "UNIQUE_ID")]
    UniqueId,
    /// The complete request the graph was submitted with
    #[serde(rename = "PROMPT")]
    Prompt,
}

impl HiddenKey {
    pub const ALL: [HiddenKey; 2] = [HiddenKey::UniqueId, HiddenKey::Prompt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UniqueId => "UNIQUE_ID",
            Self::Prompt => "PROMPT",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for HiddenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-invocation data handed over by the executor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationData {
    /// Hidden input values keyed by their `HiddenKey` name
    #[serde(default)]
    pub hidden_inputs: HashMap<String, Value>,
}

/// Hidden context resolved for one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HiddenContext {
    unique_id: Option<String>,
    prompt: Option<Value>,
}

impl HiddenContext {
    /// Resolve from a possibly-absent map of key name to value
    ///
    /// Unrecognized keys are ignored and missing keys resolve to `None`.
    pub fn from_map(map: Option<&HashMap<String, Value>>) -> Self {
        let Some(map) = map else {
            return Self::default();
        };
        let unique_id = map.get(HiddenKey::UniqueId.as_str()).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        });
        let prompt = map
            .get(HiddenKey::Prompt.as_str())
            .filter(|v| !v.is_null())
            .cloned();
        Self { unique_id, prompt }
    }

    pub fn from_invocation(data: Option<&InvocationData>) -> Self {
        Self::from_map(data.map(|d| &d.hidden_inputs))
    }

    /// Identifier of the node instance being executed
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    /// The full originating request
    pub fn prompt(&self) -> Option<&Value> {
        self.prompt.as_ref()
    }

    pub fn get(&self, key: HiddenKey) -> Option<Value> {
        match key {
            HiddenKey::UniqueId => self.unique_id.clone().map(Value::String),
            HiddenKey::Prompt => self.prompt.clone(),
        }
    }

    /// Look a value up by key name; unknown names resolve to `None`
    pub fn lookup(&self, name: &str) -> Option<Value> {
        match HiddenKey::parse(name) {
            Some(key) => self.get(key),
            None => {
                log::trace!("Hidden context has no key '{}'", name);
                None
            }
        }
    }
}
