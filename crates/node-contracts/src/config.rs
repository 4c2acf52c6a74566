//! Configuration for schema assembly and validation

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default category for schemas that do not set one
pub const DEFAULT_CATEGORY: &str = "general";

/// Settings applied when node types are registered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractSettings {
    /// Category reported for schemas that leave theirs at [`DEFAULT_CATEGORY`]
    pub default_category: String,
    /// Reject node types that reuse an input id as an output id
    pub reject_cross_port_id_collisions: bool,
}

impl Default for ContractSettings {
    fn default() -> Self {
        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
            reject_cross_port_id_collisions: false,
        }
    }
}

impl ContractSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
