//! Schema assembly, validation, and introspection
//!
//! A [`Schema`] is built once by a node type's define-schema operation, then
//! finalized and validated before it is cached on the node type:
//!
//! 1. `finalize()` fills implicit hidden-context requests and assigns ids to
//!    unlabeled outputs.
//! 2. `validate()` rejects duplicate port ids, invalid descriptors, and
//!    malformed price badges.
//! 3. `to_info()` renders the serializable [`NodeInfo`] consumed by UIs and
//!    introspection endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{ContractSettings, DEFAULT_CATEGORY};
use crate::descriptor::{Input, Output};
use crate::error::{ContractError, Result};
use crate::hidden::HiddenKey;
use crate::price_badge::PriceBadge;
use crate::types::NodeId;

/// The structural contract of one node type
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub node_id: NodeId,
    pub display_name: Option<String>,
    pub category: String,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub hidden: Vec<HiddenKey>,
    pub description: String,
    pub is_output_node: bool,
    /// Billed through an external API; credential keys are supplied by the host
    pub is_api_node: bool,
    pub price_badge: Option<PriceBadge>,
}

impl Schema {
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            display_name: None,
            category: DEFAULT_CATEGORY.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            hidden: Vec::new(),
            description: String::new(),
            is_output_node: false,
            is_api_node: false,
            price_badge: None,
        }
    }

    pub fn with_settings(node_id: impl Into<NodeId>, settings: &ContractSettings) -> Self {
        Self::new(node_id).category(settings.default_category.clone())
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn input(mut self, input: Input) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn inputs(mut self, inputs: impl IntoIterator<Item = Input>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn outputs(mut self, outputs: impl IntoIterator<Item = Output>) -> Self {
        self.outputs.extend(outputs);
        self
    }

    pub fn hidden(mut self, key: HiddenKey) -> Self {
        self.hidden.push(key);
        self
    }

    pub fn output_node(mut self) -> Self {
        self.is_output_node = true;
        self
    }

    pub fn api_node(mut self) -> Self {
        self.is_api_node = true;
        self
    }

    pub fn price_badge(mut self, badge: PriceBadge) -> Self {
        self.price_badge = Some(badge);
        self
    }

    /// Every input, with composite inputs expanded
    pub fn flattened_inputs(&self) -> Vec<&Input> {
        self.inputs.iter().flat_map(|i| i.flatten()).collect()
    }

    /// Derive implicit hidden requests and assign missing output ids
    ///
    /// The steps run in a fixed order; output ids depend on the final list.
    pub fn finalize(&mut self) {
        if self.is_api_node {
            log::debug!(
                "Schema '{}' is billed through an API; credential keys are supplied by the host",
                self.node_id
            );
        }
        if self.is_output_node && !self.hidden.contains(&HiddenKey::Prompt) {
            self.hidden.push(HiddenKey::Prompt);
        }
        for (index, output) in self.outputs.iter_mut().enumerate() {
            if output.id.is_none() {
                output.id = Some(format!("_{}_{}_", index, output.io_type()));
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_with(&ContractSettings::default())
    }

    pub fn validate_with(&self, settings: &ContractSettings) -> Result<()> {
        let inputs = self.flattened_inputs();
        let input_ids: Vec<&str> = inputs.iter().map(|i| i.id.as_str()).collect();
        let output_ids: Vec<&str> = self
            .outputs
            .iter()
            .filter_map(|o| o.id.as_deref())
            .collect();

        let mut issues = Vec::new();
        let dup_inputs = duplicates(&input_ids);
        if !dup_inputs.is_empty() {
            issues.push(format!("Input ids must be unique, but {:?} are not.", dup_inputs));
        }
        let dup_outputs = duplicates(&output_ids);
        if !dup_outputs.is_empty() {
            issues.push(format!("Output ids must be unique, but {:?} are not.", dup_outputs));
        }
        if settings.reject_cross_port_id_collisions {
            let shared: Vec<&str> = output_ids
                .iter()
                .copied()
                .filter(|id| input_ids.contains(id))
                .collect();
            if !shared.is_empty() {
                issues.push(format!("Ids {:?} are used by both an input and an output.", shared));
            }
        }
        if !issues.is_empty() {
            return Err(ContractError::validation(issues.join("\n")));
        }

        for input in &self.inputs {
            input.validate()?;
        }
        for output in &self.outputs {
            output.validate()?;
        }
        if let Some(badge) = &self.price_badge {
            badge.validate(&inputs)?;
        }
        Ok(())
    }

    /// Render the serializable descriptor map
    pub fn to_info(&self) -> Result<NodeInfo> {
        let mut input = Map::new();
        for port in &self.inputs {
            let entry = port_entry(port.io_type().to_string(), port.as_serializable());
            input.insert(port.id.clone(), entry);
        }
        let mut output = Map::new();
        for (index, port) in self.outputs.iter().enumerate() {
            let id = port
                .id
                .clone()
                .unwrap_or_else(|| format!("_{}_{}_", index, port.io_type()));
            output.insert(id, port_entry(port.io_type().to_string(), port.as_serializable()));
        }
        let inputs = self.flattened_inputs();
        let price_badge = match &self.price_badge {
            Some(badge) => Some(badge.as_serializable(&inputs)?),
            None => None,
        };

        Ok(NodeInfo {
            input,
            output,
            hidden: self.hidden.iter().map(|k| k.as_str().to_string()).collect(),
            name: self.node_id.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            output_node: self.is_output_node,
            api_node: self.is_api_node,
            price_badge,
        })
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(String::new())
    }
}

fn port_entry(io_type: String, fields: Map<String, Value>) -> Value {
    Value::Array(vec![Value::String(io_type), Value::Object(fields)])
}

/// Ids appearing more than once, in first-seen order
fn duplicates<'a>(ids: &[&'a str]) -> Vec<&'a str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        *counts.entry(*id).or_insert(0) += 1;
    }
    let mut repeated = Vec::new();
    for id in ids {
        if counts[id] > 1 && !repeated.contains(id) {
            repeated.push(*id);
        }
    }
    repeated
}

/// Serializable description of a node type
///
/// Each port entry is a `[io_type, fields]` pair keyed by port id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub input: Map<String, Value>,
    pub output: Map<String, Value>,
    pub hidden: Vec<String>,
    pub name: String,
    pub display_name: Option<String>,
    pub description: String,
    pub category: String,
    pub output_node: bool,
    pub api_node: bool,
    pub price_badge: Option<Value>,
}
