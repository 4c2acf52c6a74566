//! Node registry and executor entry points
//!
//! The registry maps node ids to shared [`NodeType`]s. Registration builds
//! and validates the node's schema and checks every port against the
//! [`PortTypeRegistry`], so a node type that registers successfully can be
//! introspected and invoked without further schema-time failures.
//!
//! # Usage
//!
//! ```ignore
//! use node_contracts::NodeRegistry;
//!
//! let registry = NodeRegistry::with_builtins()?;
//! let info = registry.node_info("PrimitiveInt")?;
//! let output = registry.invoke("PrimitiveInt", None, inputs).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ContractSettings, DEFAULT_CATEGORY};
use crate::error::{ContractError, Result};
use crate::hidden::InvocationData;
use crate::node::{NodeInputs, NodeInvocation, NodeType};
use crate::output::NodeOutput;
use crate::port_types::{PortTypeCapabilities, PortTypeRegistry};
use crate::schema::NodeInfo;
use crate::types::PortTypeTag;

/// Link-time registration of a node type constructor
///
/// ```ignore
/// inventory::submit!(node_contracts::NodeTypeFn(primitive_int));
/// ```
pub struct NodeTypeFn(pub fn() -> NodeType);

inventory::collect!(NodeTypeFn);

/// Registry of node types keyed by node id
pub struct NodeRegistry {
    port_types: PortTypeRegistry,
    nodes: HashMap<String, Arc<NodeType>>,
    settings: ContractSettings,
}

impl NodeRegistry {
    /// Create a registry knowing only the built-in port types
    pub fn new() -> Self {
        Self::with_settings(ContractSettings::default())
    }

    pub fn with_settings(settings: ContractSettings) -> Self {
        Self {
            port_types: PortTypeRegistry::with_builtins(),
            nodes: HashMap::new(),
            settings,
        }
    }

    /// Create a registry holding every node type submitted via `inventory`
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        registry.register_collected()?;
        Ok(registry)
    }

    /// Register every node type submitted via `inventory`
    ///
    /// Custom port types used by those nodes must be registered first.
    pub fn register_collected(&mut self) -> Result<()> {
        for entry in inventory::iter::<NodeTypeFn> {
            self.register((entry.0)())?;
        }
        Ok(())
    }

    pub fn settings(&self) -> &ContractSettings {
        &self.settings
    }

    pub fn port_types(&self) -> &PortTypeRegistry {
        &self.port_types
    }

    pub fn register_port_type(
        &mut self,
        tag: impl Into<PortTypeTag>,
        capabilities: PortTypeCapabilities,
    ) -> Result<()> {
        self.port_types.register(tag, capabilities)
    }

    /// Register a connection-only port type
    pub fn register_socket_type(&mut self, tag: impl Into<PortTypeTag>) -> Result<()> {
        self.port_types.register_socket(tag)
    }

    /// Validate and register a node type under its schema's node id
    ///
    /// Returns the node id. A node with the same id is replaced.
    pub fn register(&mut self, node: impl Into<Arc<NodeType>>) -> Result<String> {
        let node = node.into();
        let schema = node.get_schema()?;
        schema.validate_with(&self.settings)?;
        for input in &schema.inputs {
            self.port_types.check_input(input)?;
        }
        for output in &schema.outputs {
            self.port_types.check_output(output)?;
        }

        let node_id = schema.node_id.clone();
        if self.nodes.insert(node_id.clone(), node).is_some() {
            log::warn!("Node type '{}' was registered twice; keeping the latest", node_id);
        } else {
            log::debug!("Registered node type '{}'", node_id);
        }
        Ok(node_id)
    }

    pub fn get(&self, node_id: &str) -> Option<Arc<NodeType>> {
        self.nodes.get(node_id).cloned()
    }

    pub fn has_node_type(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// All registered node ids, sorted
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Descriptor map of one node; an unset category takes the configured default
    pub fn node_info(&self, node_id: &str) -> Result<NodeInfo> {
        let mut info = self.require(node_id)?.node_info()?;
        if info.category == DEFAULT_CATEGORY {
            info.category.clone_from(&self.settings.default_category);
        }
        Ok(info)
    }

    /// Descriptor maps for every registered node, sorted by node id
    pub fn all_node_info(&self) -> Result<Vec<NodeInfo>> {
        self.node_ids()
            .into_iter()
            .map(|id| self.node_info(id))
            .collect()
    }

    /// Descriptor maps grouped by schema category
    pub fn node_info_by_category(&self) -> Result<HashMap<String, Vec<NodeInfo>>> {
        let mut grouped: HashMap<String, Vec<NodeInfo>> = HashMap::new();
        for info in self.all_node_info()? {
            grouped.entry(info.category.clone()).or_default().push(info);
        }
        Ok(grouped)
    }

    /// Prepare an isolated invocation of a registered node type
    pub fn prepare(&self, node_id: &str, data: Option<&InvocationData>) -> Result<NodeInvocation> {
        self.require(node_id)?.prepare_invocation(data)
    }

    /// Validate inputs, execute, and normalize the output of one invocation
    pub async fn invoke(
        &self,
        node_id: &str,
        data: Option<&InvocationData>,
        inputs: NodeInputs,
    ) -> Result<NodeOutput> {
        let invocation = self.prepare(node_id, data)?;
        invocation.validate_inputs(&inputs)?;
        invocation.execute_normalized_async(inputs).await
    }

    fn require(&self, node_id: &str) -> Result<&Arc<NodeType>> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| ContractError::UnknownNodeType(node_id.to_string()))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Input, Output};
    use crate::output::ExecutionResult;
    use crate::schema::Schema;
    use serde_json::json;

    fn test_node(node_id: &'static str, category: &'static str) -> NodeType {
        NodeType::builder(format!("{}Node", node_id))
            .define_schema(move || {
                Schema::new(node_id)
                    .category(category)
                    .input(Input::int("value").default(1))
                    .output(Output::int())
            })
            .execute(|_inv, inputs| {
                let value = inputs.get("value").cloned().unwrap_or(json!(0));
                Ok(ExecutionResult::Values(vec![value]))
            })
            .build()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = NodeRegistry::new();
        let id = registry.register(test_node("Identity", "math")).unwrap();
        assert_eq!(id, "Identity");
        assert!(registry.has_node_type("Identity"));
        assert!(!registry.has_node_type("Unknown"));
        assert_eq!(registry.node_info("Identity").unwrap().category, "math");
    }

    #[test]
    fn test_unknown_node_type() {
        let registry = NodeRegistry::new();
        assert!(matches!(
            registry.node_info("Missing"),
            Err(ContractError::UnknownNodeType(_))
        ));
    }

    #[test]
    fn test_unregistered_port_type_rejected() {
        let node = NodeType::builder("Preview")
            .define_schema(|| Schema::new("Preview").input(Input::socket("images", "IMAGE")))
            .execute(|_, _| Ok(ExecutionResult::Empty))
            .build();

        let mut registry = NodeRegistry::new();
        let node = Arc::new(node);
        assert!(matches!(
            registry.register(Arc::clone(&node)),
            Err(ContractError::UnknownPortType { .. })
        ));

        registry.register_socket_type("IMAGE").unwrap();
        assert!(registry.register(node).is_ok());
    }

    #[test]
    fn test_strict_settings_reject_shared_ids() {
        let node = NodeType::builder("Pass")
            .define_schema(|| {
                Schema::new("Pass")
                    .input(Input::int("value"))
                    .output(Output::int().id("value"))
            })
            .execute(|_, _| Ok(ExecutionResult::Empty))
            .build();
        let mut registry = NodeRegistry::with_settings(ContractSettings {
            reject_cross_port_id_collisions: true,
            ..Default::default()
        });
        assert!(matches!(registry.register(node), Err(ContractError::SchemaValidation(_))));
    }

    #[test]
    fn test_all_node_info_sorted_and_grouped() {
        let mut registry = NodeRegistry::new();
        registry.register(test_node("B", "math")).unwrap();
        registry.register(test_node("A", "math")).unwrap();
        registry.register(test_node("C", "text")).unwrap();

        let names: Vec<String> = registry
            .all_node_info()
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        let grouped = registry.node_info_by_category().unwrap();
        assert_eq!(grouped["math"].len(), 2);
        assert_eq!(grouped["text"].len(), 1);
    }

    #[test]
    fn test_configured_default_category_applied() {
        let mut registry = NodeRegistry::with_settings(ContractSettings {
            default_category: "custom".to_string(),
            ..Default::default()
        });
        registry.register(test_node("Plain", DEFAULT_CATEGORY)).unwrap();
        registry.register(test_node("Sorted", "math")).unwrap();

        assert_eq!(registry.node_info("Plain").unwrap().category, "custom");
        assert_eq!(registry.node_info("Sorted").unwrap().category, "math");

        let all = registry.all_node_info().unwrap();
        assert_eq!(all[0].category, "custom");
        let grouped = registry.node_info_by_category().unwrap();
        assert_eq!(grouped["custom"].len(), 1);
        assert!(!grouped.contains_key(DEFAULT_CATEGORY));
    }

    #[tokio::test]
    async fn test_invoke_runs_validation_hook() {
        let node = NodeType::derive(&test_node("Positive", "math"), "PositiveNode")
            .validate_inputs(|inputs| match inputs.get("value").and_then(|v| v.as_i64()) {
                Some(v) if v > 0 => Ok(()),
                _ => Err("value must be positive".to_string()),
            })
            .build();
        let mut registry = NodeRegistry::new();
        registry.register(node).unwrap();

        let mut inputs = NodeInputs::new();
        inputs.insert("value".to_string(), json!(-1));
        let err = registry.invoke("Positive", None, inputs).await.unwrap_err();
        assert!(err.to_string().contains("value must be positive"));

        let mut inputs = NodeInputs::new();
        inputs.insert("value".to_string(), json!(3));
        let output = registry.invoke("Positive", None, inputs).await.unwrap();
        assert_eq!(output.values, vec![json!(3)]);
    }
}
