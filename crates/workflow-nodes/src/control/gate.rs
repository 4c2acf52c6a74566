//! Gate Node
//!
//! Passes a value through while open and blocks downstream consumers while
//! closed. Blocking is cooperative: the gate returns an [`ExecutionBlock`]
//! and the executor decides what to do with the nodes that depend on it.

use node_contracts::{
    ExecutionBlock, ExecutionResult, Input, NodeType, NodeTypeFn, Output, Schema,
};

use crate::required;

/// Gate Node
///
/// # Inputs
/// - `value` (STRING, connection only) - Value to pass through
/// - `open` (BOOLEAN) - Whether the gate is open, `true` by default
/// - `message` (STRING, optional) - Reported when blocking; blocks silently if empty
///
/// # Outputs
/// - `value` (STRING) - The input value while open
pub struct GateNode;

impl GateNode {
    pub const NODE_ID: &'static str = "Gate";
    pub const PORT_VALUE: &'static str = "value";
    pub const PORT_OPEN: &'static str = "open";
    pub const PORT_MESSAGE: &'static str = "message";

    pub fn node_type() -> NodeType {
        NodeType::builder(Self::NODE_ID)
            .define_schema(|| {
                Schema::new(Self::NODE_ID)
                    .category("control")
                    .description("Blocks downstream execution while closed")
                    .input(Input::string(Self::PORT_VALUE).force_input(true))
                    .input(Input::boolean(Self::PORT_OPEN).default(true))
                    .input(
                        Input::string(Self::PORT_MESSAGE)
                            .optional()
                            .advanced(true)
                            .default(""),
                    )
                    .output(Output::string().id(Self::PORT_VALUE))
            })
            .execute(|invocation, inputs| {
                let open = inputs
                    .get(Self::PORT_OPEN)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                if !open {
                    let message = inputs
                        .get(Self::PORT_MESSAGE)
                        .and_then(|v| v.as_str())
                        .filter(|m| !m.is_empty());
                    log::debug!(
                        "Gate {:?} closed",
                        invocation.hidden().unique_id()
                    );
                    return Ok(ExecutionResult::Blocked(match message {
                        Some(message) => ExecutionBlock::new(message),
                        None => ExecutionBlock::silent(),
                    }));
                }
                let value = required(&inputs, Self::PORT_VALUE)?.clone();
                Ok(ExecutionResult::Values(vec![value]))
            })
            .build()
    }
}

inventory::submit!(NodeTypeFn(GateNode::node_type));

#[cfg(test)]
mod tests {
    use super::*;
    use node_contracts::NodeInputs;
    use serde_json::json;
    use std::sync::Arc;

    fn inputs(open: bool, message: &str) -> NodeInputs {
        let mut inputs = NodeInputs::new();
        inputs.insert("value".to_string(), json!("payload"));
        inputs.insert("open".to_string(), json!(open));
        inputs.insert("message".to_string(), json!(message));
        inputs
    }

    #[test]
    fn test_open_gate_passes_value() {
        let node = Arc::new(GateNode::node_type());
        let output = node
            .prepare_invocation(None)
            .unwrap()
            .execute_normalized(inputs(true, ""))
            .unwrap();
        assert!(!output.is_blocked());
        assert_eq!(output[0], json!("payload"));
    }

    #[test]
    fn test_closed_gate_blocks() {
        let node = Arc::new(GateNode::node_type());
        let invocation = node.prepare_invocation(None).unwrap();

        let output = invocation.execute_normalized(inputs(false, "waiting on review")).unwrap();
        assert!(output.is_blocked());
        assert_eq!(output.block_message(), Some("waiting on review"));
        assert!(output.result().is_none());

        let silent = invocation.execute_normalized(inputs(false, "")).unwrap();
        assert!(silent.is_blocked());
        assert_eq!(silent.block_message(), None);
    }

    #[test]
    fn test_value_is_socket_only() {
        let info = GateNode::node_type().node_info().unwrap();
        assert_eq!(info.input["value"][1]["forceInput"], true);
        assert_eq!(info.input["message"][1]["optional"], true);
        assert_eq!(info.input["message"][1]["advanced"], true);
    }
}
