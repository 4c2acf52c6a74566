//! Preview Text Node
//!
//! An output node: it produces no port values and returns a UI payload
//! describing the text to show. The payload records which graph node
//! produced it, resolved from the invocation's hidden context.

use node_contracts::{
    ContractError, ExecutionResult, HiddenContext, HiddenKey, Input, NodeOutput, NodeType,
    NodeTypeFn, Schema, UiOutput,
};
use serde_json::{json, Value};

use crate::required_str;

/// UI payload shown by the preview panel
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewText {
    pub text: String,
    pub source: Option<String>,
    pub class_type: Option<String>,
}

impl PreviewText {
    /// Build a preview attributed to the node described by `hidden`
    pub fn from_context(text: impl Into<String>, hidden: &HiddenContext) -> Self {
        let source = hidden.unique_id().map(str::to_string);
        let class_type = source.as_deref().and_then(|id| {
            hidden
                .prompt()
                .and_then(|prompt| prompt.get(id))
                .and_then(|node| node.get("class_type"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        Self {
            text: text.into(),
            source,
            class_type,
        }
    }
}

impl UiOutput for PreviewText {
    fn as_value(&self) -> Value {
        let mut ui = json!({ "text": [self.text] });
        if let Some(source) = &self.source {
            ui["source"] = json!(source);
        }
        if let Some(class_type) = &self.class_type {
            ui["class_type"] = json!(class_type);
        }
        ui
    }
}

/// Preview Text Node
///
/// # Inputs
/// - `text` (STRING, connection only)
///
/// # Hidden
/// - `UNIQUE_ID`, and `PROMPT` (implied by being an output node)
pub struct PreviewTextNode;

impl PreviewTextNode {
    pub const NODE_ID: &'static str = "PreviewText";
    pub const PORT_TEXT: &'static str = "text";

    pub fn node_type() -> NodeType {
        NodeType::builder(Self::NODE_ID)
            .define_schema(|| {
                Schema::new(Self::NODE_ID)
                    .display_name("Preview Text")
                    .category("utils")
                    .output_node()
                    .hidden(HiddenKey::UniqueId)
                    .input(Input::string(Self::PORT_TEXT).force_input(true))
            })
            .execute_async(|invocation, inputs| async move {
                let text = required_str(&inputs, Self::PORT_TEXT)?;
                let preview = PreviewText::from_context(text, invocation.hidden());
                log::debug!("PreviewText {:?}: {} chars", preview.source, preview.text.len());
                Ok::<_, ContractError>(ExecutionResult::Canonical(
                    NodeOutput::empty().with_ui(&preview),
                ))
            })
            .build()
    }
}

inventory::submit!(NodeTypeFn(PreviewTextNode::node_type));
