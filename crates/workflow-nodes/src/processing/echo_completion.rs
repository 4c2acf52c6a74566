//! Echo Completion Node
//!
//! A deterministic stand-in for a billed completion API. It exercises the
//! parts of the contract remote nodes rely on: the api-node flag, a price
//! badge read by the client, an executor object, and untyped JSON results
//! of the kind an external service hands back.

use async_trait::async_trait;
use node_contracts::{
    AsyncExecute, ComboChoice, ContractError, ExecutionResult, Input, IntOptions, NodeInputs,
    NodeInvocation, NodeType, NodeTypeFn, NumberDisplay, Output, PriceBadge, PriceBadgeDepends,
    Result, Schema, StringOptions,
};
use serde_json::json;
use std::sync::Arc;

use crate::{required_i64, required_str};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionModel {
    Small,
    Large,
}

impl ComboChoice for CompletionModel {
    fn all() -> &'static [Self] {
        &[Self::Small, Self::Large]
    }

    fn value(&self) -> &'static str {
        match self {
            Self::Small => "echo-small",
            Self::Large => "echo-large",
        }
    }
}

/// Executor echoing the first `max_tokens` words of the prompt
///
/// The large model echoes the prompt in upper case.
#[derive(Debug, Default)]
pub struct EchoCompletionExecutor;

#[async_trait]
impl AsyncExecute for EchoCompletionExecutor {
    async fn execute(
        &self,
        invocation: &NodeInvocation,
        inputs: NodeInputs,
    ) -> Result<ExecutionResult> {
        let prompt = required_str(&inputs, EchoCompletionNode::PORT_PROMPT)?;
        let model = required_str(&inputs, EchoCompletionNode::PORT_MODEL)?;
        let model = CompletionModel::from_value(model)
            .ok_or_else(|| ContractError::failed(format!("Unknown model '{}'", model)))?;
        let max_tokens = required_i64(&inputs, EchoCompletionNode::PORT_MAX_TOKENS)?;
        let max_tokens = usize::try_from(max_tokens)
            .map_err(|_| ContractError::failed("max_tokens must not be negative"))?;

        let words: Vec<&str> = prompt.split_whitespace().take(max_tokens).collect();
        let mut text = words.join(" ");
        if model == CompletionModel::Large {
            text = text.to_uppercase();
        }
        log::debug!(
            "EchoCompletion {:?}: {} tokens from {}",
            invocation.hidden().unique_id(),
            words.len(),
            model.value()
        );

        Ok(ExecutionResult::Dynamic(json!({
            "result": [text, words.len()],
        })))
    }
}

/// Echo Completion Node
///
/// # Inputs
/// - `prompt` (STRING, multiline)
/// - `model` (combo) - One of [`CompletionModel`]
/// - `max_tokens` (INT, 1..=4096)
///
/// # Outputs
/// - `text` (STRING)
/// - `tokens` (INT)
pub struct EchoCompletionNode;

impl EchoCompletionNode {
    pub const NODE_ID: &'static str = "EchoCompletion";
    pub const PORT_PROMPT: &'static str = "prompt";
    pub const PORT_MODEL: &'static str = "model";
    pub const PORT_MAX_TOKENS: &'static str = "max_tokens";

    /// Price per token, in credits, keyed by model
    pub const PRICE_EXPR: &'static str =
        "(widgets.model = \"echo-large\" ? 0.002 : 0.0005) * widgets.max_tokens";

    pub fn node_type() -> NodeType {
        NodeType::builder(Self::NODE_ID)
            .define_schema(|| {
                Schema::new(Self::NODE_ID)
                    .display_name("Echo Completion")
                    .category("api/text")
                    .description("Echoes the prompt back, billed per token")
                    .api_node()
                    .input(Input::new(
                        Self::PORT_PROMPT,
                        StringOptions {
                            multiline: true,
                            placeholder: Some("Write a prompt".to_string()),
                            dynamic_prompts: Some(false),
                        },
                    ))
                    .input(
                        Input::combo_choice::<CompletionModel>(Self::PORT_MODEL)
                            .default_choice(CompletionModel::Small),
                    )
                    .input(
                        Input::new(
                            Self::PORT_MAX_TOKENS,
                            IntOptions {
                                min: Some(1),
                                max: Some(4096),
                                step: Some(1),
                                display: Some(NumberDisplay::Slider),
                                ..Default::default()
                            },
                        )
                        .default(256),
                    )
                    .output(Output::string().id("text"))
                    .output(Output::int().id("tokens"))
                    .price_badge(
                        PriceBadge::new(Self::PRICE_EXPR).depends_on(
                            PriceBadgeDepends::default()
                                .widgets([Self::PORT_MODEL, Self::PORT_MAX_TOKENS]),
                        ),
                    )
            })
            .executor(Arc::new(EchoCompletionExecutor))
            .build()
    }
}

inventory::submit!(NodeTypeFn(EchoCompletionNode::node_type));

#[cfg(test)]
mod tests {
    use super::*;
    use node_contracts::{EntryPoint, InvocationData};

    fn inputs(prompt: &str, model: CompletionModel, max_tokens: i64) -> NodeInputs {
        let mut inputs = NodeInputs::new();
        inputs.insert("prompt".to_string(), json!(prompt));
        inputs.insert("model".to_string(), json!(model.value()));
        inputs.insert("max_tokens".to_string(), json!(max_tokens));
        inputs
    }

    #[test]
    fn test_descriptor_carries_price_badge() {
        let info = EchoCompletionNode::node_type().node_info().unwrap();
        assert!(info.api_node);
        let badge = info.price_badge.unwrap();
        assert_eq!(badge["engine"], "jsonata");
        assert_eq!(badge["depends_on"]["widgets"][0], json!({"name": "model", "type": "COMBO"}));
        assert_eq!(badge["depends_on"]["widgets"][1], json!({"name": "max_tokens", "type": "INT"}));
        assert_eq!(info.input["max_tokens"][1]["display"], "slider");
        assert_eq!(info.input["prompt"][1]["placeholder"], "Write a prompt");
    }

    #[test]
    fn test_entry_point_is_async() {
        assert_eq!(
            EchoCompletionNode::node_type().entry_point().unwrap(),
            EntryPoint::NormalizedAsync
        );
    }

    #[tokio::test]
    async fn test_dynamic_result_normalized() {
        let node = Arc::new(EchoCompletionNode::node_type());
        let mut data = InvocationData::default();
        data.hidden_inputs.insert("UNIQUE_ID".to_string(), json!(9));

        let invocation = node.prepare_invocation(Some(&data)).unwrap();
        assert_eq!(invocation.hidden().unique_id(), Some("9"));

        let output = invocation
            .execute_normalized_async(inputs("one two three four", CompletionModel::Large, 2))
            .await
            .unwrap();
        assert_eq!(output.values, vec![json!("ONE TWO"), json!(2)]);
    }
}
