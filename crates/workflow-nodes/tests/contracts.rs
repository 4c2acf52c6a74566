//! Built-in nodes driven through the registry the way an executor drives them

use std::sync::Arc;

use node_contracts::{
    ComboChoice, ContractError, ExecutionBlock, ExecutionResult, Input, InvocationData, NodeInputs,
    NodeRegistry, NodeType, Output, PriceBadge, PriceBadgeDepends, Schema,
};
use serde_json::{json, Map, Value};
use workflow_nodes::{
    ClampedIntMathNode, EchoCompletionNode, GateNode, IntMathNode, MathOp, PreviewTextNode,
    PrimitiveBooleanNode, PrimitiveFloatNode, PrimitiveIntNode, PrimitiveStringNode,
    SamplerSelectNode,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registry() -> NodeRegistry {
    init_logging();
    let mut registry = NodeRegistry::new();
    for node in [
        PrimitiveIntNode::node_type(),
        PrimitiveFloatNode::node_type(),
        PrimitiveStringNode::node_type(),
        PrimitiveBooleanNode::node_type(),
        SamplerSelectNode::node_type(),
        GateNode::node_type(),
        IntMathNode::node_type(),
        ClampedIntMathNode::node_type(),
        EchoCompletionNode::node_type(),
        PreviewTextNode::node_type(),
    ] {
        registry.register(node).unwrap();
    }
    registry
}

fn hidden(unique_id: &str) -> InvocationData {
    let mut data = InvocationData::default();
    data.hidden_inputs.insert("UNIQUE_ID".to_string(), json!(unique_id));
    data
}

fn args(pairs: &[(&str, Value)]) -> NodeInputs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_every_builtin_describes_itself() {
    let registry = registry();
    for info in registry.all_node_info().unwrap() {
        assert!(!info.category.is_empty(), "{} has no category", info.name);
        for (id, entry) in &info.input {
            let pair = entry.as_array().unwrap();
            assert_eq!(pair.len(), 2, "input {} of {}", id, info.name);
            assert!(pair[1]["display_name"].is_string());
        }
        for id in info.output.keys() {
            assert!(!id.is_empty());
        }
    }
}

#[test]
fn test_node_info_is_idempotent() {
    let registry = registry();
    let first = registry.node_info(EchoCompletionNode::NODE_ID).unwrap();
    let second = registry.node_info(EchoCompletionNode::NODE_ID).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_duplicate_inputs_rejected_at_registration() {
    let mut registry = registry();
    let node = NodeType::builder("Dupes")
        .define_schema(|| {
            Schema::new("Dupes")
                .input(Input::int("seed"))
                .input(Input::int("steps"))
                .input(Input::float("seed"))
                .input(Input::string("steps"))
        })
        .execute(|_, _| Ok(ExecutionResult::Empty))
        .build();

    let err = registry.register(node).unwrap_err();
    assert!(matches!(err, ContractError::SchemaValidation(_)));
    let message = err.to_string();
    assert!(message.contains("seed"));
    assert!(message.contains("steps"));
    assert!(!registry.has_node_type("Dupes"));
}

#[test]
fn test_price_badge_with_unknown_widget_rejected() {
    let mut registry = registry();
    let node = NodeType::derive(&EchoCompletionNode::node_type(), "BadlyPricedCompletion")
        .extend_schema(|mut schema| {
            schema.node_id = "BadlyPricedCompletion".to_string();
            schema.price_badge(
                PriceBadge::new("widgets.temperature * 2")
                    .depends_on(PriceBadgeDepends::default().widgets(["temperature"])),
            )
        })
        .build();

    let message = registry.register(node).unwrap_err().to_string();
    assert!(message.contains("'temperature'"));
    assert!(message.contains("max_tokens"));
}

#[tokio::test]
async fn test_invoke_values_and_keyed_results() {
    let mut registry = registry();
    registry
        .register(
            NodeType::builder("Pair")
                .define_schema(|| {
                    Schema::new("Pair")
                        .output(Output::int())
                        .output(Output::string())
                })
                .execute(|_, _| Ok(ExecutionResult::Values(vec![json!(1), json!("a")])))
                .build(),
        )
        .unwrap();
    registry
        .register(
            NodeType::builder("Keyed")
                .define_schema(|| Schema::new("Keyed").output(Output::int()))
                .execute(|_, _| {
                    let mut map = Map::new();
                    map.insert("result".to_string(), json!([5]));
                    map.insert("ui".to_string(), json!({"text": "done"}));
                    Ok(ExecutionResult::Keyed(map))
                })
                .build(),
        )
        .unwrap();

    let pair = registry.invoke("Pair", None, NodeInputs::new()).await.unwrap();
    assert_eq!(pair.result(), Some(&[json!(1), json!("a")][..]));
    assert!(pair.ui.is_none());
    assert!(pair.block_message().is_none());

    let keyed = registry.invoke("Keyed", None, NodeInputs::new()).await.unwrap();
    assert_eq!(keyed.values, vec![json!(5)]);
    assert_eq!(keyed.ui, Some(json!({"text": "done"})));
}

#[tokio::test]
async fn test_blocked_output_keeps_message() {
    let registry = registry();
    let output = registry
        .invoke(
            GateNode::NODE_ID,
            Some(&hidden("3")),
            args(&[
                ("value", json!("x")),
                ("open", json!(false)),
                ("message", json!("missing input")),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(output.block, Some(ExecutionBlock::new("missing input")));
    assert!(output.values.is_empty());
}

#[tokio::test]
async fn test_invoke_rejects_invalid_inputs() {
    let registry = registry();
    let err = registry
        .invoke(
            ClampedIntMathNode::NODE_ID,
            None,
            args(&[
                ("a", json!(1)),
                ("b", json!(0)),
                ("op", json!(MathOp::Divide.value())),
                ("min", json!(0)),
                ("max", json!(10)),
            ]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContractError::InputValidation(_)));
}

#[tokio::test]
async fn test_unknown_node_type() {
    let registry = registry();
    let err = registry.invoke("Nope", None, NodeInputs::new()).await.unwrap_err();
    assert!(matches!(err, ContractError::UnknownNodeType(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invocations_see_own_hidden_context() {
    let registry = Arc::new(registry());

    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let id = format!("node-{}", i);
            let output = registry
                .invoke(
                    PreviewTextNode::NODE_ID,
                    Some(&hidden(&id)),
                    args(&[("text", json!(id.clone()))]),
                )
                .await?;
            Ok::<_, ContractError>((id, output))
        }));
    }

    for handle in handles {
        let (id, output) = handle.await.unwrap().unwrap();
        let ui = output.ui.unwrap();
        assert_eq!(ui["source"], json!(id));
        assert_eq!(ui["text"][0], json!(id));
    }
}
