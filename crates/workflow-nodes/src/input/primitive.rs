//! Primitive Value Nodes
//!
//! Widget-backed constants: each node exposes one widget input and passes
//! its value through to a single output of the same type.

use node_contracts::{
    ExecutionResult, FloatOptions, Input, IntOptions, NodeType, NodeTypeFn, Output, Schema,
    StringOptions,
};

use crate::required;

/// Port ID shared by every primitive node
pub const PORT_VALUE: &str = "value";

const CATEGORY: &str = "utils/primitive";

fn primitive(
    node_id: &'static str,
    description: &'static str,
    input: fn() -> Input,
    output: fn() -> Output,
) -> NodeType {
    NodeType::builder(node_id)
        .define_schema(move || {
            Schema::new(node_id)
                .category(CATEGORY)
                .description(description)
                .input(input())
                .output(output())
        })
        .execute(|invocation, inputs| {
            let value = required(&inputs, PORT_VALUE)?.clone();
            log::debug!("{}: passing through {}", invocation.node_type().name(), value);
            Ok(ExecutionResult::Values(vec![value]))
        })
        .build()
}

/// Integer constant with a generate-time control widget
pub struct PrimitiveIntNode;

impl PrimitiveIntNode {
    pub const NODE_ID: &'static str = "PrimitiveInt";

    pub fn node_type() -> NodeType {
        primitive(
            Self::NODE_ID,
            "An integer constant",
            || {
                Input::new(
                    PORT_VALUE,
                    IntOptions {
                        min: Some(i64::from(i32::MIN)),
                        max: Some(i64::from(i32::MAX)),
                        control_after_generate: Some(true),
                        ..Default::default()
                    },
                )
                .default(0)
            },
            Output::int,
        )
    }
}

inventory::submit!(NodeTypeFn(PrimitiveIntNode::node_type));

pub struct PrimitiveFloatNode;

impl PrimitiveFloatNode {
    pub const NODE_ID: &'static str = "PrimitiveFloat";

    pub fn node_type() -> NodeType {
        primitive(
            Self::NODE_ID,
            "A floating point constant",
            || {
                Input::new(
                    PORT_VALUE,
                    FloatOptions {
                        step: Some(0.01),
                        round: Some(0.001),
                        ..Default::default()
                    },
                )
                .default(0.0)
            },
            Output::float,
        )
    }
}

inventory::submit!(NodeTypeFn(PrimitiveFloatNode::node_type));

pub struct PrimitiveStringNode;

impl PrimitiveStringNode {
    pub const NODE_ID: &'static str = "PrimitiveString";

    pub fn node_type() -> NodeType {
        primitive(
            Self::NODE_ID,
            "A text constant",
            || {
                Input::new(
                    PORT_VALUE,
                    StringOptions {
                        multiline: true,
                        ..Default::default()
                    },
                )
                .default("")
            },
            Output::string,
        )
    }
}

inventory::submit!(NodeTypeFn(PrimitiveStringNode::node_type));

pub struct PrimitiveBooleanNode;

impl PrimitiveBooleanNode {
    pub const NODE_ID: &'static str = "PrimitiveBoolean";

    pub fn node_type() -> NodeType {
        primitive(
            Self::NODE_ID,
            "A boolean constant",
            || Input::boolean(PORT_VALUE).default(false),
            Output::boolean,
        )
    }
}

inventory::submit!(NodeTypeFn(PrimitiveBooleanNode::node_type));
