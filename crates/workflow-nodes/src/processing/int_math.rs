//! Integer Math Nodes
//!
//! `IntMath` applies a binary operation to two integers. `ClampedIntMath`
//! is derived from it: it inherits the schema, the input validation hook,
//! and the arithmetic, and clamps the parent's result into a range.

use node_contracts::{
    ComboChoice, ContractError, ExecutionResult, Input, NodeInputs, NodeType, NodeTypeFn, Output,
    Schema,
};
use serde_json::Value;

use crate::{required_i64, required_str};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ComboChoice for MathOp {
    fn all() -> &'static [Self] {
        &[Self::Add, Self::Subtract, Self::Multiply, Self::Divide]
    }

    fn value(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }
}

impl MathOp {
    /// `None` on overflow or division by zero
    pub fn apply(&self, a: i64, b: i64) -> Option<i64> {
        match self {
            Self::Add => a.checked_add(b),
            Self::Subtract => a.checked_sub(b),
            Self::Multiply => a.checked_mul(b),
            Self::Divide => a.checked_div(b),
        }
    }
}

fn parse_op(inputs: &NodeInputs) -> node_contracts::Result<MathOp> {
    let raw = required_str(inputs, IntMathNode::PORT_OP)?;
    MathOp::from_value(raw)
        .ok_or_else(|| ContractError::failed(format!("Unknown operation '{}'", raw)))
}

/// Integer Math Node
///
/// # Inputs
/// - `a`, `b` (INT) - Operands
/// - `op` (combo) - One of [`MathOp`]
///
/// # Outputs
/// - `result` (INT)
pub struct IntMathNode;

impl IntMathNode {
    pub const NODE_ID: &'static str = "IntMath";
    pub const PORT_A: &'static str = "a";
    pub const PORT_B: &'static str = "b";
    pub const PORT_OP: &'static str = "op";
    pub const PORT_RESULT: &'static str = "result";

    pub fn node_type() -> NodeType {
        NodeType::builder(Self::NODE_ID)
            .define_schema(|| {
                Schema::new(Self::NODE_ID)
                    .display_name("Integer Math")
                    .category("math")
                    .input(Input::int(Self::PORT_A).default(0))
                    .input(Input::int(Self::PORT_B).default(0))
                    .input(Input::combo_choice::<MathOp>(Self::PORT_OP).default_choice(MathOp::Add))
                    .output(Output::int().id(Self::PORT_RESULT))
            })
            .validate_inputs(|inputs| {
                let op = inputs.get(Self::PORT_OP).and_then(|v| v.as_str());
                let divide = op == Some(MathOp::Divide.value());
                if divide && inputs.get(Self::PORT_B).and_then(|v| v.as_i64()) == Some(0) {
                    return Err("b must not be zero when dividing".to_string());
                }
                Ok(())
            })
            .execute(|_invocation, inputs| {
                let a = required_i64(&inputs, Self::PORT_A)?;
                let b = required_i64(&inputs, Self::PORT_B)?;
                let op = parse_op(&inputs)?;
                let result = op.apply(a, b).ok_or_else(|| {
                    ContractError::failed(format!("{} {} {} is out of range", a, op.value(), b))
                })?;
                Ok(ExecutionResult::Values(vec![Value::from(result)]))
            })
            .build()
    }
}

inventory::submit!(NodeTypeFn(IntMathNode::node_type));

/// `IntMath` with its result clamped to `[min, max]`
pub struct ClampedIntMathNode;

impl ClampedIntMathNode {
    pub const NODE_ID: &'static str = "ClampedIntMath";
    pub const PORT_MIN: &'static str = "min";
    pub const PORT_MAX: &'static str = "max";

    pub fn node_type() -> NodeType {
        NodeType::derive(&IntMathNode::node_type(), Self::NODE_ID)
            .extend_schema(|mut schema| {
                schema.node_id = Self::NODE_ID.to_string();
                schema.display_name = Some("Clamped Integer Math".to_string());
                schema
                    .input(Input::int(Self::PORT_MIN).default(i64::from(i32::MIN)))
                    .input(Input::int(Self::PORT_MAX).default(i64::from(i32::MAX)))
            })
            .execute(|invocation, inputs| {
                let min = required_i64(&inputs, Self::PORT_MIN)?;
                let max = required_i64(&inputs, Self::PORT_MAX)?;
                if min > max {
                    return Err(ContractError::failed(format!(
                        "min {} is greater than max {}",
                        min, max
                    )));
                }
                let output = invocation.call_parent_sync(inputs)?.into_output()?;
                let value = output
                    .get(0)
                    .and_then(|v| v.as_i64())
                    .ok_or_else(|| ContractError::failed("IntMath produced no integer result"))?;
                Ok(ExecutionResult::Values(vec![Value::from(value.clamp(min, max))]))
            })
            .build()
    }
}

inventory::submit!(NodeTypeFn(ClampedIntMathNode::node_type));
