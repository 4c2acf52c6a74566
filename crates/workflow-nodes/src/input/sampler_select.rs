//! Sampler Select Node
//!
//! Exposes a fixed set of sampler names as a combo widget backed by the
//! [`Sampler`] enum.

use node_contracts::{
    ComboChoice, ContractError, ExecutionResult, Input, NodeType, NodeTypeFn, Output, Schema,
};
use serde_json::Value;

use crate::required_str;

/// Samplers offered by the select widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampler {
    Euler,
    EulerAncestral,
    Ddim,
    UniPc,
}

impl ComboChoice for Sampler {
    fn all() -> &'static [Self] {
        &[Self::Euler, Self::EulerAncestral, Self::Ddim, Self::UniPc]
    }

    fn value(&self) -> &'static str {
        match self {
            Self::Euler => "euler",
            Self::EulerAncestral => "euler_ancestral",
            Self::Ddim => "ddim",
            Self::UniPc => "uni_pc",
        }
    }
}

/// Sampler Select Node
///
/// # Inputs
/// - `sampler` (combo) - One of the [`Sampler`] values, `euler` by default
///
/// # Outputs
/// - `sampler` (COMBO) - The selected value
pub struct SamplerSelectNode;

impl SamplerSelectNode {
    pub const NODE_ID: &'static str = "SamplerSelect";
    pub const PORT_SAMPLER: &'static str = "sampler";

    pub fn node_type() -> NodeType {
        NodeType::builder(Self::NODE_ID)
            .define_schema(|| {
                Schema::new(Self::NODE_ID)
                    .display_name("Sampler Select")
                    .category("sampling")
                    .input(
                        Input::combo_choice::<Sampler>(Self::PORT_SAMPLER)
                            .default_choice(Sampler::Euler)
                            .tooltip("Sampling algorithm"),
                    )
                    .output(
                        Output::combo(Sampler::all().iter().map(|s| s.value()))
                            .id(Self::PORT_SAMPLER),
                    )
            })
            .execute(|_invocation, inputs| {
                let raw = required_str(&inputs, Self::PORT_SAMPLER)?;
                let sampler = Sampler::from_value(raw)
                    .ok_or_else(|| ContractError::failed(format!("Unknown sampler '{}'", raw)))?;
                Ok(ExecutionResult::Values(vec![Value::from(sampler.value())]))
            })
            .build()
    }
}

inventory::submit!(NodeTypeFn(SamplerSelectNode::node_type));

#[cfg(test)]
mod tests {
    use super::*;
    use node_contracts::NodeInputs;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_combo_options_and_default() {
        let info = SamplerSelectNode::node_type().node_info().unwrap();
        let (io_type, fields) = (&info.input["sampler"][0], &info.input["sampler"][1]);
        assert_eq!(io_type, "COMBO");
        assert_eq!(fields["options"], json!(["euler", "euler_ancestral", "ddim", "uni_pc"]));
        assert_eq!(fields["default"], "euler");
        assert_eq!(info.output["sampler"][1]["options"][3], "uni_pc");
    }

    #[test]
    fn test_rejects_unknown_sampler() {
        let node = Arc::new(SamplerSelectNode::node_type());
        let mut inputs = NodeInputs::new();
        inputs.insert("sampler".to_string(), json!("heun"));
        let err = node.prepare_invocation(None).unwrap().execute_normalized(inputs).unwrap_err();
        assert!(err.to_string().contains("heun"));

        let mut inputs = NodeInputs::new();
        inputs.insert("sampler".to_string(), json!("ddim"));
        let output = node.prepare_invocation(None).unwrap().execute_normalized(inputs).unwrap();
        assert_eq!(output.values, vec![json!("ddim")]);
    }
}
