//! Input nodes
//!
//! Nodes whose values come from widgets rather than connections.

mod primitive;
mod sampler_select;

pub use primitive::{
    PrimitiveBooleanNode, PrimitiveFloatNode, PrimitiveIntNode, PrimitiveStringNode, PORT_VALUE,
};
pub use sampler_select::{Sampler, SamplerSelectNode};
