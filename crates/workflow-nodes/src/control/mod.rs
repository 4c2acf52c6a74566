//! Control nodes
//!
//! Nodes that decide whether downstream execution may proceed.

mod gate;

pub use gate::GateNode;
