//! Processing nodes
//!
//! Nodes that transform their inputs.

mod echo_completion;
mod int_math;

pub use echo_completion::{CompletionModel, EchoCompletionExecutor, EchoCompletionNode};
pub use int_math::{ClampedIntMathNode, IntMathNode, MathOp};
