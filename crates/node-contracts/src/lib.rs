//! Node Contracts - Node definitions and execution contracts for data-flow graphs
//!
//! This crate defines how a node type describes itself and how an executor
//! calls it. It provides:
//!
//! - Port type tags and a registry of known port types
//! - Input, output, and widget descriptors with pruned serialization
//! - Schema assembly, finalization, validation, and introspection
//! - Price badges for client-side cost estimates
//! - Per-invocation hidden context
//! - A node contract with normalized sync and async execution
//!
//! # Architecture
//!
//! - `Schema`: declarative node description built from descriptors
//! - `NodeType`: explicitly registered define-schema and execute operations
//! - `NodeInvocation`: one isolated execution with its own hidden context
//! - `NodeRegistry`: validated node types keyed by node id
//!
//! # Example
//!
//! ```ignore
//! use node_contracts::{ExecutionResult, Input, NodeRegistry, NodeType, Output, Schema};
//!
//! let mut registry = NodeRegistry::new();
//! registry.register(
//!     NodeType::builder("Negate")
//!         .define_schema(|| {
//!             Schema::new("Negate")
//!                 .input(Input::int("value"))
//!                 .output(Output::int())
//!         })
//!         .execute(|_, inputs| {
//!             let v = inputs.get("value").and_then(|v| v.as_i64()).unwrap_or(0);
//!             Ok(ExecutionResult::Values(vec![(-v).into()]))
//!         })
//!         .build(),
//! )?;
//! let output = registry.invoke("Negate", None, inputs).await?;
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod hidden;
pub mod node;
pub mod output;
pub mod port_types;
pub mod price_badge;
pub mod registry;
pub mod schema;
pub mod types;

// Re-export key types
pub use config::ContractSettings;
pub use descriptor::{
    BooleanOptions, ComboOptions, FloatOptions, Input, InputKind, IntOptions, Output,
    RemoteOptions, StringOptions, WidgetFields,
};
pub use error::{ContractError, Result};
pub use hidden::{HiddenContext, HiddenKey, InvocationData};
pub use node::{AsyncExecute, EntryPoint, NodeInputs, NodeInvocation, NodeType, NodeTypeBuilder};
pub use output::{ExecutionBlock, ExecutionResult, NodeOutput, UiOutput};
pub use port_types::{InputShape, PortTypeCapabilities, PortTypeRegistry, ValueKind};
pub use price_badge::{PriceBadge, PriceBadgeDepends};
pub use registry::{NodeRegistry, NodeTypeFn};
pub use schema::{NodeInfo, Schema};
pub use types::{ComboChoice, ControlAfterRefresh, NodeId, NumberDisplay, PortId, PortTypeTag};
