//! Node contract and per-invocation isolation
//!
//! A [`NodeType`] is assembled from explicitly registered operations: a
//! define-schema function and an execute body (sync or async), plus an
//! optional input validation hook. Nothing is discovered by introspection;
//! a node type missing either required operation fails with
//! [`ContractError::Authoring`] the first time its schema is requested.
//!
//! Each invocation runs on a [`NodeInvocation`]: a fresh value holding the
//! shared node type and a hidden context resolved for that invocation only.
//! Concurrent invocations of the same node type never share hidden state.
//!
//! # Example
//!
//! ```ignore
//! use node_contracts::{ExecutionResult, Input, NodeType, Output, Schema};
//! use serde_json::json;
//!
//! let add = NodeType::builder("AddInts")
//!     .define_schema(|| {
//!         Schema::new("AddInts")
//!             .input(Input::int("a"))
//!             .input(Input::int("b"))
//!             .output(Output::int())
//!     })
//!     .execute(|_invocation, inputs| {
//!         let a = inputs.get("a").and_then(|v| v.as_i64()).unwrap_or(0);
//!         let b = inputs.get("b").and_then(|v| v.as_i64()).unwrap_or(0);
//!         Ok(ExecutionResult::Values(vec![json!(a + b)]))
//!     })
//!     .build();
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::error::{ContractError, Result};
use crate::hidden::{HiddenContext, InvocationData};
use crate::output::{ExecutionResult, NodeOutput};
use crate::schema::{NodeInfo, Schema};

/// Named input values passed to an execute body
pub type NodeInputs = HashMap<String, Value>;

type SchemaFn = Arc<dyn Fn() -> Schema + Send + Sync>;
type SyncExecuteFn =
    Arc<dyn Fn(&NodeInvocation, NodeInputs) -> Result<ExecutionResult> + Send + Sync>;
type AsyncCallbackFn = Box<
    dyn Fn(NodeInvocation, NodeInputs) -> BoxFuture<'static, Result<ExecutionResult>>
        + Send
        + Sync,
>;
type ValidateInputsFn = Arc<dyn Fn(&NodeInputs) -> std::result::Result<(), String> + Send + Sync>;

/// Asynchronous execute body
///
/// Implement this directly for stateful executors, or use
/// [`NodeTypeBuilder::execute_async`] with a closure.
#[async_trait]
pub trait AsyncExecute: Send + Sync {
    async fn execute(
        &self,
        invocation: &NodeInvocation,
        inputs: NodeInputs,
    ) -> Result<ExecutionResult>;
}

/// Closure-backed `AsyncExecute`
struct CallbackExecute {
    callback: AsyncCallbackFn,
}

#[async_trait]
impl AsyncExecute for CallbackExecute {
    async fn execute(
        &self,
        invocation: &NodeInvocation,
        inputs: NodeInputs,
    ) -> Result<ExecutionResult> {
        (self.callback)(invocation.clone(), inputs).await
    }
}

#[derive(Clone)]
enum ExecuteBody {
    Sync(SyncExecuteFn),
    Async(Arc<dyn AsyncExecute>),
}

/// One level of an execute override chain
///
/// `parent` is the implementation this one replaced, so an override can
/// delegate upward without flattening the chain.
struct ExecuteImpl {
    body: ExecuteBody,
    parent: Option<Arc<ExecuteImpl>>,
}

/// Which normalized entry point the executor must call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// `NodeInvocation::execute_normalized`
    Normalized,
    /// `NodeInvocation::execute_normalized_async`
    NormalizedAsync,
}

impl EntryPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normalized => "EXECUTE_NORMALIZED",
            Self::NormalizedAsync => "EXECUTE_NORMALIZED_ASYNC",
        }
    }
}

/// A pluggable compute unit
///
/// Shared behind an `Arc` by every invocation; the cached schema is the only
/// state and is written once.
pub struct NodeType {
    name: String,
    define_schema: Option<SchemaFn>,
    execute: Option<Arc<ExecuteImpl>>,
    validate_inputs: Option<ValidateInputsFn>,
    schema: OnceCell<Arc<Schema>>,
}

impl NodeType {
    /// Start building a node type; `name` identifies the implementation
    pub fn builder(name: impl Into<String>) -> NodeTypeBuilder {
        NodeTypeBuilder {
            name: name.into(),
            define_schema: None,
            execute: None,
            validate_inputs: None,
        }
    }

    /// Start building a node type that inherits every operation of `parent`
    pub fn derive(parent: &NodeType, name: impl Into<String>) -> NodeTypeBuilder {
        NodeTypeBuilder {
            name: name.into(),
            define_schema: parent.define_schema.clone(),
            execute: parent.execute.clone(),
            validate_inputs: parent.validate_inputs.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check both required operations were registered
    pub fn validate_node_type(&self) -> Result<()> {
        if self.define_schema.is_none() {
            return Err(ContractError::Authoring(format!(
                "No define_schema function was defined for node type {}.",
                self.name
            )));
        }
        if self.execute.is_none() {
            return Err(ContractError::Authoring(format!(
                "No execute function was defined for node type {}.",
                self.name
            )));
        }
        Ok(())
    }

    pub fn entry_point(&self) -> Result<EntryPoint> {
        self.validate_node_type()?;
        match self.execute.as_ref().map(|e| &e.body) {
            Some(ExecuteBody::Async(_)) => Ok(EntryPoint::NormalizedAsync),
            _ => Ok(EntryPoint::Normalized),
        }
    }

    /// Call define-schema and finalize the result, without validating it
    pub fn finalize_schema(&self) -> Result<Schema> {
        let define = self.define_schema.as_ref().ok_or_else(|| {
            ContractError::Authoring(format!(
                "No define_schema function was defined for node type {}.",
                self.name
            ))
        })?;
        let mut schema = define();
        schema.finalize();
        Ok(schema)
    }

    /// The finalized, validated schema
    ///
    /// The node type is re-checked on every call; the schema itself is built
    /// once and cached.
    pub fn get_schema(&self) -> Result<Arc<Schema>> {
        self.validate_node_type()?;
        self.schema
            .get_or_try_init(|| {
                let schema = self.finalize_schema()?;
                schema.validate()?;
                log::debug!(
                    "Built schema '{}' for node type {} ({} inputs, {} outputs)",
                    schema.node_id,
                    self.name,
                    schema.inputs.len(),
                    schema.outputs.len()
                );
                Ok(Arc::new(schema))
            })
            .cloned()
    }

    pub fn node_info(&self) -> Result<NodeInfo> {
        self.get_schema()?.to_info()
    }

    /// Create an isolated invocation carrying its own hidden context
    pub fn prepare_invocation(
        self: &Arc<Self>,
        data: Option<&InvocationData>,
    ) -> Result<NodeInvocation> {
        self.get_schema()?;
        let level = self.execute.clone().ok_or_else(|| {
            ContractError::Authoring(format!(
                "No execute function was defined for node type {}.",
                self.name
            ))
        })?;
        let hidden = HiddenContext::from_invocation(data);
        log::debug!(
            "Prepared invocation of {} (unique_id: {:?})",
            self.name,
            hidden.unique_id()
        );
        Ok(NodeInvocation {
            node: Arc::clone(self),
            hidden: Arc::new(hidden),
            level,
        })
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("has_define_schema", &self.define_schema.is_some())
            .field("has_execute", &self.execute.is_some())
            .field("schema_cached", &self.schema.get().is_some())
            .finish()
    }
}

/// Builder registering a node type's operations explicitly
pub struct NodeTypeBuilder {
    name: String,
    define_schema: Option<SchemaFn>,
    execute: Option<Arc<ExecuteImpl>>,
    validate_inputs: Option<ValidateInputsFn>,
}

impl NodeTypeBuilder {
    pub fn define_schema(mut self, f: impl Fn() -> Schema + Send + Sync + 'static) -> Self {
        self.define_schema = Some(Arc::new(f));
        self
    }

    /// Wrap the inherited schema; starts from an empty schema if none
    pub fn extend_schema(mut self, f: impl Fn(Schema) -> Schema + Send + Sync + 'static) -> Self {
        let base = self.define_schema.take();
        let name = self.name.clone();
        self.define_schema = Some(Arc::new(move || {
            let schema = match &base {
                Some(base) => base(),
                None => Schema::new(name.clone()),
            };
            f(schema)
        }));
        self
    }

    /// Register a synchronous execute body
    pub fn execute(
        self,
        f: impl Fn(&NodeInvocation, NodeInputs) -> Result<ExecutionResult> + Send + Sync + 'static,
    ) -> Self {
        self.with_body(ExecuteBody::Sync(Arc::new(f)))
    }

    /// Register an asynchronous execute body from a closure
    pub fn execute_async<F, Fut>(self, f: F) -> Self
    where
        F: Fn(NodeInvocation, NodeInputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ExecutionResult>> + Send + 'static,
    {
        let executor = CallbackExecute {
            callback: Box::new(
                move |invocation, inputs| -> BoxFuture<'static, Result<ExecutionResult>> {
                    Box::pin(f(invocation, inputs))
                },
            ),
        };
        self.with_body(ExecuteBody::Async(Arc::new(executor)))
    }

    /// Register an asynchronous executor object
    pub fn executor(self, executor: Arc<dyn AsyncExecute>) -> Self {
        self.with_body(ExecuteBody::Async(executor))
    }

    /// Register an input validation hook; `Err` carries the message
    pub fn validate_inputs(
        mut self,
        f: impl Fn(&NodeInputs) -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validate_inputs = Some(Arc::new(f));
        self
    }

    fn with_body(mut self, body: ExecuteBody) -> Self {
        let parent = self.execute.take();
        self.execute = Some(Arc::new(ExecuteImpl { body, parent }));
        self
    }

    pub fn build(self) -> NodeType {
        NodeType {
            name: self.name,
            define_schema: self.define_schema,
            execute: self.execute,
            validate_inputs: self.validate_inputs,
            schema: OnceCell::new(),
        }
    }
}

/// One isolated invocation of a node type
///
/// Cloning shares the same hidden context; a new invocation is prepared
/// from the node type for each execution.
#[derive(Clone)]
pub struct NodeInvocation {
    node: Arc<NodeType>,
    hidden: Arc<HiddenContext>,
    level: Arc<ExecuteImpl>,
}

impl NodeInvocation {
    pub fn node_type(&self) -> &NodeType {
        &self.node
    }

    pub fn hidden(&self) -> &HiddenContext {
        &self.hidden
    }

    pub fn schema(&self) -> Result<Arc<Schema>> {
        self.node.get_schema()
    }

    /// Run the node's input validation hook, if it registered one
    pub fn validate_inputs(&self, inputs: &NodeInputs) -> Result<()> {
        match &self.node.validate_inputs {
            Some(validate) => validate(inputs).map_err(ContractError::InputValidation),
            None => Ok(()),
        }
    }

    /// Execute a synchronous node and normalize its output
    pub fn execute_normalized(&self, inputs: NodeInputs) -> Result<NodeOutput> {
        let result = match &self.level.body {
            ExecuteBody::Sync(f) => f(self, inputs)?,
            ExecuteBody::Async(_) => {
                return Err(ContractError::Authoring(format!(
                    "Node type {} executes asynchronously; call {}",
                    self.node.name,
                    EntryPoint::NormalizedAsync.as_str()
                )));
            }
        };
        self.normalize(result)
    }

    /// Execute a node of either kind and normalize its output
    pub async fn execute_normalized_async(&self, inputs: NodeInputs) -> Result<NodeOutput> {
        let result = self.run(inputs).await?;
        self.normalize(result)
    }

    /// Run the implementation this level overrode, with the same hidden context
    pub async fn call_parent(&self, inputs: NodeInputs) -> Result<ExecutionResult> {
        self.parent_level()?.run(inputs).await
    }

    /// Synchronous form of `call_parent`; the parent must be synchronous
    pub fn call_parent_sync(&self, inputs: NodeInputs) -> Result<ExecutionResult> {
        let parent = self.parent_level()?;
        match &parent.level.body {
            ExecuteBody::Sync(f) => f(&parent, inputs),
            ExecuteBody::Async(_) => Err(ContractError::Authoring(format!(
                "Parent implementation of {} is asynchronous; use call_parent",
                self.node.name
            ))),
        }
    }

    fn parent_level(&self) -> Result<NodeInvocation> {
        let level = self.level.parent.clone().ok_or_else(|| {
            ContractError::Authoring(format!(
                "Node type {} has no parent implementation to delegate to",
                self.node.name
            ))
        })?;
        Ok(NodeInvocation {
            node: Arc::clone(&self.node),
            hidden: Arc::clone(&self.hidden),
            level,
        })
    }

    async fn run(&self, inputs: NodeInputs) -> Result<ExecutionResult> {
        match &self.level.body {
            ExecuteBody::Sync(f) => f(self, inputs),
            ExecuteBody::Async(executor) => executor.execute(self, inputs).await,
        }
    }

    fn normalize(&self, result: ExecutionResult) -> Result<NodeOutput> {
        let output = result.into_output().map_err(|e| match e {
            ContractError::ExecutionContractViolation(msg) => {
                ContractError::ExecutionContractViolation(format!(
                    "{} (node type {})",
                    msg, self.node.name
                ))
            }
            other => other,
        })?;
        if output.is_blocked() {
            log::warn!(
                "Node {} blocked execution: {}",
                self.node.name,
                output.block_message().unwrap_or("<silent>")
            );
        }
        Ok(output)
    }
}

impl fmt::Debug for NodeInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInvocation")
            .field("node", &self.node.name)
            .field("hidden", &self.hidden)
            .finish()
    }
}
