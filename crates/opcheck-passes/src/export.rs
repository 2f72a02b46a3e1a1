//! Retracing host for per-node graph rewrites.
//!
//! An [`ExportPass`] sees every call node of a graph through its
//! [`ExportPass::call_operator`] hook and hands the (possibly rewritten) call
//! back to the [`PassHost`], which appends it to a fresh graph. Placeholders
//! and the output node are copied unchanged, with argument references
//! remapped onto the new graph.

use opcheck_core::value::map_call_tensors;
use opcheck_core::{
    AbstractScope, AbstractSubstrate, Error, IrGraph, IrNodeId, Kwargs, NodeArg, NodeMeta, NodeOp,
    OpId, Result, SchemaRegistry, Value,
};
use std::collections::{BTreeMap, HashMap};

/// The side of a retrace that owns the graph being built.
pub trait PassHost {
    /// Append `op(args, kwargs)` to the graph being built.
    fn delegate(
        &mut self,
        op: OpId,
        args: Vec<NodeArg>,
        kwargs: BTreeMap<String, NodeArg>,
        meta: NodeMeta,
    ) -> Result<IrNodeId>;

    /// Registry the graph's operators are resolved against.
    fn registry(&self) -> &dyn SchemaRegistry;
}

/// A rewrite applied to every call node during a retrace.
pub trait ExportPass: Send + Sync {
    fn name(&self) -> &str;

    /// Handle one call node. The default forwards it unchanged.
    ///
    /// Implementations must call [`PassHost::delegate`] exactly once and
    /// return the id it produced.
    fn call_operator(
        &self,
        op: &OpId,
        args: Vec<NodeArg>,
        kwargs: BTreeMap<String, NodeArg>,
        meta: NodeMeta,
        host: &mut dyn PassHost,
    ) -> Result<IrNodeId> {
        host.delegate(op.clone(), args, kwargs, meta)
    }
}

/// Forwards every call unchanged.
pub struct IdentityPass;

impl ExportPass for IdentityPass {
    fn name(&self) -> &str {
        "identity"
    }
}

/// Rebuilds a graph node by node through an [`ExportPass`].
///
/// With a fake mode attached, every delegated call is also run on abstract
/// tensors and its result stored in `meta.val`, so example values always
/// describe the operator that ended up in the graph.
pub struct ExportInterpreter<'a> {
    registry: &'a dyn SchemaRegistry,
    fake_mode: Option<&'a dyn AbstractSubstrate>,
}

impl<'a> ExportInterpreter<'a> {
    pub fn new(registry: &'a dyn SchemaRegistry) -> Self {
        Self {
            registry,
            fake_mode: None,
        }
    }

    /// Recompute `meta.val` of every delegated call inside one abstract scope.
    pub fn with_fake_mode(mut self, fake_mode: &'a dyn AbstractSubstrate) -> Self {
        self.fake_mode = Some(fake_mode);
        self
    }

    /// Retrace `graph` through `pass`, returning the rebuilt graph.
    ///
    /// Nodes are visited in insertion order, which is a valid execution
    /// order. The input graph is left untouched.
    #[tracing::instrument(skip_all, fields(pass = pass.name(), num_nodes = graph.node_count()))]
    pub fn retrace(&self, graph: &IrGraph, pass: &dyn ExportPass) -> Result<IrGraph> {
        let scope = match self.fake_mode {
            Some(fake_mode) => Some(fake_mode.enter()?),
            None => None,
        };
        let mut host = RetraceHost {
            graph: IrGraph::new(),
            registry: self.registry,
            scope,
        };
        let mut remap: HashMap<IrNodeId, IrNodeId> = HashMap::new();

        for (id, node) in graph.nodes() {
            let mut lookup = |old: IrNodeId| {
                remap.get(&old).copied().ok_or_else(|| {
                    Error::InvalidGraph(format!(
                        "Node '{}' reads a value that is not defined before it",
                        node.name
                    ))
                })
            };
            let args = node
                .args
                .iter()
                .map(|arg| arg.map_nodes(&mut lookup))
                .collect::<Result<Vec<_>>>()?;
            let kwargs = node
                .kwargs
                .iter()
                .map(|(name, arg)| Ok((name.clone(), arg.map_nodes(&mut lookup)?)))
                .collect::<Result<BTreeMap<_, _>>>()?;

            let new_id = match &node.op {
                NodeOp::Placeholder => host
                    .graph
                    .add_placeholder(&node.name, node.meta.val.clone()),
                NodeOp::Call(op) => {
                    let _span = tracing::trace_span!("call_operator", node = %node.name).entered();
                    pass.call_operator(op, args, kwargs, node.meta.clone(), &mut host)?
                }
                NodeOp::Output => host.graph.set_output(args)?,
            };
            remap.insert(id, new_id);
        }

        let RetraceHost { graph, .. } = host;
        Ok(graph)
    }
}

struct RetraceHost<'a> {
    graph: IrGraph,
    registry: &'a dyn SchemaRegistry,
    scope: Option<Box<dyn AbstractScope + 'a>>,
}

impl PassHost for RetraceHost<'_> {
    fn delegate(
        &mut self,
        op: OpId,
        args: Vec<NodeArg>,
        kwargs: BTreeMap<String, NodeArg>,
        mut meta: NodeMeta,
    ) -> Result<IrNodeId> {
        if let Some(scope) = self.scope.as_mut() {
            meta.val = match run_abstract(scope.as_mut(), &self.graph, &op, &args, &kwargs) {
                Ok(val) => Some(val),
                Err(Error::UnsupportedAbstract(reason)) => {
                    tracing::warn!(op = %op, reason = %reason, "No example value for node");
                    None
                }
                Err(e) => return Err(e),
            };
        }
        self.graph.add_call(op, args, kwargs, meta)
    }

    fn registry(&self) -> &dyn SchemaRegistry {
        self.registry
    }
}

/// Run `op` on the example values of its inputs.
///
/// Real example values are lifted first; an input without an example value
/// makes the whole call unsupported.
fn run_abstract(
    scope: &mut dyn AbstractScope,
    graph: &IrGraph,
    op: &OpId,
    args: &[NodeArg],
    kwargs: &BTreeMap<String, NodeArg>,
) -> Result<Value> {
    let mut lookup = |id: IrNodeId| {
        let node = graph.node(id)?;
        node.meta.val.clone().ok_or_else(|| {
            Error::UnsupportedAbstract(format!("input '{}' has no example value", node.name))
        })
    };
    let args = args
        .iter()
        .map(|arg| arg.resolve(&mut lookup))
        .collect::<Result<Vec<_>>>()?;
    let kwargs = kwargs
        .iter()
        .map(|(name, arg)| Ok((name.clone(), arg.resolve(&mut lookup)?)))
        .collect::<Result<Kwargs>>()?;

    let (args, kwargs) = map_call_tensors(&args, &kwargs, |t| {
        if t.is_abstract() {
            Ok(t.clone())
        } else {
            scope.lift(t)
        }
    })?;
    scope.call(op, &args, &kwargs)
}
