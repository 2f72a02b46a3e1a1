//! Operator graph in single-assignment form.
//!
//! The IR is a directed graph where:
//! - **Nodes** (`IrNode`) are graph inputs (placeholders), operator calls, or
//!   the single output node
//! - **Arguments** (`NodeArg`) reference earlier nodes by id, so every value
//!   is defined exactly once and used by name afterwards
//!
//! petgraph edges mirror the argument references and exist solely for
//! topological ordering and user lookup.

use crate::op::OpId;
use crate::value::{Scalar, Value};
use crate::{Error, Result};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::Topo;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Type alias for IR node identifiers (backed by petgraph NodeIndex).
pub type IrNodeId = NodeIndex;

/// What a node does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOp {
    /// A graph input.
    Placeholder,

    /// An operator invocation.
    Call(OpId),

    /// The graph's return values.
    Output,
}

/// One argument of a node: a reference, a container, or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeArg {
    Node(IrNodeId),
    List(Vec<NodeArg>),
    Literal(Scalar),
}

impl NodeArg {
    pub fn int(value: i64) -> Self {
        NodeArg::Literal(Scalar::Int(value))
    }

    pub fn int_list(values: &[i64]) -> Self {
        NodeArg::List(values.iter().map(|&v| NodeArg::int(v)).collect())
    }

    /// Every node referenced anywhere inside this argument.
    pub fn referenced_nodes(&self) -> Vec<IrNodeId> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes(&self, out: &mut Vec<IrNodeId>) {
        match self {
            NodeArg::Node(id) => out.push(*id),
            NodeArg::List(items) => items.iter().for_each(|item| item.collect_nodes(out)),
            NodeArg::Literal(_) => {}
        }
    }

    /// Build the runtime value of this argument, reading node results
    /// through `lookup`.
    pub fn resolve<F>(&self, lookup: &mut F) -> Result<Value>
    where
        F: FnMut(IrNodeId) -> Result<Value>,
    {
        Ok(match self {
            NodeArg::Node(id) => lookup(*id)?,
            NodeArg::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| item.resolve(lookup))
                    .collect::<Result<Vec<_>>>()?,
            ),
            NodeArg::Literal(s) => Value::Scalar(s.clone()),
        })
    }

    /// Rewrite every node reference through `f`.
    pub fn map_nodes<F>(&self, f: &mut F) -> Result<NodeArg>
    where
        F: FnMut(IrNodeId) -> Result<IrNodeId>,
    {
        Ok(match self {
            NodeArg::Node(id) => NodeArg::Node(f(*id)?),
            NodeArg::List(items) => NodeArg::List(
                items
                    .iter()
                    .map(|item| item.map_nodes(f))
                    .collect::<Result<Vec<_>>>()?,
            ),
            NodeArg::Literal(s) => NodeArg::Literal(s.clone()),
        })
    }
}

/// Per-node metadata carried through rewrites.
#[derive(Debug, Clone, Default)]
pub struct NodeMeta {
    /// Example value of the node's result, usually abstract tensors.
    pub val: Option<Value>,

    /// Where the node originated, for diagnostics.
    pub stack_trace: Option<String>,
}

/// A node in the IR graph.
#[derive(Debug, Clone)]
pub struct IrNode {
    /// Unique value name within the graph.
    pub name: String,

    pub op: NodeOp,

    pub args: Vec<NodeArg>,

    pub kwargs: BTreeMap<String, NodeArg>,

    pub meta: NodeMeta,

    /// The graph node index (for efficient graph traversal).
    pub node_index: IrNodeId,
}

impl IrNode {
    /// The operator invoked by a call node.
    pub fn target(&self) -> Option<&OpId> {
        match &self.op {
            NodeOp::Call(op) => Some(op),
            _ => None,
        }
    }

    /// Every node this node reads.
    pub fn inputs(&self) -> Vec<IrNodeId> {
        self.args
            .iter()
            .chain(self.kwargs.values())
            .flat_map(NodeArg::referenced_nodes)
            .collect()
    }
}

// ──────────────────────────────── IrGraph ────────────────────────────────

/// Operator graph.
pub struct IrGraph {
    graph: StableGraph<IrNode, ()>,

    /// Nodes in insertion order (a valid execution order).
    order: Vec<IrNodeId>,

    /// Lookup table: value name -> node ID.
    node_by_name: HashMap<String, IrNodeId>,

    output: Option<IrNodeId>,
}

impl IrGraph {
    /// Create a new empty IR graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            order: Vec::new(),
            node_by_name: HashMap::new(),
            output: None,
        }
    }

    // ── Node access ──

    /// Get an immutable reference to a node.
    pub fn node(&self, id: IrNodeId) -> Result<&IrNode> {
        self.graph
            .node_weight(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))
    }

    /// Get a mutable reference to a node.
    pub fn node_mut(&mut self, id: IrNodeId) -> Result<&mut IrNode> {
        self.graph
            .node_weight_mut(id)
            .ok_or_else(|| Error::InvalidGraph(format!("Node {:?} not found", id)))
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (IrNodeId, &IrNode)> {
        self.order
            .iter()
            .filter_map(|&id| self.graph.node_weight(id).map(|node| (id, node)))
    }

    /// Iterate over operator call nodes in insertion order.
    pub fn call_nodes(&self) -> impl Iterator<Item = (IrNodeId, &IrNode)> {
        self.nodes()
            .filter(|(_, node)| matches!(node.op, NodeOp::Call(_)))
    }

    /// Graph input nodes in declaration order.
    pub fn placeholders(&self) -> Vec<IrNodeId> {
        self.nodes()
            .filter(|(_, node)| node.op == NodeOp::Placeholder)
            .map(|(id, _)| id)
            .collect()
    }

    /// The output node, once set.
    pub fn output(&self) -> Option<IrNodeId> {
        self.output
    }

    /// Nodes that read `id`.
    pub fn users(&self, id: IrNodeId) -> Vec<IrNodeId> {
        let mut users: Vec<IrNodeId> = self
            .graph
            .neighbors_directed(id, Direction::Outgoing)
            .collect();
        users.sort();
        users.dedup();
        users
    }

    // ── Graph construction ──

    /// Add a graph input with an optional example value.
    pub fn add_placeholder(&mut self, name: &str, val: Option<Value>) -> IrNodeId {
        let meta = NodeMeta {
            val,
            stack_trace: None,
        };
        self.insert(name, NodeOp::Placeholder, Vec::new(), BTreeMap::new(), meta)
    }

    /// Add an operator call.
    ///
    /// Every referenced node must already exist and may not be the output.
    pub fn add_call(
        &mut self,
        op: OpId,
        args: Vec<NodeArg>,
        kwargs: BTreeMap<String, NodeArg>,
        meta: NodeMeta,
    ) -> Result<IrNodeId> {
        self.check_references(args.iter().chain(kwargs.values()))?;
        let name = op.name().to_string();
        Ok(self.insert(&name, NodeOp::Call(op), args, kwargs, meta))
    }

    /// Set the graph's output values. A graph has exactly one output node.
    pub fn set_output(&mut self, args: Vec<NodeArg>) -> Result<IrNodeId> {
        if self.output.is_some() {
            return Err(Error::InvalidGraph("Graph output is already set".to_string()));
        }
        self.check_references(args.iter())?;
        let id = self.insert("output", NodeOp::Output, args, BTreeMap::new(), NodeMeta::default());
        self.output = Some(id);
        Ok(id)
    }

    /// Replace the operator a call node invokes, keeping its arguments.
    pub fn replace_target(&mut self, id: IrNodeId, op: OpId) -> Result<()> {
        let node = self.node_mut(id)?;
        match node.op {
            NodeOp::Call(_) => {
                node.op = NodeOp::Call(op);
                Ok(())
            }
            _ => Err(Error::InvalidGraph(format!(
                "Node '{}' is not an operator call",
                node.name
            ))),
        }
    }

    fn check_references<'a>(&self, args: impl Iterator<Item = &'a NodeArg>) -> Result<()> {
        for arg in args {
            for id in arg.referenced_nodes() {
                self.node(id)?;
                if Some(id) == self.output {
                    return Err(Error::InvalidGraph(
                        "The output node cannot be used as an argument".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn insert(
        &mut self,
        base_name: &str,
        op: NodeOp,
        args: Vec<NodeArg>,
        kwargs: BTreeMap<String, NodeArg>,
        meta: NodeMeta,
    ) -> IrNodeId {
        let name = self.unique_name(base_name);
        let mut node = IrNode {
            name: name.clone(),
            op,
            args,
            kwargs,
            meta,
            node_index: NodeIndex::default(),
        };
        let inputs = node.inputs();

        let id = self.graph.add_node(node.clone());
        node.node_index = id;
        for input in inputs {
            self.graph.add_edge(input, id, ());
        }
        if let Some(slot) = self.graph.node_weight_mut(id) {
            *slot = node;
        }

        self.node_by_name.insert(name, id);
        self.order.push(id);
        id
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.node_by_name.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{base}_{i}"))
            .find(|candidate| !self.node_by_name.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    // ── Graph queries ──

    /// Get the topological order of nodes in the graph.
    ///
    /// Returns nodes in an order such that all inputs to a node are produced
    /// before the node itself.
    pub fn topological_order(&self) -> Vec<IrNodeId> {
        let mut topo = Topo::new(&self.graph);
        let mut order = Vec::new();

        while let Some(id) = topo.next(&self.graph) {
            if self.graph.node_weight(id).is_some() {
                order.push(id);
            }
        }

        order
    }

    /// Get the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Find a node by its value name.
    pub fn find_node_by_name(&self, name: &str) -> Result<IrNodeId> {
        self.node_by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::InvalidGraph(format!("Node '{}' not found", name)))
    }

    fn format_arg(&self, arg: &NodeArg) -> String {
        match arg {
            NodeArg::Node(id) => match self.graph.node_weight(*id) {
                Some(node) => format!("%{}", node.name),
                None => "%<missing>".to_string(),
            },
            NodeArg::List(items) => {
                let parts: Vec<String> = items.iter().map(|item| self.format_arg(item)).collect();
                format!("[{}]", parts.join(", "))
            }
            NodeArg::Literal(s) => s.to_string(),
        }
    }
}

impl Default for IrGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IrGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, node) in self.nodes() {
            let mut parts: Vec<String> = node.args.iter().map(|a| self.format_arg(a)).collect();
            parts.extend(
                node.kwargs
                    .iter()
                    .map(|(name, a)| format!("{name}={}", self.format_arg(a))),
            );
            match &node.op {
                NodeOp::Placeholder => writeln!(f, "%{} = placeholder", node.name)?,
                NodeOp::Call(op) => writeln!(f, "%{} = {op}({})", node.name, parts.join(", "))?,
                NodeOp::Output => writeln!(f, "return ({})", parts.join(", "))?,
            }
        }
        Ok(())
    }
}
