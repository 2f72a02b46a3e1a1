//! Graph executor.
//!
//! Runs an `IrGraph` node by node through any `Dispatcher`: the eager
//! runtime, or a wrapper around it such as a cross-reference checker.

use crate::error::{Result, RuntimeError};
use opcheck_core::{Dispatcher, IrGraph, IrNodeId, Kwargs, NodeOp, Value};
use std::collections::HashMap;

/// Executes a graph with named inputs, returning its output values.
pub struct GraphExecutor<'a> {
    dispatcher: &'a dyn Dispatcher,
}

impl<'a> GraphExecutor<'a> {
    pub fn new(dispatcher: &'a dyn Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Execute `graph`.
    ///
    /// Every placeholder must be supplied in `inputs`; the result has one
    /// value per argument of the output node.
    #[tracing::instrument(skip_all, fields(num_nodes = graph.node_count()))]
    pub fn run(&self, graph: &IrGraph, inputs: &[(&str, Value)]) -> Result<Vec<Value>> {
        let mut values: HashMap<IrNodeId, Value> = HashMap::new();

        for (name, value) in inputs {
            let id = graph
                .find_node_by_name(name)
                .map_err(|_| RuntimeError::InvalidInputOutput(format!("Input '{name}' not found in graph")))?;
            if graph.node(id)?.op != NodeOp::Placeholder {
                return Err(RuntimeError::InvalidInputOutput(format!(
                    "'{name}' is not a graph input"
                )));
            }
            values.insert(id, value.clone());
        }

        for id in graph.topological_order() {
            let node = graph.node(id)?;
            let mut lookup = |input: IrNodeId| {
                values.get(&input).cloned().ok_or_else(|| {
                    opcheck_core::Error::InvalidGraph(format!(
                        "Value of node {input:?} is not available when running '{}'",
                        node.name
                    ))
                })
            };

            match &node.op {
                NodeOp::Placeholder => {
                    if !values.contains_key(&id) {
                        return Err(RuntimeError::InvalidInputOutput(format!(
                            "Missing graph input '{}'",
                            node.name
                        )));
                    }
                }
                NodeOp::Call(op) => {
                    let args = node
                        .args
                        .iter()
                        .map(|arg| arg.resolve(&mut lookup))
                        .collect::<opcheck_core::Result<Vec<_>>>()?;
                    let kwargs = node
                        .kwargs
                        .iter()
                        .map(|(name, arg)| -> opcheck_core::Result<(String, Value)> {
                            Ok((name.clone(), arg.resolve(&mut lookup)?))
                        })
                        .collect::<opcheck_core::Result<Kwargs>>()?;

                    let _span = tracing::debug_span!("node", name = %node.name, op = %op).entered();
                    let result = self.dispatcher.call(op, &args, &kwargs).map_err(|source| {
                        RuntimeError::NodeFailed {
                            node: node.name.clone(),
                            op: op.clone(),
                            source,
                        }
                    })?;
                    values.insert(id, result);
                }
                NodeOp::Output => {}
            }
        }

        let output = graph
            .output()
            .ok_or_else(|| RuntimeError::GraphError("Graph has no output node".to_string()))?;
        let output = graph.node(output)?;
        output
            .args
            .iter()
            .map(|arg| {
                arg.resolve(&mut |input| {
                    values.get(&input).cloned().ok_or_else(|| {
                        opcheck_core::Error::InvalidGraph(format!(
                            "Output value of node {input:?} was never computed"
                        ))
                    })
                })
                .map_err(RuntimeError::from)
            })
            .collect()
    }
}
