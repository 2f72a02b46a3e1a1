//! The demo graph shown by `opcheck rewrite`.

use anyhow::{Context, Result};
use opcheck_core::{
    AbstractSubstrate, IrGraph, IrNodeId, NodeArg, NodeMeta, OpId, SchemaRegistry, Tensor,
    TensorData, Value,
};
use opcheck_passes::PassManager;
use opcheck_runtime::{EagerRuntime, FakeTensorMode, GraphExecutor};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A small graph touching every kind of call the rewrite distinguishes.
///
/// ```text
/// y = relu(transpose(x, 0, 1)) + t(x)
/// n = sym_size(_unsafe_view(y, [-1]), 0)
/// ```
pub fn demo_graph(example: Option<Tensor>) -> Result<IrGraph> {
    let mut graph = IrGraph::new();
    let x = graph.add_placeholder("x", example.map(Value::Tensor));
    fn call(graph: &mut IrGraph, op: OpId, args: Vec<NodeArg>) -> opcheck_core::Result<IrNodeId> {
        graph.add_call(op, args, BTreeMap::new(), NodeMeta::default())
    }

    let transposed = call(
        &mut graph,
        OpId::aten("transpose", "int"),
        vec![NodeArg::Node(x), NodeArg::int(0), NodeArg::int(1)],
    )?;
    let relu = call(&mut graph, OpId::aten("relu", ""), vec![NodeArg::Node(transposed)])?;
    let t = call(&mut graph, OpId::aten("t", ""), vec![NodeArg::Node(x)])?;
    let y = call(
        &mut graph,
        OpId::aten("add", "Tensor"),
        vec![NodeArg::Node(relu), NodeArg::Node(t)],
    )?;
    let flat = call(
        &mut graph,
        OpId::aten("_unsafe_view", ""),
        vec![NodeArg::Node(y), NodeArg::int_list(&[-1])],
    )?;
    let n = call(
        &mut graph,
        OpId::aten("sym_size", "int"),
        vec![NodeArg::Node(flat), NodeArg::int(0)],
    )?;
    graph.set_output(vec![NodeArg::Node(y), NodeArg::Node(n)])?;
    Ok(graph)
}

/// Row-major `0..n` of the given shape.
pub fn arange(shape: &[usize]) -> Result<Tensor> {
    let n: usize = shape.iter().product();
    Tensor::from_data(TensorData::F32((0..n).map(|x| x as f32).collect()), shape)
        .context("Failed to build example input")
}

/// The demo graph before and after the rewrite.
pub struct RewriteReport {
    pub before: IrGraph,
    pub after: IrGraph,

    /// Whether both graphs computed the same values on the example input.
    pub outputs_match: bool,
}

/// Rewrite the demo graph for an input of `shape` and check that the result
/// still computes the same values.
pub fn rewrite_demo(registry: Arc<dyn SchemaRegistry>, shape: &[usize]) -> Result<RewriteReport> {
    let input = arange(shape)?;
    let before = demo_graph(Some(input.clone()))?;

    let mut after = demo_graph(Some(input.clone()))?;
    let fake_mode: Arc<dyn AbstractSubstrate> = Arc::new(FakeTensorMode::new());
    let mut manager = PassManager::functionalize(registry, Some(fake_mode));
    manager.run(&mut after).context("Failed to rewrite demo graph")?;

    let runtime = EagerRuntime::new();
    let executor = GraphExecutor::new(&runtime);
    let inputs = [("x", Value::Tensor(input))];
    let expected = executor
        .run(&before, &inputs)
        .context("Failed to run the original graph")?;
    let actual = executor
        .run(&after, &inputs)
        .context("Failed to run the rewritten graph")?;

    let outputs_match = expected.len() == actual.len()
        && expected
            .iter()
            .zip(&actual)
            .all(|(e, a)| same_values(e, a));
    Ok(RewriteReport {
        before,
        after,
        outputs_match,
    })
}

fn same_values(expected: &Value, actual: &Value) -> bool {
    match (expected.as_tensor(), actual.as_tensor()) {
        (Some(e), Some(a)) => {
            e.shape() == a.shape()
                && matches!((e.to_f64_vec(), a.to_f64_vec()), (Ok(x), Ok(y)) if x == y)
        }
        (None, None) => expected.as_f64() == actual.as_f64(),
        _ => false,
    }
}
