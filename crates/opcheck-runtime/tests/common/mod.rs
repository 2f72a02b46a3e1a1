//! Common test utilities for runtime tests.

#![allow(dead_code)]

use opcheck_core::{IrGraph, IrNodeId, NodeArg, NodeMeta, OpId, Tensor, TensorData};
use std::collections::BTreeMap;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

pub fn arange(shape: &[usize]) -> Tensor {
    let n: usize = shape.iter().product();
    Tensor::from_data(TensorData::F32((0..n).map(|x| x as f32).collect()), shape)
        .expect("arange shape is consistent")
}

/// Append `op(args...)` to `graph`.
pub fn call(graph: &mut IrGraph, op: OpId, args: Vec<NodeArg>) -> IrNodeId {
    graph
        .add_call(op, args, BTreeMap::new(), NodeMeta::default())
        .expect("arguments reference existing nodes")
}

/// `out = relu(transpose(x, 0, 1)) + x.t()`
pub fn make_transpose_graph() -> IrGraph {
    let mut graph = IrGraph::new();
    let x = graph.add_placeholder("x", None);
    let t = call(
        &mut graph,
        OpId::aten("transpose", "int"),
        vec![NodeArg::Node(x), NodeArg::int(0), NodeArg::int(1)],
    );
    let r = call(&mut graph, OpId::aten("relu", ""), vec![NodeArg::Node(t)]);
    let tt = call(&mut graph, OpId::aten("t", ""), vec![NodeArg::Node(x)]);
    let out = call(
        &mut graph,
        OpId::aten("add", "Tensor"),
        vec![NodeArg::Node(r), NodeArg::Node(tt)],
    );
    graph
        .set_output(vec![NodeArg::Node(out)])
        .expect("output is set once");
    graph
}
