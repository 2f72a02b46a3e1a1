//! Common test utilities for kernel tests.

#![allow(dead_code)]

use opcheck_aten::{KernelCtx, KernelRegistry, aten_kernels};
use opcheck_core::{Kwargs, OpId, Result, Tensor, TensorData, Value};

/// Install a debug-level subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// A contiguous float32 tensor holding `0, 1, 2, ...`.
pub fn arange(shape: &[usize]) -> Tensor {
    let n: usize = shape.iter().product();
    Tensor::from_data(TensorData::F32((0..n).map(|x| x as f32).collect()), shape)
        .expect("arange shape is consistent")
}

/// Replace every tensor leaf with an abstract tensor of identical metadata.
pub fn to_abstract(values: &[Value]) -> Vec<Value> {
    values
        .iter()
        .map(|v| {
            v.map_tensors(&mut |t| Ok(Tensor::new_abstract(t.meta().clone())))
                .expect("lifting cannot fail")
        })
        .collect()
}

/// Run `op` eagerly and abstractly on the same arguments.
pub fn run_both(
    kernels: &KernelRegistry,
    op: &OpId,
    args: &[Value],
    kwargs: &Kwargs,
) -> (Result<Value>, Result<Value>) {
    let eager = kernels.dispatch(op, &KernelCtx::eager(), args, kwargs);
    let fake_args = to_abstract(args);
    let fake = kernels.dispatch(op, &KernelCtx::abstract_mode(), &fake_args, kwargs);
    (eager, fake)
}

pub fn kernels() -> KernelRegistry {
    aten_kernels()
}
