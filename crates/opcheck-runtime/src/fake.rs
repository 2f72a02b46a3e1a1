//! Abstract ("fake") tensor execution.
//!
//! A fake tensor carries shape, strides, dtype and device but no data. Every
//! `FakeTensorMode::enter()` opens an independent scope; lifting is only
//! possible through a live scope, and dropping the scope ends it.

use opcheck_aten::{KernelCtx, KernelRegistry, aten_kernels};
use opcheck_core::{
    AbstractScope, AbstractSubstrate, Error, Kwargs, OpId, Result, Tensor, Value, call_tensors,
};
use std::sync::Arc;

/// Shape-only execution engine backed by the kernels' abstract mode.
#[derive(Clone)]
pub struct FakeTensorMode {
    kernels: Arc<KernelRegistry>,
}

impl FakeTensorMode {
    /// Create a fake mode over the `aten` kernels.
    pub fn new() -> Self {
        Self::with_kernels(Arc::new(aten_kernels()))
    }

    /// Create a fake mode over a custom kernel registry.
    pub fn with_kernels(kernels: Arc<KernelRegistry>) -> Self {
        Self { kernels }
    }
}

impl Default for FakeTensorMode {
    fn default() -> Self {
        Self::new()
    }
}

impl AbstractSubstrate for FakeTensorMode {
    fn enter(&self) -> Result<Box<dyn AbstractScope + '_>> {
        tracing::trace!("entering fake tensor scope");
        Ok(Box::new(FakeTensorScope {
            kernels: self.kernels.as_ref(),
            lifted: 0,
            calls: 0,
        }))
    }
}

/// One live fake-tensor scope.
pub struct FakeTensorScope<'a> {
    kernels: &'a KernelRegistry,
    lifted: usize,
    calls: usize,
}

impl AbstractScope for FakeTensorScope<'_> {
    fn lift(&mut self, tensor: &Tensor) -> Result<Tensor> {
        if tensor.is_abstract() {
            return Err(Error::Unsupported(
                "Lifting an already abstract tensor is not supported".to_string(),
            ));
        }
        self.lifted += 1;
        Ok(Tensor::new_abstract(tensor.meta().clone()))
    }

    fn call(&mut self, op: &OpId, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        if call_tensors(args, kwargs).iter().any(|t| !t.is_abstract()) {
            return Err(Error::Unsupported(format!(
                "{op} received a real tensor inside a fake tensor scope"
            )));
        }

        self.calls += 1;
        self.kernels
            .dispatch(op, &KernelCtx::abstract_mode(), args, kwargs)
    }
}

impl Drop for FakeTensorScope<'_> {
    fn drop(&mut self) {
        tracing::trace!(lifted = self.lifted, calls = self.calls, "exiting fake tensor scope");
    }
}
