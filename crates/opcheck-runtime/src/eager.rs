//! Eager execution on real tensors.

use opcheck_aten::{KernelCtx, KernelRegistry, aten_kernels};
use opcheck_core::{Dispatcher, Error, Kwargs, OpId, Result, Value, call_tensors};
use std::sync::Arc;

/// Runs operators on real data through the kernel registry.
///
/// View results share storage with their inputs, exactly as the kernels
/// produce them.
#[derive(Clone)]
pub struct EagerRuntime {
    kernels: Arc<KernelRegistry>,
}

impl EagerRuntime {
    /// Create a runtime over the `aten` kernels.
    pub fn new() -> Self {
        Self::with_kernels(Arc::new(aten_kernels()))
    }

    /// Create a runtime over a custom kernel registry.
    pub fn with_kernels(kernels: Arc<KernelRegistry>) -> Self {
        Self { kernels }
    }

    pub fn kernels(&self) -> &Arc<KernelRegistry> {
        &self.kernels
    }
}

impl Default for EagerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for EagerRuntime {
    fn call(&self, op: &OpId, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        if call_tensors(args, kwargs).iter().any(|t| t.is_abstract()) {
            return Err(Error::Unsupported(format!(
                "{op} received an abstract tensor in eager mode"
            )));
        }

        tracing::debug!(op = %op, "eager call");
        self.kernels.dispatch(op, &KernelCtx::eager(), args, kwargs)
    }
}
