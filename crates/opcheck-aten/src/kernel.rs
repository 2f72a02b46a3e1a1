//! Kernel trait and execution context.
//!
//! A kernel is written once and runs in either mode: eager execution reads
//! and writes real buffers, abstract execution only propagates metadata.

use opcheck_core::{Error, Kwargs, OpId, Result, Tensor, TensorData, TensorMeta, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a kernel executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Real data; view results share storage with their input.
    Eager,

    /// Metadata only; every result tensor is abstract.
    Abstract,
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecMode::Eager => f.write_str("eager"),
            ExecMode::Abstract => f.write_str("abstract"),
        }
    }
}

/// Context handed to `OpKernel::dispatch()`.
#[derive(Debug, Clone, Copy)]
pub struct KernelCtx {
    mode: ExecMode,
}

impl KernelCtx {
    pub fn new(mode: ExecMode) -> Self {
        Self { mode }
    }

    pub fn eager() -> Self {
        Self::new(ExecMode::Eager)
    }

    pub fn abstract_mode() -> Self {
        Self::new(ExecMode::Abstract)
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn is_abstract(&self) -> bool {
        self.mode == ExecMode::Abstract
    }

    /// A view of `input` with layout `meta`.
    pub fn view(&self, input: &Tensor, meta: TensorMeta) -> Result<Tensor> {
        input.alias(meta)
    }

    /// A tensor with its own storage.
    ///
    /// `compute` produces the row-major elements and only runs in eager mode.
    pub fn fresh<F>(&self, meta: TensorMeta, compute: F) -> Result<Tensor>
    where
        F: FnOnce() -> Result<TensorData>,
    {
        match self.mode {
            ExecMode::Abstract => Ok(Tensor::new_abstract(meta)),
            ExecMode::Eager => Tensor::from_parts(Arc::new(compute()?), meta),
        }
    }

    /// A contiguous copy of `input` with independent storage.
    pub fn materialize(&self, input: &Tensor) -> Result<Tensor> {
        let meta = TensorMeta::contiguous(input.shape().to_vec(), input.dtype(), input.device());
        self.fresh(meta, || input.contiguous_data())
    }

    /// Fail in abstract mode: the result depends on element values.
    pub fn require_data(&self, op: &str) -> Result<()> {
        match self.mode {
            ExecMode::Eager => Ok(()),
            ExecMode::Abstract => Err(Error::UnsupportedAbstract(format!(
                "{op} has a data-dependent result"
            ))),
        }
    }
}

/// A self-contained operator implementation.
///
/// # Example
///
/// ```ignore
/// struct AliasKernel;
///
/// impl OpKernel for AliasKernel {
///     fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
///         let input = tensor_arg(args, kwargs, 0, "self")?;
///         Ok(ctx.view(input, input.meta().clone())?.into())
///     }
/// }
/// ```
pub trait OpKernel: Send + Sync {
    /// Execute the operation on the given arguments.
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value>;
}

/// Kernels keyed by overload.
#[derive(Default)]
pub struct KernelRegistry {
    kernels: HashMap<OpId, Box<dyn OpKernel>>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kernel, replacing any previous one for `op`.
    pub fn register(&mut self, op: OpId, kernel: impl OpKernel + 'static) -> &mut Self {
        self.kernels.insert(op, Box::new(kernel));
        self
    }

    pub fn get(&self, op: &OpId) -> Option<&dyn OpKernel> {
        self.kernels.get(op).map(|k| k.as_ref())
    }

    pub fn contains(&self, op: &OpId) -> bool {
        self.kernels.contains_key(op)
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Run the kernel for `op`.
    pub fn dispatch(&self, op: &OpId, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let kernel = self.get(op).ok_or_else(|| match ctx.mode() {
            ExecMode::Eager => Error::Unsupported(format!("No kernel registered for {op}")),
            ExecMode::Abstract => {
                Error::UnsupportedAbstract(format!("No abstract kernel registered for {op}"))
            }
        })?;
        tracing::trace!(op = %op, mode = %ctx.mode(), "Dispatching kernel");
        kernel.dispatch(ctx, args, kwargs)
    }
}
