//! Unary elementwise operator family.
//!
//! Covers: relu, neg, abs

use opcheck_core::value::tensor_arg;
use opcheck_core::{Kwargs, Result, TensorData, TensorMeta, Value};

use crate::kernel::{KernelCtx, OpKernel};

/// Unary elementwise operator family: same shape and dtype, fresh storage.
pub struct UnaryElementwiseOp {
    name: &'static str,
    fold_fn: fn(f64) -> f64,
}

impl UnaryElementwiseOp {
    /// Create a relu operator.
    pub fn relu() -> Self {
        Self {
            name: "relu",
            fold_fn: |x| x.max(0.0),
        }
    }

    /// Create a neg operator.
    pub fn neg() -> Self {
        Self {
            name: "neg",
            fold_fn: |x| -x,
        }
    }

    /// Create an abs operator.
    pub fn abs() -> Self {
        Self {
            name: "abs",
            fold_fn: f64::abs,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }
}

impl OpKernel for UnaryElementwiseOp {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let meta = TensorMeta::contiguous(input.shape().to_vec(), input.dtype(), input.device());
        let out = ctx.fresh(meta, || {
            let values = input.to_f64_vec()?.into_iter().map(self.fold_fn).collect();
            Ok(TensorData::from_f64(values, input.dtype()))
        })?;
        Ok(out.into())
    }
}
