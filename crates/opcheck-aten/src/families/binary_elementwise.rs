//! Binary elementwise operator family.
//!
//! Covers: add.Tensor, sub.Tensor, mul.Tensor, div.Tensor

use opcheck_core::value::tensor_arg;
use opcheck_core::{
    DataType, Error, Kwargs, Result, TensorData, TensorMeta, Value, broadcast_shape,
    broadcast_strides,
};

use crate::kernel::{KernelCtx, OpKernel};

/// Binary elementwise operator family.
///
/// All members share broadcasting, type promotion and a contiguous result;
/// only the scalar function differs. `add` and `sub` scale `other` by the
/// keyword argument `alpha`.
pub struct BinaryElementwiseOp {
    name: &'static str,
    fold_fn: fn(f64, f64) -> f64,
    uses_alpha: bool,
    float_result: bool,
}

impl BinaryElementwiseOp {
    /// Create an add operator.
    pub fn add() -> Self {
        Self {
            name: "add",
            fold_fn: |a, b| a + b,
            uses_alpha: true,
            float_result: false,
        }
    }

    /// Create a sub operator.
    pub fn sub() -> Self {
        Self {
            name: "sub",
            fold_fn: |a, b| a - b,
            uses_alpha: true,
            float_result: false,
        }
    }

    /// Create a mul operator.
    pub fn mul() -> Self {
        Self {
            name: "mul",
            fold_fn: |a, b| a * b,
            uses_alpha: false,
            float_result: false,
        }
    }

    /// Create a div operator (true division; integer inputs give float32).
    pub fn div() -> Self {
        Self {
            name: "div",
            fold_fn: |a, b| a / b,
            uses_alpha: false,
            float_result: true,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }
}

impl OpKernel for BinaryElementwiseOp {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let a = tensor_arg(args, kwargs, 0, "self")?;
        let b = tensor_arg(args, kwargs, 1, "other")?;
        if a.device() != b.device() {
            return Err(Error::Kernel(format!(
                "{}: expected all tensors to be on the same device, but found {} and {}",
                self.name,
                a.device(),
                b.device()
            )));
        }

        let alpha = match kwargs.get("alpha") {
            Some(value) if self.uses_alpha => value
                .as_f64()
                .ok_or_else(|| Error::Kernel(format!("{}: alpha must be a number", self.name)))?,
            _ => 1.0,
        };

        let shape = broadcast_shape(a.shape(), b.shape())?;
        let mut dtype = a.dtype().promote(b.dtype());
        if self.float_result && !dtype.is_floating_point() {
            dtype = DataType::F32;
        }
        let meta = TensorMeta::contiguous(shape.clone(), dtype, a.device());

        let out = ctx.fresh(meta, || {
            let lhs = a.alias(broadcast_strides(a.meta(), &shape)?)?.to_f64_vec()?;
            let rhs = b.alias(broadcast_strides(b.meta(), &shape)?)?.to_f64_vec()?;
            let values = lhs
                .iter()
                .zip(&rhs)
                .map(|(&x, &y)| (self.fold_fn)(x, alpha * y))
                .collect();
            Ok(TensorData::from_f64(values, dtype))
        })?;
        Ok(out.into())
    }
}
