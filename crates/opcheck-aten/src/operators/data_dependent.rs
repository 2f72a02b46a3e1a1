//! Operators whose result metadata depends on element values.
//!
//! In abstract mode these report `UnsupportedAbstract`.

use opcheck_core::value::tensor_arg;
use opcheck_core::{DataType, Error, Kwargs, Result, Scalar, TensorData, TensorMeta, Value};

use crate::kernel::{KernelCtx, OpKernel};

/// `nonzero` - coordinates of every non-zero element, shape `[count, rank]`.
pub struct NonzeroKernel;

impl OpKernel for NonzeroKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        ctx.require_data("aten::nonzero")?;

        let shape = input.shape();
        let mut count = 0usize;
        let mut coords = Vec::new();
        let mut index = vec![0i64; shape.len()];
        for value in input.to_f64_vec()? {
            if value != 0.0 {
                count += 1;
                coords.extend_from_slice(&index);
            }
            for dim in (0..index.len()).rev() {
                index[dim] += 1;
                if (index[dim] as usize) < shape[dim] {
                    break;
                }
                index[dim] = 0;
            }
        }

        let meta = TensorMeta::contiguous(vec![count, shape.len()], DataType::I64, input.device());
        Ok(ctx.fresh(meta, || Ok(TensorData::I64(coords)))?.into())
    }
}

/// `item` / `_local_scalar_dense` - the single element as a scalar.
pub struct ItemKernel;

impl OpKernel for ItemKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        ctx.require_data("aten::item")?;
        if input.numel() != 1 {
            return Err(Error::Shape(format!(
                "a Tensor with {} elements cannot be converted to Scalar",
                input.numel()
            )));
        }

        let scalar = match input.contiguous_data()? {
            TensorData::F32(v) => Scalar::Float(v[0] as f64),
            TensorData::F64(v) => Scalar::Float(v[0]),
            TensorData::I32(v) => Scalar::Int(v[0] as i64),
            TensorData::I64(v) => Scalar::Int(v[0]),
            TensorData::Bool(v) => Scalar::Bool(v[0]),
        };
        Ok(Value::Scalar(scalar))
    }
}
