//! Size-changing views: `view`, `_unsafe_view` and `reshape`.

use opcheck_core::value::{int_list_arg, tensor_arg};
use opcheck_core::{Error, Kwargs, Result, TensorMeta, Value};

use crate::helpers::{infer_size, view_strides};
use crate::kernel::{KernelCtx, OpKernel};

fn view_meta(meta: &TensorMeta, shape: Vec<usize>) -> Option<TensorMeta> {
    let strides = view_strides(meta, &shape)?;
    Some(TensorMeta {
        shape,
        strides,
        ..meta.clone()
    })
}

/// `view` - reinterpret the input with a new shape, sharing storage.
///
/// Fails when the input's layout cannot express the requested shape.
pub struct ViewKernel;

impl OpKernel for ViewKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let size = int_list_arg(args, kwargs, 1, "size")?;
        let shape = infer_size(&size, input.numel())?;

        let meta = view_meta(input.meta(), shape).ok_or_else(|| {
            Error::Shape(format!(
                "view size is not compatible with input tensor's size {:?} and stride {:?}; use reshape instead",
                input.shape(),
                input.strides()
            ))
        })?;
        Ok(ctx.view(input, meta)?.into())
    }
}

/// `reshape` - a view when the layout allows it, otherwise a copy.
pub struct ReshapeKernel;

impl OpKernel for ReshapeKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let size = int_list_arg(args, kwargs, 1, "shape")?;
        let shape = infer_size(&size, input.numel())?;

        match view_meta(input.meta(), shape.clone()) {
            Some(meta) => Ok(ctx.view(input, meta)?.into()),
            None => {
                let copy = ctx.materialize(input)?;
                let meta = TensorMeta::contiguous(shape, copy.dtype(), copy.device());
                Ok(ctx.view(&copy, meta)?.into())
            }
        }
    }
}
