//! Layout views: the result shares storage and only shape/strides change.

use opcheck_core::value::{int_arg, int_list_arg, tensor_arg};
use opcheck_core::{Error, Kwargs, Result, Tensor, TensorMeta, Value, broadcast_strides};

use crate::helpers::{normalize_dim, to_usize};
use crate::kernel::{KernelCtx, OpKernel};

/// `transpose.int` / `transpose_` - swap two dimensions.
pub struct TransposeKernel;

impl OpKernel for TransposeKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let rank = input.ndim();
        let dim0 = normalize_dim(int_arg(args, kwargs, 1, "dim0", None)?, rank)?;
        let dim1 = normalize_dim(int_arg(args, kwargs, 2, "dim1", None)?, rank)?;

        let mut meta = input.meta().clone();
        if rank > 0 {
            meta.shape.swap(dim0, dim1);
            meta.strides.swap(dim0, dim1);
        }
        Ok(ctx.view(input, meta)?.into())
    }
}

/// `t` - transpose for tensors of rank <= 2.
pub struct TKernel;

impl OpKernel for TKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        if input.ndim() > 2 {
            return Err(Error::Shape(format!(
                "t() expects a tensor with <= 2 dimensions, but self is {}D",
                input.ndim()
            )));
        }

        let mut meta = input.meta().clone();
        meta.shape.reverse();
        meta.strides.reverse();
        Ok(ctx.view(input, meta)?.into())
    }
}

/// `permute` - reorder all dimensions.
pub struct PermuteKernel;

impl OpKernel for PermuteKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let rank = input.ndim();
        let dims = int_list_arg(args, kwargs, 1, "dims")?;
        if dims.len() != rank {
            return Err(Error::Shape(format!(
                "permute: number of dims ({}) doesn't match input rank ({rank})",
                dims.len()
            )));
        }

        let dims = dims
            .iter()
            .map(|&d| normalize_dim(d, rank))
            .collect::<Result<Vec<_>>>()?;
        let mut seen = vec![false; rank];
        for &d in &dims {
            if std::mem::replace(&mut seen[d], true) {
                return Err(Error::Shape(format!("permute: repeated dim {d}")));
            }
        }

        let src = input.meta();
        let meta = TensorMeta {
            shape: dims.iter().map(|&d| src.shape[d]).collect(),
            strides: dims.iter().map(|&d| src.strides[d]).collect(),
            ..src.clone()
        };
        Ok(ctx.view(input, meta)?.into())
    }
}

/// `expand` - broadcast size-1 dimensions without copying.
///
/// `-1` keeps an existing dimension; new leading dimensions get stride 0.
pub struct ExpandKernel;

impl OpKernel for ExpandKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let size = int_list_arg(args, kwargs, 1, "size")?;
        let rank = input.ndim();
        if size.len() < rank {
            return Err(Error::Shape(format!(
                "expand: the number of sizes provided ({}) must be greater or equal to the number of dimensions in the tensor ({rank})",
                size.len()
            )));
        }

        let pad = size.len() - rank;
        let target = size
            .iter()
            .enumerate()
            .map(|(i, &s)| match s {
                -1 if i >= pad => Ok(input.shape()[i - pad]),
                -1 => Err(Error::Shape(
                    "expand: -1 is not allowed in a leading, non-existing dimension".to_string(),
                )),
                s => to_usize(s, "expanded size"),
            })
            .collect::<Result<Vec<_>>>()?;

        let meta = broadcast_strides(input.meta(), &target)?;
        Ok(ctx.view(input, meta)?.into())
    }
}

/// `unsqueeze` / `unsqueeze_` - insert a dimension of size 1.
pub struct UnsqueezeKernel;

impl OpKernel for UnsqueezeKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let rank = input.ndim();
        let dim = normalize_dim(int_arg(args, kwargs, 1, "dim", None)?, rank + 1)?;

        let mut meta = input.meta().clone();
        let stride = if dim >= rank {
            1
        } else {
            meta.shape[dim] * meta.strides[dim]
        };
        meta.shape.insert(dim, 1);
        meta.strides.insert(dim, stride);
        Ok(ctx.view(input, meta)?.into())
    }
}

fn squeeze_dims(input: &Tensor, dims: &[usize]) -> TensorMeta {
    let src = input.meta();
    let keep = |d: &usize| !(dims.contains(d) && src.shape[*d] == 1);
    TensorMeta {
        shape: (0..src.ndim()).filter(keep).map(|d| src.shape[d]).collect(),
        strides: (0..src.ndim()).filter(keep).map(|d| src.strides[d]).collect(),
        ..src.clone()
    }
}

/// `squeeze.dim` / `squeeze.dims` - drop the given dimensions if they have size 1.
///
/// Dimensions with any other size are kept; this is not an error.
pub struct SqueezeKernel;

impl OpKernel for SqueezeKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let rank = input.ndim();
        let dims = int_list_arg(args, kwargs, 1, "dim")?
            .into_iter()
            .map(|d| normalize_dim(d, rank))
            .collect::<Result<Vec<_>>>()?;

        let meta = if rank == 0 {
            input.meta().clone()
        } else {
            squeeze_dims(input, &dims)
        };
        Ok(ctx.view(input, meta)?.into())
    }
}

/// `alias`, `detach`, `real`, `lift_fresh` - a view with identical layout.
pub struct AliasKernel;

impl OpKernel for AliasKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        Ok(ctx.view(input, input.meta().clone())?.into())
    }
}
