//! Indexing views: `select`, `slice`, `split` and `unbind`.
//!
//! All of them move the storage offset and shrink one dimension; none reads
//! element values.

use opcheck_core::value::{int_arg, opt_int_arg, tensor_arg};
use opcheck_core::{Error, Kwargs, Result, Tensor, TensorMeta, Value};

use crate::helpers::normalize_dim;
use crate::kernel::{KernelCtx, OpKernel};

fn select_meta(input: &Tensor, dim: usize, index: i64) -> Result<TensorMeta> {
    let size = input.shape()[dim] as i64;
    let wrapped = if index < 0 { index + size } else { index };
    if !(0..size).contains(&wrapped) {
        return Err(Error::Shape(format!(
            "select(): index {index} out of range for tensor of size {:?} at dimension {dim}",
            input.shape()
        )));
    }

    let mut meta = input.meta().clone();
    meta.storage_offset += wrapped as usize * meta.strides[dim];
    meta.shape.remove(dim);
    meta.strides.remove(dim);
    Ok(meta)
}

/// Layout of `input[start:start+len:step]` along `dim`.
fn narrow_meta(input: &Tensor, dim: usize, start: usize, len: usize, step: usize) -> TensorMeta {
    let mut meta = input.meta().clone();
    if len > 0 {
        meta.storage_offset += start * meta.strides[dim];
    }
    meta.shape[dim] = len;
    meta.strides[dim] *= step;
    meta
}

fn require_rank(input: &Tensor, op: &str) -> Result<()> {
    if input.ndim() == 0 {
        return Err(Error::Shape(format!("{op}() cannot be applied to a 0-dim tensor")));
    }
    Ok(())
}

/// `select.int` - index one position, removing the dimension.
pub struct SelectKernel;

impl OpKernel for SelectKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        require_rank(input, "select")?;
        let dim = normalize_dim(int_arg(args, kwargs, 1, "dim", None)?, input.ndim())?;
        let index = int_arg(args, kwargs, 2, "index", None)?;

        let meta = select_meta(input, dim, index)?;
        Ok(ctx.view(input, meta)?.into())
    }
}

/// `slice.Tensor` - strided range along one dimension.
///
/// Out-of-range bounds are clamped rather than rejected.
pub struct SliceKernel;

impl OpKernel for SliceKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        require_rank(input, "slice")?;
        let dim = normalize_dim(int_arg(args, kwargs, 1, "dim", Some(0))?, input.ndim())?;
        let start = opt_int_arg(args, kwargs, 2, "start")?;
        let end = opt_int_arg(args, kwargs, 3, "end")?;
        let step = int_arg(args, kwargs, 4, "step", Some(1))?;
        if step <= 0 {
            return Err(Error::Shape("slice step must be positive".to_string()));
        }

        let size = input.shape()[dim] as i64;
        let clamp = |bound: i64| {
            let bound = if bound < 0 { bound + size } else { bound };
            bound.clamp(0, size)
        };
        let start = clamp(start.unwrap_or(0));
        let end = clamp(end.unwrap_or(size)).max(start);
        let len = if end > start { (end - start - 1) / step + 1 } else { 0 };

        let meta = narrow_meta(input, dim, start as usize, len as usize, step as usize);
        Ok(ctx.view(input, meta)?.into())
    }
}

/// `split.Tensor` - consecutive chunks of `split_size` along a dimension.
///
/// The last chunk may be smaller.
pub struct SplitKernel;

impl OpKernel for SplitKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        require_rank(input, "split")?;
        let split_size = int_arg(args, kwargs, 1, "split_size", None)?;
        let dim = normalize_dim(int_arg(args, kwargs, 2, "dim", Some(0))?, input.ndim())?;

        let size = input.shape()[dim];
        if split_size < 0 || (split_size == 0 && size > 0) {
            return Err(Error::Shape(format!(
                "split expects split_size be positive, but got split_size={split_size}"
            )));
        }
        let split_size = split_size as usize;
        let chunks = if size == 0 { 1 } else { size.div_ceil(split_size) };

        let parts = (0..chunks)
            .map(|i| {
                let start = i * split_size;
                let len = split_size.min(size - start);
                let meta = narrow_meta(input, dim, start, len, 1);
                ctx.view(input, meta).map(Value::Tensor)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::List(parts))
    }
}

/// `unbind.int` - every slice along a dimension, with the dimension removed.
pub struct UnbindKernel;

impl OpKernel for UnbindKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        require_rank(input, "unbind")?;
        let dim = normalize_dim(int_arg(args, kwargs, 1, "dim", Some(0))?, input.ndim())?;

        let parts = (0..input.shape()[dim] as i64)
            .map(|i| {
                let meta = select_meta(input, dim, i)?;
                ctx.view(input, meta).map(Value::Tensor)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::List(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcheck_core::TensorData;

    fn arange(shape: &[usize]) -> Tensor {
        let n: usize = shape.iter().product();
        Tensor::from_data(TensorData::F32((0..n).map(|x| x as f32).collect()), shape).unwrap()
    }

    #[test]
    fn test_select_moves_offset() {
        let x = arange(&[3, 4]);
        let out = SelectKernel
            .dispatch(&KernelCtx::eager(), &[x.into(), Value::int(1), Value::int(-1)], &Kwargs::new())
            .unwrap();
        let out = out.as_tensor().unwrap();
        assert_eq!(out.shape(), &[3]);
        assert_eq!(out.meta().storage_offset, 3);
        assert_eq!(out.to_f64_vec().unwrap(), vec![3.0, 7.0, 11.0]);
    }

    #[test]
    fn test_select_out_of_range() {
        let x = arange(&[3]);
        let result =
            SelectKernel.dispatch(&KernelCtx::eager(), &[x.into(), Value::int(0), Value::int(3)], &Kwargs::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_slice_with_step_and_clamp() {
        let x = arange(&[10]);
        let out = SliceKernel
            .dispatch(
                &KernelCtx::eager(),
                &[x.into(), Value::int(0), Value::int(1), Value::int(100), Value::int(3)],
                &Kwargs::new(),
            )
            .unwrap();
        let out = out.as_tensor().unwrap();
        assert_eq!(out.shape(), &[3]);
        assert_eq!(out.strides(), &[3]);
        assert_eq!(out.to_f64_vec().unwrap(), vec![1.0, 4.0, 7.0]);
    }

    #[test]
    fn test_slice_huge_step() {
        let x = arange(&[4]);
        let out = SliceKernel
            .dispatch(
                &KernelCtx::eager(),
                &[x.into(), Value::int(0), Value::int(0), Value::int(4), Value::int(i64::MAX)],
                &Kwargs::new(),
            )
            .unwrap();
        let out = out.as_tensor().unwrap();
        assert_eq!(out.shape(), &[1]);
        assert_eq!(out.to_f64_vec().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_slice_empty_range() {
        let x = arange(&[4]);
        let out = SliceKernel
            .dispatch(
                &KernelCtx::eager(),
                &[x.into(), Value::int(0), Value::int(3), Value::int(1), Value::int(2)],
                &Kwargs::new(),
            )
            .unwrap();
        assert_eq!(out.as_tensor().unwrap().shape(), &[0]);
    }

    #[test]
    fn test_slice_defaults() {
        let x = arange(&[2, 5]);
        let mut kwargs = Kwargs::new();
        kwargs.insert("dim".to_string(), Value::int(1));
        kwargs.insert("start".to_string(), Value::int(-2));
        let out = SliceKernel
            .dispatch(&KernelCtx::eager(), &[x.into()], &kwargs)
            .unwrap();
        assert_eq!(out.as_tensor().unwrap().shape(), &[2, 2]);
    }

    #[test]
    fn test_split_uneven() {
        let x = arange(&[5, 2]);
        let out = SplitKernel
            .dispatch(&KernelCtx::eager(), &[x.into(), Value::int(2)], &Kwargs::new())
            .unwrap();
        let shapes: Vec<Vec<usize>> = out.tensors().iter().map(|t| t.shape().to_vec()).collect();
        assert_eq!(shapes, vec![vec![2, 2], vec![2, 2], vec![1, 2]]);
        assert_eq!(out.tensors()[2].meta().storage_offset, 8);
    }

    #[test]
    fn test_unbind() {
        let x = arange(&[2, 3]);
        let out = UnbindKernel
            .dispatch(&KernelCtx::eager(), &[x.into(), Value::int(1)], &Kwargs::new())
            .unwrap();
        let parts = out.tensors();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].to_f64_vec().unwrap(), vec![1.0, 4.0]);
    }
}
