//! Reduction operator family.
//!
//! Covers: sum, sum.dim_IntList, mean, mean.dim

use opcheck_core::value::{arg, tensor_arg};
use opcheck_core::{
    DataType, Error, Kwargs, Result, Scalar, TensorData, TensorMeta, Value, contiguous_strides,
};

use crate::helpers::normalize_dim;
use crate::kernel::{KernelCtx, OpKernel};

/// Reduction operator family.
///
/// Reduces over the dimensions in `dim` (all of them when absent or empty),
/// keeping them as size 1 when `keepdim` is set.
pub struct ReductionOp {
    name: &'static str,
    fold_fn: fn(&[f64]) -> f64,
    requires_float: bool,
}

impl ReductionOp {
    /// Create a sum operator.
    pub fn sum() -> Self {
        Self {
            name: "sum",
            fold_fn: |values| values.iter().sum(),
            requires_float: false,
        }
    }

    /// Create a mean operator.
    pub fn mean() -> Self {
        Self {
            name: "mean",
            fold_fn: |values| values.iter().sum::<f64>() / values.len().max(1) as f64,
            requires_float: true,
        }
    }

    fn output_dtype(&self, input: DataType, kwargs: &Kwargs) -> Result<DataType> {
        let dtype = match kwargs.get("dtype").cloned() {
            Some(Value::Scalar(Scalar::Dtype(dtype))) => dtype,
            Some(value) if !value.is_none() => {
                return Err(Error::Kernel(format!("{}: invalid dtype {value}", self.name)));
            }
            _ if input.is_floating_point() => input,
            _ => DataType::I64,
        };
        if self.requires_float && !dtype.is_floating_point() {
            return Err(Error::Kernel(format!(
                "{}(): could not infer output dtype. Input dtype must be floating point, got {dtype}",
                self.name
            )));
        }
        Ok(dtype)
    }
}

impl OpKernel for ReductionOp {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let rank = input.ndim();
        let dims = match arg(args, kwargs, 1, "dim") {
            Some(value) if !value.is_none() => value
                .as_int_list()
                .ok_or_else(|| Error::Kernel(format!("{}: dim must be int[]", self.name)))?,
            _ => Vec::new(),
        };
        let keepdim = arg(args, kwargs, 2, "keepdim")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let reduced: Vec<bool> = if dims.is_empty() {
            vec![true; rank]
        } else {
            let mut reduced = vec![false; rank];
            for d in dims {
                let d = normalize_dim(d, rank)?;
                if d < rank {
                    reduced[d] = true;
                }
            }
            reduced
        };

        let kept_shape: Vec<usize> = input
            .shape()
            .iter()
            .zip(&reduced)
            .map(|(&size, &r)| if r { 1 } else { size })
            .collect();
        let out_shape: Vec<usize> = if keepdim {
            kept_shape.clone()
        } else {
            input
                .shape()
                .iter()
                .zip(&reduced)
                .filter(|(_, r)| !**r)
                .map(|(&size, _)| size)
                .collect()
        };

        let dtype = self.output_dtype(input.dtype(), kwargs)?;
        let meta = TensorMeta::contiguous(out_shape, dtype, input.device());
        let out = ctx.fresh(meta, || {
            let out_strides = contiguous_strides(&kept_shape);
            let out_len: usize = kept_shape.iter().product();
            let mut groups = vec![Vec::new(); out_len];

            let mut index = vec![0usize; rank];
            for value in input.to_f64_vec()? {
                let slot: usize = index
                    .iter()
                    .zip(&reduced)
                    .zip(&out_strides)
                    .map(|((&i, &r), &s)| if r { 0 } else { i * s })
                    .sum();
                groups[slot].push(value);
                for dim in (0..rank).rev() {
                    index[dim] += 1;
                    if index[dim] < input.shape()[dim] {
                        break;
                    }
                    index[dim] = 0;
                }
            }

            let values = groups.iter().map(|g| (self.fold_fn)(g)).collect();
            Ok(TensorData::from_f64(values, dtype))
        })?;
        Ok(out.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcheck_core::Tensor;

    fn input() -> Tensor {
        Tensor::from_data(TensorData::I32(vec![1, 2, 3, 4, 5, 6]), &[2, 3]).unwrap()
    }

    #[test]
    fn test_sum_all() {
        let out = ReductionOp::sum()
            .dispatch(&KernelCtx::eager(), &[input().into()], &Kwargs::new())
            .unwrap();
        let out = out.as_tensor().unwrap();
        assert_eq!(out.shape(), &[] as &[usize]);
        assert_eq!(out.dtype(), DataType::I64);
        assert_eq!(out.to_f64_vec().unwrap(), vec![21.0]);
    }

    #[test]
    fn test_sum_dim_keepdim() {
        let args = [input().into(), Value::int_list(&[-1]), Value::bool(true)];
        let out = ReductionOp::sum()
            .dispatch(&KernelCtx::eager(), &args, &Kwargs::new())
            .unwrap();
        let out = out.as_tensor().unwrap();
        assert_eq!(out.shape(), &[2, 1]);
        assert_eq!(out.to_f64_vec().unwrap(), vec![6.0, 15.0]);
    }

    #[test]
    fn test_mean_rejects_integers() {
        let result = ReductionOp::mean().dispatch(&KernelCtx::abstract_mode(), &[input().into()], &Kwargs::new());
        assert!(result.is_err());

        let mut kwargs = Kwargs::new();
        kwargs.insert("dtype".to_string(), Value::Scalar(Scalar::Dtype(DataType::F64)));
        let out = ReductionOp::mean()
            .dispatch(&KernelCtx::eager(), &[input().into(), Value::int_list(&[0])], &kwargs)
            .unwrap();
        assert_eq!(out.as_tensor().unwrap().to_f64_vec().unwrap(), vec![2.5, 3.5, 4.5]);
    }
}
