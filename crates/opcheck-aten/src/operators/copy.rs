//! Kernels whose results own their storage.

use opcheck_core::value::tensor_arg;
use opcheck_core::{Kwargs, Result, Value};

use crate::kernel::{KernelCtx, OpKernel};

/// The non-aliasing counterpart of a view kernel.
///
/// Runs the view, then replaces every tensor in the result with a contiguous
/// copy, so `view_copy(x, s)` has the shape of `view(x, s)` but its own
/// storage.
pub struct ViewCopyKernel {
    view: Box<dyn OpKernel>,
}

impl ViewCopyKernel {
    pub fn new(view: impl OpKernel + 'static) -> Self {
        Self {
            view: Box::new(view),
        }
    }
}

impl OpKernel for ViewCopyKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let viewed = self.view.dispatch(ctx, args, kwargs)?;
        viewed.map_tensors(&mut |t| ctx.materialize(t))
    }
}

/// `clone` / `lift_fresh_copy` - contiguous copy of the input.
pub struct CloneKernel;

impl OpKernel for CloneKernel {
    fn dispatch(&self, ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        Ok(ctx.materialize(input)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::TransposeKernel;
    use opcheck_core::{Tensor, TensorData};

    #[test]
    fn test_view_copy_owns_storage() {
        let x = Tensor::from_data(TensorData::F32(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]), &[2, 3]).unwrap();
        let kernel = ViewCopyKernel::new(TransposeKernel);
        let out = kernel
            .dispatch(&KernelCtx::eager(), &[x.clone().into(), Value::int(0), Value::int(1)], &Kwargs::new())
            .unwrap();
        let out = out.as_tensor().unwrap();

        assert_eq!(out.shape(), &[3, 2]);
        assert_eq!(out.strides(), &[2, 1]);
        assert!(!out.shares_storage(&x));
        assert_eq!(out.to_f64_vec().unwrap(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_clone_in_abstract_mode() {
        let x = Tensor::from_data(TensorData::I64(vec![1, 2]), &[2]).unwrap();
        let x = Tensor::new_abstract(x.meta().clone());
        let out = CloneKernel
            .dispatch(&KernelCtx::abstract_mode(), &[x.into()], &Kwargs::new())
            .unwrap();
        assert!(out.as_tensor().unwrap().is_abstract());
    }
}
