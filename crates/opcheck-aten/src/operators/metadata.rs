//! Metadata queries: `sym_size`, `sym_stride`, `sym_numel`.
//!
//! These answer from the tensor's metadata alone, so they work the same on
//! real and abstract tensors.

use opcheck_core::value::{int_arg, tensor_arg};
use opcheck_core::{Kwargs, Result, Value};

use crate::helpers::normalize_dim;
use crate::kernel::{KernelCtx, OpKernel};

/// Which metadata field a query reads.
#[derive(Debug, Clone, Copy)]
pub enum MetadataQuery {
    Size,
    Stride,
    Numel,
}

/// `sym_size.int`, `sym_stride.int` and `sym_numel`.
pub struct MetadataKernel {
    query: MetadataQuery,
}

impl MetadataKernel {
    pub fn size() -> Self {
        Self {
            query: MetadataQuery::Size,
        }
    }

    pub fn stride() -> Self {
        Self {
            query: MetadataQuery::Stride,
        }
    }

    pub fn numel() -> Self {
        Self {
            query: MetadataQuery::Numel,
        }
    }
}

impl OpKernel for MetadataKernel {
    fn dispatch(&self, _ctx: &KernelCtx, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let input = tensor_arg(args, kwargs, 0, "self")?;
        let value = match self.query {
            MetadataQuery::Numel => input.numel(),
            MetadataQuery::Size | MetadataQuery::Stride => {
                let dim = normalize_dim(int_arg(args, kwargs, 1, "dim", None)?, input.ndim())?;
                let source = match self.query {
                    MetadataQuery::Size => input.shape(),
                    _ => input.strides(),
                };
                source.get(dim).copied().unwrap_or(1)
            }
        };
        Ok(Value::int(value as i64))
    }
}
