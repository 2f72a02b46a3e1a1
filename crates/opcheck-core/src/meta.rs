//! Tensor metadata snapshots and their structural comparison.

use crate::types::{DataType, Device};

/// Shape, layout, dtype and device of one tensor, without its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorMeta {
    pub shape: Vec<usize>,
    pub strides: Vec<usize>,
    pub storage_offset: usize,
    pub dtype: DataType,
    pub device: Device,
}

impl TensorMeta {
    /// Contiguous (row-major) layout for `shape`.
    pub fn contiguous(shape: Vec<usize>, dtype: DataType, device: Device) -> Self {
        let strides = contiguous_strides(&shape);
        Self {
            shape,
            strides,
            storage_offset: 0,
            dtype,
            device,
        }
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check whether the layout is row-major with no gaps.
    ///
    /// Dimensions of size 1 may carry any stride.
    pub fn is_contiguous(&self) -> bool {
        if self.numel() == 0 {
            return true;
        }
        let mut expected = 1usize;
        for (&size, &stride) in self.shape.iter().zip(&self.strides).rev() {
            if size != 1 && stride != expected {
                return false;
            }
            expected *= size;
        }
        true
    }

    /// Storage index of the element at `index` (one coordinate per dim).
    pub fn storage_index(&self, index: &[usize]) -> usize {
        self.storage_offset
            + index
                .iter()
                .zip(&self.strides)
                .map(|(&i, &stride)| i * stride)
                .sum::<usize>()
    }

    /// Storage indices of every element in row-major logical order.
    pub fn storage_indices(&self) -> Vec<usize> {
        let numel = self.numel();
        let mut out = Vec::with_capacity(numel);
        if numel == 0 {
            return out;
        }

        let mut index = vec![0usize; self.ndim()];
        for _ in 0..numel {
            out.push(self.storage_index(&index));
            for dim in (0..index.len()).rev() {
                index[dim] += 1;
                if index[dim] < self.shape[dim] {
                    break;
                }
                index[dim] = 0;
            }
        }
        out
    }

    /// Smallest storage length able to back this layout.
    pub fn required_storage_len(&self) -> usize {
        if self.numel() == 0 {
            return self.storage_offset;
        }
        self.storage_offset
            + self
                .shape
                .iter()
                .zip(&self.strides)
                .map(|(&size, &stride)| (size - 1) * stride)
                .sum::<usize>()
            + 1
    }
}

/// Row-major strides for `shape`.
pub fn contiguous_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0usize; shape.len()];
    let mut stride = 1usize;
    for (dim, &size) in shape.iter().enumerate().rev() {
        strides[dim] = stride;
        stride *= size.max(1);
    }
    strides
}

/// The first field on which two metadata snapshots disagree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetaMismatch {
    #[error("ranks {left} and {right} are not equal")]
    Rank { left: usize, right: usize },

    #[error("shapes {left:?} and {right:?} are not equal")]
    Shape { left: Vec<usize>, right: Vec<usize> },

    #[error("dtypes {left} and {right} are not equal")]
    Dtype { left: DataType, right: DataType },

    #[error("devices {left} and {right} are not equal")]
    Device { left: Device, right: Device },

    #[error("strides {left:?} and {right:?} differ at dimension {dim} for shape {shape:?}")]
    Stride {
        dim: usize,
        shape: Vec<usize>,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("storage offsets {left} and {right} are not equal")]
    StorageOffset { left: usize, right: usize },
}

/// Compare two tensors' metadata without reading any element.
///
/// Checks rank, shape, dtype and device; with `check_strides`, also the
/// significant strides (dimensions of size 1 and empty tensors impose no
/// layout constraint) and the storage offset. The check is symmetric.
pub fn compare_tensor_meta(
    left: &TensorMeta,
    right: &TensorMeta,
    check_strides: bool,
) -> Result<(), MetaMismatch> {
    if left.ndim() != right.ndim() {
        return Err(MetaMismatch::Rank {
            left: left.ndim(),
            right: right.ndim(),
        });
    }

    if left.shape != right.shape {
        return Err(MetaMismatch::Shape {
            left: left.shape.clone(),
            right: right.shape.clone(),
        });
    }

    if left.dtype != right.dtype {
        return Err(MetaMismatch::Dtype {
            left: left.dtype,
            right: right.dtype,
        });
    }

    if left.device != right.device {
        return Err(MetaMismatch::Device {
            left: left.device,
            right: right.device,
        });
    }

    if !check_strides {
        return Ok(());
    }

    if left.numel() > 0 {
        for (dim, &size) in left.shape.iter().enumerate() {
            if size > 1 && left.strides.get(dim) != right.strides.get(dim) {
                return Err(MetaMismatch::Stride {
                    dim,
                    shape: left.shape.clone(),
                    left: left.strides.clone(),
                    right: right.strides.clone(),
                });
            }
        }
    }

    if left.storage_offset != right.storage_offset {
        return Err(MetaMismatch::StorageOffset {
            left: left.storage_offset,
            right: right.storage_offset,
        });
    }

    Ok(())
}
