//! Helper functions for kernel implementation.

use opcheck_core::{Error, Result, TensorMeta, contiguous_strides};

/// Wrap a possibly negative dimension index into `0..rank`.
///
/// Scalars accept dimensions as if they had rank 1.
pub fn normalize_dim(dim: i64, rank: usize) -> Result<usize> {
    let rank = rank.max(1) as i64;
    let wrapped = if dim < 0 { dim + rank } else { dim };
    if !(0..rank).contains(&wrapped) {
        return Err(Error::Shape(format!(
            "Dimension out of range (expected to be in range of [{}, {}], but got {})",
            -rank,
            rank - 1,
            dim
        )));
    }
    Ok(wrapped as usize)
}

/// Resolve a requested size that may contain one `-1`.
pub fn infer_size(size: &[i64], numel: usize) -> Result<Vec<usize>> {
    let mut inferred = None;
    let mut known = 1usize;
    for (i, &d) in size.iter().enumerate() {
        match d {
            -1 if inferred.is_none() => inferred = Some(i),
            -1 => return Err(Error::Shape("only one dimension can be inferred".to_string())),
            d if d < 0 => return Err(Error::Shape(format!("invalid shape dimension {d}"))),
            d => {
                known = known.checked_mul(d as usize).ok_or_else(|| {
                    Error::Shape(format!("shape '{size:?}' overflows the element count"))
                })?
            }
        }
    }

    let mut out: Vec<usize> = size.iter().map(|&d| d.max(0) as usize).collect();
    match inferred {
        Some(i) => {
            if known == 0 || numel % known != 0 {
                return Err(Error::Shape(format!(
                    "shape '{size:?}' is invalid for input of size {numel}"
                )));
            }
            out[i] = numel / known;
        }
        None if known != numel => {
            return Err(Error::Shape(format!(
                "shape '{size:?}' is invalid for input of size {numel}"
            )));
        }
        None => {}
    }
    Ok(out)
}

/// Strides that let `meta`'s storage be read with `new_shape`, if any exist.
///
/// Dimensions of the input are grouped into chunks that are contiguous with
/// each other; each chunk may be split or merged freely, but a view cannot
/// cross a chunk boundary.
pub fn view_strides(meta: &TensorMeta, new_shape: &[usize]) -> Option<Vec<usize>> {
    let old_shape = &meta.shape;
    let old_strides = &meta.strides;

    if meta.numel() == 0 {
        return Some(if old_shape.as_slice() == new_shape {
            old_strides.clone()
        } else {
            contiguous_strides(new_shape)
        });
    }
    let Some(&last_stride) = old_strides.last() else {
        return Some(contiguous_strides(new_shape));
    };

    let mut new_strides = vec![0usize; new_shape.len()];
    let mut view_d = new_shape.len() as isize - 1;
    let mut chunk_base_stride = last_stride;
    let mut tensor_numel = 1usize;
    let mut view_numel = 1usize;

    for tensor_d in (0..old_shape.len()).rev() {
        tensor_numel *= old_shape[tensor_d];
        let chunk_ends = tensor_d == 0
            || (old_shape[tensor_d - 1] != 1
                && old_strides[tensor_d - 1] != tensor_numel * chunk_base_stride);
        if !chunk_ends {
            continue;
        }

        while view_d >= 0 && (view_numel < tensor_numel || new_shape[view_d as usize] == 1) {
            new_strides[view_d as usize] = view_numel * chunk_base_stride;
            view_numel *= new_shape[view_d as usize];
            view_d -= 1;
        }
        if view_numel != tensor_numel {
            return None;
        }
        if tensor_d > 0 {
            chunk_base_stride = old_strides[tensor_d - 1];
            tensor_numel = 1;
            view_numel = 1;
        }
    }

    (view_d == -1).then_some(new_strides)
}

/// Convert a non-negative int argument to `usize`.
pub fn to_usize(value: i64, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::Shape(format!("{what} must be non-negative, got {value}")))
}
