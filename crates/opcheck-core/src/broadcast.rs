//! Broadcasting helpers shared by pointwise kernels.

use crate::meta::TensorMeta;
use crate::{Error, Result};

/// Compute the NumPy-style broadcast shape of two shapes.
///
/// Shapes are aligned from the rightmost dimension; dimensions match if they
/// are equal or one of them is 1, and missing leading dimensions count as 1.
///
/// ```text
/// broadcast_shape(&[2, 3, 4], &[3, 4])       -> [2, 3, 4]
/// broadcast_shape(&[8, 1, 6, 1], &[7, 1, 5]) -> [8, 7, 6, 5]
/// ```
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let dim_of = |shape: &[usize], i: usize| {
        let pad = rank - shape.len();
        if i < pad { 1 } else { shape[i - pad] }
    };

    (0..rank)
        .map(|i| match (dim_of(a, i), dim_of(b, i)) {
            (da, db) if da == db => Ok(da),
            (1, db) => Ok(db),
            (da, 1) => Ok(da),
            (da, db) => Err(Error::Shape(format!(
                "Cannot broadcast shapes {a:?} and {b:?} at dimension {i} ({da} vs {db})"
            ))),
        })
        .collect()
}

/// Layout that reads `meta` as if it had shape `target`.
///
/// Broadcast dimensions get stride 0, which is also how `expand` lays out
/// its result.
pub fn broadcast_strides(meta: &TensorMeta, target: &[usize]) -> Result<TensorMeta> {
    if target.len() < meta.ndim() {
        return Err(Error::Shape(format!(
            "Cannot broadcast shape {:?} to lower-rank shape {:?}",
            meta.shape, target
        )));
    }

    let pad = target.len() - meta.ndim();
    let mut strides = vec![0usize; target.len()];
    for (i, &size) in target.iter().enumerate().skip(pad) {
        let src = i - pad;
        strides[i] = match meta.shape[src] {
            s if s == size => meta.strides[src],
            1 => 0,
            s => {
                return Err(Error::Shape(format!(
                    "Cannot broadcast dimension {src} of size {s} to {size}"
                )));
            }
        };
    }

    Ok(TensorMeta {
        shape: target.to_vec(),
        strides,
        ..meta.clone()
    })
}
