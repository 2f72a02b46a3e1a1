//! Pairwise comparison of real and abstract result trees.

use opcheck_core::{Error, OpId, Result, Value, compare_tensor_meta};

/// Compare the flattened leaves of `real` and `fake`.
///
/// Both trees must have the same number of leaves, and each pair must agree
/// on being a tensor. Tensor pairs are compared with strides; non-tensor
/// leaves are not compared. Returns the number of tensors compared.
pub fn compare_results(op: &OpId, real: &Value, fake: &Value) -> Result<usize> {
    let real_leaves = real.leaves();
    let fake_leaves = fake.leaves();
    if real_leaves.len() != fake_leaves.len() {
        return Err(Error::ResultStructure {
            op: op.clone(),
            detail: format!(
                "real result has {} leaves, abstract result has {}",
                real_leaves.len(),
                fake_leaves.len()
            ),
        });
    }

    let mut compared = 0;
    for (index, (real_leaf, fake_leaf)) in real_leaves.into_iter().zip(fake_leaves).enumerate() {
        match (real_leaf.as_tensor(), fake_leaf.as_tensor()) {
            (Some(real_tensor), Some(fake_tensor)) => {
                compare_tensor_meta(real_tensor.meta(), fake_tensor.meta(), true).map_err(
                    |source| Error::CrossRefMismatch {
                        op: op.clone(),
                        source,
                    },
                )?;
                compared += 1;
            }
            (None, None) => {}
            (real_tensor, _) => {
                let (is, is_not) = if real_tensor.is_some() {
                    ("real", "abstract")
                } else {
                    ("abstract", "real")
                };
                return Err(Error::ResultStructure {
                    op: op.clone(),
                    detail: format!(
                        "leaf {index} is a tensor in the {is} result but not in the {is_not} result"
                    ),
                });
            }
        }
    }
    Ok(compared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcheck_core::{MetaMismatch, Tensor, TensorData};

    fn tensor(shape: &[usize]) -> Tensor {
        let n: usize = shape.iter().product();
        Tensor::from_data(TensorData::F32(vec![0.0; n]), shape).unwrap()
    }

    fn fake(shape: &[usize]) -> Tensor {
        Tensor::new_abstract(tensor(shape).meta().clone())
    }

    fn op() -> OpId {
        OpId::aten("split", "Tensor")
    }

    #[test]
    fn test_matching_trees() {
        let real = Value::List(vec![tensor(&[2, 3]).into(), Value::int(4)]);
        let abstract_ = Value::List(vec![fake(&[2, 3]).into(), Value::int(5)]);
        assert_eq!(compare_results(&op(), &real, &abstract_).unwrap(), 1);
    }

    #[test]
    fn test_shape_mismatch_names_the_op() {
        let err = compare_results(&op(), &tensor(&[2, 3]).into(), &fake(&[3, 2]).into())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CrossRefMismatch {
                source: MetaMismatch::Shape { .. },
                ..
            }
        ));
        assert!(err.to_string().starts_with("Mismatch on aten::split.Tensor: shapes"));
    }

    #[test]
    fn test_tensor_against_scalar() {
        let err = compare_results(&op(), &tensor(&[1]).into(), &Value::int(0)).unwrap_err();
        assert!(matches!(err, Error::ResultStructure { .. }));
        assert!(err.to_string().contains("leaf 0"));
    }

    #[test]
    fn test_leaf_count_mismatch() {
        let real = Value::List(vec![tensor(&[1]).into(), tensor(&[1]).into()]);
        let abstract_ = Value::List(vec![fake(&[1]).into()]);
        let err = compare_results(&op(), &real, &abstract_).unwrap_err();
        assert!(matches!(err, Error::ResultStructure { .. }));
    }
}
