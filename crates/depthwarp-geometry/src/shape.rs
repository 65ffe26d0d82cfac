use depthwarp_tensor::Tensor;

use crate::error::GeometryError;

/// Checks a tensor against a shape pattern.
///
/// Every character of `expected` describes one dimension: a digit pins the
/// dimension to that size, any other character (`B`, `H`, `W`, ...) accepts
/// any size. The rank must match the pattern length.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidShape`] naming the tensor, the pattern and
/// the actual shape.
///
/// # Example
///
/// ```
/// use depthwarp_geometry::shape::check_sizes;
/// use depthwarp_tensor::Tensor2;
///
/// let pose = Tensor2::<f32>::zeros([4, 6]);
/// assert!(check_sizes(&pose, "pose", "B6").is_ok());
/// assert!(check_sizes(&pose, "pose", "B3").is_err());
/// ```
pub fn check_sizes<T, const N: usize>(
    tensor: &Tensor<T, N>,
    name: &str,
    expected: &str,
) -> Result<(), GeometryError> {
    let pattern: Vec<char> = expected.chars().collect();
    let mut ok = pattern.len() == N;
    if ok {
        for (dim, symbol) in pattern.iter().enumerate() {
            if let Some(size) = symbol.to_digit(10) {
                ok &= tensor.shape[dim] == size as usize;
            }
        }
    }

    if !ok {
        let joined = pattern
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join("x");
        return Err(GeometryError::invalid_shape(name, joined, &tensor.shape));
    }
    Ok(())
}

/// Checks that a tensor carries `batch` items along its first dimension.
pub(crate) fn check_batch<T, const N: usize>(
    tensor: &Tensor<T, N>,
    name: &str,
    batch: usize,
) -> Result<(), GeometryError> {
    if tensor.shape[0] != batch {
        let rest = tensor.shape[1..]
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>();
        let expected = std::iter::once(batch.to_string())
            .chain(rest)
            .collect::<Vec<_>>()
            .join("x");
        return Err(GeometryError::invalid_shape(name, expected, &tensor.shape));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthwarp_tensor::{Tensor3, Tensor4};

    #[test]
    fn accepts_free_and_fixed_dims() -> Result<(), GeometryError> {
        let img = Tensor4::<f32>::zeros([2, 3, 5, 7]);
        check_sizes(&img, "img", "B3HW")?;
        let depth = Tensor4::<f32>::zeros([2, 1, 5, 7]);
        check_sizes(&depth, "depth", "B1HW")?;
        Ok(())
    }

    #[test]
    fn reports_name_pattern_and_shape() {
        let intrinsics = Tensor3::<f32>::zeros([1, 3, 4]);
        let err = check_sizes(&intrinsics, "intrinsics", "B33");
        assert_eq!(
            err,
            Err(GeometryError::InvalidShape {
                name: "intrinsics".to_string(),
                expected: "Bx3x3".to_string(),
                actual: vec![1, 3, 4],
            })
        );
        if let Err(e) = err {
            assert_eq!(
                e.to_string(),
                "wrong size for intrinsics, expected Bx3x3, got [1, 3, 4]"
            );
        }
    }

    #[test]
    fn rank_mismatch_fails() {
        let depth = Tensor3::<f32>::zeros([1, 4, 4]);
        assert!(check_sizes(&depth, "depth", "B1HW").is_err());
    }

    #[test]
    fn batch_mismatch_fails() {
        let pose = Tensor3::<f32>::zeros([3, 3, 4]);
        assert!(check_batch(&pose, "pose_mat", 3).is_ok());
        assert_eq!(
            check_batch(&pose, "pose_mat", 2),
            Err(GeometryError::invalid_shape("pose_mat", "2x3x4", &[3, 3, 4]))
        );
    }
}
