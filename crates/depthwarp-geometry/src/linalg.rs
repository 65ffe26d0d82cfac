//! Small batched matrix helpers over row-major `[B, M, N]` tensors.

use depthwarp_tensor::Tensor3;

use crate::error::GeometryError;
use crate::shape::{check_batch, check_sizes};

#[rustfmt::skip]
fn determinant3x3(m: &[f32]) -> f32 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) -
    m[1] * (m[3] * m[8] - m[5] * m[6]) +
    m[2] * (m[3] * m[7] - m[4] * m[6])
}

#[rustfmt::skip]
fn adjugate3x3(m: &[f32]) -> [f32; 9] {
    [
        m[4] * m[8] - m[5] * m[7],  // [0, 0]
        m[2] * m[7] - m[1] * m[8],  // [0, 1]
        m[1] * m[5] - m[2] * m[4],  // [0, 2]
        m[5] * m[6] - m[3] * m[8],  // [1, 0]
        m[0] * m[8] - m[2] * m[6],  // [1, 1]
        m[2] * m[3] - m[0] * m[5],  // [1, 2]
        m[3] * m[7] - m[4] * m[6],  // [2, 0]
        m[1] * m[6] - m[0] * m[7],  // [2, 1]
        m[0] * m[4] - m[1] * m[3],  // [2, 2]
    ]
}

/// Inverts a row-major 3x3 matrix, returning `None` when it is singular.
pub fn inverse3x3(m: &[f32]) -> Option<[f32; 9]> {
    let det = determinant3x3(m);
    if det == 0.0 {
        return None;
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut inv_m = [0.0; 9];
    for (dst, a) in inv_m.iter_mut().zip(adj.iter()) {
        *dst = a * inv_det;
    }
    Some(inv_m)
}

/// Inverts every matrix of a `[B, 3, 3]` batch.
///
/// # Errors
///
/// * The tensor must have shape `[B, 3, 3]`.
/// * Every matrix must have a non-zero determinant.
///
/// # Example
///
/// ```
/// use depthwarp_geometry::linalg::batch_inverse3x3;
/// use depthwarp_tensor::Tensor3;
///
/// let k = Tensor3::from_shape_vec([1, 3, 3], vec![2.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0, 0.0, 1.0]).unwrap();
/// let k_inv = batch_inverse3x3(&k, "intrinsics").unwrap();
/// assert_eq!(k_inv.as_slice(), &[0.5, 0.0, -1.0, 0.0, 0.5, -1.0, 0.0, 0.0, 1.0]);
/// ```
pub fn batch_inverse3x3(matrices: &Tensor3<f32>, name: &str) -> Result<Tensor3<f32>, GeometryError> {
    check_sizes(matrices, name, "B33")?;

    let mut data = Vec::with_capacity(matrices.numel());
    for (batch, m) in matrices.as_slice().chunks_exact(9).enumerate() {
        let inv = inverse3x3(m).ok_or_else(|| GeometryError::SingularMatrix {
            name: name.to_string(),
            batch,
        })?;
        data.extend_from_slice(&inv);
    }

    Ok(Tensor3::from_shape_vec(matrices.shape, data)?)
}

/// Batched matrix product `[B, M, K] x [B, K, N] -> [B, M, N]`.
///
/// # Errors
///
/// The batch sizes and the inner dimensions must agree.
pub fn batch_matmul(a: &Tensor3<f32>, b: &Tensor3<f32>) -> Result<Tensor3<f32>, GeometryError> {
    let [batch, m, k] = a.shape;
    check_batch(b, "rhs", batch)?;
    if b.shape[1] != k {
        return Err(GeometryError::invalid_shape(
            "rhs",
            format!("Bx{k}xN"),
            &b.shape,
        ));
    }
    let n = b.shape[2];

    let (lhs, rhs) = (a.as_slice(), b.as_slice());
    let out = Tensor3::from_shape_fn([batch, m, n], |[bi, i, j]| {
        let row = &lhs[(bi * m + i) * k..(bi * m + i + 1) * k];
        let mut acc = 0.0;
        for (kk, &value) in row.iter().enumerate() {
            acc += value * rhs[(bi * k + kk) * n + j];
        }
        acc
    });

    Ok(out)
}
