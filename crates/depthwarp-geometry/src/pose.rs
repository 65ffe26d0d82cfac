use depthwarp_tensor::{Tensor2, Tensor3};

use crate::error::GeometryError;
use crate::rotation::{rotation_matrix, RotationMode};
use crate::shape::check_sizes;

/// Convert 6DoF parameters to transformation matrices.
///
/// # Arguments
///
/// * `vec` - 6DoF parameters in the order `tx, ty, tz, r0, r1, r2` with shape `[B, 6]`.
/// * `mode` - How the three rotation parameters are interpreted.
///
/// # Returns
///
/// The `[R | t]` transformation matrices with shape `[B, 3, 4]`.
///
/// # Errors
///
/// The input must have shape `[B, 6]`.
///
/// # Example
///
/// ```
/// use depthwarp_geometry::{pose::pose_vec2mat, rotation::RotationMode};
/// use depthwarp_tensor::Tensor2;
///
/// let vec = Tensor2::from_shape_vec([1, 6], vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0]).unwrap();
/// let mat = pose_vec2mat(&vec, RotationMode::Euler).unwrap();
/// assert_eq!(
///     mat.as_slice(),
///     &[1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 3.0]
/// );
/// ```
pub fn pose_vec2mat(vec: &Tensor2<f32>, mode: RotationMode) -> Result<Tensor3<f32>, GeometryError> {
    check_sizes(vec, "vec", "B6")?;
    let batch = vec.shape[0];

    let rot_params = vec
        .as_slice()
        .chunks_exact(6)
        .flat_map(|v| v[3..].iter().copied())
        .collect::<Vec<_>>();
    let rot_mat = rotation_matrix(&Tensor2::from_shape_vec([batch, 3], rot_params)?, mode)?;

    let mut data = Vec::with_capacity(batch * 12);
    for (v, r) in vec
        .as_slice()
        .chunks_exact(6)
        .zip(rot_mat.as_slice().chunks_exact(9))
    {
        for row in 0..3 {
            data.extend_from_slice(&r[row * 3..row * 3 + 3]);
            data.push(v[row]);
        }
    }

    Ok(Tensor3::from_shape_vec([batch, 3, 4], data)?)
}
