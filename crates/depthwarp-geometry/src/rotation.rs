use std::str::FromStr;

use glam::Mat3;
use serde::{Deserialize, Serialize};

use depthwarp_tensor::{Tensor2, Tensor3};

use crate::error::GeometryError;
use crate::shape::check_sizes;

/// Parameterization of the last three entries of a pose vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    /// Euler angles `(rx, ry, rz)` in radians, composed as `Rx * Ry * Rz`.
    #[default]
    Euler,
    /// Vector part `(x, y, z)` of a quaternion whose scalar part is assumed close to 1.
    Quat,
}

impl FromStr for RotationMode {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euler" => Ok(RotationMode::Euler),
            "quat" => Ok(RotationMode::Quat),
            other => Err(GeometryError::UnknownRotationMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for RotationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotationMode::Euler => write!(f, "euler"),
            RotationMode::Quat => write!(f, "quat"),
        }
    }
}

/// Row-major storage of a glam matrix.
pub(crate) fn mat3_to_row_major(m: &Mat3) -> [f32; 9] {
    m.transpose().to_cols_array()
}

/// Convert euler angles to rotation matrices.
///
/// The elementary rotations are composed as `Rx * Ry * Rz`, so a vector is
/// rotated about z first, then y, then x.
///
/// # Arguments
///
/// * `angle` - Rotation angles about the x, y and z axes in radians with shape `[B, 3]`.
///
/// # Returns
///
/// The rotation matrices with shape `[B, 3, 3]`, row-major.
///
/// # Errors
///
/// The input must have shape `[B, 3]`.
pub fn euler2mat(angle: &Tensor2<f32>) -> Result<Tensor3<f32>, GeometryError> {
    check_sizes(angle, "angle", "B3")?;

    let mut data = Vec::with_capacity(angle.shape[0] * 9);
    for xyz in angle.as_slice().chunks_exact(3) {
        let (x, y, z) = (xyz[0], xyz[1], xyz[2]);
        let rot = Mat3::from_rotation_x(x) * Mat3::from_rotation_y(y) * Mat3::from_rotation_z(z);
        data.extend_from_slice(&mat3_to_row_major(&rot));
    }

    Ok(Tensor3::from_shape_vec([angle.shape[0], 3, 3], data)?)
}

/// Convert quaternion coefficients to rotation matrices.
///
/// The input holds the vector part `(x, y, z)`. The scalar part is set to 1
/// and the resulting 4-vector is normalized, so the input need not be
/// normalized but is assumed to describe a quaternion whose scalar part was
/// close to 1. A vector part with a huge norm degenerates towards a
/// 180 degree rotation; this is not checked.
///
/// # Arguments
///
/// * `quat` - The vector part of the quaternions with shape `[B, 3]`.
///
/// # Returns
///
/// The rotation matrices with shape `[B, 3, 3]`, row-major.
///
/// # Errors
///
/// The input must have shape `[B, 3]`.
pub fn quat2mat(quat: &Tensor2<f32>) -> Result<Tensor3<f32>, GeometryError> {
    check_sizes(quat, "quat", "B3")?;

    let mut data = Vec::with_capacity(quat.shape[0] * 9);
    for xyz in quat.as_slice().chunks_exact(3) {
        let norm = (1.0 + xyz[0] * xyz[0] + xyz[1] * xyz[1] + xyz[2] * xyz[2]).sqrt();
        let (w, x, y, z) = (1.0 / norm, xyz[0] / norm, xyz[1] / norm, xyz[2] / norm);

        let (w2, x2, y2, z2) = (w * w, x * x, y * y, z * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);

        #[rustfmt::skip]
        let rot = [
            w2 + x2 - y2 - z2, 2.0 * xy - 2.0 * wz, 2.0 * wy + 2.0 * xz,
            2.0 * wz + 2.0 * xy, w2 - x2 + y2 - z2, 2.0 * yz - 2.0 * wx,
            2.0 * xz - 2.0 * wy, 2.0 * wx + 2.0 * yz, w2 - x2 - y2 + z2,
        ];
        data.extend_from_slice(&rot);
    }

    Ok(Tensor3::from_shape_vec([quat.shape[0], 3, 3], data)?)
}

/// Build rotation matrices with the requested parameterization.
pub fn rotation_matrix(
    params: &Tensor2<f32>,
    mode: RotationMode,
) -> Result<Tensor3<f32>, GeometryError> {
    match mode {
        RotationMode::Euler => euler2mat(params),
        RotationMode::Quat => quat2mat(params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};
    use rand::Rng;

    fn row_major_to_mat3(m: &[f32]) -> Mat3 {
        Mat3::from_cols_array(&[m[0], m[3], m[6], m[1], m[4], m[7], m[2], m[5], m[8]])
    }

    fn random_params(batch: usize, range: f32) -> Tensor2<f32> {
        let mut rng = rand::rng();
        let data = (0..batch * 3)
            .map(|_| rng.random_range(-range..range))
            .collect::<Vec<f32>>();
        Tensor2::from_shape_vec([batch, 3], data).unwrap()
    }

    fn assert_orthonormal(rot: &Tensor3<f32>) {
        for m in rot.as_slice().chunks_exact(9) {
            let r = row_major_to_mat3(m);
            let rrt = r * r.transpose();
            for (a, b) in rrt.to_cols_array().iter().zip(Mat3::IDENTITY.to_cols_array()) {
                assert_relative_eq!(*a, b, epsilon = 1e-5);
            }
            assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn parse_rotation_mode() -> Result<(), GeometryError> {
        assert_eq!("euler".parse::<RotationMode>()?, RotationMode::Euler);
        assert_eq!("quat".parse::<RotationMode>()?, RotationMode::Quat);
        assert!("axis-angle".parse::<RotationMode>().is_err());
        assert_eq!(RotationMode::Quat.to_string(), "quat");
        Ok(())
    }

    #[test]
    fn euler_zero_is_identity() -> Result<(), GeometryError> {
        let rot = euler2mat(&Tensor2::zeros([2, 3]))?;
        for m in rot.as_slice().chunks_exact(9) {
            assert_eq!(m, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        }
        Ok(())
    }

    #[test]
    fn euler_composition_order() -> Result<(), GeometryError> {
        let (x, y, z) = (0.3f32, -0.7f32, 1.1f32);
        let angle = Tensor2::from_shape_vec([1, 3], vec![x, y, z])?;
        let rot = euler2mat(&angle)?;

        let (cx, sx) = (x.cos(), x.sin());
        let (cy, sy) = (y.cos(), y.sin());
        let (cz, sz) = (z.cos(), z.sin());
        #[rustfmt::skip]
        let xmat = row_major_to_mat3(&[1.0, 0.0, 0.0, 0.0, cx, -sx, 0.0, sx, cx]);
        #[rustfmt::skip]
        let ymat = row_major_to_mat3(&[cy, 0.0, sy, 0.0, 1.0, 0.0, -sy, 0.0, cy]);
        #[rustfmt::skip]
        let zmat = row_major_to_mat3(&[cz, -sz, 0.0, sz, cz, 0.0, 0.0, 0.0, 1.0]);
        let expected = mat3_to_row_major(&(xmat * ymat * zmat));

        for (a, b) in rot.as_slice().iter().zip(expected.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }

        // the z-first convention differs from the x-first one
        let reversed = mat3_to_row_major(&(zmat * ymat * xmat));
        let max_diff = rot
            .as_slice()
            .iter()
            .zip(reversed.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_diff > 1e-2);
        Ok(())
    }

    #[test]
    fn euler_random_is_orthonormal() -> Result<(), GeometryError> {
        let rot = euler2mat(&random_params(16, std::f32::consts::PI))?;
        assert_eq!(rot.shape, [16, 3, 3]);
        assert_orthonormal(&rot);
        Ok(())
    }

    #[test]
    fn quat_matches_glam() -> Result<(), GeometryError> {
        let params = random_params(16, 2.0);
        let rot = quat2mat(&params)?;
        assert_orthonormal(&rot);

        for (xyz, m) in params.as_slice().chunks_exact(3).zip(rot.as_slice().chunks_exact(9)) {
            let q = Quat::from_xyzw(xyz[0], xyz[1], xyz[2], 1.0).normalize();
            let expected = mat3_to_row_major(&Mat3::from_quat(q));
            for (a, b) in m.iter().zip(expected.iter()) {
                assert_relative_eq!(a, b, epsilon = 1e-5);
            }
        }
        Ok(())
    }

    #[test]
    fn quat_rotates_about_axis() -> Result<(), GeometryError> {
        // 90 degrees about z: vector part tan(pi/4) along z before normalization
        let params = Tensor2::from_shape_vec([1, 3], vec![0.0, 0.0, 1.0])?;
        let rot = rotation_matrix(&params, RotationMode::Quat)?;
        let r = row_major_to_mat3(rot.as_slice());
        let v = r * Vec3::X;
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn rejects_wrong_width() {
        let params = Tensor2::<f32>::zeros([1, 4]);
        assert!(euler2mat(&params).is_err());
        assert!(quat2mat(&params).is_err());
    }
}
