use depthwarp_imgproc::interpolation::{GridSampler, PaddingMode, Resampler};
use depthwarp_tensor::{Tensor2, Tensor3, Tensor4};

use crate::camera::{cam2pixel, cam2pixel2, pixel2cam, FisheyeProjection, MIN_DEPTH};
use crate::error::GeometryError;
use crate::fisheye::{FisheyeOptions, LensContext, LensRectifier};
use crate::grid::PixelGridCache;
use crate::linalg::{batch_inverse3x3, batch_matmul};
use crate::pose::pose_vec2mat;
use crate::rotation::RotationMode;
use crate::shape::{check_batch, check_sizes};

/// The output of [`InverseWarper::inverse_warp`].
#[derive(Debug, Clone, PartialEq)]
pub struct WarpOutput {
    /// The source image warped to the target image plane, `[B, 3, H, W]`.
    pub projected_img: Tensor4<f32>,
    /// Whether each target pixel projects inside the source frame, `[B, H, W]`.
    pub valid_points: Tensor3<bool>,
}

/// The output of [`InverseWarper::inverse_warp2`].
#[derive(Debug, Clone, PartialEq)]
pub struct DepthWarpOutput {
    /// The source image warped to the target image plane, `[B, 3, H, W]`.
    pub projected_img: Tensor4<f32>,
    /// `1.0` where the target pixel projects inside the source frame, `[B, 1, H, W]`.
    pub valid_mask: Tensor4<f32>,
    /// The source depth resampled at the projected locations, floored at [`MIN_DEPTH`], `[B, 1, H, W]`.
    pub projected_depth: Tensor4<f32>,
    /// The depth of the target points seen from the source camera, `[B, 1, H, W]`.
    pub computed_depth: Tensor4<f32>,
}

/// Inverse warps source images to the target image plane.
///
/// The warper owns the pixel grid cache, the sampling backend and, for
/// fisheye cameras, the lens rectifier. It can be shared between threads.
///
/// # Example
///
/// ```
/// use depthwarp_geometry::{rotation::RotationMode, warp::InverseWarper};
/// use depthwarp_imgproc::interpolation::PaddingMode;
/// use depthwarp_tensor::{Tensor2, Tensor3, Tensor4};
///
/// let warper = InverseWarper::new();
/// let img = Tensor4::from_shape_fn([1, 3, 4, 4], |[_, c, r, col]| (c * 16 + r * 4 + col) as f32);
/// let depth = Tensor3::from_shape_val([1, 4, 4], 1.0);
/// let pose = Tensor2::<f32>::zeros([1, 6]);
/// let k = Tensor3::from_shape_vec([1, 3, 3], vec![2.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0, 0.0, 1.0]).unwrap();
///
/// let out = warper
///     .inverse_warp(&img, &depth, &pose, &k, RotationMode::Euler, PaddingMode::Zeros)
///     .unwrap();
/// assert_eq!(out.projected_img, img);
/// assert!(out.valid_points.iter().all(|v| *v));
/// ```
#[derive(Debug, Default)]
pub struct InverseWarper<S: GridSampler = Resampler> {
    grid_cache: PixelGridCache,
    sampler: S,
    rectifier: Option<LensRectifier>,
}

impl InverseWarper<Resampler> {
    /// Creates a warper with bilinear sampling and no lens model.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: GridSampler> InverseWarper<S> {
    /// Creates a warper with a custom sampling backend.
    pub fn with_sampler(sampler: S) -> Self {
        Self {
            grid_cache: PixelGridCache::new(),
            sampler,
            rectifier: None,
        }
    }

    /// Attaches the lens rectifier used when fisheye handling is requested.
    pub fn with_lens(mut self, rectifier: LensRectifier) -> Self {
        self.rectifier = Some(rectifier);
        self
    }

    /// The pixel grid cache shared by every call on this warper.
    pub fn grid_cache(&self) -> &PixelGridCache {
        &self.grid_cache
    }

    /// Inverse warp a source image to the target image plane.
    ///
    /// # Arguments
    ///
    /// * `img` - The source image (where to sample pixels) with shape `[B, 3, H, W]`.
    /// * `depth` - The depth map of the target image with shape `[B, H, W]`.
    /// * `pose` - 6DoF pose parameters from target to source with shape `[B, 6]`.
    /// * `intrinsics` - The camera intrinsic matrices with shape `[B, 3, 3]`.
    /// * `rotation_mode` - How the rotation part of `pose` is parameterized.
    /// * `padding_mode` - The sampler's policy for out-of-frame locations.
    ///
    /// # Returns
    ///
    /// The warped image and a mask of the target pixels that project inside
    /// the source frame.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidShape`] when a tensor violates its
    /// shape contract, and [`GeometryError::SingularMatrix`] when an
    /// intrinsic matrix cannot be inverted.
    pub fn inverse_warp(
        &self,
        img: &Tensor4<f32>,
        depth: &Tensor3<f32>,
        pose: &Tensor2<f32>,
        intrinsics: &Tensor3<f32>,
        rotation_mode: RotationMode,
        padding_mode: PaddingMode,
    ) -> Result<WarpOutput, GeometryError> {
        check_sizes(img, "img", "B3HW")?;
        check_sizes(depth, "depth", "BHW")?;
        check_sizes(pose, "pose", "B6")?;
        check_sizes(intrinsics, "intrinsics", "B33")?;

        let batch = img.shape[0];
        check_batch(depth, "depth", batch)?;
        check_batch(pose, "pose", batch)?;
        check_batch(intrinsics, "intrinsics", batch)?;

        log::trace!(
            "inverse_warp img {:?} depth {:?} rotation {rotation_mode} padding {padding_mode}",
            img.shape,
            depth.shape
        );

        let intrinsics_inv = batch_inverse3x3(intrinsics, "intrinsics")?;
        let cam_coords = pixel2cam(&self.grid_cache, depth, &intrinsics_inv, None)?;

        let pose_mat = pose_vec2mat(pose, rotation_mode)?;
        let (rot, tr) = split_projection(&batch_matmul(intrinsics, &pose_mat)?)?;

        let src_pixel_coords = cam2pixel(&cam_coords, Some(&rot), Some(&tr))?;
        let projected_img = self.sampler.sample(img, &src_pixel_coords, padding_mode)?;

        let [_, h, w, _] = src_pixel_coords.shape;
        let valid_points = Tensor3::from_shape_vec([batch, h, w], in_frame(&src_pixel_coords).collect())?;

        Ok(WarpOutput {
            projected_img,
            valid_points,
        })
    }

    /// Inverse warp a source image and its depth map to the target image plane.
    ///
    /// The rotation part of `pose` is always read as Euler angles.
    ///
    /// # Arguments
    ///
    /// * `img` - The source image (where to sample pixels) with shape `[B, 3, H, W]`.
    /// * `depth` - The depth map of the target image with shape `[B, 1, H, W]`.
    /// * `ref_depth` - The source depth map (where to sample depth) with shape `[B, 1, H, W]`.
    /// * `pose` - 6DoF pose parameters from target to source with shape `[B, 6]`.
    /// * `intrinsics` - The camera intrinsic matrices with shape `[B, 3, 3]`.
    /// * `padding_mode` - The sampler's policy for out-of-frame locations.
    /// * `fisheye` - Whether the camera has a fisheye lens and how the capture was cropped.
    ///
    /// # Returns
    ///
    /// The warped image, the validity mask, the resampled source depth and
    /// the depth of the target points seen from the source camera. Comparing
    /// the two depths is left to the caller.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`InverseWarper::inverse_warp`], returns
    /// [`GeometryError::MissingLensModel`] when fisheye handling is enabled on
    /// a warper without a lens rectifier.
    #[allow(clippy::too_many_arguments)]
    pub fn inverse_warp2(
        &self,
        img: &Tensor4<f32>,
        depth: &Tensor4<f32>,
        ref_depth: &Tensor4<f32>,
        pose: &Tensor2<f32>,
        intrinsics: &Tensor3<f32>,
        padding_mode: PaddingMode,
        fisheye: FisheyeOptions,
    ) -> Result<DepthWarpOutput, GeometryError> {
        check_sizes(img, "img", "B3HW")?;
        check_sizes(depth, "depth", "B1HW")?;
        check_sizes(ref_depth, "ref_depth", "B1HW")?;
        check_sizes(pose, "pose", "B6")?;
        check_sizes(intrinsics, "intrinsics", "B33")?;

        let batch = img.shape[0];
        check_batch(depth, "depth", batch)?;
        check_batch(ref_depth, "ref_depth", batch)?;
        check_batch(pose, "pose", batch)?;
        check_batch(intrinsics, "intrinsics", batch)?;

        let lens = if fisheye.enabled {
            let rectifier = self
                .rectifier
                .as_ref()
                .ok_or(GeometryError::MissingLensModel)?;
            Some(LensContext {
                rectifier,
                crop_lines: fisheye.crop_lines,
            })
        } else {
            None
        };

        log::trace!(
            "inverse_warp2 img {:?} depth {:?} padding {padding_mode} fisheye {fisheye:?}",
            img.shape,
            depth.shape
        );

        let [_, _, h, w] = depth.shape;
        let target_depth = depth.clone().reshape([batch, h, w])?;

        let intrinsics_inv = batch_inverse3x3(intrinsics, "intrinsics")?;
        let cam_coords = pixel2cam(&self.grid_cache, &target_depth, &intrinsics_inv, lens)?;

        let pose_mat = pose_vec2mat(pose, RotationMode::Euler)?;
        let (rot, tr) = split_projection(&batch_matmul(intrinsics, &pose_mat)?)?;

        let projection = cam2pixel2(
            &cam_coords,
            Some(&rot),
            Some(&tr),
            padding_mode,
            lens.map(|lens| FisheyeProjection { lens, intrinsics }),
        )?;
        let src_pixel_coords = &projection.coords;

        let projected_img = self.sampler.sample(img, src_pixel_coords, padding_mode)?;

        let valid_mask = Tensor4::from_shape_vec(
            [batch, 1, h, w],
            in_frame(src_pixel_coords)
                .map(|valid| if valid { 1.0 } else { 0.0 })
                .collect(),
        )?;

        let projected_depth = self
            .sampler
            .sample(ref_depth, src_pixel_coords, padding_mode)?
            .map(|d| d.max(MIN_DEPTH));

        Ok(DepthWarpOutput {
            projected_img,
            valid_mask,
            projected_depth,
            computed_depth: projection.depth,
        })
    }
}

/// Splits `[B, 3, 4]` projection matrices into `[B, 3, 3]` and `[B, 3, 1]` parts.
fn split_projection(proj: &Tensor3<f32>) -> Result<(Tensor3<f32>, Tensor3<f32>), GeometryError> {
    check_sizes(proj, "proj_cam_to_src_pixel", "B34")?;
    let batch = proj.shape[0];

    let mut rot = Vec::with_capacity(batch * 9);
    let mut tr = Vec::with_capacity(batch * 3);
    for row in proj.as_slice().chunks_exact(4) {
        rot.extend_from_slice(&row[..3]);
        tr.push(row[3]);
    }

    Ok((
        Tensor3::from_shape_vec([batch, 3, 3], rot)?,
        Tensor3::from_shape_vec([batch, 3, 1], tr)?,
    ))
}

/// Yields whether each `(x, y)` pair of `[B, H, W, 2]` coordinates lies in `[-1, 1]`.
///
/// A NaN on either axis is out of frame.
fn in_frame(coords: &Tensor4<f32>) -> impl Iterator<Item = bool> + '_ {
    coords
        .as_slice()
        .chunks_exact(2)
        .map(|xy| xy[0].abs() <= 1.0 && xy[1].abs() <= 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_projection_layout() -> Result<(), GeometryError> {
        let proj = Tensor3::from_shape_vec([1, 3, 4], (0..12).map(|v| v as f32).collect())?;
        let (rot, tr) = split_projection(&proj)?;
        assert_eq!(rot.as_slice(), &[0.0, 1.0, 2.0, 4.0, 5.0, 6.0, 8.0, 9.0, 10.0]);
        assert_eq!(tr.as_slice(), &[3.0, 7.0, 11.0]);
        Ok(())
    }

    #[test]
    fn in_frame_is_inclusive() -> Result<(), GeometryError> {
        let coords = Tensor4::from_shape_vec([1, 1, 4, 2], vec![1.0, -1.0, 1.01, 0.0, 0.0, -2.0, f32::NAN, 0.0])?;
        let valid: Vec<bool> = in_frame(&coords).collect();
        assert_eq!(valid, vec![true, false, false, false]);

        let coords = Tensor4::from_shape_vec([1, 1, 2, 2], vec![0.0, f32::NAN, f32::NAN, f32::NAN])?;
        assert_eq!(in_frame(&coords).collect::<Vec<_>>(), vec![false, false]);
        Ok(())
    }

    #[test]
    fn batch_mismatch_is_reported() {
        let warper = InverseWarper::new();
        let img = Tensor4::<f32>::zeros([2, 3, 4, 4]);
        let depth = Tensor3::from_shape_val([2, 4, 4], 1.0);
        let pose = Tensor2::<f32>::zeros([1, 6]);
        let k = Tensor3::from_shape_val([2, 3, 3], 1.0);
        let res = warper.inverse_warp(&img, &depth, &pose, &k, RotationMode::Euler, PaddingMode::Zeros);
        assert!(matches!(res, Err(GeometryError::InvalidShape { ref name, .. }) if name == "pose"));
    }

    #[test]
    fn singular_intrinsics_are_reported() {
        let warper = InverseWarper::new();
        let img = Tensor4::<f32>::zeros([1, 3, 2, 2]);
        let depth = Tensor3::from_shape_val([1, 2, 2], 1.0);
        let pose = Tensor2::<f32>::zeros([1, 6]);
        let k = Tensor3::<f32>::zeros([1, 3, 3]);
        let res = warper.inverse_warp(&img, &depth, &pose, &k, RotationMode::Quat, PaddingMode::Border);
        assert_eq!(
            res,
            Err(GeometryError::SingularMatrix {
                name: "intrinsics".to_string(),
                batch: 0
            })
        );
    }
}
