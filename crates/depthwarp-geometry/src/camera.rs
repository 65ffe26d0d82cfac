use rayon::prelude::*;

use depthwarp_imgproc::interpolation::PaddingMode;
use depthwarp_tensor::{Tensor3, Tensor4};

use crate::error::GeometryError;
use crate::fisheye::LensContext;
use crate::grid::PixelGridCache;
use crate::linalg::batch_inverse3x3;
use crate::shape::{check_batch, check_sizes};

/// Smallest depth a projected point may have.
pub const MIN_DEPTH: f32 = 1e-3;

/// Normalized coordinate written to both axes of out-of-frame points under zero padding.
pub const OUT_OF_BOUNDS_SENTINEL: f32 = 2.0;

/// Fisheye context for projecting camera points back into a fisheye image.
#[derive(Debug, Clone, Copy)]
pub struct FisheyeProjection<'a> {
    /// The lens rectifier and the crop used to produce the inputs.
    pub lens: LensContext<'a>,
    /// The (non-inverted) intrinsics with shape `[B, 3, 3]`.
    pub intrinsics: &'a Tensor3<f32>,
}

/// The output of [`cam2pixel2`].
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Normalized sample coordinates with shape `[B, H, W, 2]`.
    pub coords: Tensor4<f32>,
    /// Depth of every projected point, floored at [`MIN_DEPTH`], with shape `[B, 1, H, W]`.
    pub depth: Tensor4<f32>,
}

/// Transform coordinates in the pixel frame to the camera frame.
///
/// # Arguments
///
/// * `grid_cache` - The pixel grid cache to read the homogeneous pixel grid from.
/// * `depth` - The depth maps with shape `[B, H, W]`.
/// * `intrinsics_inv` - The inverse intrinsics of every batch item with shape `[B, 3, 3]`.
/// * `lens` - When set, pixels are rectified before unprojection.
///
/// # Returns
///
/// The depth scaled camera points with shape `[B, 3, H, W]`. A depth of zero
/// yields the camera origin.
///
/// # Example
///
/// ```
/// use depthwarp_geometry::camera::pixel2cam;
/// use depthwarp_geometry::grid::PixelGridCache;
/// use depthwarp_tensor::Tensor3;
///
/// let cache = PixelGridCache::new();
/// let depth = Tensor3::from_shape_val([1, 2, 2], 2.0);
/// let k_inv = Tensor3::from_shape_vec([1, 3, 3], vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
/// let cam = pixel2cam(&cache, &depth, &k_inv, None).unwrap();
/// assert_eq!(cam.shape, [1, 3, 2, 2]);
/// // (col, row, 1) * depth
/// assert_eq!(cam.get([0, 0, 1, 1]), Some(&2.0));
/// assert_eq!(cam.get([0, 2, 1, 1]), Some(&2.0));
/// ```
pub fn pixel2cam(
    grid_cache: &PixelGridCache,
    depth: &Tensor3<f32>,
    intrinsics_inv: &Tensor3<f32>,
    lens: Option<LensContext<'_>>,
) -> Result<Tensor4<f32>, GeometryError> {
    check_sizes(depth, "depth", "BHW")?;
    check_sizes(intrinsics_inv, "intrinsics_inv", "B33")?;

    let [batch, h, w] = depth.shape;
    check_batch(intrinsics_inv, "intrinsics_inv", batch)?;

    let hw = h * w;
    let mut cam_coords = Tensor4::<f32>::zeros([batch, 3, h, w]);
    if hw == 0 {
        return Ok(cam_coords);
    }

    let grid = grid_cache.get_grid(h, w);
    let rectified = match lens {
        Some(ctx) => {
            let intrinsics = batch_inverse3x3(intrinsics_inv, "intrinsics_inv")?;
            Some(ctx.rectifier.rectify_grid(&grid, &intrinsics, ctx.crop_lines)?)
        }
        None => None,
    };

    let pixels = grid.as_slice();
    let k_inv = intrinsics_inv.as_slice();
    let depth = depth.as_slice();

    cam_coords
        .as_slice_mut()
        .par_chunks_exact_mut(3 * hw)
        .enumerate()
        .for_each(|(b, dst)| {
            let (xs, ys) = match &rectified {
                Some(r) => r.as_slice()[b * 2 * hw..(b + 1) * 2 * hw].split_at(hw),
                None => (&pixels[..hw], &pixels[hw..2 * hw]),
            };
            let m = &k_inv[b * 9..(b + 1) * 9];
            let d = &depth[b * hw..(b + 1) * hw];

            let (cx, rest) = dst.split_at_mut(hw);
            let (cy, cz) = rest.split_at_mut(hw);
            for i in 0..hw {
                let (x, y) = (xs[i], ys[i]);
                cx[i] = (m[0] * x + m[1] * y + m[2]) * d[i];
                cy[i] = (m[3] * x + m[4] * y + m[5]) * d[i];
                cz[i] = (m[6] * x + m[7] * y + m[8]) * d[i];
            }
        });

    Ok(cam_coords)
}

/// Transform coordinates in the camera frame to normalized sample coordinates.
///
/// This is the plain projector: it neither handles fisheye lenses nor rewrites
/// out-of-frame points.
///
/// # Arguments
///
/// * `cam_coords` - Camera points with shape `[B, 3, H, W]`; a fourth homogeneous channel is ignored.
/// * `rot` - Optional rotation (or projection) matrices with shape `[B, 3, 3]`.
/// * `tr` - Optional translations with shape `[B, 3, 1]`.
///
/// # Returns
///
/// Normalized coordinates with shape `[B, H, W, 2]`, `-1` on the first and
/// `1` on the last pixel of each axis.
pub fn cam2pixel(
    cam_coords: &Tensor4<f32>,
    rot: Option<&Tensor3<f32>>,
    tr: Option<&Tensor3<f32>>,
) -> Result<Tensor4<f32>, GeometryError> {
    Ok(project(cam_coords, rot, tr, None, None)?.coords)
}

/// Transform coordinates in the camera frame to normalized sample coordinates
/// and projected depth.
///
/// Unlike [`cam2pixel`], points can be projected back into a fisheye image
/// and, with [`PaddingMode::Zeros`], a point with a normalized coordinate
/// outside `[-1, 1]` on either axis gets [`OUT_OF_BOUNDS_SENTINEL`] on both
/// axes, so that the sampler never blends a border pixel with padding.
pub fn cam2pixel2(
    cam_coords: &Tensor4<f32>,
    rot: Option<&Tensor3<f32>>,
    tr: Option<&Tensor3<f32>>,
    padding_mode: PaddingMode,
    fisheye: Option<FisheyeProjection<'_>>,
) -> Result<Projection, GeometryError> {
    project(cam_coords, rot, tr, Some(padding_mode), fisheye)
}

fn project(
    cam_coords: &Tensor4<f32>,
    rot: Option<&Tensor3<f32>>,
    tr: Option<&Tensor3<f32>>,
    padding_mode: Option<PaddingMode>,
    fisheye: Option<FisheyeProjection<'_>>,
) -> Result<Projection, GeometryError> {
    let [batch, channels, h, w] = cam_coords.shape;
    if channels != 3 && channels != 4 {
        return Err(GeometryError::invalid_shape(
            "cam_coords",
            "Bx3xHxW",
            &cam_coords.shape,
        ));
    }
    if let Some(rot) = rot {
        check_sizes(rot, "rot", "B33")?;
        check_batch(rot, "rot", batch)?;
    }
    if let Some(tr) = tr {
        check_sizes(tr, "tr", "B31")?;
        check_batch(tr, "tr", batch)?;
    }
    if let Some(fe) = &fisheye {
        check_sizes(fe.intrinsics, "intrinsics", "B33")?;
        check_batch(fe.intrinsics, "intrinsics", batch)?;
    }

    let hw = h * w;
    let mut coords = Tensor4::<f32>::zeros([batch, h, w, 2]);
    let mut depth = Tensor4::<f32>::zeros([batch, 1, h, w]);
    if hw == 0 {
        return Ok(Projection { coords, depth });
    }

    let zero_padding = padding_mode == Some(PaddingMode::Zeros);
    let native = fisheye
        .map(|fe| fe.lens.rectifier.native_size(fe.lens.crop_lines))
        .unwrap_or_default();
    let (wf, hf) = (w as f32, h as f32);
    let src = cam_coords.as_slice();

    coords
        .as_slice_mut()
        .par_chunks_exact_mut(2 * hw)
        .zip(depth.as_slice_mut().par_chunks_exact_mut(hw))
        .enumerate()
        .for_each(|(b, (dst_xy, dst_z))| {
            let plane = &src[b * channels * hw..];
            let (xs, ys, zs) = (&plane[..hw], &plane[hw..2 * hw], &plane[2 * hw..3 * hw]);
            let m = rot.map(|r| &r.as_slice()[b * 9..(b + 1) * 9]);
            let t = tr.map(|t| &t.as_slice()[b * 3..(b + 1) * 3]);
            let lens = fisheye.map(|fe| {
                (
                    fe.lens.rectifier,
                    LensContext::principal_point(fe.intrinsics, b),
                )
            });

            for (i, (xy, z_out)) in dst_xy.chunks_exact_mut(2).zip(dst_z.iter_mut()).enumerate() {
                let (mut x, mut y, mut z) = (xs[i], ys[i], zs[i]);
                if let Some(m) = m {
                    (x, y, z) = (
                        m[0] * x + m[1] * y + m[2] * z,
                        m[3] * x + m[4] * y + m[5] * z,
                        m[6] * x + m[7] * y + m[8] * z,
                    );
                }
                if let Some(t) = t {
                    x += t[0];
                    y += t[1];
                    z += t[2];
                }
                let z = z.max(MIN_DEPTH);

                let (u, v) = match lens {
                    Some((rectifier, principal_point)) => rectifier.rect_to_fisheye_native(
                        x / z,
                        y / z,
                        principal_point,
                        (w, h),
                        native,
                    ),
                    None => (x / z, y / z),
                };

                let mut x_norm = 2.0 * u / (wf - 1.0) - 1.0;
                let mut y_norm = 2.0 * v / (hf - 1.0) - 1.0;
                if zero_padding && (x_norm.abs() > 1.0 || y_norm.abs() > 1.0) {
                    x_norm = OUT_OF_BOUNDS_SENTINEL;
                    y_norm = OUT_OF_BOUNDS_SENTINEL;
                }

                xy[0] = x_norm;
                xy[1] = y_norm;
                *z_out = z;
            }
        });

    Ok(Projection { coords, depth })
}
