//! Fisheye rectification around an external lens-distortion model.
//!
//! The distortion model itself converts pixel offsets from the principal
//! point between the fisheye and the rectilinear image at the native
//! calibration resolution. This module only does the bookkeeping around it:
//! moving between network resolution and native resolution, accounting for
//! scan lines cropped from the top of the capture, and applying the
//! demagnification that keeps the rectilinear image at roughly the size of
//! the fisheye one.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use depthwarp_tensor::{Tensor3, Tensor4};

use crate::error::GeometryError;
use crate::shape::check_sizes;

/// Conversion between fisheye and rectilinear pixel offsets.
///
/// Offsets are measured from the principal point in pixels of the native
/// calibration resolution.
pub trait FisheyeDistortion: std::fmt::Debug + Send + Sync {
    /// Maps a fisheye offset `(dx, dy)` to the corresponding rectilinear offset.
    fn delta_fisheye_to_delta_rect(&self, dx: f32, dy: f32) -> (f32, f32);

    /// Maps a rectilinear offset `(dx, dy)` to the corresponding fisheye offset.
    fn delta_rect_to_delta_fisheye(&self, dx: f32, dy: f32) -> (f32, f32);
}

/// The equidistant fisheye model `r_fish = f * theta`.
///
/// A rectilinear camera with the same focal length maps the same ray to
/// `r_rect = f * tan(theta)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquidistantFisheye {
    /// Focal length in native-resolution pixels.
    pub focal: f32,
}

impl EquidistantFisheye {
    /// Largest incidence angle the rectilinear image can represent.
    const MAX_THETA: f32 = std::f32::consts::FRAC_PI_2 - 1e-3;

    /// Creates the model from its focal length in native-resolution pixels.
    pub fn new(focal: f32) -> Self {
        Self { focal }
    }

    fn rescale(dx: f32, dy: f32, from_radius: f32, to_radius: f32) -> (f32, f32) {
        if from_radius == 0.0 {
            return (dx, dy);
        }
        let s = to_radius / from_radius;
        (dx * s, dy * s)
    }
}

impl FisheyeDistortion for EquidistantFisheye {
    fn delta_fisheye_to_delta_rect(&self, dx: f32, dy: f32) -> (f32, f32) {
        let r_fish = dx.hypot(dy);
        let theta = (r_fish / self.focal).min(Self::MAX_THETA);
        Self::rescale(dx, dy, r_fish, self.focal * theta.tan())
    }

    fn delta_rect_to_delta_fisheye(&self, dx: f32, dy: f32) -> (f32, f32) {
        let r_rect = dx.hypot(dy);
        let theta = (r_rect / self.focal).atan();
        Self::rescale(dx, dy, r_rect, self.focal * theta)
    }
}

/// Calibration constants of the fisheye capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensCalibration {
    /// Width of the native capture the distortion model was calibrated at.
    pub native_width: f32,
    /// Height of the native capture before any scan lines are cropped.
    pub native_height: f32,
    /// Demagnification applied to rectified offsets.
    pub rect_scale: f32,
}

impl Default for LensCalibration {
    fn default() -> Self {
        Self {
            native_width: 1280.0,
            native_height: 720.0,
            rect_scale: 3.0,
        }
    }
}

/// Per-call fisheye configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FisheyeOptions {
    /// Whether the camera uses a fisheye lens.
    pub enabled: bool,
    /// Scan lines cropped from the native capture before resizing to network resolution.
    pub crop_lines: usize,
}

/// Forward and inverse fisheye rectification at network resolution.
#[derive(Debug)]
pub struct LensRectifier {
    model: Box<dyn FisheyeDistortion>,
    calibration: LensCalibration,
}

impl LensRectifier {
    /// Creates a rectifier from a distortion model and its calibration constants.
    pub fn new(model: impl FisheyeDistortion + 'static, calibration: LensCalibration) -> Self {
        Self {
            model: Box::new(model),
            calibration,
        }
    }

    /// Native-resolution size `(width, height)` after cropping `crop_lines`.
    pub(crate) fn native_size(&self, crop_lines: usize) -> (f32, f32) {
        let height = self.calibration.native_height - crop_lines as f32;
        if height <= 0.0 {
            log::warn!(
                "cropping {crop_lines} lines leaves no rows of the {} line native capture",
                self.calibration.native_height
            );
        }
        (self.calibration.native_width, height)
    }

    /// Maps a fisheye pixel to its rectilinear position.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Fisheye pixel coordinates at network resolution.
    /// * `principal_point` - `(cx, cy)` at network resolution.
    /// * `size` - Network resolution `(width, height)`.
    /// * `crop_lines` - Scan lines cropped from the native capture.
    ///
    /// # Returns
    ///
    /// The rectilinear pixel, demagnified by the calibration's `rect_scale`
    /// and clamped to the frame.
    pub fn fisheye_to_rect(
        &self,
        x: f32,
        y: f32,
        principal_point: (f32, f32),
        size: (usize, usize),
        crop_lines: usize,
    ) -> (f32, f32) {
        self.fisheye_to_rect_native(x, y, principal_point, size, self.native_size(crop_lines))
    }

    /// Maps a rectilinear pixel to its fisheye position.
    ///
    /// This is the inverse of [`LensRectifier::fisheye_to_rect`] without the
    /// clamping: points outside the frame keep their out-of-frame coordinate.
    pub fn rect_to_fisheye(
        &self,
        x: f32,
        y: f32,
        principal_point: (f32, f32),
        size: (usize, usize),
        crop_lines: usize,
    ) -> (f32, f32) {
        self.rect_to_fisheye_native(x, y, principal_point, size, self.native_size(crop_lines))
    }

    fn fisheye_to_rect_native(
        &self,
        x: f32,
        y: f32,
        (cx, cy): (f32, f32),
        size: (usize, usize),
        (native_w, native_h): (f32, f32),
    ) -> (f32, f32) {
        let (w, h) = (size.0 as f32, size.1 as f32);
        let scale = self.calibration.rect_scale;

        let dx_f = (x - cx) * native_w / w;
        let dy_f = (y - cy) * native_h / h;

        let (dx_r, dy_r) = self.model.delta_fisheye_to_delta_rect(dx_f, dy_f);

        let dx_r = dx_r * w / (native_w * scale);
        let dy_r = dy_r * h / (native_h * scale);

        (
            (dx_r + cx).clamp(0.0, (w - 1.0).max(0.0)),
            (dy_r + cy).clamp(0.0, (h - 1.0).max(0.0)),
        )
    }

    pub(crate) fn rect_to_fisheye_native(
        &self,
        x: f32,
        y: f32,
        (cx, cy): (f32, f32),
        size: (usize, usize),
        (native_w, native_h): (f32, f32),
    ) -> (f32, f32) {
        let (w, h) = (size.0 as f32, size.1 as f32);
        let scale = self.calibration.rect_scale;

        let dx_r = (x - cx) * (native_w * scale) / w;
        let dy_r = (y - cy) * (native_h * scale) / h;

        let (dx_f, dy_f) = self.model.delta_rect_to_delta_fisheye(dx_r, dy_r);

        (dx_f * w / native_w + cx, dy_f * h / native_h + cy)
    }

    /// Rectifies the pixel grid for every batch item.
    ///
    /// # Arguments
    ///
    /// * `grid` - The homogeneous pixel grid with shape `[1, 3, H, W]`.
    /// * `intrinsics` - Network-resolution intrinsics with shape `[B, 3, 3]`.
    /// * `crop_lines` - Scan lines cropped from the native capture.
    ///
    /// # Returns
    ///
    /// Rectilinear `(x, y)` coordinates with shape `[B, 2, H * W]`.
    pub fn rectify_grid(
        &self,
        grid: &Tensor4<f32>,
        intrinsics: &Tensor3<f32>,
        crop_lines: usize,
    ) -> Result<Tensor3<f32>, GeometryError> {
        check_sizes(grid, "pixel_coords", "13HW")?;
        check_sizes(intrinsics, "intrinsics", "B33")?;

        let [_, _, h, w] = grid.shape;
        let batch = intrinsics.shape[0];
        let hw = h * w;

        let mut out = Tensor3::<f32>::zeros([batch, 2, hw]);
        if hw == 0 {
            return Ok(out);
        }

        let native = self.native_size(crop_lines);
        let pixels = grid.as_slice();
        out.as_slice_mut()
            .par_chunks_exact_mut(2 * hw)
            .enumerate()
            .for_each(|(b, dst)| {
                let principal_point = LensContext::principal_point(intrinsics, b);
                let (xs, ys) = dst.split_at_mut(hw);
                for i in 0..hw {
                    let (x, y) = self.fisheye_to_rect_native(
                        pixels[i],
                        pixels[hw + i],
                        principal_point,
                        (w, h),
                        native,
                    );
                    xs[i] = x;
                    ys[i] = y;
                }
            });

        Ok(out)
    }
}

/// A rectifier together with the per-call crop used to produce the inputs.
#[derive(Debug, Clone, Copy)]
pub struct LensContext<'a> {
    /// The rectifier wrapping the lens model.
    pub rectifier: &'a LensRectifier,
    /// Scan lines cropped from the native capture.
    pub crop_lines: usize,
}

impl LensContext<'_> {
    /// Returns the principal point `(cx, cy)` of batch item `b` of `[B, 3, 3]` intrinsics.
    pub(crate) fn principal_point(intrinsics: &Tensor3<f32>, b: usize) -> (f32, f32) {
        let k = intrinsics.as_slice();
        (k[b * 9 + 2], k[b * 9 + 5])
    }
}
