use serde::{Deserialize, Serialize};

use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;

/// Interpolation mode for the sampling operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `plane` - A single channel stored row-major with `rows * cols` elements.
/// * `rows` - The height of the plane.
/// * `cols` - The width of the plane.
/// * `u` - The x coordinate of the pixel to interpolate, in pixels.
/// * `v` - The y coordinate of the pixel to interpolate, in pixels.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated pixel value.
pub fn interpolate_pixel(
    plane: &[f32],
    rows: usize,
    cols: usize,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> f32 {
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(plane, rows, cols, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(plane, rows, cols, u, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const PLANE: [f32; 9] = [
        0.0, 1.0, 2.0,
        3.0, 4.0, 5.0,
        6.0, 7.0, 8.0,
    ];

    #[test]
    fn bilinear_on_pixel_centres_is_exact() {
        for v in 0..3 {
            for u in 0..3 {
                let val = interpolate_pixel(
                    &PLANE,
                    3,
                    3,
                    u as f32,
                    v as f32,
                    InterpolationMode::Bilinear,
                );
                assert_eq!(val, PLANE[v * 3 + u]);
            }
        }
    }

    #[test]
    fn bilinear_midpoint() {
        let val = interpolate_pixel(&PLANE, 3, 3, 0.5, 0.5, InterpolationMode::Bilinear);
        approx::assert_relative_eq!(val, 2.0);
    }

    #[test]
    fn bilinear_outside_taps_are_zero() {
        // half way between the last column and the padding
        let val = interpolate_pixel(&PLANE, 3, 3, 2.5, 0.0, InterpolationMode::Bilinear);
        approx::assert_relative_eq!(val, 1.0);
        let val = interpolate_pixel(&PLANE, 3, 3, 10.0, -4.0, InterpolationMode::Bilinear);
        assert_eq!(val, 0.0);
    }

    #[test]
    fn nearest_rounds() {
        let val = interpolate_pixel(&PLANE, 3, 3, 1.4, 1.6, InterpolationMode::Nearest);
        assert_eq!(val, 7.0);
        let val = interpolate_pixel(&PLANE, 3, 3, -0.6, 0.0, InterpolationMode::Nearest);
        assert_eq!(val, 0.0);
    }

    #[test]
    fn interpolation_mode_serde() -> Result<(), serde_json::Error> {
        let mode: InterpolationMode = serde_json::from_str("\"nearest\"")?;
        assert_eq!(mode, InterpolationMode::Nearest);
        assert_eq!(serde_json::to_string(&InterpolationMode::Bilinear)?, "\"bilinear\"");
        Ok(())
    }
}
