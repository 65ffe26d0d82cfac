use super::padding::tap_or_zero;

/// Kernel for nearest neighbor interpolation
///
/// # Arguments
///
/// * `plane` - A single channel stored row-major with `rows * cols` elements.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The value of the nearest pixel, or zero if it lies outside the plane.
pub(crate) fn nearest_neighbor_interpolation(
    plane: &[f32],
    rows: usize,
    cols: usize,
    u: f32,
    v: f32,
) -> f32 {
    let iu = u.round() as isize;
    let iv = v.round() as isize;
    tap_or_zero(plane, rows, cols, iv, iu)
}
