use super::padding::tap_or_zero;

/// Kernel for bilinear interpolation
///
/// # Arguments
///
/// * `plane` - A single channel stored row-major with `rows * cols` elements.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated value. Taps outside the plane contribute zero.
pub(crate) fn bilinear_interpolation(
    plane: &[f32],
    rows: usize,
    cols: usize,
    u: f32,
    v: f32,
) -> f32 {
    let u0 = u.floor();
    let v0 = v.floor();

    let frac_u = u - u0;
    let frac_v = v - v0;

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let iu0 = u0 as isize;
    let iv0 = v0 as isize;
    let iu1 = iu0.saturating_add(1);
    let iv1 = iv0.saturating_add(1);

    let p00 = tap_or_zero(plane, rows, cols, iv0, iu0);
    let p01 = tap_or_zero(plane, rows, cols, iv0, iu1);
    let p10 = tap_or_zero(plane, rows, cols, iv1, iu0);
    let p11 = tap_or_zero(plane, rows, cols, iv1, iu1);

    p00 * w00 + p01 * w01 + p10 * w10 + p11 * w11
}
