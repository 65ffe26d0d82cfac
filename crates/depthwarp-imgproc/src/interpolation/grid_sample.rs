use rayon::prelude::*;

use depthwarp_tensor::Tensor4;

use super::interpolate::{interpolate_pixel, InterpolationMode};
use super::padding::PaddingMode;
use crate::error::ImgprocError;

/// Maps a normalized coordinate in `[-1, 1]` to a pixel coordinate in `[0, size - 1]`.
#[inline]
pub fn unnormalize_coord(coord: f32, size: usize) -> f32 {
    ((coord + 1.0) / 2.0) * (size.saturating_sub(1)) as f32
}

/// Sample a batch of images at normalized grid locations.
///
/// # Arguments
///
/// * `input` - The images to sample from with shape `[B, C, H, W]`.
/// * `grid` - The sample locations with shape `[B, Ho, Wo, 2]`, holding `(x, y)` in `[-1, 1]`.
/// * `interpolation` - The interpolation mode to use.
/// * `padding` - The policy for locations outside the input frame.
///
/// # Returns
///
/// The sampled images with shape `[B, C, Ho, Wo]`.
///
/// # Errors
///
/// * The grid must have a trailing dimension of 2.
/// * The input and the grid must have the same batch size.
/// * The input must have a non-empty spatial size.
///
/// # Example
///
/// ```
/// use depthwarp_imgproc::interpolation::{grid_sample, InterpolationMode, PaddingMode};
/// use depthwarp_tensor::Tensor4;
///
/// let img = Tensor4::from_shape_vec([1, 1, 2, 2], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
/// // sample the bottom-right and the top-left corners
/// let grid = Tensor4::from_shape_vec([1, 1, 2, 2], vec![1.0, 1.0, -1.0, -1.0]).unwrap();
/// let out = grid_sample(&img, &grid, InterpolationMode::Bilinear, PaddingMode::Zeros).unwrap();
/// assert_eq!(out.as_slice(), &[3.0, 0.0]);
/// ```
pub fn grid_sample(
    input: &Tensor4<f32>,
    grid: &Tensor4<f32>,
    interpolation: InterpolationMode,
    padding: PaddingMode,
) -> Result<Tensor4<f32>, ImgprocError> {
    let [batch, channels, rows, cols] = input.shape;
    let [grid_batch, out_rows, out_cols, coord_dim] = grid.shape;

    if coord_dim != 2 {
        return Err(ImgprocError::InvalidGridShape(grid.shape));
    }
    if grid_batch != batch {
        return Err(ImgprocError::BatchMismatch(batch, grid_batch));
    }
    if rows == 0 || cols == 0 {
        return Err(ImgprocError::EmptyInput(rows, cols));
    }

    let mut output = Tensor4::<f32>::zeros([batch, channels, out_rows, out_cols]);

    let in_plane = rows * cols;
    let out_plane = out_rows * out_cols;
    if out_plane == 0 || channels == 0 {
        return Ok(output);
    }

    let src = input.as_slice();
    let coords = grid.as_slice();

    // one task per (batch, channel) output plane
    output
        .as_slice_mut()
        .par_chunks_exact_mut(out_plane)
        .enumerate()
        .for_each(|(plane_idx, dst_plane)| {
            let b = plane_idx / channels;
            let src_plane = &src[plane_idx * in_plane..(plane_idx + 1) * in_plane];
            let grid_plane = &coords[b * out_plane * 2..(b + 1) * out_plane * 2];

            dst_plane
                .iter_mut()
                .zip(grid_plane.chunks_exact(2))
                .for_each(|(dst_pixel, xy)| {
                    let u = padding.apply(unnormalize_coord(xy[0], cols), cols);
                    let v = padding.apply(unnormalize_coord(xy[1], rows), rows);
                    *dst_pixel = interpolate_pixel(src_plane, rows, cols, u, v, interpolation);
                });
        });

    Ok(output)
}

/// A resampler that reads a batch of images at normalized sample coordinates.
///
/// The warping pipeline only depends on this trait, so callers can plug in a
/// different sampling backend.
pub trait GridSampler {
    /// Samples `input` `[B, C, H, W]` at `grid` `[B, Ho, Wo, 2]`, returning `[B, C, Ho, Wo]`.
    fn sample(
        &self,
        input: &Tensor4<f32>,
        grid: &Tensor4<f32>,
        padding: PaddingMode,
    ) -> Result<Tensor4<f32>, ImgprocError>;
}

/// The default [`GridSampler`], backed by [`grid_sample`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resampler {
    /// The interpolation mode used for every sample.
    pub interpolation: InterpolationMode,
}

impl Resampler {
    /// Creates a resampler with the given interpolation mode.
    pub fn new(interpolation: InterpolationMode) -> Self {
        Self { interpolation }
    }
}

impl GridSampler for Resampler {
    fn sample(
        &self,
        input: &Tensor4<f32>,
        grid: &Tensor4<f32>,
        padding: PaddingMode,
    ) -> Result<Tensor4<f32>, ImgprocError> {
        grid_sample(input, grid, self.interpolation, padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthwarp_tensor::Tensor4;

    fn identity_grid(batch: usize, rows: usize, cols: usize) -> Tensor4<f32> {
        Tensor4::from_shape_fn([batch, rows, cols, 2], |[_, r, c, k]| {
            if k == 0 {
                2.0 * c as f32 / (cols - 1) as f32 - 1.0
            } else {
                2.0 * r as f32 / (rows - 1) as f32 - 1.0
            }
        })
    }

    #[test]
    fn sample_smoke() -> Result<(), ImgprocError> {
        let image = Tensor4::from_shape_vec(
            [1, 1, 3, 3],
            vec![0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        )?;
        let grid = Tensor4::from_shape_vec(
            [1, 2, 2, 2],
            vec![-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0],
        )?;

        let out = grid_sample(&image, &grid, InterpolationMode::Bilinear, PaddingMode::Zeros)?;

        assert_eq!(out.shape, [1, 1, 2, 2]);
        for (a, b) in out.as_slice().iter().zip([0.0, 2.0, 6.0, 8.0].iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn identity_grid_reproduces_input() -> Result<(), ImgprocError> {
        let (batch, channels, rows, cols) = (2, 3, 4, 5);
        let image = Tensor4::from_shape_fn([batch, channels, rows, cols], |[b, c, r, x]| {
            (b * 1000 + c * 100 + r * 10 + x) as f32
        });
        let grid = identity_grid(batch, rows, cols);

        let out = Resampler::default().sample(&image, &grid, PaddingMode::Zeros)?;
        for (a, b) in out.as_slice().iter().zip(image.as_slice()) {
            approx::assert_relative_eq!(a, b, epsilon = 1e-3);
        }
        Ok(())
    }

    #[test]
    fn zeros_vs_border_outside() -> Result<(), ImgprocError> {
        let image = Tensor4::from_shape_vec([1, 1, 2, 2], vec![1.0, 2.0, 3.0, 4.0])?;
        let grid = Tensor4::from_shape_vec([1, 1, 1, 2], vec![5.0, 5.0])?;

        let zeros = grid_sample(&image, &grid, InterpolationMode::Bilinear, PaddingMode::Zeros)?;
        assert_eq!(zeros.as_slice(), &[0.0]);

        let border = grid_sample(&image, &grid, InterpolationMode::Bilinear, PaddingMode::Border)?;
        assert_eq!(border.as_slice(), &[4.0]);
        Ok(())
    }

    #[test]
    fn sentinel_never_blends() -> Result<(), ImgprocError> {
        let image = Tensor4::from_shape_val([1, 1, 4, 4], 5.0);
        let grid = Tensor4::from_shape_vec([1, 1, 1, 2], vec![2.0, 0.0])?;
        let out = grid_sample(&image, &grid, InterpolationMode::Bilinear, PaddingMode::Zeros)?;
        assert_eq!(out.as_slice(), &[0.0]);
        Ok(())
    }

    #[test]
    fn batches_use_their_own_grid() -> Result<(), ImgprocError> {
        let image = Tensor4::from_shape_vec(
            [2, 1, 1, 2],
            vec![1.0, 2.0, 10.0, 20.0],
        )?;
        let grid = Tensor4::from_shape_vec([2, 1, 1, 2], vec![-1.0, 0.0, 1.0, 0.0])?;
        let out = grid_sample(&image, &grid, InterpolationMode::Nearest, PaddingMode::Zeros)?;
        assert_eq!(out.as_slice(), &[1.0, 20.0]);
        Ok(())
    }

    #[test]
    fn shape_errors() {
        let image = Tensor4::<f32>::zeros([1, 1, 2, 2]);
        let bad_grid = Tensor4::<f32>::zeros([1, 2, 2, 3]);
        assert_eq!(
            grid_sample(&image, &bad_grid, InterpolationMode::Bilinear, PaddingMode::Zeros),
            Err(ImgprocError::InvalidGridShape([1, 2, 2, 3]))
        );
        let other_batch = Tensor4::<f32>::zeros([2, 2, 2, 2]);
        assert_eq!(
            grid_sample(&image, &other_batch, InterpolationMode::Bilinear, PaddingMode::Zeros),
            Err(ImgprocError::BatchMismatch(1, 2))
        );
    }
}
