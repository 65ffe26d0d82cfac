//! Pixel interpolation at normalized sample coordinates.
//!
//! The sampling grid follows the `[-1, 1]` convention where `-1` and `1`
//! address the centres of the first and last pixel along each axis.
//!
//! # Interpolation Modes
//!
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels
//! - **Nearest**: Uses the nearest pixel value (no interpolation)
//!
//! # Padding Modes
//!
//! - **Zeros**: taps falling outside the frame contribute zero
//! - **Border**: coordinates are clamped to the frame before interpolation

mod bilinear;
mod grid_sample;
mod interpolate;
mod nearest;
mod padding;

pub use grid_sample::{grid_sample, unnormalize_coord, GridSampler, Resampler};
pub use interpolate::{interpolate_pixel, InterpolationMode};
pub use padding::PaddingMode;
