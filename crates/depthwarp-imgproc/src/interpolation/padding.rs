use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ImgprocError;

/// Policy for sample locations that fall outside the input frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingMode {
    /// Out-of-frame taps read as zero.
    #[default]
    Zeros,
    /// Out-of-frame coordinates are clamped to the nearest border pixel.
    Border,
}

impl PaddingMode {
    /// Applies the padding policy to an unnormalized coordinate along an axis of `size` pixels.
    #[inline]
    pub(crate) fn apply(self, coord: f32, size: usize) -> f32 {
        match self {
            PaddingMode::Zeros => coord,
            PaddingMode::Border => coord.clamp(0.0, (size - 1) as f32),
        }
    }
}

impl FromStr for PaddingMode {
    type Err = ImgprocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zeros" => Ok(PaddingMode::Zeros),
            "border" => Ok(PaddingMode::Border),
            other => Err(ImgprocError::UnknownPaddingMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaddingMode::Zeros => write!(f, "zeros"),
            PaddingMode::Border => write!(f, "border"),
        }
    }
}

/// Reads the pixel at `(row, col)` or zero when it lies outside the plane.
#[inline]
pub(crate) fn tap_or_zero(plane: &[f32], rows: usize, cols: usize, row: isize, col: isize) -> f32 {
    if row < 0 || col < 0 {
        return 0.0;
    }
    let (row, col) = (row as usize, col as usize);
    if row >= rows || col >= cols {
        return 0.0;
    }
    plane[row * cols + col]
}
