#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Unprojection and projection between pixels and camera points.
pub mod camera;

/// Error types for the geometry module.
pub mod error;

/// Fisheye lens rectification.
pub mod fisheye;

/// The homogeneous pixel grid and its cache.
pub mod grid;

/// Small batched 3x3 linear algebra.
pub mod linalg;

/// 6DoF pose vectors to transformation matrices.
pub mod pose;

/// Rotation matrices from Euler angles and quaternions.
pub mod rotation;

/// Shape contract checks.
pub mod shape;

/// Inverse warping of images and depth maps.
pub mod warp;

pub use error::GeometryError;
pub use warp::{DepthWarpOutput, InverseWarper, WarpOutput};
