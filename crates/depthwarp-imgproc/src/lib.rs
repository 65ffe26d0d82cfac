#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the sampling operations.
pub mod error;

/// utilities for interpolation.
pub mod interpolation;

pub use error::ImgprocError;
