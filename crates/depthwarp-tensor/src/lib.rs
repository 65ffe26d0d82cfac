#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `depthwarp-tensor` provides the owned, row-major N-dimensional array used
//! to carry every batched quantity through the warping pipeline. The number
//! of dimensions is a const generic, so a depth map (`Tensor3`) can never be
//! confused with an image batch (`Tensor4`) at compile time; the sizes of
//! the individual dimensions are checked at runtime.
//!
//! ```rust
//! use depthwarp_tensor::Tensor4;
//!
//! // a batch of one 3-channel 2x2 image
//! let img = Tensor4::<f32>::zeros([1, 3, 2, 2]);
//! assert_eq!(img.numel(), 12);
//! assert_eq!(img.strides, [12, 4, 2, 1]);
//! ```

/// Tensor module containing the main tensor implementation and error types.
pub mod tensor;

pub use crate::tensor::{get_strides_from_shape, Tensor, TensorError};

/// Type alias for a 2-dimensional tensor.
pub type Tensor2<T> = Tensor<T, 2>;

/// Type alias for a 3-dimensional tensor.
pub type Tensor3<T> = Tensor<T, 3>;

/// Type alias for a 4-dimensional tensor.
pub type Tensor4<T> = Tensor<T, 4>;
