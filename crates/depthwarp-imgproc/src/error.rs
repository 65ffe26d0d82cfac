use depthwarp_tensor::TensorError;
use thiserror::Error;

/// An error type for the sampling operations.
#[derive(Error, Debug, PartialEq)]
pub enum ImgprocError {
    /// The sampling grid does not have the `[B, H, W, 2]` layout.
    #[error("Invalid sampling grid shape {0:?}, expected [B, H, W, 2]")]
    InvalidGridShape([usize; 4]),

    /// The input and the grid disagree on the batch size.
    #[error("Batch size mismatch: input has {0} items but the grid has {1}")]
    BatchMismatch(usize, usize),

    /// The input has an empty spatial dimension.
    #[error("Input spatial size {0}x{1} must be non-empty")]
    EmptyInput(usize, usize),

    /// The padding mode string is not recognised.
    #[error("Unknown padding mode '{0}', expected one of 'zeros', 'border'")]
    UnknownPaddingMode(String),

    /// Tensor error
    #[error("Error with the tensor: {0}")]
    TensorError(#[from] TensorError),
}
