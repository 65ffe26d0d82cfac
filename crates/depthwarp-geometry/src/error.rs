use depthwarp_imgproc::ImgprocError;
use depthwarp_tensor::TensorError;
use thiserror::Error;

/// An error type for the geometry and warping operations.
#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    /// A tensor violates the shape contract of an operation.
    #[error("wrong size for {name}, expected {expected}, got {actual:?}")]
    InvalidShape {
        /// Name of the offending tensor
        name: String,
        /// Expected shape pattern, e.g. `Bx3xHxW`
        expected: String,
        /// Actual shape of the tensor
        actual: Vec<usize>,
    },

    /// A matrix that must be inverted has a zero determinant.
    #[error("cannot invert {name} for batch item {batch}: the determinant is zero")]
    SingularMatrix {
        /// Name of the offending tensor
        name: String,
        /// Index of the batch item
        batch: usize,
    },

    /// Fisheye handling was requested on a warper without a lens model.
    #[error("fisheye rectification requested but no lens model is configured")]
    MissingLensModel,

    /// The rotation mode string is not recognised.
    #[error("Unknown rotation mode '{0}', expected one of 'euler', 'quat'")]
    UnknownRotationMode(String),

    /// Error raised by the sampler.
    #[error(transparent)]
    ImgprocError(#[from] ImgprocError),

    /// Tensor error
    #[error("Error with the tensor: {0}")]
    TensorError(#[from] TensorError),
}

impl GeometryError {
    /// Creates an InvalidShape error from a tensor name, pattern and actual shape.
    pub fn invalid_shape(name: &str, expected: impl Into<String>, actual: &[usize]) -> Self {
        Self::InvalidShape {
            name: name.to_string(),
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }
}
