#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use depthwarp_tensor as tensor;

#[doc(inline)]
pub use depthwarp_imgproc as imgproc;

#[doc(inline)]
pub use depthwarp_geometry as geometry;
