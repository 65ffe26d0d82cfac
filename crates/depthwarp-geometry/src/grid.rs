use std::sync::{Mutex, MutexGuard, PoisonError};

use depthwarp_tensor::Tensor4;

/// Create the homogeneous pixel grid of shape `[1, 3, H, W]`.
///
/// Channel 0 holds the column index, channel 1 the row index and channel 2 is
/// all ones.
///
/// # Example
///
/// ```
/// use depthwarp_geometry::grid::pixel_grid;
///
/// let grid = pixel_grid(2, 3);
/// assert_eq!(grid.shape, [1, 3, 2, 3]);
/// assert_eq!(grid.get([0, 0, 1, 2]), Some(&2.0));
/// assert_eq!(grid.get([0, 1, 1, 2]), Some(&1.0));
/// assert_eq!(grid.get([0, 2, 1, 2]), Some(&1.0));
/// ```
pub fn pixel_grid(height: usize, width: usize) -> Tensor4<f32> {
    Tensor4::from_shape_fn([1, 3, height, width], |[_, c, row, col]| match c {
        0 => col as f32,
        1 => row as f32,
        _ => 1.0,
    })
}

/// A lazily built, monotonically growing cache of the pixel grid.
///
/// The first request builds a grid of the requested size; later requests are
/// served by slicing the cached grid, which is rebuilt only when a larger
/// height or width is requested. The cache is guarded by a mutex so that the
/// size check and the replacement happen atomically for concurrent callers.
///
/// The cache is purely an optimization: [`PixelGridCache::get_grid`] always
/// returns the same values as [`pixel_grid`].
#[derive(Debug, Default)]
pub struct PixelGridCache {
    grid: Mutex<Option<Tensor4<f32>>>,
}

impl PixelGridCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Tensor4<f32>>> {
        // the cached grid is rebuilt wholesale, so a poisoned lock still holds a valid grid
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the `[1, 3, height, width]` pixel grid, growing the cache if needed.
    pub fn get_grid(&self, height: usize, width: usize) -> Tensor4<f32> {
        let mut cached = self.lock();
        Self::grow_locked(&mut cached, height, width);

        let Some(grid) = cached.as_ref() else {
            return pixel_grid(height, width);
        };
        let [_, _, cached_h, cached_w] = grid.shape;
        if cached_h == height && cached_w == width {
            return grid.clone();
        }

        let src = grid.as_slice();
        let mut data = Vec::with_capacity(3 * height * width);
        for c in 0..3 {
            for row in 0..height {
                let start = (c * cached_h + row) * cached_w;
                data.extend_from_slice(&src[start..start + width]);
            }
        }
        Tensor4::from_shape_vec([1, 3, height, width], data)
            .unwrap_or_else(|_| pixel_grid(height, width))
    }

    /// Ensures the cached grid covers at least `height x width`.
    pub fn grow(&self, height: usize, width: usize) {
        let mut cached = self.lock();
        Self::grow_locked(&mut cached, height, width);
    }

    /// Drops the cached grid; the next request rebuilds it.
    pub fn invalidate(&self) {
        let mut cached = self.lock();
        if cached.take().is_some() {
            log::debug!("pixel grid cache invalidated");
        }
    }

    /// Returns the `(height, width)` of the cached grid, if any.
    pub fn cached_size(&self) -> Option<(usize, usize)> {
        self.lock().as_ref().map(|g| (g.shape[2], g.shape[3]))
    }

    fn grow_locked(cached: &mut Option<Tensor4<f32>>, height: usize, width: usize) {
        let (new_h, new_w) = match cached.as_ref() {
            None => (height, width),
            Some(g) if g.shape[2] < height || g.shape[3] < width => {
                (g.shape[2].max(height), g.shape[3].max(width))
            }
            Some(_) => return,
        };
        log::debug!("building pixel grid cache of size {new_h}x{new_w}");
        *cached = Some(pixel_grid(new_h, new_w));
    }
}
