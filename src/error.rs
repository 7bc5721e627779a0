// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The few things that can go wrong in the cache are all configuration
//! mistakes, and they are reported the moment a grid is built rather
//! than surfacing later as tiles full of NaN.

use std::io;

use planes::Interval;

/// Everything the cache refuses to do.
#[derive(Debug, Fail)]
pub enum CacheError {
    /// A viewport or tile with no pixels in it.
    #[fail(display = "viewport must have positive dimensions, got {}x{}", width, height)]
    EmptyViewport {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// The viewport and its frames do not add up to a single whole tile
    /// on one of the axes.
    #[fail(display = "viewport and frame do not cover a single tile ({}x{} tiles)", tiles_u, tiles_v)]
    NoTiles {
        /// Tiles along the real axis
        tiles_u: usize,
        /// Tiles along the imaginary axis
        tiles_v: usize,
    },

    /// The viewport, frames and scale add up to more pixels than a grid
    /// can address.
    #[fail(display = "viewport and frames are too large for a tile grid")]
    LayoutTooLarge,

    /// Zero iterations would render every tile black.
    #[fail(display = "iteration budget must be positive")]
    NoIterations,

    /// Resolution scales and zoom factors must be positive and finite.
    #[fail(display = "scale factor must be positive and finite, got {}", _0)]
    BadScale(f64),

    /// An interval with no width or height cannot be projected onto pixels.
    #[fail(display = "interval {} has no area", _0)]
    DegenerateInterval(Interval),

    /// A worker panicked while holding the cache.
    #[fail(display = "the shared cache was poisoned by a panicking thread")]
    Poisoned,

    /// The operating system refused us a worker thread.
    #[fail(display = "could not spawn worker thread: {}", _0)]
    Spawn(#[cause] io::Error),
}
