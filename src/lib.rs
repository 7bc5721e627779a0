#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Speculative tiled Mandelbrot cache
//!
//! Rendering the Mandelbrot set takes long enough that an explorer who
//! waits for each frame to be computed from scratch will spend most of
//! their time looking at a progress bar.  This crate keeps a cache of
//! rendered tiles that is larger than what is being looked at, and
//! rendered at a higher resolution, so that panning and small zooms
//! only reveal pixels that already exist.
//!
//! The cache is a pair of tile grids.  The "current" grid covers the
//! viewport plus a frame of extra tiles on every side; the "next" grid
//! covers the interval the viewport will show after zooming in one
//! resolution step.  When the viewport crosses that step, next becomes
//! current and a new next is started.
//!
//! Tiles are rendered by a pool of worker threads.  A tile is claimed
//! with a single atomic compare-and-swap, so any number of workers can
//! scan the grids at once and every tile is still rendered exactly
//! once.  The scan starts in the middle of the visible area and works
//! its way outward, so what the user is looking at finishes first.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;
#[macro_use]
extern crate tracing;

#[cfg(test)]
extern crate rand;

pub mod cache;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod escape;
pub mod grid;
pub mod planes;
pub mod status;
pub mod tile;
pub mod worker;

pub use cache::{CachePair, SharedCache, ZoomOutcome};
pub use canvas::Canvas;
pub use color::{ColorProjection, Rgb};
pub use config::CacheConfig;
pub use error::CacheError;
pub use escape::{escape_time, Orbit};
pub use grid::{GridLayout, TileGrid};
pub use planes::{Interval, Pixel, ScreenProjection};
pub use status::{format_sci, GridStatus, Status};
pub use tile::Tile;
pub use worker::WorkerPool;
