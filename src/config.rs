// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The knobs of the cache pair.  Once validated, a configuration
//! produces well-formed grids; everything that could produce an empty
//! grid or a NaN-filled tile is rejected here.

use num::Complex;
use num_cpus;

use color::ColorProjection;
use error::CacheError;
use grid::GridLayout;
use planes::Interval;

/// Everything the cache pair needs to know to build its grids.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CacheConfig {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
    /// High-priority precomputed margin, in pixels
    pub frame: u32,
    /// Low-priority precomputed margin beyond `frame`, in pixels
    pub low_priority_frame: u32,
    /// Resolution scale; also the zoom ratio between the two grids
    pub scale: f64,
    /// Iteration budget of the escape-time test
    pub iterations: u32,
    /// Color projection for every tile
    pub color: ColorProjection,
    /// Per-step zoom: a step scales the interval by 1 ± this
    pub zoom_factor: f64,
    /// Number of worker threads
    pub threads: usize,
}

impl Default for CacheConfig {
    fn default() -> CacheConfig {
        CacheConfig {
            width: 400,
            height: 300,
            frame: 100,
            low_priority_frame: 300,
            scale: 2.0,
            iterations: 100,
            color: ColorProjection::SqrtBlue,
            zoom_factor: 0.03,
            threads: num_cpus::get(),
        }
    }
}

impl CacheConfig {
    /// The interval a fresh session starts with: the whole set, at the
    /// default 4:3 aspect.
    pub fn initial_interval() -> Interval {
        Interval::new(Complex::new(-2.2, -1.501), Complex::new(0.8, 1.499))
    }

    /// The pixel geometry for building a grid.
    pub fn layout(&self) -> GridLayout {
        GridLayout {
            width: self.width,
            height: self.height,
            frame: self.frame,
            low_priority_frame: self.low_priority_frame,
            scale: self.scale,
        }
    }

    /// Fails fast on anything that cannot produce a usable grid.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.width == 0 || self.height == 0 {
            return Err(CacheError::EmptyViewport {
                width: self.width,
                height: self.height,
            });
        }
        if self.iterations == 0 {
            return Err(CacheError::NoIterations);
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(CacheError::BadScale(self.scale));
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 0.0 && self.zoom_factor < 1.0) {
            return Err(CacheError::BadScale(self.zoom_factor));
        }
        Ok(())
    }

    /// The scale factor of one zoom-in step.
    pub fn zoom_in_factor(&self) -> f64 {
        1.0 - self.zoom_factor
    }

    /// The scale factor of one zoom-out step.
    pub fn zoom_out_factor(&self) -> f64 {
        1.0 + self.zoom_factor
    }
}
