// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The cache pair: two tile grids, one serving the viewport at its
//! native resolution ("current") and one already rendering the
//! interval the viewport will show one resolution step deeper
//! ("next").  Zooming in far enough turns next into current for the
//! price of a pointer swap.
//!
//! The pair is owned by whatever drives the interaction, and shared
//! with the worker pool through a `SharedCache`.  Workers only ever
//! take the read side of its lock, and only for as long as it takes
//! to reserve a tile.

use std::mem;
use std::sync::Arc;

use crossbeam::sync::{ShardedLock, ShardedLockReadGuard, ShardedLockWriteGuard};
use num::Complex;

use color::ColorProjection;
use config::CacheConfig;
use error::CacheError;
use grid::TileGrid;
use planes::Interval;
use status::{GridStatus, Status};
use tile::Tile;

/// What a call to `zoom()` did to the grids.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZoomOutcome {
    /// Only the requested interval changed.
    Scaled,
    /// Next became current, and a new next was built.
    Swapped,
    /// The precomputed margin ran out and both grids were rebuilt.
    Rebuilt,
    /// Next would have taken over, but the interval outgrew it too, so
    /// both grids were rebuilt.
    SwappedAndRebuilt,
}

/// The current and next grids, and the configuration they are built
/// from.
#[derive(Debug)]
pub struct CachePair {
    config: CacheConfig,
    current: TileGrid,
    next: TileGrid,
    drag: Option<(Complex<f64>, Interval)>,
}

impl CachePair {
    /// Builds both grids around `interval`.
    pub fn new(config: CacheConfig, interval: Interval) -> Result<CachePair, CacheError> {
        config.validate()?;
        let (current, next) = build_pair(&config, interval)?;
        Ok(CachePair {
            config,
            current,
            next,
            drag: None,
        })
    }

    /// The configuration the grids are built from.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The grid serving the viewport.
    pub fn current(&self) -> &TileGrid {
        &self.current
    }

    /// The grid one resolution step deeper.
    pub fn next(&self) -> &TileGrid {
        &self.next
    }

    /// Rebuilds both grids around the interval current is showing.
    pub fn refresh(&mut self) -> Result<(), CacheError> {
        let interval = self.current.interval();
        self.rebuild(interval)
    }

    /// Throws away every tile and builds both grids around `interval`.
    /// On error the old grids stay in place.
    pub fn rebuild(&mut self, interval: Interval) -> Result<(), CacheError> {
        let config = self.config;
        self.reconfigure(config, interval)
    }

    // Builds a complete pair from `config`, and only then replaces the
    // old configuration and grids with it.
    fn reconfigure(&mut self, config: CacheConfig, interval: Interval) -> Result<(), CacheError> {
        let (current, next) = build_pair(&config, interval)?;
        self.config = config;
        self.current = current;
        self.next = next;
        info!(current = self.current.id(), next = self.next.id(), interval = %interval, "rebuilt cache pair");
        Ok(())
    }

    /// Changes the iteration budget; every tile is rendered anew.
    pub fn set_iterations(&mut self, iterations: u32) -> Result<(), CacheError> {
        if iterations == 0 {
            return Err(CacheError::NoIterations);
        }
        let config = CacheConfig {
            iterations,
            ..self.config
        };
        let interval = self.current.interval();
        self.reconfigure(config, interval)
    }

    /// Changes the color projection; every tile is rendered anew.
    pub fn set_color(&mut self, color: ColorProjection) -> Result<(), CacheError> {
        let config = CacheConfig {
            color,
            ..self.config
        };
        let interval = self.current.interval();
        self.reconfigure(config, interval)
    }

    /// Adapts to a new viewport size.  The requested interval keeps its
    /// center and its height, and takes its width from the new aspect
    /// ratio.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CacheError> {
        if width == 0 || height == 0 {
            return Err(CacheError::EmptyViewport { width, height });
        }
        let old = self.current.interval();
        let interval = Interval::centered(
            old.center(),
            old.height() * f64::from(width) / f64::from(height),
            old.height(),
        );
        let config = CacheConfig {
            width,
            height,
            ..self.config
        };
        self.reconfigure(config, interval)
    }

    /// Remembers where a drag begins, in plane coordinates.
    pub fn drag_start(&mut self, point: Complex<f64>) {
        self.drag = Some((point, self.current.interval()));
    }

    /// Moves current's requested interval by the distance from the drag
    /// start to `point`, or by its negation if `reverse` is set, and lets
    /// the grid follow.  May be called any number of times per drag.
    /// Without a preceding `drag_start()` this does nothing.
    pub fn drag(&mut self, point: Complex<f64>, reverse: bool) -> Result<(), CacheError> {
        let (start, start_interval) = match self.drag {
            Some(drag) => drag,
            None => return Ok(()),
        };
        let movement = point - start;
        let interval = if reverse {
            start_interval - movement
        } else {
            start_interval + movement
        };
        self.current.follow(interval)
    }

    /// Scales current's requested interval by `factor` about `origin`.
    /// A factor below 1 zooms in.
    ///
    /// Once the interval is smaller than current's native size on either
    /// axis, next takes over.  Afterwards, if the interval is larger than
    /// 90% of the covered area on either axis, both grids are rebuilt.
    /// On error the pair is left as it was.
    pub fn zoom(&mut self, origin: Complex<f64>, factor: f64) -> Result<ZoomOutcome, CacheError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(CacheError::BadScale(factor));
        }
        let interval = self.current.interval().scale_about(origin, factor);
        if !interval.has_area() {
            return Err(CacheError::DegenerateInterval(interval));
        }

        let native = self.current.native_size();
        let swapped = interval.width() < native.re || interval.height() < native.im;
        // Recentering moves a grid by whole tiles, so the covered size
        // is known before the swap happens.
        let total = if swapped {
            self.next.total_interval()
        } else {
            self.current.total_interval()
        };
        let exhausted = interval.width() > total.width() * 0.9
            || interval.height() > total.height() * 0.9;

        if exhausted {
            debug!(interval = %interval, total = %total, swapped, "precomputed margin exhausted");
            self.rebuild(interval)?;
        } else if swapped {
            let next = build_next(&self.config, interval)?;
            self.next.follow(interval)?;
            mem::swap(&mut self.current, &mut self.next);
            debug!(from = self.next.id(), to = self.current.id(), "swapped next grid into current");
            self.next = next;
        } else {
            self.current.set_interval(interval);
        }

        Ok(match (swapped, exhausted) {
            (false, false) => ZoomOutcome::Scaled,
            (true, false) => ZoomOutcome::Swapped,
            (false, true) => ZoomOutcome::Rebuilt,
            (true, true) => ZoomOutcome::SwappedAndRebuilt,
        })
    }

    /// Reserves the most urgent tile: current's inner tiles, then next's,
    /// then current's low-priority band, then next's.
    pub fn get_work(&self, seed: usize) -> Option<Arc<Tile>> {
        self.current
            .get_work(seed, true)
            .or_else(|| self.next.get_work(seed, true))
            .or_else(|| self.current.get_work(seed, false))
            .or_else(|| self.next.get_work(seed, false))
    }

    /// A snapshot of both grids.
    pub fn status(&self) -> Status {
        Status {
            current: GridStatus::from(&self.current),
            next: GridStatus::from(&self.next),
            threads: self.config.threads,
        }
    }
}

// Next shows the requested interval at 1/scale of its size.
fn build_next(config: &CacheConfig, interval: Interval) -> Result<TileGrid, CacheError> {
    TileGrid::new(
        &config.layout(),
        interval.scale(1.0 / config.scale),
        config.color,
        config.iterations,
    )
}

fn build_pair(config: &CacheConfig, interval: Interval) -> Result<(TileGrid, TileGrid), CacheError> {
    let current = TileGrid::new(&config.layout(), interval, config.color, config.iterations)?;
    let next = build_next(config, interval)?;
    Ok((current, next))
}

/// A cache pair shared between the thread that drives it and the
/// workers that render it.
#[derive(Clone, Debug)]
pub struct SharedCache(Arc<ShardedLock<CachePair>>);

impl SharedCache {
    /// Wraps a cache pair for sharing.
    pub fn new(pair: CachePair) -> SharedCache {
        SharedCache(Arc::new(ShardedLock::new(pair)))
    }

    /// Read access, for drawing, status, and finding work.
    pub fn read(&self) -> Result<ShardedLockReadGuard<CachePair>, CacheError> {
        self.0.read().map_err(|_| CacheError::Poisoned)
    }

    /// Write access, for zooming, dragging, and rebuilding.
    pub fn write(&self) -> Result<ShardedLockWriteGuard<CachePair>, CacheError> {
        self.0.write().map_err(|_| CacheError::Poisoned)
    }

    /// Reserves a tile.  The lock is released before this returns, so
    /// the caller renders without holding it.
    pub fn get_work(&self, seed: usize) -> Result<Option<Arc<Tile>>, CacheError> {
        Ok(self.read()?.get_work(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 400px at scale 2 with 100px frames: 16 tiles a side, two of them
    // low priority, each 0.5 wide.  The total interval is twice the
    // requested one and the native size half of it.
    fn config() -> CacheConfig {
        CacheConfig {
            width: 400,
            height: 400,
            frame: 100,
            low_priority_frame: 100,
            scale: 2.0,
            iterations: 8,
            threads: 2,
            ..CacheConfig::default()
        }
    }

    fn square() -> Interval {
        Interval::new(Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0))
    }

    fn pair() -> CachePair {
        CachePair::new(config(), square()).unwrap()
    }

    #[test]
    fn next_is_one_resolution_step_deeper() {
        let p = pair();
        assert_eq!(
            p.current().total_interval(),
            Interval::new(Complex::new(-4.0, -4.0), Complex::new(4.0, 4.0))
        );
        assert_eq!(p.current().native_size(), Complex::new(2.0, 2.0));
        assert_eq!(
            p.next().interval(),
            Interval::new(Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0))
        );
        assert_eq!(p.next().native_size(), Complex::new(1.0, 1.0));
    }

    #[test]
    fn pair_rejects_bad_configuration() {
        let bad = CacheConfig {
            iterations: 0,
            ..config()
        };
        assert!(CachePair::new(bad, square()).is_err());
        let flat = Interval::new(Complex::new(0.0, 0.0), Complex::new(1.0, 0.0));
        assert!(CachePair::new(config(), flat).is_err());
    }

    #[test]
    fn zero_or_negative_zoom_is_refused() {
        let mut p = pair();
        assert!(p.zoom(Complex::new(0.0, 0.0), 0.0).is_err());
        assert!(p.zoom(Complex::new(0.0, 0.0), -1.0).is_err());
        assert!(p.zoom(Complex::new(0.0, 0.0), ::std::f64::INFINITY).is_err());
        assert_eq!(p.current().interval(), square());
    }

    #[test]
    fn small_zoom_only_scales() {
        let mut p = pair();
        let id = p.current().id();
        let origin = Complex::new(0.0, 0.0);
        assert_eq!(p.zoom(origin, 0.5).unwrap(), ZoomOutcome::Scaled);
        assert_eq!(p.current().id(), id);
        assert_eq!(
            p.current().interval(),
            Interval::new(Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0))
        );
    }

    #[test]
    fn zooming_in_past_native_size_swaps_in_next() {
        let mut p = pair();
        let origin = Complex::new(0.0, 0.0);
        let mut steps = 0;
        loop {
            let next_id = p.next().id();
            steps += 1;
            match p.zoom(origin, 0.9).unwrap() {
                ZoomOutcome::Scaled => continue,
                outcome => {
                    assert_eq!(outcome, ZoomOutcome::Swapped);
                    assert_eq!(p.current().id(), next_id);
                    break;
                }
            }
        }
        // 4 * 0.9^7 is the first width below 2.
        assert_eq!(steps, 7);
        assert!((p.current().interval().width() - 4.0 * 0.9f64.powi(7)).abs() < 1e-12);
        assert_ne!(p.next().id(), p.current().id());
    }

    #[test]
    fn zooming_out_past_the_margin_rebuilds() {
        let mut p = pair();
        let origin = Complex::new(0.0, 0.0);
        let mut steps = 0;
        loop {
            let (current_id, next_id) = (p.current().id(), p.next().id());
            steps += 1;
            match p.zoom(origin, 1.1).unwrap() {
                ZoomOutcome::Scaled => continue,
                outcome => {
                    assert_eq!(outcome, ZoomOutcome::Rebuilt);
                    assert!(p.current().id() != current_id && p.current().id() != next_id);
                    break;
                }
            }
        }
        // 4 * 1.1^7 is the first width above 90% of 8.
        assert_eq!(steps, 7);
        let width = p.current().interval().width();
        assert!(width < p.current().total_interval().width() * 0.9);
    }

    #[test]
    fn extreme_zoom_can_swap_and_rebuild_in_one_call() {
        let mut p = pair();
        let origin = Complex::new(0.0, 0.0);
        assert_eq!(p.zoom(origin, 0.1).unwrap(), ZoomOutcome::Swapped);
        // The new next covers only 0.4 around the origin; growing the
        // interval past that while it is still below current's native
        // size does both.
        assert_eq!(p.zoom(origin, 1.01).unwrap(), ZoomOutcome::SwappedAndRebuilt);
        let i = p.current().interval();
        assert!((i.width() - 0.404).abs() < 1e-12);
        assert!(i.width() < p.current().total_interval().width() * 0.9);
    }

    #[test]
    fn drag_moves_current_and_leaves_next_alone() {
        let mut p = pair();
        let next_id = p.next().id();
        let next_total = p.next().total_interval();
        p.drag_start(Complex::new(0.0, 0.0));
        p.drag(Complex::new(1.5, 0.0), false).unwrap();
        assert_eq!(
            p.current().interval(),
            Interval::new(Complex::new(-0.5, -2.0), Complex::new(3.5, 2.0))
        );
        assert_eq!(
            p.current().total_interval(),
            Interval::new(Complex::new(-2.5, -4.0), Complex::new(5.5, 4.0))
        );
        assert_eq!(p.next().id(), next_id);
        assert_eq!(p.next().total_interval(), next_total);

        // Every move is measured from the start of the drag.
        p.drag(Complex::new(1.5, 0.0), true).unwrap();
        assert_eq!(
            p.current().interval(),
            Interval::new(Complex::new(-3.5, -2.0), Complex::new(0.5, 2.0))
        );
        assert_eq!(
            p.current().total_interval(),
            Interval::new(Complex::new(-5.5, -4.0), Complex::new(2.5, 4.0))
        );
    }

    #[test]
    fn drag_without_start_is_ignored() {
        let mut p = pair();
        p.drag(Complex::new(1.0, 1.0), false).unwrap();
        assert_eq!(p.current().interval(), square());
    }

    #[test]
    fn work_goes_to_current_before_next() {
        let p = pair();
        let inner = 12 * 12;
        for _ in 0..inner {
            let t = p.get_work(0).unwrap();
            assert!(p.current().tiles().iter().any(|c| Arc::ptr_eq(c, &t)));
        }
        for _ in 0..inner {
            let t = p.get_work(1).unwrap();
            assert!(p.next().tiles().iter().any(|n| Arc::ptr_eq(n, &t)));
        }
        let t = p.get_work(2).unwrap();
        assert!(p.current().tiles().iter().any(|c| Arc::ptr_eq(c, &t)));
    }

    #[test]
    fn settings_rebuild_both_grids() {
        let mut p = pair();
        let ids = (p.current().id(), p.next().id());
        p.set_iterations(20).unwrap();
        assert_eq!(p.current().iterations(), 20);
        assert_eq!(p.next().iterations(), 20);
        assert!(p.current().id() != ids.0 && p.next().id() != ids.1);
        p.set_color(ColorProjection::BlackWhite).unwrap();
        assert_eq!(p.next().color(), ColorProjection::BlackWhite);
        assert!(p.set_iterations(0).is_err());
        assert_eq!(p.current().interval(), square());
    }

    #[test]
    fn resize_keeps_center_and_height() {
        let mut p = pair();
        p.resize(800, 400).unwrap();
        assert_eq!(
            p.current().interval(),
            Interval::new(Complex::new(-4.0, -2.0), Complex::new(4.0, 2.0))
        );
        assert_eq!(p.config().width, 800);
        assert_eq!(p.current().tiles_u(), 24);
        assert!(p.resize(0, 400).is_err());
    }

    #[test]
    fn shared_cache_hands_out_work() {
        let shared = SharedCache::new(pair());
        let t = shared.get_work(0).unwrap().unwrap();
        t.render();
        assert!(shared.read().unwrap().status().current.completeness > 0.0);
        shared.write().unwrap().refresh().unwrap();
        assert_eq!(shared.read().unwrap().status().current.completeness, 0.0);
    }

    fn snapshot(p: &CachePair) -> (usize, usize, Interval, Interval, Interval, Interval) {
        (
            p.current().id(),
            p.next().id(),
            p.current().interval(),
            p.next().interval(),
            p.current().total_interval(),
            p.next().total_interval(),
        )
    }

    #[test]
    fn failed_zoom_leaves_the_pair_alone() {
        // A 2x2 grid with no frame keeps every step cheap.
        let small = CacheConfig {
            width: 100,
            height: 100,
            frame: 0,
            low_priority_frame: 0,
            ..config()
        };
        let mut p = CachePair::new(small, square()).unwrap();
        let origin = Complex::new(0.0, 0.0);
        let mut failed = false;
        for _ in 0..1000 {
            let before = snapshot(&p);
            if p.zoom(origin, 1e-3).is_err() {
                assert_eq!(snapshot(&p), before);
                assert!(p.current().interval().has_area());
                failed = true;
                break;
            }
        }
        // Sooner or later the interval underflows to nothing.
        assert!(failed);
    }

    #[test]
    fn failed_drag_leaves_the_grid_alone() {
        let mut p = pair();
        let before = snapshot(&p);
        p.drag_start(Complex::new(0.0, 0.0));
        assert!(p.drag(Complex::new(1e300, 0.0), false).is_err());
        assert_eq!(snapshot(&p), before);
        let g = p.current();
        assert_eq!(g.tile(0, 0).interval().top_left(), g.total_interval().top_left());

        // The drag is still usable afterwards.
        p.drag(Complex::new(1.5, 0.0), false).unwrap();
        assert_eq!(
            p.current().total_interval(),
            Interval::new(Complex::new(-2.5, -4.0), Complex::new(5.5, 4.0))
        );
    }

    #[test]
    fn failed_resize_keeps_the_old_configuration() {
        let mut p = pair();
        let before = snapshot(&p);
        assert!(p.resize(u32::max_value(), 1).is_err());
        assert_eq!(p.config().width, 400);
        assert_eq!(p.config().height, 400);
        assert_eq!(snapshot(&p), before);
    }
}
