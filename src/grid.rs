// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A TileGrid is a rendering of a fixed pixel size assembled from
//! Tiles, holding more information than the requested interval needs
//! in two ways: the tiles are rendered at a higher resolution than
//! the display, and they extend past the edges of the requested
//! interval by a frame of extra tiles.  The inner part of that frame
//! is rendered before the outer, low-priority part.
//!
//! The grid is arranged in four concerns:
//!
//!  + *rearranging*: shifting the tiles under a fixed requested
//!    interval, and recentering the grid when the interval wanders
//!    toward an edge.  Tiles that stay on the grid keep their pixels.
//!  + *scheduling*: picking and reserving the unreserved tile nearest
//!    the middle of the grid.
//!  + *statistics*: how much of the grid is done, and what it cost.
//!  + *drawing*: blitting tiles onto a Canvas.
//!
//! Work is done by any number of threads calling `get_work()` and
//! rendering what they get back; see the `worker` module.  Only the
//! thread that owns the grid rearranges it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use itertools::iproduct;
use num::Complex;

use canvas::Canvas;
use color::{ColorProjection, Rgb};
use error::CacheError;
use planes::{Interval, Pixel, ScreenProjection};
use tile::{Tile, TILE_HEIGHT, TILE_WIDTH};

static NEXT_GRID_ID: AtomicUsize = AtomicUsize::new(1);

/// The pixel geometry a grid is built with.  All distances are in
/// display pixels, before `scale` is applied.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridLayout {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
    /// High-priority margin precomputed around the viewport
    pub frame: u32,
    /// Additional low-priority margin outside the high-priority one
    pub low_priority_frame: u32,
    /// Render at this many times the display resolution
    pub scale: f64,
}

/// A grid of tiles around a requested interval.
#[derive(Debug)]
pub struct TileGrid {
    id: usize,
    interval: Interval,
    native_size: Complex<f64>,
    tiles_u: usize,
    tiles_v: usize,
    // Column-major: the tile at (u, v) lives at u * tiles_v + v.
    tiles: Vec<Arc<Tile>>,
    low_priority_u: usize,
    low_priority_v: usize,
    total_width: u32,
    total_height: u32,
    total_interval: Interval,
    tile_extent: Complex<f64>,
    iterations: u32,
    color: ColorProjection,
}

impl TileGrid {
    /// Builds every tile, unrendered, for a grid around `interval`.
    ///
    /// The grid is a whole number of tiles covering the scaled viewport
    /// plus both frames on every side.  Its total interval is found by
    /// projecting the grid's pixel extent through the same mapping the
    /// viewport uses, centered on the viewport.
    pub fn new(
        layout: &GridLayout,
        interval: Interval,
        color: ColorProjection,
        iterations: u32,
    ) -> Result<TileGrid, CacheError> {
        if layout.width == 0 || layout.height == 0 {
            return Err(CacheError::EmptyViewport {
                width: layout.width,
                height: layout.height,
            });
        }
        if iterations == 0 {
            return Err(CacheError::NoIterations);
        }
        if !(layout.scale.is_finite() && layout.scale > 0.0) {
            return Err(CacheError::BadScale(layout.scale));
        }
        if !interval.has_area() {
            return Err(CacheError::DegenerateInterval(interval));
        }

        let frame = layout
            .frame
            .checked_add(layout.low_priority_frame)
            .ok_or(CacheError::LayoutTooLarge)?;
        let scaled_width = (f64::from(layout.width) * layout.scale) as u32;
        let scaled_height = (f64::from(layout.height) * layout.scale) as u32;
        let scaled_frame = (f64::from(frame) * layout.scale) as u32;
        let scaled_low = (f64::from(layout.low_priority_frame) * layout.scale) as u32;

        // Tiles along one axis, and that many tiles in pixels.
        let span = |scaled: u32, tile: u32| -> Result<(usize, u32), CacheError> {
            let tiles = (scaled_frame / tile)
                .checked_mul(2)
                .and_then(|frames| frames.checked_add(scaled / tile))
                .ok_or(CacheError::LayoutTooLarge)?;
            let pixels = tiles.checked_mul(tile).ok_or(CacheError::LayoutTooLarge)?;
            Ok((tiles as usize, pixels))
        };
        let (tiles_u, total_width) = span(scaled_width, TILE_WIDTH)?;
        let (tiles_v, total_height) = span(scaled_height, TILE_HEIGHT)?;
        if tiles_u == 0 || tiles_v == 0 {
            return Err(CacheError::NoTiles { tiles_u, tiles_v });
        }
        let low_priority_u = ((scaled_low / TILE_WIDTH) as usize).min(tiles_u / 2);
        let low_priority_v = ((scaled_low / TILE_HEIGHT) as usize).min(tiles_v / 2);

        let projection = ScreenProjection::new(interval, scaled_width.max(1), scaled_height.max(1))?;
        let (cx, cy) = (i64::from(scaled_width / 2), i64::from(scaled_height / 2));
        let (hw, hh) = (i64::from(total_width / 2), i64::from(total_height / 2));
        let total_interval = Interval::new(
            projection.from_screen(Pixel(cx - hw, cy + hh)),
            projection.from_screen(Pixel(cx + hw, cy - hh)),
        );

        let mut grid = TileGrid {
            id: NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed),
            interval,
            native_size: interval.size() / layout.scale,
            tiles_u,
            tiles_v,
            tiles: Vec::with_capacity(tiles_u * tiles_v),
            low_priority_u,
            low_priority_v,
            total_width,
            total_height,
            total_interval,
            tile_extent: Complex::new(
                total_interval.width() / tiles_u as f64,
                total_interval.height() / tiles_v as f64,
            ),
            iterations,
            color,
        };

        let total_projection = grid.total_projection()?;
        for (u, v) in iproduct!(0..tiles_u, 0..tiles_v) {
            let tile = grid.make_tile(&total_projection, u, v)?;
            grid.tiles.push(Arc::new(tile));
        }

        debug!(
            id = grid.id,
            tiles_u,
            tiles_v,
            low_priority_u,
            low_priority_v,
            total = %grid.total_interval,
            "built tile grid"
        );
        Ok(grid)
    }

    fn total_projection(&self) -> Result<ScreenProjection, CacheError> {
        ScreenProjection::new(self.total_interval, self.total_width, self.total_height)
    }

    fn make_tile(&self, total: &ScreenProjection, u: usize, v: usize) -> Result<Tile, CacheError> {
        let (u, v) = (u as i64, v as i64);
        let (tw, th) = (i64::from(TILE_WIDTH), i64::from(TILE_HEIGHT));
        Tile::new(
            TILE_WIDTH,
            TILE_HEIGHT,
            Interval::new(
                total.from_screen(Pixel(u * tw, (v + 1) * th)),
                total.from_screen(Pixel((u + 1) * tw, v * th)),
            ),
            self.color,
            self.iterations,
        )
    }

    #[inline]
    fn index(&self, u: usize, v: usize) -> usize {
        u * self.tiles_v + v
    }

    /// A process-unique number for this grid, so callers can tell
    /// whether two handles name the same grid.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The interval the viewport currently wants to see.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Moves the requested interval.  The tiles do not follow; call
    /// `recenter()` for that.
    pub fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }

    /// The smallest interval this grid can show without upscaling.
    pub fn native_size(&self) -> Complex<f64> {
        self.native_size
    }

    /// The region of the plane the whole grid covers.
    pub fn total_interval(&self) -> Interval {
        self.total_interval
    }

    /// Tiles along the real axis.
    pub fn tiles_u(&self) -> usize {
        self.tiles_u
    }

    /// Tiles along the imaginary axis.
    pub fn tiles_v(&self) -> usize {
        self.tiles_v
    }

    /// Width, in tiles, of the low-priority band on the left and right.
    pub fn low_priority_u(&self) -> usize {
        self.low_priority_u
    }

    /// Height, in tiles, of the low-priority band on the top and bottom.
    pub fn low_priority_v(&self) -> usize {
        self.low_priority_v
    }

    /// The iteration budget every tile of this grid renders with.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// The color projection every tile of this grid renders with.
    pub fn color(&self) -> ColorProjection {
        self.color
    }

    /// The tile in column `u` (left to right) and row `v` (top to bottom).
    pub fn tile(&self, u: usize, v: usize) -> &Arc<Tile> {
        &self.tiles[self.index(u, v)]
    }

    /// Every tile, column by column.
    pub fn tiles(&self) -> &[Arc<Tile>] {
        &self.tiles
    }

    /// Shifts the tile grid by whole tiles without moving the
    /// requested interval.  Positive `du` exposes new tiles on the
    /// right, positive `dv` on the bottom.  Tiles that stay on the
    /// grid keep their pixels; the rest are dropped, and any worker
    /// still rendering one of them finishes into a buffer nobody
    /// will look at.
    ///
    /// On error the grid is left exactly as it was.
    pub fn shift(&mut self, du: i64, dv: i64) -> Result<(), CacheError> {
        if du == 0 && dv == 0 {
            return Ok(());
        }

        let offset = Complex::new(
            du as f64 * self.tile_extent.re,
            -(dv as f64) * self.tile_extent.im,
        );
        let total_interval = self.total_interval + offset;
        let total_projection =
            ScreenProjection::new(total_interval, self.total_width, self.total_height)?;

        let (tiles_u, tiles_v) = (self.tiles_u as i64, self.tiles_v as i64);
        let mut tiles = Vec::with_capacity(self.tiles.len());
        for (u, v) in iproduct!(0..tiles_u, 0..tiles_v) {
            match (u.checked_add(du), v.checked_add(dv)) {
                (Some(from_u), Some(from_v))
                    if from_u >= 0 && from_u < tiles_u && from_v >= 0 && from_v < tiles_v =>
                {
                    let kept = self.index(from_u as usize, from_v as usize);
                    tiles.push(Arc::clone(&self.tiles[kept]));
                }
                _ => {
                    let tile = self.make_tile(&total_projection, u as usize, v as usize)?;
                    tiles.push(Arc::new(tile));
                }
            }
        }
        self.total_interval = total_interval;
        self.tiles = tiles;

        trace!(id = self.id, du, dv, total = %self.total_interval, "shifted tile grid");
        Ok(())
    }

    /// Shifts the grid so that the requested interval sits roughly in
    /// its middle.  Nothing moves until the padding on opposite sides
    /// differs by at least two whole tiles.
    pub fn recenter(&mut self) -> Result<(), CacheError> {
        let interval = self.interval;
        self.follow(interval)
    }

    /// Makes `interval` the requested interval and recenters the grid
    /// under it.  On error neither the interval nor the tiles change.
    pub fn follow(&mut self, interval: Interval) -> Result<(), CacheError> {
        if !interval.has_area() {
            return Err(CacheError::DegenerateInterval(interval));
        }
        let (tile_w, tile_h) = (self.tile_extent.re, self.tile_extent.im);

        let padding_top = (self.total_interval.top() - interval.top()) / tile_h;
        let padding_bottom = (interval.bottom() - self.total_interval.bottom()) / tile_h;
        let dv = if (padding_top.floor() - padding_bottom.floor()).abs() >= 2.0 {
            ((padding_top - padding_bottom) / 2.0).floor() as i64
        } else {
            0
        };

        let padding_left = (interval.left() - self.total_interval.left()) / tile_w;
        let padding_right = (self.total_interval.right() - interval.right()) / tile_w;
        let du = if (padding_left.floor() - padding_right.floor()).abs() >= 2.0 {
            ((padding_left - padding_right) / 2.0).floor() as i64
        } else {
            0
        };

        if du != 0 || dv != 0 {
            debug!(id = self.id, du, dv, "recentering");
        }
        self.shift(du, dv)?;
        self.interval = interval;
        Ok(())
    }

    /// Finds the next tile to render and reserves it.
    ///
    /// Starting from the tile in the middle of the eligible part of the
    /// grid, scans the border of an ever-growing rectangle for a tile
    /// nobody has reserved yet.  `seed` only rotates which edge of the
    /// border is scanned first, so that concurrent workers spread out;
    /// it has no bearing on correctness.  With `skip_low_priority`,
    /// the outer low-priority band is not eligible.
    ///
    /// Returns None once every eligible tile is reserved.
    pub fn get_work(&self, seed: usize, skip_low_priority: bool) -> Option<Arc<Tile>> {
        let (ou, ov) = if skip_low_priority {
            (self.low_priority_u, self.low_priority_v)
        } else {
            (0, 0)
        };
        let tu = self.tiles_u - 2 * ou;
        let tv = self.tiles_v - 2 * ov;
        if tu == 0 || tv == 0 {
            return None;
        }

        let reserve = |u: usize, v: usize| -> Option<Arc<Tile>> {
            let tile = &self.tiles[self.index(ou + u, ov + v)];
            if tile.try_reserve() {
                Some(Arc::clone(tile))
            } else {
                None
            }
        };

        let (mut u, mut v) = (tu / 2, tv / 2);
        let (mut w, mut h) = (1, 1);
        loop {
            for side in 0..4 {
                let found = match (seed % 4 + side) % 4 {
                    // top edge, left to right
                    0 => (0..w).filter_map(|i| reserve(u + i, v)).next(),
                    // right edge, downward
                    1 => (1..h).filter_map(|i| reserve(u + w - 1, v + i)).next(),
                    // bottom edge, right to left
                    2 => (0..w - 1).rev().filter_map(|i| reserve(u + i, v + h - 1)).next(),
                    // left edge, upward
                    _ => (0..h - 1).rev().filter_map(|i| reserve(u, v + i)).next(),
                };
                if found.is_some() {
                    return found;
                }
            }

            if u == 0 && v == 0 && w == tu && h == tv {
                return None;
            }

            u = u.saturating_sub(1);
            v = v.saturating_sub(1);
            w = (w + 2).min(tu);
            h = (h + 2).min(tv);
        }
    }

    /// Renders every tile on the calling thread.  Mostly useful for
    /// tests and one-shot renders; interactive use wants the worker
    /// pool instead.
    pub fn render_all(&self) {
        while let Some(tile) = self.get_work(0, false) {
            tile.render();
        }
    }

    /// Total milliseconds spent on the tiles that are currently on the
    /// grid and finished.  Divide by the worker count for wall time.
    pub fn total_time(&self) -> u64 {
        self.tiles.iter().map(|t| t.millis()).sum()
    }

    /// The fraction, between 0 and 1, of tiles on the grid that are done.
    pub fn completeness(&self) -> f64 {
        let done = self.tiles.iter().filter(|t| t.is_done()).count();
        done as f64 / self.tiles.len() as f64
    }

    fn draw_interval(
        &self,
        canvas: &mut Canvas,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        interval: Interval,
    ) -> Result<ScreenProjection, CacheError> {
        let projection = ScreenProjection::new(interval, width, height)?;
        let (w, h) = (i64::from(width), i64::from(height));

        for tile in &self.tiles {
            let tl = projection.to_screen(tile.interval().top_left());
            let br = projection.to_screen(tile.interval().bottom_right());
            if br.0 < 0 || br.1 < 0 || tl.0 > w || tl.1 > h {
                continue;
            }
            tile.blit(canvas, x + tl.0, y + tl.1, br.0 - tl.0, br.1 - tl.1, (x, y, w, h));
        }
        Ok(projection)
    }

    /// Draws the requested interval into the `width` x `height`
    /// rectangle at (`x`, `y`) of the canvas.  Tiles that are not done
    /// yet contribute whatever they have so far.
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> Result<(), CacheError> {
        self.draw_interval(canvas, x, y, width, height, self.interval)
            .map(|_| ())
    }

    /// Draws everything the grid covers, with the requested interval
    /// outlined in white ("camera") and the native size, centered on
    /// it, outlined in gray.
    pub fn draw_debug(
        &self,
        canvas: &mut Canvas,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> Result<(), CacheError> {
        let total = self.draw_interval(canvas, x, y, width, height, self.total_interval)?;

        let native = Interval::centered(
            self.interval.center(),
            self.native_size.re,
            self.native_size.im,
        );
        for &(rect, color) in &[(native, Rgb::GRAY), (self.interval, Rgb::WHITE)] {
            let tl = total.to_screen(rect.top_left());
            let br = total.to_screen(rect.bottom_right());
            canvas.outline(x + tl.0, y + tl.1, x + br.0, y + br.1, color);
        }
        Ok(())
    }
}
