// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A Tile is a fixed-size image of a fixed interval of the complex
//! plane, rendered with a fixed color projection and iteration budget.
//! It is the unit of work of the cache.
//!
//! A Tile is meant to be rendered exactly once.  Any number of threads
//! may race to `try_reserve()` it; exactly one of them wins and thereby
//! becomes the only thread that will ever write to its pixels.  The
//! pixels themselves are atomics, so the drawing side can read a tile
//! that is still being rendered and simply see whatever has been
//! written so far (black, for the rest).

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use canvas::Canvas;
use color::{ColorProjection, Rgb};
use error::CacheError;
use escape::escape_time;
use planes::{Interval, Pixel, ScreenProjection};

/// Width of every tile, in pixels.
pub const TILE_WIDTH: u32 = 100;
/// Height of every tile, in pixels.
pub const TILE_HEIGHT: u32 = 100;

/// One independently renderable piece of the cache.
#[derive(Debug)]
pub struct Tile {
    projection: ScreenProjection,
    width: u32,
    height: u32,
    color: ColorProjection,
    iterations: u32,
    pixels: Box<[AtomicU32]>,
    // Milliseconds spent rendering; 0 until the render is finished.
    millis: AtomicU64,
    reserved: AtomicBool,
}

impl Tile {
    /// An unreserved, unrendered tile covering `interval`.
    pub fn new(
        width: u32,
        height: u32,
        interval: Interval,
        color: ColorProjection,
        iterations: u32,
    ) -> Result<Tile, CacheError> {
        if iterations == 0 {
            return Err(CacheError::NoIterations);
        }
        let projection = ScreenProjection::new(interval, width, height)?;
        let pixels = (0..width as usize * height as usize)
            .map(|_| AtomicU32::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Tile {
            projection,
            width,
            height,
            color,
            iterations,
            pixels,
            millis: AtomicU64::new(0),
            reserved: AtomicBool::new(false),
        })
    }

    /// The region of the plane this tile shows.
    pub fn interval(&self) -> Interval {
        self.projection.interval()
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The iteration budget this tile renders with.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Claims the exclusive right to render this tile.  True exactly
    /// once per tile; every later or losing call gets false.
    pub fn try_reserve(&self) -> bool {
        self.reserved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether someone has already claimed this tile.
    pub fn is_reserved(&self) -> bool {
        self.reserved.load(Ordering::Acquire)
    }

    /// Computes every pixel and records how long it took.  Only the
    /// thread that won `try_reserve()` may call this, and only once.
    pub fn render(&self) {
        debug_assert!(self.is_reserved(), "rendering a tile nobody reserved");
        let start = Instant::now();

        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.projection.from_screen(Pixel(i64::from(x), i64::from(y)));
                let count = escape_time(c, self.iterations);
                let rgb = self.color.project(count, self.iterations);
                self.pixels[self.index(x, y)].store(rgb.pack(), Ordering::Relaxed);
            }
        }

        let elapsed = start.elapsed();
        let millis = elapsed.as_secs() * 1000 + u64::from(elapsed.subsec_millis());
        // 0 means "not rendered", so even a very fast render counts as 1ms.
        self.millis.store(millis.max(1), Ordering::Release);
        trace!(interval = %self.interval(), millis = millis, "rendered tile");
    }

    /// True once `render()` has finished.
    pub fn is_done(&self) -> bool {
        self.millis() != 0
    }

    /// Milliseconds the render took, or 0 if it has not finished.
    pub fn millis(&self) -> u64 {
        self.millis.load(Ordering::Acquire)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// The current color of one pixel.  Unwritten pixels are black.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        Rgb::unpack(self.pixels[self.index(x, y)].load(Ordering::Relaxed))
    }

    /// Scales the tile's current pixels into the `dest_width` x
    /// `dest_height` rectangle at (`dest_x`, `dest_y`) of the canvas,
    /// touching only pixels inside the `clip` rectangle (x, y, width,
    /// height).
    pub fn blit(
        &self,
        canvas: &mut Canvas,
        dest_x: i64,
        dest_y: i64,
        dest_width: i64,
        dest_height: i64,
        clip: (i64, i64, i64, i64),
    ) {
        if dest_width <= 0 || dest_height <= 0 {
            return;
        }
        let (cx, cy, cw, ch) = clip;
        let x0 = dest_x.max(cx);
        let y0 = dest_y.max(cy);
        let x1 = (dest_x + dest_width).min(cx + cw);
        let y1 = (dest_y + dest_height).min(cy + ch);

        for ty in y0..y1 {
            let sy = (ty - dest_y) * i64::from(self.height) / dest_height;
            for tx in x0..x1 {
                let sx = (tx - dest_x) * i64::from(self.width) / dest_width;
                canvas.put(tx, ty, self.pixel(sx as u32, sy as u32));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam;
    use num::Complex;
    use std::sync::atomic::AtomicUsize;

    fn tile(width: u32, height: u32) -> Tile {
        Tile::new(
            width,
            height,
            Interval::new(Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0)),
            ColorProjection::BlackWhite,
            50,
        )
        .unwrap()
    }

    #[test]
    fn reserve_succeeds_exactly_once() {
        let t = tile(4, 4);
        assert!(!t.is_reserved());
        assert!(t.try_reserve());
        assert!(!t.try_reserve());
        assert!(!t.try_reserve());
        assert!(t.is_reserved());
    }

    #[test]
    fn concurrent_reservations_have_one_winner() {
        for _ in 0..20 {
            let t = tile(2, 2);
            let winners = AtomicUsize::new(0);
            crossbeam::scope(|s| {
                for _ in 0..8 {
                    s.spawn(|_| {
                        if t.try_reserve() {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                }
            })
            .unwrap();
            assert_eq!(winners.load(Ordering::SeqCst), 1);
            assert!(!t.try_reserve());
        }
    }

    #[test]
    fn refuses_an_empty_budget_or_shape() {
        let i = Interval::new(Complex::new(0.0, 0.0), Complex::new(1.0, 1.0));
        assert!(Tile::new(4, 4, i, ColorProjection::SqrtBlue, 0).is_err());
        assert!(Tile::new(0, 4, i, ColorProjection::SqrtBlue, 10).is_err());
    }

    #[test]
    fn fresh_tile_is_black_and_not_done() {
        let t = tile(4, 4);
        assert!(!t.is_done());
        assert_eq!(t.millis(), 0);
        assert_eq!(t.pixel(3, 3), Rgb::BLACK);
    }

    #[test]
    fn render_marks_the_tile_done() {
        let t = tile(8, 8);
        assert!(t.try_reserve());
        t.render();
        assert!(t.is_done());
        assert!(t.millis() >= 1);
    }

    #[test]
    fn corner_pixels_follow_the_inverted_axis() {
        let t = Tile::new(
            4,
            4,
            Interval::new(Complex::new(0.0, -4.0), Complex::new(4.0, 0.0)),
            ColorProjection::BlackWhite,
            1,
        )
        .unwrap();
        assert!(t.try_reserve());
        t.render();
        // Pixel (0,0) is the upper-left plane point 0+0i, which never escapes.
        assert_eq!(t.pixel(0, 0), Rgb::BLACK);
        // Pixel (3,3) sits one step up and left of 4-4i; 3-3i escapes at once.
        assert_eq!(t.pixel(3, 3), Rgb::WHITE);
    }

    #[test]
    fn blit_scales_into_the_destination() {
        let t = tile(2, 2);
        let mut canvas = Canvas::new(4, 4);
        t.pixels[t.index(1, 0)].store(Rgb::WHITE.pack(), Ordering::Relaxed);
        t.blit(&mut canvas, 0, 0, 4, 4, (0, 0, 4, 4));
        assert_eq!(canvas.get(2, 0), Some(Rgb::WHITE));
        assert_eq!(canvas.get(3, 1), Some(Rgb::WHITE));
        assert_eq!(canvas.get(1, 1), Some(Rgb::BLACK));
        assert_eq!(canvas.get(2, 2), Some(Rgb::BLACK));
    }

    #[test]
    fn blit_respects_the_clip_rectangle() {
        let t = tile(2, 2);
        for p in t.pixels.iter() {
            p.store(Rgb::WHITE.pack(), Ordering::Relaxed);
        }
        let mut canvas = Canvas::new(4, 4);
        t.blit(&mut canvas, -2, -2, 8, 8, (1, 1, 2, 2));
        assert_eq!(canvas.get(0, 0), Some(Rgb::BLACK));
        assert_eq!(canvas.get(1, 1), Some(Rgb::WHITE));
        assert_eq!(canvas.get(2, 2), Some(Rgb::WHITE));
        assert_eq!(canvas.get(3, 3), Some(Rgb::BLACK));
    }
}
