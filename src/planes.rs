// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Interval struct, an axis-aligned rectangle of the
//! complex plane, and the ScreenProjection, which describes a
//! relationship between such an interval and a rectangle of pixels
//! with an origin at 0,0.
//!
//! The two planes disagree about which way is up: the imaginary part
//! of a point grows toward the top of the plane, while the row of a
//! pixel grows toward the bottom of the screen.  Every mapping in
//! here flips the vertical axis accordingly.

use std::fmt;
use std::ops::{Add, Sub};

use num::Complex;

use error::CacheError;

/// Describes the x, y of a pixel on a screen.  Signed, because a tile
/// projected onto a viewport may very well start to the left of or
/// above it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pixel(pub i64, pub i64);

// We don't need a Point, as a single Complex number is a Point.

/// An immutable, axis-aligned rectangle of the complex plane, stored
/// as its left-lower and right-upper corners.  Every transformation
/// produces a new Interval.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Interval {
    min: Complex<f64>,
    max: Complex<f64>,
}

impl Interval {
    /// The rectangle spanned by two opposite corners, in any order.
    pub fn new(a: Complex<f64>, b: Complex<f64>) -> Interval {
        Interval {
            min: Complex::new(a.re.min(b.re), a.im.min(b.im)),
            max: Complex::new(a.re.max(b.re), a.im.max(b.im)),
        }
    }

    /// The rectangle of the given width and height around a center point.
    pub fn centered(center: Complex<f64>, width: f64, height: f64) -> Interval {
        let half = Complex::new(width / 2.0, height / 2.0);
        Interval::new(center - half, center + half)
    }

    /// Real part of the left edge.
    pub fn left(&self) -> f64 {
        self.min.re
    }

    /// Real part of the right edge.
    pub fn right(&self) -> f64 {
        self.max.re
    }

    /// Imaginary part of the upper edge.
    pub fn top(&self) -> f64 {
        self.max.im
    }

    /// Imaginary part of the lower edge.
    pub fn bottom(&self) -> f64 {
        self.min.im
    }

    /// Upper left corner.
    pub fn top_left(&self) -> Complex<f64> {
        Complex::new(self.min.re, self.max.im)
    }

    /// Upper right corner.
    pub fn top_right(&self) -> Complex<f64> {
        self.max
    }

    /// Lower left corner.
    pub fn bottom_left(&self) -> Complex<f64> {
        self.min
    }

    /// Lower right corner.
    pub fn bottom_right(&self) -> Complex<f64> {
        Complex::new(self.max.re, self.min.im)
    }

    /// Midpoint of the rectangle.
    pub fn center(&self) -> Complex<f64> {
        (self.min + self.max) / 2.0
    }

    /// Extent along the real axis.
    pub fn width(&self) -> f64 {
        self.max.re - self.min.re
    }

    /// Extent along the imaginary axis.
    pub fn height(&self) -> f64 {
        self.max.im - self.min.im
    }

    /// The diagonal from lower left to upper right, i.e. width + height·i.
    pub fn size(&self) -> Complex<f64> {
        self.max - self.min
    }

    /// True if the interval has a positive, finite area.  Anything else
    /// cannot be mapped onto pixels.
    pub fn has_area(&self) -> bool {
        let (w, h) = (self.width(), self.height());
        w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0
    }

    /// Scales the interval about its own center.
    pub fn scale(&self, factor: f64) -> Interval {
        self.scale_about(self.center(), factor)
    }

    /// Scales the interval about an arbitrary origin.  A factor below 1
    /// shrinks the interval toward the origin, which is zooming in.
    pub fn scale_about(&self, origin: Complex<f64>, factor: f64) -> Interval {
        Interval::new(
            origin + (self.min - origin) * factor,
            origin + (self.max - origin) * factor,
        )
    }
}

impl Add<Complex<f64>> for Interval {
    type Output = Interval;

    fn add(self, offset: Complex<f64>) -> Interval {
        Interval::new(self.min + offset, self.max + offset)
    }
}

impl Sub<Complex<f64>> for Interval {
    type Output = Interval;

    fn sub(self, offset: Complex<f64>) -> Interval {
        Interval::new(self.min - offset, self.max - offset)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}, {}] x [{}, {}]",
            self.left(),
            self.right(),
            self.bottom(),
            self.top()
        )
    }
}

/// Maps points between an Interval of the complex plane and a screen
/// of `width` x `height` pixels.  Screen coordinates run from 0 to the
/// width and height inclusive; the corner pixel (width, height) is the
/// lower right corner of the interval.
#[derive(Copy, Clone, Debug)]
pub struct ScreenProjection {
    interval: Interval,
    width: u32,
    height: u32,
}

impl ScreenProjection {
    /// Constructor.  Refuses empty screens and intervals without area,
    /// since either would turn every mapped point into NaN or infinity.
    pub fn new(interval: Interval, width: u32, height: u32) -> Result<ScreenProjection, CacheError> {
        if width == 0 || height == 0 {
            return Err(CacheError::EmptyViewport { width, height });
        }
        if !interval.has_area() {
            return Err(CacheError::DegenerateInterval(interval));
        }
        Ok(ScreenProjection {
            interval,
            width,
            height,
        })
    }

    /// The interval this projection covers.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Given a pixel on the screen, map it to a point on the complex
    /// plane.  Pixel 0,0 is the upper left corner of the interval.
    pub fn from_screen(&self, pixel: Pixel) -> Complex<f64> {
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        Complex::new(
            (pixel.0 as f64 / w) * self.interval.width() + self.interval.left(),
            ((h - pixel.1 as f64) / h) * self.interval.height() + self.interval.bottom(),
        )
    }

    /// Given a point on the complex plane, map that as closely as
    /// possible to a pixel on the screen.  Fractions are truncated
    /// toward zero.
    pub fn to_screen(&self, point: Complex<f64>) -> Pixel {
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        Pixel(
            ((point.re - self.interval.left()) / self.interval.width() * w) as i64,
            (h - (point.im - self.interval.bottom()) / self.interval.height() * h) as i64,
        )
    }
}
