// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Read-only snapshots of the cache for status displays.

use std::fmt;

use num::Complex;

use grid::TileGrid;
use planes::Interval;

/// Formats a number as a short mantissa and a decimal exponent, e.g.
/// `2.50000e2`.  Readable at any zoom depth, unlike the default float
/// formatting which degenerates into long runs of zeroes.
pub fn format_sci(value: f64, precision: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{:.*}", precision, value);
    }
    let exponent = value.abs().log10().trunc() as i32;
    let mantissa = value / 10f64.powi(exponent);
    format!("{:.*}e{}", precision, mantissa, exponent)
}

/// What one grid looks like right now.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridStatus {
    /// The interval the viewport wants
    pub interval: Interval,
    /// The smallest interval showable without upscaling
    pub native_size: Complex<f64>,
    /// The region covered by the whole grid
    pub total_interval: Interval,
    /// Fraction of finished tiles
    pub completeness: f64,
    /// Milliseconds spent on the finished tiles
    pub total_time: u64,
}

impl<'a> From<&'a TileGrid> for GridStatus {
    fn from(grid: &'a TileGrid) -> GridStatus {
        GridStatus {
            interval: grid.interval(),
            native_size: grid.native_size(),
            total_interval: grid.total_interval(),
            completeness: grid.completeness(),
            total_time: grid.total_time(),
        }
    }
}

/// Both grids of the cache pair, plus what it takes to turn CPU time
/// into wall time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Status {
    /// The grid serving the viewport
    pub current: GridStatus,
    /// The grid prepared for the next zoom level
    pub next: GridStatus,
    /// Worker thread count
    pub threads: usize,
}

impl fmt::Display for GridStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let i = &self.interval;
        writeln!(f, "real:         [{}, {}]", format_sci(i.left(), 5), format_sci(i.right(), 5))?;
        writeln!(f, "imaginary:    [{}, {}]", format_sci(i.bottom(), 5), format_sci(i.top(), 5))?;
        writeln!(f, "width:        {}", format_sci(i.width(), 5))?;
        writeln!(f, "height:       {}", format_sci(i.height(), 5))?;
        writeln!(
            f,
            "native:       {} x {}",
            format_sci(self.native_size.re, 5),
            format_sci(self.native_size.im, 5)
        )?;
        writeln!(f, "completeness: {:.1}%", self.completeness * 100.0)?;
        write!(f, "cpu time:     {} ms", self.total_time)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let threads = self.threads.max(1) as u64;
        writeln!(f, "CURRENT")?;
        writeln!(f, "{}", self.current)?;
        writeln!(f, "wall time:    ~{} ms", self.current.total_time / threads)?;
        writeln!(f, "NEXT")?;
        writeln!(f, "{}", self.next)?;
        write!(f, "wall time:    ~{} ms", self.next.total_time / threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scientific_format() {
        assert_eq!(format_sci(250.0, 5), "2.50000e2");
        assert_eq!(format_sci(3.0, 5), "3.00000e0");
        assert_eq!(format_sci(0.5, 3), "0.500e0");
        assert_eq!(format_sci(-250.0, 2), "-2.50e2");
        assert_eq!(format_sci(0.0, 2), "0.00");
    }

    #[test]
    fn small_numbers_keep_their_digits() {
        // The exponent truncates toward zero, so the mantissa drops below 1.
        let s = format_sci(1.5e-12, 3);
        assert!(s.starts_with("0.15"), "{}", s);
        assert!(s.ends_with("e-11"), "{}", s);
    }

    #[test]
    fn display_reports_progress() {
        let grid = GridStatus {
            interval: Interval::new(Complex::new(-2.0, -1.0), Complex::new(2.0, 1.0)),
            native_size: Complex::new(4.0, 2.0),
            total_interval: Interval::new(Complex::new(-3.0, -2.0), Complex::new(3.0, 2.0)),
            completeness: 0.5,
            total_time: 400,
        };
        let status = Status {
            current: grid,
            next: grid,
            threads: 4,
        };
        let text = status.to_string();
        assert!(text.contains("completeness: 50.0%"));
        assert!(text.contains("width:        4.00000e0"));
        assert!(text.contains("wall time:    ~100 ms"));
    }
}
