// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time test.  Take a point c on the complex plane, start
//! with z = 0 and repeatedly replace z with z² + c.  If |z| ever
//! exceeds 2 the orbit is guaranteed to run off to infinity, and the
//! number of steps it took to get there is the "velocity" we color
//! by.  Points whose orbit stays within the circle for the entire
//! budget are assumed to belong to the set.

use num::Complex;

/// The successive values of z for a starting point c: z₁ = c,
/// z₂ = c² + c, and so on.  Never ends; `take()` what you need.
#[derive(Copy, Clone, Debug)]
pub struct Orbit {
    c: Complex<f64>,
    z: Complex<f64>,
}

impl Orbit {
    /// An orbit that has not taken its first step yet.
    pub fn new(c: Complex<f64>) -> Orbit {
        Orbit {
            c,
            z: Complex::new(0.0, 0.0),
        }
    }
}

impl Iterator for Orbit {
    type Item = Complex<f64>;

    #[inline]
    fn next(&mut self) -> Option<Complex<f64>> {
        self.z = self.z * self.z + self.c;
        Some(self.z)
    }
}

/// Returns the smallest i ≤ `limit` such that |z| > 2 after i steps
/// of the orbit of `c`, or 0 if the orbit stays bounded for the whole
/// budget.
pub fn escape_time(c: Complex<f64>, limit: u32) -> u32 {
    for (i, z) in Orbit::new(c).take(limit as usize).enumerate() {
        if z.norm_sqr() > 4.0 {
            return i as u32 + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        for limit in &[1, 10, 100, 1000] {
            assert_eq!(escape_time(Complex::new(0.0, 0.0), *limit), 0);
        }
    }

    #[test]
    fn minus_one_is_a_bounded_cycle() {
        for limit in 1..1001 {
            assert_eq!(escape_time(Complex::new(-1.0, 0.0), limit), 0);
        }
    }

    #[test]
    fn two_sits_on_the_circle_then_escapes() {
        // z1 = 2 is not strictly outside the circle; z2 = 6 is.
        assert_eq!(escape_time(Complex::new(2.0, 0.0), 1), 0);
        for limit in &[2, 3, 50, 1000] {
            assert_eq!(escape_time(Complex::new(2.0, 0.0), *limit), 2);
        }
    }

    #[test]
    fn far_points_escape_on_the_first_step() {
        assert_eq!(escape_time(Complex::new(3.0, 0.0), 10), 1);
        assert_eq!(escape_time(Complex::new(0.0, -2.5), 10), 1);
    }

    #[test]
    fn zero_budget_reports_no_escape() {
        assert_eq!(escape_time(Complex::new(3.0, 0.0), 0), 0);
    }

    #[test]
    fn orbit_follows_the_recurrence() {
        let steps: Vec<Complex<f64>> = Orbit::new(Complex::new(1.0, 0.0)).take(4).collect();
        assert_eq!(
            steps,
            vec![
                Complex::new(1.0, 0.0),
                Complex::new(2.0, 0.0),
                Complex::new(5.0, 0.0),
                Complex::new(26.0, 0.0)
            ]
        );
    }
}
