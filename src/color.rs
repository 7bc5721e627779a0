// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Color projections turn an escape count between 0 and the iteration
//! budget into a color.  There is a small, fixed menu of them, each a
//! pure function of (count, budget).  A count of 0 means "never
//! escaped" and is always black; the strategies never see it.

use std::fmt;

/// An opaque 8-bit RGB color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// The color of the set itself.
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    /// Full intensity on every channel.
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    /// Used for the native-size outline in debug drawings.
    pub const GRAY: Rgb = Rgb(128, 128, 128);

    /// Packs the channels as 0x00RRGGBB, so that an unwritten (zeroed)
    /// buffer reads back as black.
    pub fn pack(self) -> u32 {
        (u32::from(self.0) << 16) | (u32::from(self.1) << 8) | u32::from(self.2)
    }

    /// Inverse of `pack`.
    pub fn unpack(packed: u32) -> Rgb {
        Rgb((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }
}

/// Converts hue (in turns; only the fractional part matters),
/// saturation and brightness, all nominally in 0..1, into RGB.
pub fn hsb_to_rgb(hue: f64, saturation: f64, brightness: f64) -> Rgb {
    let channel = |x: f64| (x * 255.0 + 0.5).max(0.0).min(255.0) as u8;
    if saturation == 0.0 {
        let v = channel(brightness);
        return Rgb(v, v, v);
    }

    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));
    let (r, g, b) = match h as u32 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    };
    Rgb(channel(r), channel(g), channel(b))
}

/// The menu of color projections.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorProjection {
    /// Blue channel proportional to the square root of the count.
    SqrtBlue,
    /// One trip around the hue wheel over the whole budget.
    HsbLinear,
    /// Hue grows with the square of the count.
    HsbQuadratic,
    /// Three trips around the hue wheel.
    HsbLinear3,
    /// Eight trips around the hue wheel.
    HsbLinear8,
    /// One trip around the wheel per twenty iterations.
    HsbDynamic,
    /// Alternates between two hues on odd and even counts.
    HsbAlternating,
    /// Alternates, but drifts slowly so the bands form a gradient.
    HsbAlternatingGradient,
    /// Hue is the logarithm of the count.
    HsbLogarithmic,
    /// Everything that escapes is white.
    BlackWhite,
}

impl ColorProjection {
    /// Every projection, in menu order.
    pub const ALL: [ColorProjection; 10] = [
        ColorProjection::SqrtBlue,
        ColorProjection::HsbLinear,
        ColorProjection::HsbQuadratic,
        ColorProjection::HsbLinear3,
        ColorProjection::HsbLinear8,
        ColorProjection::HsbDynamic,
        ColorProjection::HsbAlternating,
        ColorProjection::HsbAlternatingGradient,
        ColorProjection::HsbLogarithmic,
        ColorProjection::BlackWhite,
    ];

    /// The projection at a menu position, if there is one.
    pub fn from_index(index: usize) -> Option<ColorProjection> {
        ColorProjection::ALL.get(index).cloned()
    }

    /// Human-readable name for menus and status lines.
    pub fn name(&self) -> &'static str {
        match *self {
            ColorProjection::SqrtBlue => "RGB blue: square root",
            ColorProjection::HsbLinear => "HSB: linear",
            ColorProjection::HsbQuadratic => "HSB: quadratic",
            ColorProjection::HsbLinear3 => "HSB: linear x3",
            ColorProjection::HsbLinear8 => "HSB: linear x8",
            ColorProjection::HsbDynamic => "HSB: linear (dynamic factor)",
            ColorProjection::HsbAlternating => "HSB: two alternating colors",
            ColorProjection::HsbAlternatingGradient => "HSB: alternating gradient",
            ColorProjection::HsbLogarithmic => "HSB: logarithmic",
            ColorProjection::BlackWhite => "black and white",
        }
    }

    /// Maps `count` out of `max` to a color.  A count of 0 is black
    /// regardless of the projection.
    pub fn project(&self, count: u32, max: u32) -> Rgb {
        if count == 0 || max == 0 {
            return Rgb::BLACK;
        }

        let v = f64::from(count) / f64::from(max);
        // max / 2 and max / 20 are integer divisions.
        let half = f64::from(max / 2);
        match *self {
            ColorProjection::SqrtBlue => Rgb(0, 0, (v.sqrt() * 255.0).min(255.0) as u8),
            ColorProjection::HsbLinear => hsb_to_rgb(v, 1.0, 1.0),
            ColorProjection::HsbQuadratic => hsb_to_rgb(v * v, 1.0, 1.0),
            ColorProjection::HsbLinear3 => hsb_to_rgb(3.0 * v, 1.0, 1.0),
            ColorProjection::HsbLinear8 => hsb_to_rgb(8.0 * v, 1.0, 1.0),
            ColorProjection::HsbDynamic => hsb_to_rgb(f64::from(max / 20) * v, 1.0, 1.0),
            ColorProjection::HsbAlternating => hsb_to_rgb(half * v, 1.0, 1.0),
            ColorProjection::HsbAlternatingGradient => {
                hsb_to_rgb((half + 1.1 * f64::from(max) / 100.0) * v, 1.0, 1.0)
            }
            ColorProjection::HsbLogarithmic => hsb_to_rgb(v.ln(), 1.0, 1.0),
            ColorProjection::BlackWhite => hsb_to_rgb(1.0, 0.0, 1.0),
        }
    }
}

impl Default for ColorProjection {
    fn default() -> ColorProjection {
        ColorProjection::SqrtBlue
    }
}

impl fmt::Display for ColorProjection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
