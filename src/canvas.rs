// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A plain RGB framebuffer that finished tiles are blitted onto.  The
//! raw bytes are laid out row by row, three per pixel, which is what
//! the PNM encoder wants.

use std::io::{self, Write};

use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;

use color::Rgb;

/// A width x height RGB image, initially black.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    /// A black canvas.
    pub fn new(width: u32, height: u32) -> Canvas {
        Canvas {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 3)
    }

    /// Sets one pixel.  Coordinates outside the canvas are ignored.
    pub fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if let Some(o) = self.offset(x, y) {
            self.data[o] = color.0;
            self.data[o + 1] = color.1;
            self.data[o + 2] = color.2;
        }
    }

    /// Reads one pixel, if it is on the canvas.
    pub fn get(&self, x: i64, y: i64) -> Option<Rgb> {
        self.offset(x, y)
            .map(|o| Rgb(self.data[o], self.data[o + 1], self.data[o + 2]))
    }

    /// Draws the one-pixel outline of the rectangle with corners
    /// (x0, y0) and (x1, y1), inclusive.
    pub fn outline(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb) {
        for x in x0..=x1 {
            self.put(x, y0, color);
            self.put(x, y1, color);
        }
        for y in y0..=y1 {
            self.put(x0, y, color);
            self.put(x1, y, color);
        }
    }

    /// The raw RGB bytes.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Writes the canvas as a binary PPM.
    pub fn write_ppm<W: Write>(&self, output: W) -> Result<(), io::Error> {
        let mut encoder =
            PNMEncoder::new(output).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
        encoder.encode(self.as_raw(), self.width, self.height, ColorType::RGB(8))
    }
}
