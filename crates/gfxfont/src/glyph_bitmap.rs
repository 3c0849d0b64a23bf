// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0

use rand::Rng;

use crate::raster::RasterGlyph;

/// How coverage values become on/off pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Pixels at least half covered are set.
    #[default]
    Mono,
    /// Grayscale with random dithering. Empty pixels always stay unset.
    Dither,
    /// Grayscale with Floyd-Steinberg error diffusion.
    Diffuse,
}

/// Accumulates bits MSB first into bytes.
#[derive(Default)]
pub struct BitPacker {
    bytes: Vec<u8>,
    current: u8,
    filled: u8,
}

impl BitPacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A packer with room for `len` bytes.
    pub fn with_capacity(len: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(len),
            ..Self::default()
        }
    }

    pub fn push(&mut self, bit: bool) {
        if bit {
            self.current |= 0x80 >> self.filled;
        }

        self.filled += 1;
        if self.filled == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    /// Pads the last byte with zero bits and returns the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.current);
        }

        self.bytes
    }
}

/// Number of bytes a packed `width` by `height` bitmap occupies.
pub fn packed_len(width: u32, height: u32) -> usize {
    (width as usize * height as usize + 7) / 8
}

/// Packs a glyph's pixels into a dense bitstream.
///
/// Rows are not padded; only the end of the glyph is padded to a byte.
pub fn pack_glyph(glyph: &RasterGlyph, mode: RenderMode, rng: &mut impl Rng) -> Vec<u8> {
    let mut packer = BitPacker::with_capacity(packed_len(glyph.width(), glyph.height()));
    match mode {
        RenderMode::Mono => {
            for y in 0..glyph.height() {
                for x in 0..glyph.width() {
                    packer.push(glyph.coverage_at(x, y) >= 0x80);
                }
            }
        }
        RenderMode::Dither => {
            for y in 0..glyph.height() {
                for x in 0..glyph.width() {
                    let coverage = glyph.coverage_at(x, y);
                    // no snowflakes
                    let bit = coverage != 0 && rng.gen_range(0..256u32) <= coverage as u32;
                    packer.push(bit);
                }
            }
        }
        RenderMode::Diffuse => {
            for bit in diffuse(glyph) {
                packer.push(bit);
            }
        }
    }

    packer.finish()
}

fn diffuse(glyph: &RasterGlyph) -> Vec<bool> {
    let width = glyph.width() as usize;
    let height = glyph.height() as usize;
    let mut levels: Vec<i32> = glyph.coverage.iter().map(|c| *c as i32).collect();
    let mut bits = Vec::with_capacity(levels.len());

    for y in 0..height {
        for x in 0..width {
            let old = levels[y * width + x];
            let new = if old >= 0x80 { 0xFF } else { 0 };
            let error = old - new;
            bits.push(new != 0);

            let mut spread = |dx: isize, dy: usize, weight: i32| {
                let nx = x as isize + dx;
                let ny = y + dy;
                if nx >= 0 && (nx as usize) < width && ny < height {
                    levels[ny * width + nx as usize] += error * weight / 16;
                }
            };

            spread(1, 0, 7);
            spread(-1, 1, 3);
            spread(0, 1, 5);
            spread(1, 1, 1);
        }
    }

    bits
}
