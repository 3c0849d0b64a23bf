// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0

//! Converts outline fonts into bit-packed bitmap font tables for embedded
//! displays, in the Adafruit-GFX `GFXfont` layout.

pub mod emit;
pub mod error;
pub mod glyph_bitmap;
pub mod glyph_table;
pub mod naming;
pub mod range;
pub mod raster;

pub use error::{FontError, FontResult, GlyphError};
pub use glyph_bitmap::RenderMode;
pub use glyph_table::{FontTable, TableOptions};
pub use range::{CodepointRange, RangeSet};
pub use raster::{FontdueRasterizer, GlyphRasterizer};
