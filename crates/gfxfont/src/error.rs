// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontError {
    /// The font engine rejected the font data.
    Load(String),
    /// The font engine failed to render a glyph.
    Render { glyph: u16, reason: String },
    /// The glyph's bitmap would be too large for the glyph table, so it
    /// wasn't rendered.
    Oversized {
        glyph: u16,
        width: usize,
        height: usize,
    },
    InvalidNumber(String),
    CodepointOutOfRange(u64),
    /// An odd number (greater than one) of range bounds was given.
    RangeEndMissing(usize),
    RangeOverlap {
        first: (u32, u32),
        second: (u32, u32),
    },
    NoRanges,
    /// The bitmap blob outgrew the 16-bit offsets of the glyph table.
    BitmapOverflow { codepoint: u32, offset: usize },
    GlyphMetric {
        codepoint: u32,
        field: &'static str,
        value: i64,
    },
    DescriptorCodepoint(i64),
    LineHeight(i64),
}

/// A problem with a single glyph that doesn't stop the conversion.
///
/// The glyph's slot in the table is filled with a zero record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphError {
    Missing { codepoint: u32 },
    Render { codepoint: u32, error: FontError },
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Load(reason) => write!(f, "failed to load font: {}", reason),
            FontError::Render { glyph, reason } => {
                write!(f, "failed to render glyph {}: {}", glyph, reason)
            }
            FontError::Oversized {
                glyph,
                width,
                height,
            } => write!(
                f,
                "glyph {} would be {}x{} pixels, beyond the 255 pixel limit",
                glyph, width, height
            ),
            FontError::InvalidNumber(text) => write!(f, "invalid number: {:?}", text),
            FontError::CodepointOutOfRange(codepoint) => {
                write!(f, "code point 0x{:x} is beyond 0x10ffff", codepoint)
            }
            FontError::RangeEndMissing(count) => write!(
                f,
                "range end not specified: {} free arguments supplied",
                count
            ),
            FontError::RangeOverlap { first, second } => write!(
                f,
                "range 0x{:x} - 0x{:x} overlaps range 0x{:x} - 0x{:x}",
                first.0, first.1, second.0, second.1
            ),
            FontError::NoRanges => write!(f, "no code point ranges given"),
            FontError::BitmapOverflow { codepoint, offset } => write!(
                f,
                "bitmap offset {} for code point 0x{:x} doesn't fit in 16 bits",
                offset, codepoint
            ),
            FontError::GlyphMetric {
                codepoint,
                field,
                value,
            } => write!(
                f,
                "glyph 0x{:x} has {} {} which doesn't fit the glyph table",
                codepoint, field, value
            ),
            FontError::DescriptorCodepoint(codepoint) => write!(
                f,
                "offset code point {} doesn't fit in an unsigned 16-bit field",
                codepoint
            ),
            FontError::LineHeight(height) => {
                write!(f, "line height {} doesn't fit in 8 bits", height)
            }
        }
    }
}

impl std::error::Error for FontError {}

impl fmt::Display for GlyphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GlyphError::Missing { codepoint } => {
                write!(f, "no glyph for code point 0x{:x}", codepoint)
            }
            GlyphError::Render { codepoint, error } => {
                write!(f, "code point 0x{:x}: {}", codepoint, error)
            }
        }
    }
}

pub type FontResult<T> = Result<T, FontError>;
