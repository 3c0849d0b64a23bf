// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use fontdue::{Font, FontSettings};
use glam::{IVec2, UVec2};
use tracing::debug;
use ttf_parser::{Face, GlyphId};

use crate::error::{FontError, FontResult};

/// Resolution of the displays the tables are usually made for (Adafruit 2.8" TFT).
pub const DEFAULT_DPI: u32 = 141;

/// Converts a point size to pixels per em at the given resolution.
pub fn pixels_per_em(size_pt: u32, dpi: u32) -> f32 {
    size_pt as f32 * dpi as f32 / 72.0
}

/// An anti-aliased glyph as rendered by the font engine.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterGlyph {
    pub size: UVec2,
    /// Left and top edges of the bitmap relative to the pen origin, +Y up.
    pub bearing: IVec2,
    /// Horizontal advance in pixels.
    pub advance: f32,
    /// Row-major coverage values, `size.x * size.y` of them.
    pub coverage: Vec<u8>,
}

impl RasterGlyph {
    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    pub fn is_empty(&self) -> bool {
        self.size.x == 0 || self.size.y == 0
    }

    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        self.coverage[(y * self.size.x + x) as usize]
    }
}

/// The font engine, as seen by table assembly.
pub trait GlyphRasterizer {
    /// Maps a code point to a glyph index. `None` if the font has no glyph.
    fn glyph_index(&self, codepoint: u32) -> Option<u16>;

    /// The PostScript name of a glyph, if the font has one.
    fn glyph_name(&self, glyph: u16) -> Option<String>;

    fn rasterize(&self, glyph: u16) -> FontResult<RasterGlyph>;

    /// Baseline-to-baseline distance in pixels.
    fn line_height(&self) -> Option<f32>;
}

/// Face statistics, for dumping.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FontInfo {
    pub faces: u32,
    pub glyphs: u16,
    pub charmaps: u16,
}

/// [GlyphRasterizer] backed by fontdue, with ttf-parser for glyph names.
pub struct FontdueRasterizer {
    font: Font,
    px: f32,
    names: Vec<Option<String>>,
    info: FontInfo,
}

impl FontdueRasterizer {
    pub fn open(path: &Path, face_index: u32, px: f32) -> FontResult<Self> {
        debug!("Reading font file {:?}", path);
        let data = std::fs::read(path)
            .map_err(|err| FontError::Load(format!("reading {:?}: {}", path, err)))?;
        Self::from_bytes(&data, face_index, px)
    }

    pub fn from_bytes(data: &[u8], face_index: u32, px: f32) -> FontResult<Self> {
        let face =
            Face::parse(data, face_index).map_err(|err| FontError::Load(err.to_string()))?;

        let names = (0..face.number_of_glyphs())
            .map(|id| face.glyph_name(GlyphId(id)).map(str::to_string))
            .collect();

        let info = FontInfo {
            faces: ttf_parser::fonts_in_collection(data).unwrap_or(1),
            glyphs: face.number_of_glyphs(),
            charmaps: face
                .tables()
                .cmap
                .as_ref()
                .map(|cmap| cmap.subtables.len())
                .unwrap_or(0),
        };

        let settings = FontSettings {
            collection_index: face_index,
            scale: px,
            ..FontSettings::default()
        };

        let font = Font::from_bytes(data, settings).map_err(|err| FontError::Load(err.into()))?;

        debug!(
            "Loaded face {} with {} glyphs at {} px/em",
            face_index, info.glyphs, px
        );

        Ok(Self {
            font,
            px,
            names,
            info,
        })
    }

    pub fn info(&self) -> FontInfo {
        self.info
    }

    /// Every mapped code point with its glyph index, in code point order.
    pub fn codepoints(&self) -> Vec<(u32, u16)> {
        let mut codepoints: Vec<_> = self
            .font
            .chars()
            .iter()
            .map(|(c, glyph)| (*c as u32, glyph.get()))
            .collect();
        codepoints.sort_unstable();
        codepoints
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn glyph_index(&self, codepoint: u32) -> Option<u16> {
        let c = char::from_u32(codepoint)?;
        match self.font.lookup_glyph_index(c) {
            0 => None,
            glyph => Some(glyph),
        }
    }

    fn glyph_name(&self, glyph: u16) -> Option<String> {
        self.names.get(glyph as usize).cloned().flatten()
    }

    fn rasterize(&self, glyph: u16) -> FontResult<RasterGlyph> {
        if glyph >= self.font.glyph_count() {
            return Err(FontError::Render {
                glyph,
                reason: "glyph index out of bounds".into(),
            });
        }

        // checked before rendering, which allocates the whole bitmap
        let metrics = self.font.metrics_indexed(glyph, self.px);
        if metrics.width > u8::MAX as usize || metrics.height > u8::MAX as usize {
            return Err(FontError::Oversized {
                glyph,
                width: metrics.width,
                height: metrics.height,
            });
        }

        let (metrics, coverage) = self.font.rasterize_indexed(glyph, self.px);
        if coverage.len() != metrics.width * metrics.height {
            return Err(FontError::Render {
                glyph,
                reason: format!(
                    "{} coverage values for a {}x{} bitmap",
                    coverage.len(),
                    metrics.width,
                    metrics.height
                ),
            });
        }

        let height = metrics.height as i32;
        Ok(RasterGlyph {
            size: UVec2::new(metrics.width as u32, metrics.height as u32),
            bearing: IVec2::new(metrics.xmin, metrics.ymin + height),
            advance: metrics.advance_width,
            coverage,
        })
    }

    fn line_height(&self) -> Option<f32> {
        self.font
            .horizontal_line_metrics(self.px)
            .map(|metrics| metrics.new_line_size)
    }
}
