// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0

use std::ops::Range;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::error::{FontError, FontResult, GlyphError};
use crate::glyph_bitmap::{pack_glyph, RenderMode};
use crate::range::RangeSet;
use crate::raster::{GlyphRasterizer, RasterGlyph};

/// Flash bytes per glyph record on AVR. The font descriptor takes as many.
pub const RECORD_SIZE: usize = 7;

/// One row of the generated glyph table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphRecord {
    pub bitmap_offset: u16,
    pub width: u8,
    pub height: u8,
    pub x_advance: u8,
    /// From the cursor to the left edge of the bitmap.
    pub x_offset: i8,
    /// From the cursor to the top edge of the bitmap, +Y down.
    pub y_offset: i8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Rendered,
    /// The font has no usable glyph for the code point.
    Missing,
    /// The code point lies between two requested ranges.
    Gap,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphEntry {
    pub codepoint: u32,
    pub name: Option<String>,
    pub kind: EntryKind,
    pub record: GlyphRecord,
}

impl GlyphEntry {
    fn placeholder(codepoint: u32, kind: EntryKind) -> Self {
        Self {
            codepoint,
            name: None,
            kind,
            record: GlyphRecord::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TableOptions {
    pub mode: RenderMode,
    /// Seed for the dithering noise.
    pub seed: u64,
    /// Replaces the font's line height when set.
    pub height: Option<u8>,
    /// Added to the first and last code points of the font descriptor.
    pub codepoint_offset: i64,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Mono,
            seed: 0,
            height: None,
            codepoint_offset: 0,
        }
    }
}

/// A fully assembled font: bitmap blob, glyph table and descriptor fields.
#[derive(Clone, Debug)]
pub struct FontTable {
    pub ranges: RangeSet,
    pub bitmap: Vec<u8>,
    /// The part of `bitmap` produced by each range.
    pub range_spans: Vec<Range<usize>>,
    /// One per slot, from the first requested code point to the last.
    pub entries: Vec<GlyphEntry>,
    pub first: u16,
    pub last: u16,
    pub y_advance: u8,
}

impl FontTable {
    /// Rasterizes and packs every code point of `ranges`.
    ///
    /// Glyphs the font can't provide don't abort the conversion; they get a
    /// zero record and are returned as [GlyphError]s next to the table.
    pub fn build(
        rasterizer: &impl GlyphRasterizer,
        ranges: &RangeSet,
        options: &TableOptions,
    ) -> FontResult<(FontTable, Vec<GlyphError>)> {
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut bitmap = Vec::new();
        let mut range_spans = Vec::with_capacity(ranges.len());
        let mut entries = Vec::with_capacity(ranges.slot_count());
        let mut glyph_errors = vec![];

        for (index, range) in ranges.ranges().iter().enumerate() {
            if let Some(previous) = index.checked_sub(1).map(|i| ranges.ranges()[i]) {
                for codepoint in (previous.last + 1)..range.first {
                    entries.push(GlyphEntry::placeholder(codepoint, EntryKind::Gap));
                }
            }

            debug!(
                "Extracting range {} (0x{:x} - 0x{:x})",
                index, range.first, range.last
            );

            let span_start = bitmap.len();
            for codepoint in range.iter() {
                let Some(glyph) = rasterizer.glyph_index(codepoint) else {
                    let error = GlyphError::Missing { codepoint };
                    warn!("{}", error);
                    glyph_errors.push(error);
                    entries.push(GlyphEntry::placeholder(codepoint, EntryKind::Missing));
                    continue;
                };

                let raster = match rasterizer.rasterize(glyph) {
                    Ok(raster) => raster,
                    Err(FontError::Oversized { width, height, .. }) => {
                        let (field, value) = if width > u8::MAX as usize {
                            ("width", width)
                        } else {
                            ("height", height)
                        };

                        return Err(FontError::GlyphMetric {
                            codepoint,
                            field,
                            value: value as i64,
                        });
                    }
                    Err(error) => {
                        let error = GlyphError::Render { codepoint, error };
                        warn!("{}", error);
                        glyph_errors.push(error);
                        entries.push(GlyphEntry::placeholder(codepoint, EntryKind::Missing));
                        continue;
                    }
                };

                let record = Self::record(codepoint, bitmap.len(), &raster)?;
                if raster.is_empty() {
                    debug!(
                        "No pixel data for 0x{:x}: {}x{}",
                        codepoint,
                        raster.width(),
                        raster.height()
                    );
                } else {
                    bitmap.extend(pack_glyph(&raster, options.mode, &mut rng));
                }

                entries.push(GlyphEntry {
                    codepoint,
                    name: rasterizer.glyph_name(glyph),
                    kind: EntryKind::Rendered,
                    record,
                });
            }

            range_spans.push(span_start..bitmap.len());
        }

        let first = Self::descriptor_codepoint(ranges.first(), options.codepoint_offset)?;
        let last = Self::descriptor_codepoint(ranges.last(), options.codepoint_offset)?;
        let y_advance = Self::line_height(rasterizer, &entries, options.height)?;

        info!(
            "Packed {} glyphs into {} bitmap bytes ({} skipped)",
            entries.len(),
            bitmap.len(),
            glyph_errors.len()
        );

        Ok((
            FontTable {
                ranges: ranges.clone(),
                bitmap,
                range_spans,
                entries,
                first,
                last,
                y_advance,
            },
            glyph_errors,
        ))
    }

    fn record(codepoint: u32, offset: usize, raster: &RasterGlyph) -> FontResult<GlyphRecord> {
        let bitmap_offset = u16::try_from(offset)
            .map_err(|_| FontError::BitmapOverflow { codepoint, offset })?;

        let metric = |field: &'static str, value: i64| FontError::GlyphMetric {
            codepoint,
            field,
            value,
        };

        let width = raster.width() as i64;
        let height = raster.height() as i64;
        let x_advance = raster.advance.round() as i64;
        let x_offset = raster.bearing.x as i64;
        let y_offset = 1 - raster.bearing.y as i64;

        Ok(GlyphRecord {
            bitmap_offset,
            width: u8::try_from(width).map_err(|_| metric("width", width))?,
            height: u8::try_from(height).map_err(|_| metric("height", height))?,
            x_advance: u8::try_from(x_advance).map_err(|_| metric("advance", x_advance))?,
            x_offset: i8::try_from(x_offset).map_err(|_| metric("x offset", x_offset))?,
            y_offset: i8::try_from(y_offset).map_err(|_| metric("y offset", y_offset))?,
        })
    }

    fn descriptor_codepoint(codepoint: u32, offset: i64) -> FontResult<u16> {
        let shifted = codepoint as i64 + offset;
        u16::try_from(shifted).map_err(|_| FontError::DescriptorCodepoint(shifted))
    }

    fn line_height(
        rasterizer: &impl GlyphRasterizer,
        entries: &[GlyphEntry],
        height: Option<u8>,
    ) -> FontResult<u8> {
        if let Some(height) = height.filter(|height| *height != 0) {
            return Ok(height);
        }

        let from_font = rasterizer
            .line_height()
            .map(|height| height.round() as i64)
            .unwrap_or(0);

        let height = if from_font == 0 {
            entries
                .first()
                .map(|entry| entry.record.height as i64)
                .unwrap_or(0)
        } else {
            from_font
        };

        u8::try_from(height).map_err(|_| FontError::LineHeight(height))
    }

    /// Approximate flash footprint, based on AVR struct and pointer sizes.
    pub fn size_estimate(&self) -> usize {
        self.bitmap.len() + self.entries.len() * RECORD_SIZE + RECORD_SIZE
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use glam::{IVec2, UVec2};

    use super::*;
    use crate::glyph_bitmap::packed_len;
    use crate::range::CodepointRange;
    use crate::raster::{pixels_per_em, FontdueRasterizer, DEFAULT_DPI};

    /// Serves glyphs from memory. Glyph ids are the code points themselves.
    #[derive(Default)]
    pub struct MockRasterizer {
        pub glyphs: HashMap<u32, RasterGlyph>,
        pub broken: Vec<u32>,
        /// Glyphs the engine refuses to render at 1000x10 pixels.
        pub oversized: Vec<u32>,
        pub line_height: Option<f32>,
    }

    impl MockRasterizer {
        pub fn with_glyph(mut self, codepoint: u32, width: u32, height: u32, top: i32) -> Self {
            self.glyphs.insert(
                codepoint,
                RasterGlyph {
                    size: UVec2::new(width, height),
                    bearing: IVec2::new(1, top),
                    advance: width as f32 + 1.6,
                    coverage: vec![0xff; (width * height) as usize],
                },
            );
            self
        }
    }

    impl GlyphRasterizer for MockRasterizer {
        fn glyph_index(&self, codepoint: u32) -> Option<u16> {
            if self.glyphs.contains_key(&codepoint)
                || self.broken.contains(&codepoint)
                || self.oversized.contains(&codepoint)
            {
                Some(codepoint as u16)
            } else {
                None
            }
        }

        fn glyph_name(&self, glyph: u16) -> Option<String> {
            Some(format!("uni{:04X}", glyph))
        }

        fn rasterize(&self, glyph: u16) -> FontResult<RasterGlyph> {
            if self.oversized.contains(&(glyph as u32)) {
                return Err(FontError::Oversized {
                    glyph,
                    width: 1000,
                    height: 10,
                });
            }

            self.glyphs
                .get(&(glyph as u32))
                .cloned()
                .ok_or_else(|| FontError::Render {
                    glyph,
                    reason: "broken outline".into(),
                })
        }

        fn line_height(&self) -> Option<f32> {
            self.line_height
        }
    }

    fn ranges(pairs: &[(u32, u32)]) -> RangeSet {
        RangeSet::new(
            pairs
                .iter()
                .map(|(first, last)| CodepointRange::new(*first, *last))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn offsets_accumulate() {
        let font = MockRasterizer {
            line_height: Some(11.6),
            ..Default::default()
        }
        .with_glyph(0x41, 3, 3, 3)
        .with_glyph(0x42, 0, 0, 0)
        .with_glyph(0x43, 8, 2, 5);

        let (table, errors) =
            FontTable::build(&font, &ranges(&[(0x41, 0x43)]), &TableOptions::default()).unwrap();

        assert!(errors.is_empty());
        assert_eq!(table.bitmap.len(), 2 + 2);
        assert_eq!(table.range_spans, vec![0..4]);

        let records: Vec<_> = table.entries.iter().map(|e| e.record).collect();
        assert_eq!(
            records[0],
            GlyphRecord {
                bitmap_offset: 0,
                width: 3,
                height: 3,
                x_advance: 5,
                x_offset: 1,
                y_offset: -2,
            }
        );
        assert_eq!(records[1].bitmap_offset, 2);
        assert_eq!(records[1].x_advance, 2);
        assert_eq!(records[2].bitmap_offset, 2);
        assert_eq!(records[2].y_offset, -4);

        assert_eq!(table.entries[0].name.as_deref(), Some("uni0041"));
        assert_eq!((table.first, table.last, table.y_advance), (0x41, 0x43, 12));
        assert_eq!(table.size_estimate(), 4 + 3 * 7 + 7);
    }

    #[test]
    fn gaps_and_missing_glyphs() {
        let mut font = MockRasterizer::default()
            .with_glyph(0x30, 2, 2, 2)
            .with_glyph(0x35, 2, 2, 2);
        font.broken.push(0x31);

        let (table, errors) = FontTable::build(
            &font,
            &ranges(&[(0x35, 0x35), (0x30, 0x32)]),
            &TableOptions::default(),
        )
        .unwrap();

        assert_eq!(
            errors,
            vec![
                GlyphError::Render {
                    codepoint: 0x31,
                    error: FontError::Render {
                        glyph: 0x31,
                        reason: "broken outline".into()
                    }
                },
                GlyphError::Missing { codepoint: 0x32 },
            ]
        );

        let kinds: Vec<_> = table.entries.iter().map(|e| (e.codepoint, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0x30, EntryKind::Rendered),
                (0x31, EntryKind::Missing),
                (0x32, EntryKind::Missing),
                (0x33, EntryKind::Gap),
                (0x34, EntryKind::Gap),
                (0x35, EntryKind::Rendered),
            ]
        );
        assert_eq!(table.entries[3].record, GlyphRecord::default());
        assert_eq!(table.entries[5].record.bitmap_offset, 1);
        assert_eq!(table.range_spans, vec![0..1, 1..2]);

        // no line metrics, so the first glyph's height is used
        assert_eq!(table.y_advance, 2);
    }

    #[test]
    fn height_override_and_offset() {
        let font = MockRasterizer {
            line_height: Some(20.0),
            ..Default::default()
        }
        .with_glyph(0x20, 0, 0, 0);

        let options = TableOptions {
            height: Some(9),
            codepoint_offset: -0x10,
            ..Default::default()
        };

        let (table, _) = FontTable::build(&font, &ranges(&[(0x20, 0x20)]), &options).unwrap();
        assert_eq!((table.first, table.last, table.y_advance), (0x10, 0x10, 9));

        let options = TableOptions {
            codepoint_offset: -0x21,
            ..Default::default()
        };
        let result = FontTable::build(&font, &ranges(&[(0x20, 0x20)]), &options);
        assert!(matches!(result, Err(FontError::DescriptorCodepoint(-1))));
    }

    #[test]
    fn oversized_glyphs_are_rejected() {
        let font = MockRasterizer::default().with_glyph(0x41, 300, 1, 1);
        let result = FontTable::build(&font, &ranges(&[(0x41, 0x41)]), &TableOptions::default());
        assert_eq!(
            result.unwrap_err(),
            FontError::GlyphMetric {
                codepoint: 0x41,
                field: "width",
                value: 300,
            }
        );
    }

    #[test]
    fn bitmap_offset_overflow() {
        // 250x255 glyphs take 7969 bytes each; the tenth starts past 65535
        let mut font = MockRasterizer::default();
        for codepoint in 0x41..=0x4a {
            font = font.with_glyph(codepoint, 250, 255, 100);
        }

        let result = FontTable::build(&font, &ranges(&[(0x41, 0x4a)]), &TableOptions::default());
        assert!(matches!(
            result,
            Err(FontError::BitmapOverflow {
                codepoint: 0x4a,
                offset: 71721,
            })
        ));
    }

    #[test]
    fn engine_refuses_oversized_glyph() {
        let mut font = MockRasterizer::default().with_glyph(0x41, 2, 2, 2);
        font.oversized.push(0x42);

        let result = FontTable::build(&font, &ranges(&[(0x41, 0x42)]), &TableOptions::default());
        assert_eq!(
            result.unwrap_err(),
            FontError::GlyphMetric {
                codepoint: 0x42,
                field: "width",
                value: 1000,
            }
        );
    }

    #[test]
    fn metric_overflow() {
        let build = |font: &MockRasterizer| {
            FontTable::build(font, &ranges(&[(0x41, 0x41)]), &TableOptions::default())
                .unwrap_err()
        };
        let metric = |field, value| FontError::GlyphMetric {
            codepoint: 0x41,
            field,
            value,
        };

        // 255 + 1.6 rounds to 257
        let font = MockRasterizer::default().with_glyph(0x41, 255, 1, 1);
        assert_eq!(build(&font), metric("advance", 257));

        let mut font = MockRasterizer::default().with_glyph(0x41, 2, 2, 2);
        font.glyphs.get_mut(&0x41).unwrap().bearing.x = 200;
        assert_eq!(build(&font), metric("x offset", 200));

        let mut font = MockRasterizer::default().with_glyph(0x41, 2, 2, 2);
        font.glyphs.get_mut(&0x41).unwrap().bearing.x = -129;
        assert_eq!(build(&font), metric("x offset", -129));

        let font = MockRasterizer::default().with_glyph(0x41, 2, 2, 200);
        assert_eq!(build(&font), metric("y offset", -199));
    }

    #[test]
    fn line_height_overflow() {
        let font = MockRasterizer {
            line_height: Some(300.0),
            ..Default::default()
        }
        .with_glyph(0x41, 2, 2, 2);

        let result = FontTable::build(&font, &ranges(&[(0x41, 0x41)]), &TableOptions::default());
        assert_eq!(result.unwrap_err(), FontError::LineHeight(300));

        // an explicit height takes precedence over the engine's
        let options = TableOptions {
            height: Some(40),
            ..Default::default()
        };
        let (table, _) = FontTable::build(&font, &ranges(&[(0x41, 0x41)]), &options).unwrap();
        assert_eq!(table.y_advance, 40);
    }

    #[test]
    fn descriptor_beyond_16_bits() {
        let font = MockRasterizer::default();
        let options = TableOptions {
            codepoint_offset: 1,
            ..Default::default()
        };

        let result = FontTable::build(&font, &ranges(&[(0xfffe, 0xffff)]), &options);
        assert_eq!(result.unwrap_err(), FontError::DescriptorCodepoint(0x10000));
    }

    #[test]
    fn noto_sans_table() {
        let px = pixels_per_em(12, DEFAULT_DPI);
        let font = FontdueRasterizer::from_bytes(notosans::REGULAR_TTF, 0, px).unwrap();

        let (table, errors) =
            FontTable::build(&font, &ranges(&[(0x41, 0x43)]), &TableOptions::default()).unwrap();

        assert!(errors.is_empty());
        assert_eq!((table.first, table.last), (0x41, 0x43));
        assert!(table.y_advance > 0);
        assert_eq!(table.range_spans, vec![0..table.bitmap.len()]);

        let a = &table.entries[0];
        assert_eq!(a.kind, EntryKind::Rendered);
        assert_eq!(a.record.bitmap_offset, 0);
        assert!(a.record.width > 0 && a.record.height > 0);
        assert!(a.record.y_offset < 0);

        let b = &table.entries[1];
        let a_len = packed_len(a.record.width as u32, a.record.height as u32);
        assert_eq!(b.record.bitmap_offset as usize, a_len);
    }
}
