// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0

//! C source emission for Adafruit-GFX style `GFXfont` tables.

use std::io::{self, Write};

use crate::glyph_table::{EntryKind, FontTable, GlyphEntry};
use crate::raster::FontInfo;

pub const CUSTOMISER_URL: &str = "https://tchapi.github.io/Adafruit-GFX-Font-Customiser";

#[derive(Clone, Debug)]
pub struct EmitOptions {
    /// Hex bytes per line of the bitmap array.
    pub bytes_per_line: usize,
    /// Echoed into the header comment when not empty.
    pub command_line: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            bytes_per_line: 12,
            command_line: String::new(),
        }
    }
}

/// Writes the bitmap array, glyph array and font descriptor of `table`.
pub fn write_font(
    w: &mut impl Write,
    table: &FontTable,
    name: &str,
    options: &EmitOptions,
) -> io::Result<()> {
    if !options.command_line.is_empty() {
        writeln!(w, "// {}", options.command_line)?;
    }
    writeln!(w, "// Visualize your font via {}", CUSTOMISER_URL)?;
    writeln!(w)?;

    write_bitmaps(w, table, name, options.bytes_per_line.max(1))?;
    write_glyphs(w, table, name)?;

    writeln!(w, "const GFXfont {} PROGMEM = {{", name)?;
    writeln!(w, "  (uint8_t  *){}Bitmaps,", name)?;
    writeln!(w, "  (GFXglyph *){}Glyphs,", name)?;
    writeln!(w, "  0x{:02X}, // first", table.first)?;
    writeln!(w, "  0x{:02X}, // last", table.last)?;
    writeln!(w, "  {}   // height", table.y_advance)?;
    writeln!(w, " }};")?;
    writeln!(w)?;

    writeln!(w, "// Approx. {} bytes", table.size_estimate())
}

fn write_bitmaps(
    w: &mut impl Write,
    table: &FontTable,
    name: &str,
    bytes_per_line: usize,
) -> io::Result<()> {
    writeln!(w, "/* num ranges: {} */", table.ranges.len())?;
    writeln!(w, "const uint8_t {}Bitmaps[] PROGMEM = {{", name)?;

    let total = table.bitmap.len();
    for (index, (range, span)) in table
        .ranges
        .ranges()
        .iter()
        .zip(table.range_spans.iter())
        .enumerate()
    {
        writeln!(
            w,
            "  /* range {} (0x{:x} - 0x{:x}): */",
            index, range.first, range.last
        )?;

        let bytes = &table.bitmap[span.clone()];
        let mut line_start = span.start;
        for chunk in bytes.chunks(bytes_per_line) {
            let line = chunk
                .iter()
                .map(|byte| format!("0x{:02X}", byte))
                .collect::<Vec<_>>()
                .join(", ");

            line_start += chunk.len();
            let separator = if line_start == total { "" } else { "," };
            writeln!(w, "  {}{}", line, separator)?;
        }
    }

    // C doesn't allow empty initializers
    if total == 0 {
        writeln!(w, "  0x00")?;
    }

    writeln!(w, " }};")?;
    writeln!(w)
}

fn write_glyphs(w: &mut impl Write, table: &FontTable, name: &str) -> io::Result<()> {
    writeln!(w, "const GFXglyph {}Glyphs[] PROGMEM = {{", name)?;

    let mut ranges = table.ranges.ranges().iter().enumerate().peekable();
    let last_index = table.entries.len().saturating_sub(1);
    for (index, entry) in table.entries.iter().enumerate() {
        if let Some((range_index, range)) = ranges.next_if(|(_, r)| r.first == entry.codepoint) {
            writeln!(
                w,
                "// bmpOff,   w,   h,xAdv, xOff, yOff      range {} (0x{:x} - 0x{:x})",
                range_index, range.first, range.last
            )?;
        }

        let record = &entry.record;
        write!(
            w,
            "  {{ {:5}, {:3}, {:3}, {:3}, {:4}, {:4} }}",
            record.bitmap_offset,
            record.width,
            record.height,
            record.x_advance,
            record.x_offset,
            record.y_offset
        )?;

        let separator = if index == last_index { " }; //" } else { ",   //" };
        writeln!(w, "{} {} (#{})", separator, entry_comment(entry), index)?;
    }

    writeln!(w)
}

fn entry_comment(entry: &GlyphEntry) -> String {
    let mut comment = format!("0x{:02X}", entry.codepoint);
    if let Some(name) = entry.name.as_deref() {
        comment.push(' ');
        comment.push_str(name);
    }

    if let Some(c) = char::from_u32(entry.codepoint).filter(|c| (' '..='~').contains(c)) {
        comment.push_str(&format!(" '{}'", c));
    }

    match entry.kind {
        EntryKind::Rendered => {}
        EntryKind::Missing => comment.push_str(" (missing)"),
        EntryKind::Gap => comment.push_str(" (skip)"),
    }

    comment
}

/// Lists a font's face statistics and every code point it maps.
pub fn write_codepoint_dump(
    w: &mut impl Write,
    font_name: &str,
    info: &FontInfo,
    codepoints: &[(u32, u16)],
) -> io::Result<()> {
    writeln!(w, "{} Stats:", font_name)?;
    writeln!(
        w,
        "Num faces: {} Num glyphs: {} Maps: {}",
        info.faces, info.glyphs, info.charmaps
    )?;
    writeln!(w, "=============================================")?;
    for (codepoint, glyph) in codepoints {
        writeln!(w, "Codepoint: 0x{:x}, gid: {}", codepoint, glyph)?;
    }

    Ok(())
}
