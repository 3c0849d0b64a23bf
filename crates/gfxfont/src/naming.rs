// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

/// Bits per character the font needs, going by its last code point.
pub fn charset_bits(last_codepoint: u32) -> u32 {
    match last_codepoint {
        0..=127 => 7,
        128..=255 => 8,
        _ => 16,
    }
}

/// Derives the C symbol name of a font, e.g. `FreeSans18pt7b`.
///
/// The file extension is replaced with the variant, point size and
/// character set width.
pub fn symbol_name(font_path: &Path, variant: Option<&str>, size: u32, last_codepoint: u32) -> String {
    let file_name = font_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name.as_str(),
    };

    let raw = format!(
        "{}{}{}pt{}b",
        stem,
        variant.unwrap_or(""),
        size,
        charset_bits(last_codepoint)
    );

    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }

    name
}
