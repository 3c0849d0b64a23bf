// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{FontError, FontResult};

/// The highest Unicode scalar value.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

/// Printable ASCII, `' '` through `'~'`.
pub const DEFAULT_RANGE: CodepointRange = CodepointRange {
    first: 0x20,
    last: 0x7E,
};

/// Parses a decimal number, or a hexadecimal one with a `0x` prefix.
pub fn parse_number(text: &str) -> FontResult<u32> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };

    let value = parsed.map_err(|_| FontError::InvalidNumber(text.to_string()))?;
    u32::try_from(value).map_err(|_| FontError::InvalidNumber(text.to_string()))
}

/// Parses a code point, rejecting values beyond [MAX_CODEPOINT].
pub fn parse_codepoint(text: &str) -> FontResult<u32> {
    let value = parse_number(text)?;
    if value > MAX_CODEPOINT {
        return Err(FontError::CodepointOutOfRange(value as u64));
    }

    Ok(value)
}

/// An inclusive range of code points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CodepointRange {
    pub first: u32,
    pub last: u32,
}

impl CodepointRange {
    /// Creates a range, swapping the bounds if they're given in reverse.
    pub fn new(first: u32, last: u32) -> Self {
        if last < first {
            Self {
                first: last,
                last: first,
            }
        } else {
            Self { first, last }
        }
    }

    pub fn count(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        (self.first..=self.last).contains(&codepoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }

    fn overlaps(&self, other: &CodepointRange) -> bool {
        self.contains(other.first) || other.contains(self.first)
    }
}

/// A sorted set of non-overlapping code point ranges.
///
/// Generated glyph tables are indexed by `codepoint - first`, so the ranges
/// have to be ascending and disjoint. Holes between ranges become gap slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<CodepointRange>,
}

impl RangeSet {
    pub fn new(mut ranges: Vec<CodepointRange>) -> FontResult<Self> {
        if ranges.is_empty() {
            return Err(FontError::NoRanges);
        }

        ranges.sort_by_key(|range| range.first);
        for pair in ranges.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(FontError::RangeOverlap {
                    first: (pair[0].first, pair[0].last),
                    second: (pair[1].first, pair[1].last),
                });
            }
        }

        Ok(Self { ranges })
    }

    /// Interprets free command-line arguments as ranges.
    ///
    /// No arguments selects `default`. A single argument replaces the end of
    /// `default`. Otherwise the arguments are `first last` pairs.
    pub fn from_args<S: AsRef<str>>(args: &[S], default: CodepointRange) -> FontResult<Self> {
        let ranges = match args.len() {
            0 => vec![default],
            1 => {
                let last = parse_codepoint(args[0].as_ref())?;
                vec![CodepointRange::new(default.first, last)]
            }
            count if count % 2 != 0 => return Err(FontError::RangeEndMissing(count)),
            _ => args
                .chunks(2)
                .map(|pair| {
                    let first = parse_codepoint(pair[0].as_ref())?;
                    let last = parse_codepoint(pair[1].as_ref())?;
                    Ok(CodepointRange::new(first, last))
                })
                .collect::<FontResult<Vec<_>>>()?,
        };

        Self::new(ranges)
    }

    pub fn ranges(&self) -> &[CodepointRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Always false, since [RangeSet::new] refuses an empty set.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn first(&self) -> u32 {
        self.ranges[0].first
    }

    pub fn last(&self) -> u32 {
        self.ranges[self.ranges.len() - 1].last
    }

    /// Number of code points actually requested.
    pub fn requested_count(&self) -> usize {
        self.ranges.iter().map(CodepointRange::count).sum()
    }

    /// Number of glyph table slots, gaps between ranges included.
    pub fn slot_count(&self) -> usize {
        (self.last() - self.first()) as usize + 1
    }
}
