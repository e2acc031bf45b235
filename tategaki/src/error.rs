// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::font::Tag;
use thiserror::Error;

/// Malformed or unsupported font data. Fatal for the font it came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FontError {
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },
    #[error("invalid sfnt version {0:#010x}")]
    InvalidSfntVersion(u32),
    #[error("font index {index} out of range for a collection of {count}")]
    InvalidCollectionIndex { index: u32, count: u32 },
    #[error("required table '{0}' is missing")]
    MissingTable(Tag),
    #[error("invalid units per em: {0}")]
    InvalidUnitsPerEm(u16),
    #[error("no cmap subtable for platform 3 encoding 10")]
    MissingUnicodeFullCmap,
    #[error("unsupported cmap subtable format {0}")]
    UnsupportedCmapFormat(u16),
    #[error("unsupported GSUB lookup type {0}")]
    UnsupportedLookupType(u16),
    #[error("unsupported single substitution format {0}")]
    UnsupportedSubstFormat(u16),
    #[error("unsupported coverage format {0}")]
    UnsupportedCoverageFormat(u16),
    #[error("value {0:#x} does not fit in a signed 32-bit integer")]
    NegativeInt32(u32),
    #[error("malformed '{0}' table: {1}")]
    MalformedTable(Tag, &'static str),
}

/// Errors aborting a layout call. No partial result is produced.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum LayoutError {
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("invalid range {start}..{end} for text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("offset {0} is not on a char boundary")]
    NotCharBoundary(usize),
    #[error("block height must be positive and finite, got {0}")]
    InvalidHeight(f32),
    #[error("font size must be positive and finite, got {0}")]
    InvalidFontSize(f32),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to parse layout config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid layout config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Checks that `start..end` is a valid `char`-aligned range of `text`.
pub(crate) fn check_range(text: &str, start: usize, end: usize) -> Result<()> {
    if start > end || end > text.len() {
        return Err(LayoutError::InvalidRange {
            start,
            end,
            len: text.len(),
        });
    }
    for offset in [start, end] {
        if !text.is_char_boundary(offset) {
            return Err(LayoutError::NotCharBoundary(offset));
        }
    }
    Ok(())
}
