//! Character to glyph mapping table.
//!
//! Only the segmented coverage subtable (format 12) under the Windows
//! Unicode full repertoire encoding (platform 3, encoding 10) is
//! supported. Fonts without one are rejected rather than silently
//! falling back to a BMP-only subtable.

use super::{Bytes, ReadResult, TableRecord, CMAP};
use crate::error::FontError;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

const PLATFORM_WINDOWS: u16 = 3;
const ENCODING_UNICODE_FULL: u16 = 10;
const GROUP_SIZE: usize = 12;
const GROUPS_OFFSET: usize = 16;

/// Finds the (3, 10) subtable and returns its absolute offset.
pub fn subtable(data: &[u8], cmap: TableRecord) -> ReadResult<usize> {
    let base = cmap.offset as usize;
    let mut s = Bytes::new(data).stream_at(base)?;
    s.skip(2)?;
    let len = s.read_u16()?;
    for _ in 0..len {
        let platform = s.read_u16()?;
        let encoding = s.read_u16()?;
        let offset = s.read_u31()?;
        if platform == PLATFORM_WINDOWS && encoding == ENCODING_UNICODE_FULL {
            return Ok(base + offset as usize);
        }
    }
    Err(FontError::MissingUnicodeFullCmap)
}

/// Groups expanded into parallel arrays.
#[derive(Debug)]
struct FlatGroups {
    starts: Vec<u32>,
    ends: Vec<u32>,
    glyphs: Vec<u32>,
}

/// Codepoint to glyph id lookup over a format 12 subtable.
#[derive(Debug)]
pub struct CharToGlyphMap {
    offset: usize,
    num_groups: usize,
    flat: Option<FlatGroups>,
    cache: Mutex<FxHashMap<u32, u16>>,
}

impl CharToGlyphMap {
    /// Locates and validates the subtable. With `flatten`, all groups are
    /// copied out of the font buffer up front.
    pub fn new(data: &[u8], cmap: TableRecord, flatten: bool) -> ReadResult<Self> {
        let offset = subtable(data, cmap)?;
        let b = Bytes::new(data);
        let format = b.read_u16(offset)?;
        if format != 12 {
            return Err(FontError::UnsupportedCmapFormat(format));
        }
        let reserved = b.read_u16(offset + 2)?;
        if reserved != 0 {
            return Err(FontError::MalformedTable(CMAP, "non-zero reserved field"));
        }
        let num_groups = b.read_u31(offset + 12)? as usize;
        b.ensure_range(offset + GROUPS_OFFSET, num_groups * GROUP_SIZE)?;

        let flat = if flatten {
            let mut starts = Vec::with_capacity(num_groups);
            let mut ends = Vec::with_capacity(num_groups);
            let mut glyphs = Vec::with_capacity(num_groups);
            let mut s = b.stream_at(offset + GROUPS_OFFSET)?;
            for _ in 0..num_groups {
                starts.push(s.read_u32()?);
                ends.push(s.read_u32()?);
                glyphs.push(s.read_u32()?);
            }
            Some(FlatGroups {
                starts,
                ends,
                glyphs,
            })
        } else {
            None
        };

        tracing::debug!(
            "cmap format 12 at {offset}: {num_groups} groups (flattened: {flatten})"
        );

        Ok(Self {
            offset,
            num_groups,
            flat,
            cache: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Maps a codepoint to a glyph identifier. Unmapped codepoints map to
    /// 0 (`.notdef`).
    pub fn map(&self, data: &[u8], codepoint: u32) -> u16 {
        if let Some(flat) = &self.flat {
            let index = flat.starts.partition_point(|&start| start <= codepoint);
            if index == 0 || codepoint > flat.ends[index - 1] {
                return 0;
            }
            let i = index - 1;
            return glyph_in_group(flat.starts[i], flat.glyphs[i], codepoint);
        }

        if let Some(gid) = self.cache.lock().get(&codepoint) {
            return *gid;
        }
        let gid = self.search(data, codepoint).unwrap_or(0);
        self.cache.lock().insert(codepoint, gid);
        gid
    }

    fn search(&self, data: &[u8], codepoint: u32) -> ReadResult<u16> {
        let b = Bytes::new(data);
        let base = self.offset + GROUPS_OFFSET;
        let mut l = 0;
        let mut h = self.num_groups;
        while l < h {
            let i = (l + h) / 2;
            let rec = base + i * GROUP_SIZE;
            let start = b.read_u32(rec)?;
            if codepoint < start {
                h = i;
            } else if codepoint > b.read_u32(rec + 4)? {
                l = i + 1;
            } else {
                return Ok(glyph_in_group(start, b.read_u32(rec + 8)?, codepoint));
            }
        }
        Ok(0)
    }
}

#[inline]
fn glyph_in_group(start: u32, start_glyph: u32, codepoint: u32) -> u16 {
    u16::try_from(start_glyph as u64 + (codepoint - start) as u64).unwrap_or(0)
}
