//! Low level OpenType parsing: the table directory and the handful of
//! tables vertical layout depends on.

pub mod cmap;
pub mod gsub;
pub mod head;
pub mod xmtx;

mod parse;

pub use parse::*;

pub use super::tag::{raw_tag, RawTag, Tag};
use crate::error::FontError;

pub const HEAD: Tag = Tag::new(b"head");
pub const HHEA: Tag = Tag::new(b"hhea");
pub const HMTX: Tag = Tag::new(b"hmtx");
pub const VHEA: Tag = Tag::new(b"vhea");
pub const VMTX: Tag = Tag::new(b"vmtx");
pub const CMAP: Tag = Tag::new(b"cmap");
pub const GSUB: Tag = Tag::new(b"GSUB");

/// Functions for checking the validity of a font file and extracting
/// fonts from collections.
pub mod raw_data {
    use super::{raw_tag, Bytes, RawTag, ReadResult};
    use crate::error::FontError;

    pub const OTTO: RawTag = raw_tag(b"OTTO");
    pub const TTCF: RawTag = raw_tag(b"ttcf");
    pub const TRUETYPE: RawTag = 0x0001_0000;

    /// Returns true if the data represents a font collection.
    pub fn is_collection(data: &[u8]) -> bool {
        Bytes::new(data).read_u32(0) == Ok(TTCF)
    }

    /// Returns the number of fonts contained in the specified data.
    pub fn count(data: &[u8]) -> ReadResult<u32> {
        if is_collection(data) {
            Bytes::new(data).read_u31(8)
        } else {
            Ok(1)
        }
    }

    /// Returns the byte offset of the table directory for the font at
    /// the specified index.
    pub fn offset(data: &[u8], index: u32) -> ReadResult<usize> {
        let count = count(data)?;
        if index >= count {
            return Err(FontError::InvalidCollectionIndex { index, count });
        }
        if is_collection(data) {
            Ok(Bytes::new(data).read_u31(12 + index as usize * 4)? as usize)
        } else {
            Ok(0)
        }
    }
}

/// Entry of a font's table directory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    /// Returns the table's bytes, validating the record against the
    /// buffer.
    pub fn data<'a>(&self, font_data: &'a [u8]) -> ReadResult<&'a [u8]> {
        Bytes::new(font_data).read_bytes(self.offset as usize, self.length as usize)
    }
}

const RECORD_SIZE: usize = 16;

/// Reads the table directory of the font at `index`, following the
/// collection header when present.
pub fn read_table_directory(data: &[u8], index: u32) -> ReadResult<Vec<TableRecord>> {
    let base = raw_data::offset(data, index)?;
    let b = Bytes::new(data);
    let version = b.read_u32(base)?;
    if version != raw_data::TRUETYPE && version != raw_data::OTTO {
        return Err(FontError::InvalidSfntVersion(version));
    }
    let num_tables = b.read_u16(base + 4)? as usize;
    b.ensure_range(base + 12, num_tables * RECORD_SIZE)?;
    let mut records = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let record = base + 12 + i * RECORD_SIZE;
        records.push(TableRecord {
            tag: b.read_tag(record)?,
            offset: b.read_u31(record + 8)?,
            length: b.read_u31(record + 12)?,
        });
    }
    Ok(records)
}
