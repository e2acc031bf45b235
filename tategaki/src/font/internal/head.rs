//! Font header tables.

use super::{Bytes, ReadResult};

/// Font header table.
#[derive(Copy, Clone)]
pub struct Head<'a>(Bytes<'a>);

impl<'a> Head<'a> {
    /// The expected value of the 'magic' field in the header table.
    pub const MAGIC: u32 = 0x5F0F3CF5;

    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    pub fn magic(&self) -> ReadResult<u32> {
        self.0.read_u32(12)
    }

    /// Returns the design units per em. Valid values are 16..=16384.
    pub fn units_per_em(&self) -> ReadResult<u16> {
        self.0.read_u16(18)
    }
}

/// Horizontal (`hhea`) or vertical (`vhea`) header. Both tables share
/// the fields vertical layout reads, at the same offsets.
#[derive(Copy, Clone)]
pub struct MetricsHeader<'a>(Bytes<'a>);

impl<'a> MetricsHeader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Typographic ascender. For `vhea`, the distance from the centre
    /// line to the previous column's descent.
    pub fn ascender(&self) -> ReadResult<i16> {
        self.0.read_i16(4)
    }

    /// Typographic descender. For `vhea`, the distance from the centre
    /// line to the next column's ascent.
    pub fn descender(&self) -> ReadResult<i16> {
        self.0.read_i16(6)
    }

    pub fn line_gap(&self) -> ReadResult<i16> {
        self.0.read_i16(8)
    }

    /// Number of long entries in the matching `hmtx`/`vmtx` table.
    pub fn num_long_metrics(&self) -> ReadResult<u16> {
        self.0.read_u16(34)
    }
}
