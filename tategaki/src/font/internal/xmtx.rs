//! Glyph metrics tables (`hmtx`, `vmtx`).

use super::{Bytes, ReadResult, TableRecord};

/// Location and shape of a metrics table inside the font buffer.
///
/// The table holds `long_metric_count` (advance, side bearing) pairs
/// followed by bare side bearings for the remaining glyphs, which all
/// share the last long advance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MetricsTable {
    offset: usize,
    len: usize,
    long_metric_count: u16,
}

impl MetricsTable {
    /// Validates that `record` holds at least `long_metric_count` long
    /// entries.
    pub fn new(data: &[u8], record: TableRecord, long_metric_count: u16) -> ReadResult<Self> {
        let table = record.data(data)?;
        Bytes::new(table).ensure_range(0, long_metric_count as usize * 4)?;
        Ok(Self {
            offset: record.offset as usize,
            len: record.length as usize,
            long_metric_count,
        })
    }

    pub fn long_metric_count(&self) -> u16 {
        self.long_metric_count
    }

    fn bytes<'a>(&self, data: &'a [u8]) -> Bytes<'a> {
        Bytes::new(data.get(self.offset..self.offset + self.len).unwrap_or(&[]))
    }

    /// Returns the advance for the specified glyph in font units. Glyphs
    /// past the long entries use the last long advance.
    pub fn advance(&self, data: &[u8], glyph_id: u16) -> u16 {
        if self.long_metric_count == 0 {
            return 0;
        }
        let index = glyph_id.min(self.long_metric_count - 1) as usize;
        self.bytes(data).read_u16(index * 4).unwrap_or(0)
    }

    /// Returns the side bearing (left for `hmtx`, top for `vmtx`) for the
    /// specified glyph in font units.
    pub fn side_bearing(&self, data: &[u8], glyph_id: u16) -> i16 {
        if self.long_metric_count == 0 {
            return 0;
        }
        let b = self.bytes(data);
        if glyph_id < self.long_metric_count {
            return b.read_i16(glyph_id as usize * 4 + 2).unwrap_or(0);
        }
        let trailing = self.long_metric_count as usize * 4
            + (glyph_id - self.long_metric_count) as usize * 2;
        match b.read_i16(trailing) {
            Ok(sb) => sb,
            Err(_) => b
                .read_i16((self.long_metric_count as usize - 1) * 4 + 2)
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::internal::Tag;
    use crate::error::FontError;
    use tategaki_test_data::BeBuffer;

    fn table(long: &[(u16, i16)], bearings: &[i16]) -> (Vec<u8>, MetricsTable) {
        let mut buf = BeBuffer::new();
        // Leading junk so offsets are exercised.
        buf.u32(0xDEAD_BEEF);
        for (advance, sb) in long {
            buf.u16(*advance).i16(*sb);
        }
        for sb in bearings {
            buf.i16(*sb);
        }
        let data = buf.into_vec();
        let record = TableRecord {
            tag: Tag::new(b"vmtx"),
            offset: 4,
            length: data.len() as u32 - 4,
        };
        let table = MetricsTable::new(&data, record, long.len() as u16).unwrap();
        (data, table)
    }

    #[test]
    fn advance_clamps_to_last_long_entry() {
        let (data, t) = table(&[(500, 1), (1000, 2), (800, 3)], &[7, 8]);
        assert_eq!(t.advance(&data, 0), 500);
        assert_eq!(t.advance(&data, 2), 800);
        assert_eq!(t.advance(&data, 3), 800);
        assert_eq!(t.advance(&data, u16::MAX), 800);
    }

    #[test]
    fn side_bearing_reads_trailing_array() {
        let (data, t) = table(&[(500, 1), (1000, 2)], &[7, 8]);
        assert_eq!(t.side_bearing(&data, 1), 2);
        assert_eq!(t.side_bearing(&data, 2), 7);
        assert_eq!(t.side_bearing(&data, 3), 8);
        // Past the trailing array: last long entry.
        assert_eq!(t.side_bearing(&data, 40), 2);
    }

    #[test]
    fn zero_long_metrics_yield_zero() {
        let (data, t) = table(&[], &[]);
        assert_eq!(t.advance(&data, 5), 0);
        assert_eq!(t.side_bearing(&data, 5), 0);
    }

    #[test]
    fn short_table_is_rejected() {
        let data = [0u8; 8];
        let record = TableRecord {
            tag: Tag::new(b"hmtx"),
            offset: 0,
            length: 8,
        };
        assert!(matches!(
            MetricsTable::new(&data, record, 3),
            Err(FontError::OutOfBounds { .. })
        ));
    }
}
