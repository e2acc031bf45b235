//! Synthetic font binaries shared by the tategaki tests and benches.
//!
//! Real CJK fonts are tens of megabytes, so tests build small sfnt
//! containers that carry only the tables the vertical layout engine
//! reads: `head`, `maxp`, `hhea`/`hmtx`, `vhea`/`vmtx`, `cmap` and
//! optionally `GSUB`.

mod bebuffer;
pub mod gsub;

pub use bebuffer::BeBuffer;
pub use gsub::{
    CoverageTable, FeatureRecord, GsubTable, LookupRecord, ScriptRecord, SingleSubtable,
};

pub const TRUETYPE: u32 = 0x0001_0000;
pub const OPENTYPE: u32 = 0x4F54_544F;

/// Horizontal or vertical header plus its metrics table.
#[derive(Clone, Debug)]
pub struct MetricsRecord {
    pub ascender: i16,
    pub descender: i16,
    /// Long metrics: (advance, side bearing).
    pub long_metrics: Vec<(u16, i16)>,
    /// Trailing side bearings for glyphs past the long metrics.
    pub bearings: Vec<i16>,
}

#[derive(Clone, Debug)]
pub enum CmapTable {
    /// Format 12 subtable under platform 3 encoding 10, next to a
    /// minimal format 4 subtable under platform 3 encoding 1.
    Format12 {
        groups: Vec<(u32, u32, u32)>,
        reserved: u16,
    },
    /// Only a BMP format 4 subtable.
    Format4Only,
    /// A format 13 subtable under platform 3 encoding 10.
    Format13 { groups: Vec<(u32, u32, u32)> },
}

#[derive(Clone, Debug)]
pub struct TestFont {
    pub sfnt_version: u32,
    pub units_per_em: u16,
    pub num_glyphs: u16,
    pub horizontal: MetricsRecord,
    pub vertical: Option<MetricsRecord>,
    pub cmap: CmapTable,
    pub gsub: Option<GsubTable>,
    /// Tables dropped from the output even though they are described.
    pub omit: Vec<[u8; 4]>,
}

// Glyph ids of the kana fixture.
pub const GID_LATIN_A: u16 = 10;
pub const GID_DIGIT_0: u16 = 110;
pub const GID_IDEOGRAPHIC_COMMA: u16 = 100;
pub const GID_IDEOGRAPHIC_COMMA_VERT: u16 = 101;
pub const GID_IDEOGRAPHIC_STOP: u16 = 102;
pub const GID_IDEOGRAPHIC_STOP_VERT: u16 = 103;
pub const GID_PROLONGED_MARK: u16 = 104;
pub const GID_PROLONGED_MARK_VERT: u16 = 105;
pub const GID_HIRAGANA_SMALL_A: u16 = 200;
pub const GID_KANJI_JI: u16 = 301;
pub const GID_KANJI_KAN: u16 = 300;
pub const KANA_NUM_GLYPHS: u16 = 302;

/// Glyph id of a hiragana codepoint in the kana fixture.
pub fn hiragana_gid(c: char) -> u16 {
    GID_HIRAGANA_SMALL_A + (c as u32 - 0x3041) as u16
}

/// Advance widths (font units) of the kana fixture.
pub const LATIN_ADVANCE: u16 = 600;
pub const DIGIT_ADVANCE: u16 = 550;
pub const FULL_ADVANCE: u16 = 1000;
pub const NOTDEF_ADVANCE: u16 = 500;
pub const VERTICAL_ADVANCE: u16 = 1000;
pub const TOP_SIDE_BEARING: i16 = 100;
pub const PUNCT_VERT_TOP_SIDE_BEARING: i16 = 50;

/// A 1000 upem font that maps digits, `A-Z`, a few ideographic
/// punctuation marks, the hiragana block and two kanji, with full
/// horizontal and vertical metrics and a `kana`/`JAN `/`vrt2`
/// substitution for the punctuation.
pub fn kana_font() -> TestFont {
    let groups = vec![
        (0x30, 0x39, GID_DIGIT_0 as u32),
        (0x41, 0x5A, GID_LATIN_A as u32),
        (0x3001, 0x3001, GID_IDEOGRAPHIC_COMMA as u32),
        (0x3002, 0x3002, GID_IDEOGRAPHIC_STOP as u32),
        (0x3041, 0x3093, GID_HIRAGANA_SMALL_A as u32),
        (0x30FC, 0x30FC, GID_PROLONGED_MARK as u32),
        (0x5B57, 0x5B57, GID_KANJI_JI as u32),
        (0x6F22, 0x6F22, GID_KANJI_KAN as u32),
    ];
    let h_metrics = (0..KANA_NUM_GLYPHS)
        .map(|gid| {
            let advance = match gid {
                0 => NOTDEF_ADVANCE,
                10..=35 => LATIN_ADVANCE,
                110..=119 => DIGIT_ADVANCE,
                _ => FULL_ADVANCE,
            };
            (advance, 50)
        })
        .collect();
    let v_metrics = (0..KANA_NUM_GLYPHS)
        .map(|gid| {
            let tsb = match gid {
                GID_IDEOGRAPHIC_COMMA_VERT | GID_IDEOGRAPHIC_STOP_VERT => {
                    PUNCT_VERT_TOP_SIDE_BEARING
                }
                _ => TOP_SIDE_BEARING,
            };
            (VERTICAL_ADVANCE, tsb)
        })
        .collect();
    TestFont {
        sfnt_version: TRUETYPE,
        units_per_em: 1000,
        num_glyphs: KANA_NUM_GLYPHS,
        horizontal: MetricsRecord {
            ascender: 880,
            descender: -120,
            long_metrics: h_metrics,
            bearings: vec![],
        },
        vertical: Some(MetricsRecord {
            ascender: 500,
            descender: -500,
            long_metrics: v_metrics,
            bearings: vec![],
        }),
        cmap: CmapTable::Format12 {
            groups,
            reserved: 0,
        },
        gsub: Some(GsubTable::vertical_forms(&[
            (GID_IDEOGRAPHIC_COMMA, GID_IDEOGRAPHIC_COMMA_VERT),
            (GID_IDEOGRAPHIC_STOP, GID_IDEOGRAPHIC_STOP_VERT),
            (GID_PROLONGED_MARK, GID_PROLONGED_MARK_VERT),
        ])),
        omit: vec![],
    }
}

impl TestFont {
    pub fn without(mut self, tag: &[u8; 4]) -> Self {
        self.omit.push(*tag);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_at(0)
    }

    /// Serializes the font with table offsets relative to `base`, for
    /// embedding in a collection.
    pub fn build_at(&self, base: u32) -> Vec<u8> {
        let mut tables: Vec<([u8; 4], Vec<u8>)> = Vec::new();
        tables.push((*b"head", self.head()));
        tables.push((*b"maxp", self.maxp()));
        tables.push((
            *b"hhea",
            header(0x0001_0000, &self.horizontal),
        ));
        tables.push((*b"hmtx", metrics(&self.horizontal)));
        if let Some(vertical) = &self.vertical {
            tables.push((*b"vhea", header(0x0001_1000, vertical)));
            tables.push((*b"vmtx", metrics(vertical)));
        }
        tables.push((*b"cmap", self.cmap()));
        if let Some(gsub) = &self.gsub {
            tables.push((*b"GSUB", gsub.build()));
        }
        tables.retain(|(tag, _)| !self.omit.contains(tag));
        tables.sort_by(|a, b| a.0.cmp(&b.0));

        let num_tables = tables.len() as u16;
        let mut out = BeBuffer::new();
        let (search_range, entry_selector, range_shift) = search_params(num_tables);
        out.u32(self.sfnt_version)
            .u16(num_tables)
            .u16(search_range)
            .u16(entry_selector)
            .u16(range_shift);
        let mut offset = 12 + 16 * tables.len() as u32;
        for (tag, data) in &tables {
            out.tag(tag)
                .u32(checksum(data))
                .u32(base + offset)
                .u32(data.len() as u32);
            offset += padded_len(data.len()) as u32;
        }
        for (_, data) in &tables {
            out.bytes(data).pad4();
        }
        out.into_vec()
    }

    fn head(&self) -> Vec<u8> {
        let mut buf = BeBuffer::new();
        buf.u32(0x0001_0000) // version
            .u32(0x0001_0000) // fontRevision
            .u32(0) // checksumAdjustment
            .u32(0x5F0F_3CF5) // magicNumber
            .u16(0) // flags
            .u16(self.units_per_em)
            .u32(0)
            .u32(0) // created
            .u32(0)
            .u32(0) // modified
            .i16(0)
            .i16(self.horizontal.descender)
            .i16(self.units_per_em as i16)
            .i16(self.horizontal.ascender) // bbox
            .u16(0) // macStyle
            .u16(8) // lowestRecPPEM
            .i16(2) // fontDirectionHint
            .i16(0) // indexToLocFormat
            .i16(0); // glyphDataFormat
        buf.into_vec()
    }

    fn maxp(&self) -> Vec<u8> {
        let mut buf = BeBuffer::new();
        buf.u32(0x0000_5000).u16(self.num_glyphs);
        buf.into_vec()
    }

    fn cmap(&self) -> Vec<u8> {
        let mut buf = BeBuffer::new();
        match &self.cmap {
            CmapTable::Format12 { groups, reserved } => {
                let format4 = minimal_format4();
                buf.u16(0).u16(2);
                buf.u16(3).u16(1).u32(20);
                buf.u16(3).u16(10).u32(20 + format4.len() as u32);
                buf.bytes(&format4);
                buf.bytes(&segmented(12, *reserved, groups));
            }
            CmapTable::Format4Only => {
                buf.u16(0).u16(1);
                buf.u16(3).u16(1).u32(12);
                buf.bytes(&minimal_format4());
            }
            CmapTable::Format13 { groups } => {
                buf.u16(0).u16(1);
                buf.u16(3).u16(10).u32(12);
                buf.bytes(&segmented(13, 0, groups));
            }
        }
        buf.into_vec()
    }
}

/// Packs fonts into a `ttcf` collection.
pub fn collection(fonts: &[TestFont]) -> Vec<u8> {
    let header_len = 12 + 4 * fonts.len() as u32;
    let mut offsets = Vec::with_capacity(fonts.len());
    let mut bodies = Vec::with_capacity(fonts.len());
    let mut base = header_len;
    for font in fonts {
        let body = font.build_at(base);
        offsets.push(base);
        base += padded_len(body.len()) as u32;
        bodies.push(body);
    }
    let mut out = BeBuffer::new();
    out.tag(b"ttcf").u16(1).u16(0).u32(fonts.len() as u32);
    for offset in offsets {
        out.u32(offset);
    }
    for body in &bodies {
        out.bytes(body).pad4();
    }
    out.into_vec()
}

fn header(version: u32, record: &MetricsRecord) -> Vec<u8> {
    let max_advance = record
        .long_metrics
        .iter()
        .map(|m| m.0)
        .max()
        .unwrap_or(0);
    let mut buf = BeBuffer::new();
    buf.u32(version)
        .i16(record.ascender)
        .i16(record.descender)
        .i16(0) // lineGap
        .u16(max_advance)
        .i16(0)
        .i16(0)
        .i16(0)
        .i16(1) // caretSlopeRise
        .i16(0)
        .i16(0);
    for _ in 0..4 {
        buf.i16(0);
    }
    buf.i16(0) // metricDataFormat
        .u16(record.long_metrics.len() as u16);
    buf.into_vec()
}

fn metrics(record: &MetricsRecord) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    for (advance, bearing) in &record.long_metrics {
        buf.u16(*advance).i16(*bearing);
    }
    for bearing in &record.bearings {
        buf.i16(*bearing);
    }
    buf.into_vec()
}

fn segmented(format: u16, reserved: u16, groups: &[(u32, u32, u32)]) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.u16(format)
        .u16(reserved)
        .u32(16 + 12 * groups.len() as u32)
        .u32(0)
        .u32(groups.len() as u32);
    for (start, end, glyph) in groups {
        buf.u32(*start).u32(*end).u32(*glyph);
    }
    buf.into_vec()
}

/// A format 4 subtable with only the terminating 0xFFFF segment.
fn minimal_format4() -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.u16(4)
        .u16(24) // length
        .u16(0) // language
        .u16(2) // segCountX2
        .u16(2)
        .u16(0)
        .u16(0)
        .u16(0xFFFF) // endCode
        .u16(0) // reservedPad
        .u16(0xFFFF) // startCode
        .i16(1) // idDelta
        .u16(0); // idRangeOffset
    buf.into_vec()
}

fn search_params(num_tables: u16) -> (u16, u16, u16) {
    let mut entry_selector = 0u16;
    while (1u16 << (entry_selector + 1)) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);
    (search_range, entry_selector, range_shift)
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn directory_is_sorted_and_in_bounds() {
        let data = kana_font().build();
        let num_tables = u16::from_be_bytes([data[4], data[5]]) as usize;
        assert_eq!(num_tables, 8);
        let mut previous = [0u8; 4];
        for i in 0..num_tables {
            let record = 12 + i * 16;
            let tag: [u8; 4] = data[record..record + 4].try_into().unwrap();
            assert!(tag > previous, "table records must be sorted by tag");
            previous = tag;
            let offset = read_u32(&data, record + 8) as usize;
            let len = read_u32(&data, record + 12) as usize;
            assert!(offset + len <= data.len());
        }
    }

    #[test]
    fn collection_offsets_are_absolute() {
        let data = collection(&[kana_font(), kana_font().without(b"GSUB")]);
        assert_eq!(&data[..4], b"ttcf");
        assert_eq!(read_u32(&data, 8), 2);
        let second = read_u32(&data, 16) as usize;
        assert_eq!(read_u32(&data, second), TRUETYPE);
        let first_table = read_u32(&data, second + 12 + 8) as usize;
        assert!(first_table > second);
    }
}
