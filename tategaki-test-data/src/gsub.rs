//! GSUB table assembly.

use crate::BeBuffer;

#[derive(Clone, Debug)]
pub struct GsubTable {
    pub scripts: Vec<ScriptRecord>,
    pub features: Vec<FeatureRecord>,
    pub lookups: Vec<LookupRecord>,
}

#[derive(Clone, Debug)]
pub struct ScriptRecord {
    pub tag: [u8; 4],
    /// Language systems: tag and indices into the feature list.
    pub languages: Vec<([u8; 4], Vec<u16>)>,
}

#[derive(Clone, Debug)]
pub struct FeatureRecord {
    pub tag: [u8; 4],
    pub lookups: Vec<u16>,
}

#[derive(Clone, Debug)]
pub struct LookupRecord {
    pub lookup_type: u16,
    pub subtables: Vec<SingleSubtable>,
}

#[derive(Clone, Debug)]
pub enum SingleSubtable {
    /// Single substitution, format 2.
    Glyphs {
        coverage: CoverageTable,
        substitutes: Vec<u16>,
    },
    /// Single substitution, format 1.
    Delta { coverage: CoverageTable, delta: i16 },
}

#[derive(Clone, Debug)]
pub enum CoverageTable {
    Glyphs(Vec<u16>),
    /// (start, end, start coverage index)
    Ranges(Vec<(u16, u16, u16)>),
    /// A coverage table with an arbitrary format and no entries.
    Format(u16),
}

impl GsubTable {
    /// `kana`/`JAN `/`vrt2` mapping each pair's source glyph to its
    /// vertical form, next to a `latn` script and a `vert` feature that
    /// map the same glyphs elsewhere.
    pub fn vertical_forms(pairs: &[(u16, u16)]) -> Self {
        let mut sorted = pairs.to_vec();
        sorted.sort_by_key(|p| p.0);
        let glyphs: Vec<u16> = sorted.iter().map(|p| p.0).collect();
        let substitutes: Vec<u16> = sorted.iter().map(|p| p.1).collect();
        GsubTable {
            scripts: vec![
                ScriptRecord {
                    tag: *b"kana",
                    languages: vec![(*b"JAN ", vec![1]), (*b"ZHS ", vec![0])],
                },
                ScriptRecord {
                    tag: *b"latn",
                    languages: vec![(*b"TRK ", vec![0])],
                },
            ],
            features: vec![
                FeatureRecord {
                    tag: *b"vert",
                    lookups: vec![0],
                },
                FeatureRecord {
                    tag: *b"vrt2",
                    lookups: vec![1],
                },
            ],
            lookups: vec![
                LookupRecord {
                    lookup_type: 1,
                    subtables: vec![SingleSubtable::Glyphs {
                        coverage: CoverageTable::Glyphs(glyphs.clone()),
                        substitutes: glyphs.iter().map(|_| 1).collect(),
                    }],
                },
                LookupRecord {
                    lookup_type: 1,
                    subtables: vec![SingleSubtable::Glyphs {
                        coverage: CoverageTable::Glyphs(glyphs),
                        substitutes,
                    }],
                },
            ],
        }
    }

    /// A single `kana`/`JAN `/`vrt2` lookup with the given shape.
    pub fn single_lookup(lookup_type: u16, subtables: Vec<SingleSubtable>) -> Self {
        GsubTable {
            scripts: vec![ScriptRecord {
                tag: *b"kana",
                languages: vec![(*b"JAN ", vec![0])],
            }],
            features: vec![FeatureRecord {
                tag: *b"vrt2",
                lookups: vec![0],
            }],
            lookups: vec![LookupRecord {
                lookup_type,
                subtables,
            }],
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let scripts = self.script_list();
        let features = self.feature_list();
        let lookups = self.lookup_list();
        let mut buf = BeBuffer::new();
        let script_offset = 10u16;
        let feature_offset = script_offset + scripts.len() as u16;
        let lookup_offset = feature_offset + features.len() as u16;
        buf.u16(1)
            .u16(0)
            .u16(script_offset)
            .u16(feature_offset)
            .u16(lookup_offset)
            .bytes(&scripts)
            .bytes(&features)
            .bytes(&lookups);
        buf.into_vec()
    }

    fn script_list(&self) -> Vec<u8> {
        let bodies: Vec<Vec<u8>> = self.scripts.iter().map(script).collect();
        let tags: Vec<[u8; 4]> = self.scripts.iter().map(|s| s.tag).collect();
        tagged_list(&tags, &bodies)
    }

    fn feature_list(&self) -> Vec<u8> {
        let bodies: Vec<Vec<u8>> = self
            .features
            .iter()
            .map(|feature| {
                let mut buf = BeBuffer::new();
                buf.u16(0).u16(feature.lookups.len() as u16);
                for index in &feature.lookups {
                    buf.u16(*index);
                }
                buf.into_vec()
            })
            .collect();
        let tags: Vec<[u8; 4]> = self.features.iter().map(|f| f.tag).collect();
        tagged_list(&tags, &bodies)
    }

    fn lookup_list(&self) -> Vec<u8> {
        let bodies: Vec<Vec<u8>> = self.lookups.iter().map(lookup).collect();
        offset_list(&bodies)
    }
}

fn script(record: &ScriptRecord) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.u16(0).u16(record.languages.len() as u16);
    let mut offset = 4 + 6 * record.languages.len();
    for (tag, indices) in &record.languages {
        buf.tag(tag).u16(offset as u16);
        offset += 6 + 2 * indices.len();
    }
    for (_, indices) in &record.languages {
        buf.u16(0).u16(0xFFFF).u16(indices.len() as u16);
        for index in indices {
            buf.u16(*index);
        }
    }
    buf.into_vec()
}

fn lookup(record: &LookupRecord) -> Vec<u8> {
    let bodies: Vec<Vec<u8>> = record.subtables.iter().map(subtable).collect();
    let mut buf = BeBuffer::new();
    buf.u16(record.lookup_type).u16(0).u16(bodies.len() as u16);
    let mut offset = 6 + 2 * bodies.len();
    for body in &bodies {
        buf.u16(offset as u16);
        offset += body.len();
    }
    for body in &bodies {
        buf.bytes(body);
    }
    buf.into_vec()
}

fn subtable(record: &SingleSubtable) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    match record {
        SingleSubtable::Glyphs {
            coverage: cov,
            substitutes,
        } => {
            let coverage_offset = 6 + 2 * substitutes.len();
            buf.u16(2)
                .u16(coverage_offset as u16)
                .u16(substitutes.len() as u16);
            for glyph in substitutes {
                buf.u16(*glyph);
            }
            buf.bytes(&coverage(cov));
        }
        SingleSubtable::Delta {
            coverage: cov,
            delta,
        } => {
            buf.u16(1).u16(6).i16(*delta).bytes(&coverage(cov));
        }
    }
    buf.into_vec()
}

fn coverage(record: &CoverageTable) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    match record {
        CoverageTable::Glyphs(glyphs) => {
            buf.u16(1).u16(glyphs.len() as u16);
            for glyph in glyphs {
                buf.u16(*glyph);
            }
        }
        CoverageTable::Ranges(ranges) => {
            buf.u16(2).u16(ranges.len() as u16);
            for (start, end, index) in ranges {
                buf.u16(*start).u16(*end).u16(*index);
            }
        }
        CoverageTable::Format(format) => {
            buf.u16(*format).u16(0);
        }
    }
    buf.into_vec()
}

/// Count, (tag, offset) records, then the bodies.
fn tagged_list(tags: &[[u8; 4]], bodies: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.u16(bodies.len() as u16);
    let mut offset = 2 + 6 * bodies.len();
    for (tag, body) in tags.iter().zip(bodies) {
        buf.tag(tag).u16(offset as u16);
        offset += body.len();
    }
    for body in bodies {
        buf.bytes(body);
    }
    buf.into_vec()
}

/// Count, offsets, then the bodies.
fn offset_list(bodies: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.u16(bodies.len() as u16);
    let mut offset = 2 + 2 * bodies.len();
    for body in bodies {
        buf.u16(offset as u16);
        offset += body.len();
    }
    for body in bodies {
        buf.bytes(body);
    }
    buf.into_vec()
}
