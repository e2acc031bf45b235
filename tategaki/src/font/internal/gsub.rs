//! Glyph substitution table, restricted to single substitution lookups.
//!
//! Vertical layout only needs the `vrt2`/`vert` features, which map a
//! glyph to its vertical presentation form one-to-one. Any other lookup
//! type reached through the selected feature is a hard error.

use super::{Bytes, ReadResult, TableRecord, Tag};
use crate::error::FontError;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

const LOOKUP_SINGLE: u16 = 1;
const NO_REQUIRED_FEATURE: u16 = 0xFFFF;

/// Glyph id to vertical alternate glyph id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerticalSubstitutionMap {
    map: FxHashMap<u16, u16>,
}

impl VerticalSubstitutionMap {
    /// Returns the vertical form of `glyph_id`, or `glyph_id` itself when
    /// the font has none.
    pub fn get(&self, glyph_id: u16) -> u16 {
        self.map.get(&glyph_id).copied().unwrap_or(glyph_id)
    }

    pub fn alternate(&self, glyph_id: u16) -> Option<u16> {
        self.map.get(&glyph_id).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

type SubstitutionKey = (Tag, Tag, Tag);

/// Offsets of the three GSUB lists plus a cache of resolved maps keyed by
/// (script, language system, feature).
#[derive(Debug)]
pub struct GlyphSubstitution {
    script_list: usize,
    feature_list: usize,
    lookup_list: usize,
    cache: Mutex<FxHashMap<SubstitutionKey, Option<Arc<VerticalSubstitutionMap>>>>,
}

impl GlyphSubstitution {
    pub fn new(data: &[u8], gsub: TableRecord) -> ReadResult<Self> {
        let base = gsub.offset as usize;
        let b = Bytes::new(data);
        Ok(Self {
            script_list: b.read_offset16(base + 4, base)?,
            feature_list: b.read_offset16(base + 6, base)?,
            lookup_list: b.read_offset16(base + 8, base)?,
            cache: Mutex::new(FxHashMap::default()),
        })
    }

    /// Collects the single substitutions reachable from `feature` under
    /// `script`/`language`. Returns `None` when any of the three is
    /// missing; the language system must match exactly, the default
    /// language system is not consulted.
    pub fn single_substitution(
        &self,
        data: &[u8],
        script: Tag,
        language: Tag,
        feature: Tag,
    ) -> ReadResult<Option<Arc<VerticalSubstitutionMap>>> {
        let key = (script, language, feature);
        if let Some(cached) = self.cache.lock().get(&key) {
            return Ok(cached.clone());
        }
        let result = self.build(data, script, language, feature)?.map(Arc::new);
        match &result {
            Some(map) => tracing::debug!(
                "GSUB {script}/{language}/{feature}: {} substitutions",
                map.len()
            ),
            None => tracing::debug!("GSUB {script}/{language}/{feature}: not present"),
        }
        self.cache.lock().insert(key, result.clone());
        Ok(result)
    }

    fn build(
        &self,
        data: &[u8],
        script: Tag,
        language: Tag,
        feature: Tag,
    ) -> ReadResult<Option<VerticalSubstitutionMap>> {
        let b = Bytes::new(data);
        let Some(script_table) = find_tagged(b, self.script_list, 2, script)? else {
            return Ok(None);
        };
        let Some(lang_sys) = find_tagged(b, script_table, 4, language)? else {
            return Ok(None);
        };
        let Some(feature_table) = self.find_feature(b, lang_sys, feature)? else {
            return Ok(None);
        };

        let mut map = FxHashMap::default();
        let lookup_count = b.read_u16(feature_table + 2)?;
        for i in 0..lookup_count as usize {
            let lookup_index = b.read_u16(feature_table + 4 + 2 * i)? as usize;
            let lookup = b.read_offset16(self.lookup_list + 2 + 2 * lookup_index, self.lookup_list)?;
            read_single_lookup(b, lookup, &mut map)?;
        }
        Ok(Some(VerticalSubstitutionMap { map }))
    }

    /// Resolves `feature` among the features referenced by a language
    /// system, the required feature first.
    fn find_feature(&self, b: Bytes<'_>, lang_sys: usize, feature: Tag) -> ReadResult<Option<usize>> {
        let required = b.read_u16(lang_sys + 2)?;
        let count = b.read_u16(lang_sys + 4)? as usize;
        let mut indices = Vec::with_capacity(count + 1);
        if required != NO_REQUIRED_FEATURE {
            indices.push(required);
        }
        for i in 0..count {
            indices.push(b.read_u16(lang_sys + 6 + 2 * i)?);
        }
        for index in indices {
            let record = self.feature_list + 2 + 6 * index as usize;
            if b.read_tag(record)? == feature {
                return Ok(Some(b.read_offset16(record + 4, self.feature_list)?));
            }
        }
        Ok(None)
    }
}

/// Scans `count` (tag, offset16) records starting at `list + records_at`
/// (the count lives just before the records) and returns the absolute
/// offset of the matching entry.
fn find_tagged(b: Bytes<'_>, list: usize, records_at: usize, tag: Tag) -> ReadResult<Option<usize>> {
    let count = b.read_u16(list + records_at - 2)? as usize;
    for i in 0..count {
        let record = list + records_at + 6 * i;
        if b.read_tag(record)? == tag {
            return Ok(Some(b.read_offset16(record + 4, list)?));
        }
    }
    Ok(None)
}

fn read_single_lookup(b: Bytes<'_>, lookup: usize, map: &mut FxHashMap<u16, u16>) -> ReadResult<()> {
    let lookup_type = b.read_u16(lookup)?;
    if lookup_type != LOOKUP_SINGLE {
        return Err(FontError::UnsupportedLookupType(lookup_type));
    }
    let subtable_count = b.read_u16(lookup + 4)? as usize;
    for i in 0..subtable_count {
        let subtable = b.read_offset16(lookup + 6 + 2 * i, lookup)?;
        match b.read_u16(subtable)? {
            2 => {
                let coverage = read_coverage(b, b.read_offset16(subtable + 2, subtable)?)?;
                let glyph_count = b.read_u16(subtable + 4)? as usize;
                for (index, glyph) in coverage.into_iter().enumerate().take(glyph_count) {
                    map.insert(glyph, b.read_u16(subtable + 6 + 2 * index)?);
                }
            }
            format => return Err(FontError::UnsupportedSubstFormat(format)),
        }
    }
    Ok(())
}

/// Expands a coverage table into glyph ids ordered by coverage index.
fn read_coverage(b: Bytes<'_>, coverage: usize) -> ReadResult<Vec<u16>> {
    match b.read_u16(coverage)? {
        1 => {
            let count = b.read_u16(coverage + 2)? as usize;
            (0..count)
                .map(|i| b.read_u16(coverage + 4 + 2 * i))
                .collect()
        }
        2 => {
            let range_count = b.read_u16(coverage + 2)? as usize;
            let mut glyphs = Vec::new();
            for i in 0..range_count {
                let record = coverage + 4 + 6 * i;
                let start = b.read_u16(record)?;
                let end = b.read_u16(record + 2)?;
                let start_index = b.read_u16(record + 4)? as usize;
                if end < start {
                    continue;
                }
                let needed = start_index + (end - start) as usize + 1;
                if glyphs.len() < needed {
                    glyphs.resize(needed, 0);
                }
                for gid in start..=end {
                    glyphs[start_index + (gid - start) as usize] = gid;
                }
            }
            Ok(glyphs)
        }
        format => Err(FontError::UnsupportedCoverageFormat(format)),
    }
}
