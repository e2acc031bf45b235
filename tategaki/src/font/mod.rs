//! Font binary model: shared font bytes, the parsed table directory and
//! lazily built views over the tables vertical layout reads.

pub mod internal;
mod shaper;
mod tag;

pub use internal::cmap::CharToGlyphMap;
pub use internal::gsub::VerticalSubstitutionMap;
pub use shaper::{MetricsShaper, ShapedCluster, SwashShaper, TextShaper};
pub use tag::{raw_tag, RawTag, Tag};

use crate::error::FontError;
use internal::{
    gsub::GlyphSubstitution, head::Head, head::MetricsHeader, read_table_directory,
    xmtx::MetricsTable, TableRecord, CMAP, GSUB, HEAD, HHEA, HMTX, VHEA, VMTX,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Shared font data.
#[derive(Clone)]
pub struct SharedData {
    inner: Arc<Inner>,
}

enum Inner {
    Memory(Vec<u8>),
    Mapped(memmap2::Mmap),
}

impl SharedData {
    /// Creates shared data from the specified bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(Inner::Memory(data)),
        }
    }

    /// Creates shared data from the specified path, optionally memory
    /// mapping the file.
    pub fn from_file(path: impl AsRef<Path>, mmap: bool) -> Result<Self, io::Error> {
        let path = path.as_ref();
        let inner = Arc::new(if mmap {
            let file = std::fs::File::open(path)?;
            let map = unsafe { memmap2::Mmap::map(&file)? };
            Inner::Mapped(map)
        } else {
            Inner::Memory(std::fs::read(path)?)
        });
        Ok(Self { inner })
    }

    /// Returns the underlying bytes of the data.
    pub fn as_bytes(&self) -> &[u8] {
        match &*self.inner {
            Inner::Memory(data) => data,
            Inner::Mapped(mmap) => mmap,
        }
    }

    /// Returns the number of strong references to the data.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl std::fmt::Debug for SharedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedData")
            .field("len", &self.as_bytes().len())
            .finish()
    }
}

/// Stable font identity: a content hash of the font bytes, seeded with
/// the collection index. Two loads of the same face compare equal.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct FontId(u64);

impl FontId {
    pub fn from_content(data: &[u8], index: u32) -> Self {
        Self(twox_hash::XxHash64::oneshot(index as u64, data))
    }

    /// Wraps an externally assigned identifier, for shapers or tests that
    /// name fonts without loading them.
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

/// Ascender/descender pair from `hhea` or `vhea`, in em units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineMetrics {
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

impl LineMetrics {
    /// Distance from ascender to descender.
    pub fn extent(&self) -> f32 {
        self.ascender - self.descender
    }
}

/// Per-glyph metrics accessor borrowing the font buffer. Values are in em
/// units (font units divided by units per em).
#[derive(Copy, Clone)]
pub struct GlyphMetrics<'a> {
    data: &'a [u8],
    table: MetricsTable,
    scale: f32,
}

impl<'a> GlyphMetrics<'a> {
    pub fn advance(&self, glyph_id: u16) -> f32 {
        self.table.advance(self.data, glyph_id) as f32 * self.scale
    }

    /// Left side bearing for `hmtx`, top side bearing for `vmtx`.
    pub fn side_bearing(&self, glyph_id: u16) -> f32 {
        self.table.side_bearing(self.data, glyph_id) as f32 * self.scale
    }

    pub fn long_metric_count(&self) -> u16 {
        self.table.long_metric_count()
    }
}

/// Load-time options for a [`FontTableSet`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Copy cmap groups out of the buffer for faster repeated lookups.
    pub flatten_cmap: bool,
}

type Lazy<T> = OnceLock<Result<T, FontError>>;

/// A font's tables. The directory and `head` are parsed eagerly; every
/// other view is built on first access and kept for the lifetime of the
/// set.
pub struct FontTableSet {
    id: FontId,
    index: u32,
    data: SharedData,
    tables: FxHashMap<Tag, TableRecord>,
    units_per_em: u16,
    options: LoadOptions,
    horizontal_header: Lazy<Option<LineMetrics>>,
    vertical_header: Lazy<Option<LineMetrics>>,
    horizontal_metrics: Lazy<Option<MetricsTable>>,
    vertical_metrics: Lazy<Option<MetricsTable>>,
    char_map: Lazy<CharToGlyphMap>,
    substitution: Lazy<Option<GlyphSubstitution>>,
}

impl FontTableSet {
    pub fn new(data: SharedData, index: u32) -> Result<Self, FontError> {
        Self::with_options(data, index, LoadOptions::default())
    }

    pub fn with_options(
        data: SharedData,
        index: u32,
        options: LoadOptions,
    ) -> Result<Self, FontError> {
        let bytes = data.as_bytes();
        let tables: FxHashMap<Tag, TableRecord> = read_table_directory(bytes, index)?
            .into_iter()
            .map(|record| (record.tag, record))
            .collect();
        let head = tables
            .get(&HEAD)
            .ok_or(FontError::MissingTable(HEAD))?
            .data(bytes)?;
        let units_per_em = Head::new(head).units_per_em()?;
        if !(16..=16384).contains(&units_per_em) {
            return Err(FontError::InvalidUnitsPerEm(units_per_em));
        }
        let id = FontId::from_content(bytes, index);
        tracing::debug!(
            "font {id:?} index {index}: {} tables, {units_per_em} units per em",
            tables.len()
        );
        Ok(Self {
            id,
            index,
            data,
            tables,
            units_per_em,
            options,
            horizontal_header: OnceLock::new(),
            vertical_header: OnceLock::new(),
            horizontal_metrics: OnceLock::new(),
            vertical_metrics: OnceLock::new(),
            char_map: OnceLock::new(),
            substitution: OnceLock::new(),
        })
    }

    /// Loads the font at `index` from a file.
    pub fn from_file(path: impl AsRef<Path>, index: u32, mmap: bool) -> io::Result<Self> {
        let data = SharedData::from_file(path, mmap)?;
        Self::new(data, index).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    pub fn id(&self) -> FontId {
        self.id
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn data(&self) -> &SharedData {
        &self.data
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn has_table(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    pub fn table_record(&self, tag: Tag) -> Option<TableRecord> {
        self.tables.get(&tag).copied()
    }

    fn scale(&self) -> f32 {
        1.0 / self.units_per_em as f32
    }

    fn header(&self, tag: Tag) -> Result<Option<LineMetrics>, FontError> {
        let Some(record) = self.table_record(tag) else {
            return Ok(None);
        };
        let header = MetricsHeader::new(record.data(self.data.as_bytes())?);
        let scale = self.scale();
        Ok(Some(LineMetrics {
            ascender: header.ascender()? as f32 * scale,
            descender: header.descender()? as f32 * scale,
            line_gap: header.line_gap()? as f32 * scale,
        }))
    }

    fn metrics(&self, header: Tag, table: Tag) -> Result<Option<MetricsTable>, FontError> {
        let (Some(header), Some(table)) = (self.table_record(header), self.table_record(table))
        else {
            return Ok(None);
        };
        let bytes = self.data.as_bytes();
        let count = MetricsHeader::new(header.data(bytes)?).num_long_metrics()?;
        MetricsTable::new(bytes, table, count).map(Some)
    }

    /// `hhea` ascender/descender, or `None` without `hhea`.
    pub fn horizontal_header(&self) -> Result<Option<LineMetrics>, FontError> {
        self.horizontal_header
            .get_or_init(|| self.header(HHEA))
            .clone()
    }

    /// `vhea` ascender/descender, or `None` without `vhea`.
    pub fn vertical_header(&self) -> Result<Option<LineMetrics>, FontError> {
        self.vertical_header.get_or_init(|| self.header(VHEA)).clone()
    }

    /// Horizontal advances and left side bearings. `None` unless both
    /// `hhea` and `hmtx` are present.
    pub fn horizontal_metrics(&self) -> Result<Option<GlyphMetrics<'_>>, FontError> {
        let table = self
            .horizontal_metrics
            .get_or_init(|| self.metrics(HHEA, HMTX))
            .clone()?;
        Ok(table.map(|table| self.glyph_metrics(table)))
    }

    /// Vertical advances and top side bearings. `None` unless both `vhea`
    /// and `vmtx` are present; callers fall back to horizontal-only
    /// layout.
    pub fn vertical_metrics(&self) -> Result<Option<GlyphMetrics<'_>>, FontError> {
        let table = self
            .vertical_metrics
            .get_or_init(|| self.metrics(VHEA, VMTX))
            .clone()?;
        Ok(table.map(|table| self.glyph_metrics(table)))
    }

    fn glyph_metrics(&self, table: MetricsTable) -> GlyphMetrics<'_> {
        GlyphMetrics {
            data: self.data.as_bytes(),
            table,
            scale: self.scale(),
        }
    }

    /// The format 12 character map. Fonts without one cannot be laid out.
    pub fn char_map(&self) -> Result<&CharToGlyphMap, FontError> {
        self.char_map
            .get_or_init(|| {
                let record = self.table_record(CMAP).ok_or(FontError::MissingTable(CMAP))?;
                CharToGlyphMap::new(self.data.as_bytes(), record, self.options.flatten_cmap)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Maps a character to a glyph id, 0 when unmapped.
    pub fn glyph_id(&self, c: char) -> Result<u16, FontError> {
        Ok(self.char_map()?.map(self.data.as_bytes(), c as u32))
    }

    /// Single substitutions for the (script, language, feature) triple.
    /// `None` when the font has no `GSUB` or the triple is not present.
    pub fn vertical_substitution(
        &self,
        script: Tag,
        language: Tag,
        feature: Tag,
    ) -> Result<Option<Arc<VerticalSubstitutionMap>>, FontError> {
        let gsub = self
            .substitution
            .get_or_init(|| {
                self.table_record(GSUB)
                    .map(|record| GlyphSubstitution::new(self.data.as_bytes(), record))
                    .transpose()
            })
            .as_ref()
            .map_err(Clone::clone)?;
        match gsub {
            Some(gsub) => {
                gsub.single_substitution(self.data.as_bytes(), script, language, feature)
            }
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for FontTableSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontTableSet")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .field("tables", &self.tables.len())
            .finish()
    }
}

/// Session cache of parsed fonts, keyed by [`FontId`].
#[derive(Default)]
pub struct FontTableCache {
    fonts: RwLock<FxHashMap<FontId, Arc<FontTableSet>>>,
    options: LoadOptions,
}

impl FontTableCache {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            fonts: RwLock::new(FxHashMap::default()),
            options,
        }
    }

    /// Returns the cached table set for this font, parsing it on first
    /// use.
    pub fn get_or_load(&self, data: SharedData, index: u32) -> Result<Arc<FontTableSet>, FontError> {
        let id = FontId::from_content(data.as_bytes(), index);
        if let Some(font) = self.fonts.read().get(&id) {
            return Ok(font.clone());
        }
        let font = Arc::new(FontTableSet::with_options(data, index, self.options)?);
        Ok(self.fonts.write().entry(id).or_insert(font).clone())
    }

    pub fn get(&self, id: FontId) -> Option<Arc<FontTableSet>> {
        self.fonts.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.fonts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.read().is_empty()
    }
}
