//! Shaping collaborators.
//!
//! Rotated runs are set as ordinary horizontal text, so their advances
//! come from a shaper rather than from glyph-level metrics. A
//! [`TextShaper`] returns one [`ShapedCluster`] per grapheme cluster.

use super::{FontId, FontTableSet, SharedData};
use std::ops::Range;
use std::sync::Arc;
use swash::shape::{Direction, ShapeContext};
use swash::FontRef;
use unicode_segmentation::UnicodeSegmentation;

/// A shaped grapheme cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapedCluster {
    /// Byte range in the shaped text.
    pub range: Range<usize>,
    /// First glyph of the cluster.
    pub glyph_id: u16,
    /// Font that supplied the glyph.
    pub font: FontId,
    /// Total horizontal advance of the cluster in pixels.
    pub advance: f32,
}

pub trait TextShaper {
    /// Shapes `text` horizontally at `font_size`, returning clusters in
    /// logical order.
    fn shape(&mut self, text: &str, font_size: f32) -> Vec<ShapedCluster>;

    /// Per-character advances of `text`: each cluster's advance goes to
    /// its first character and the cluster's other characters get zero.
    fn char_advances(&mut self, text: &str, font_size: f32) -> Vec<f32> {
        let clusters = self.shape(text, font_size);
        let mut advances = Vec::with_capacity(text.chars().count());
        let mut clusters = clusters.iter().peekable();
        for (offset, _) in text.char_indices() {
            while clusters.next_if(|c| c.range.end <= offset).is_some() {}
            match clusters.peek() {
                Some(cluster) if cluster.range.start == offset => {
                    advances.push(cluster.advance)
                }
                _ => advances.push(0.0),
            }
        }
        advances
    }
}

/// Shaper backed by swash.
pub struct SwashShaper {
    context: ShapeContext,
    data: SharedData,
    index: u32,
    id: FontId,
}

impl SwashShaper {
    pub fn new(font: &FontTableSet) -> Self {
        Self {
            context: ShapeContext::new(),
            data: font.data().clone(),
            index: font.index(),
            id: font.id(),
        }
    }
}

impl TextShaper for SwashShaper {
    fn shape(&mut self, text: &str, font_size: f32) -> Vec<ShapedCluster> {
        let Some(font) = FontRef::from_index(self.data.as_bytes(), self.index as usize) else {
            tracing::warn!("swash rejected font {:?}, shaping skipped", self.id);
            return Vec::new();
        };
        let mut shaper = self
            .context
            .builder(font)
            .direction(Direction::LeftToRight)
            .size(font_size)
            .build();
        shaper.add_str(text);

        let id = self.id;
        let mut clusters = Vec::new();
        shaper.shape_with(|cluster| {
            let start = cluster.source.start as usize;
            let end = cluster.source.end as usize;
            let advance = cluster.glyphs.iter().map(|g| g.advance).sum();
            let glyph_id = cluster.glyphs.first().map(|g| g.id).unwrap_or(0);
            clusters.push(ShapedCluster {
                range: start..end,
                glyph_id,
                font: id,
                advance,
            });
        });
        merge_graphemes(text, clusters)
    }
}

/// Shaper that sets each grapheme with the font's own `cmap` and `hmtx`,
/// without any layout features. Deterministic, suited to height-only
/// passes and tests.
pub struct MetricsShaper {
    font: Arc<FontTableSet>,
}

impl MetricsShaper {
    pub fn new(font: Arc<FontTableSet>) -> Self {
        Self { font }
    }
}

impl TextShaper for MetricsShaper {
    fn shape(&mut self, text: &str, font_size: f32) -> Vec<ShapedCluster> {
        let hmtx = match self.font.horizontal_metrics() {
            Ok(hmtx) => hmtx,
            Err(err) => {
                tracing::warn!("unreadable hmtx: {err}");
                None
            }
        };
        text.grapheme_indices(true)
            .map(|(start, grapheme)| {
                let mut glyph_id = None;
                let mut advance = 0.0;
                for c in grapheme.chars() {
                    let gid = self.font.glyph_id(c).unwrap_or(0);
                    glyph_id.get_or_insert(gid);
                    if let Some(hmtx) = &hmtx {
                        advance += hmtx.advance(gid) * font_size;
                    }
                }
                ShapedCluster {
                    range: start..start + grapheme.len(),
                    glyph_id: glyph_id.unwrap_or(0),
                    font: self.font.id(),
                    advance,
                }
            })
            .collect()
    }
}

/// Joins shaper clusters that fall inside one grapheme cluster, so a
/// cluster never splits a user-perceived character.
fn merge_graphemes(text: &str, clusters: Vec<ShapedCluster>) -> Vec<ShapedCluster> {
    let boundaries: Vec<usize> = text
        .grapheme_indices(true)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let mut merged: Vec<ShapedCluster> = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        if let Some(last) = merged.last_mut() {
            if boundaries.binary_search(&cluster.range.start).is_err()
                && cluster.range.start >= last.range.start
            {
                last.range.end = last.range.end.max(cluster.range.end);
                last.advance += cluster.advance;
                continue;
            }
        }
        merged.push(cluster);
    }
    merged
}
