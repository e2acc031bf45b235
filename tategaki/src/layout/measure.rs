// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Turns orientation runs into measured runs.

use super::orientation::{analyze, DrawOrientationRun, TextOrientation};
use super::run::{
    FontExtents, GlyphRef, IntrinsicVerticalLayout, RotateRun, RotatedChar, RubyRun,
    TateChuYokoRun, UprightChar, UprightRun, VerticalLayoutRun,
};
use super::span::Spanned;
use crate::config::SubstitutionConfig;
use crate::error::Result;
use crate::font::{FontTableSet, TextShaper, VerticalSubstitutionMap};
use std::ops::Range;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Measures text against one font with vertical metrics.
#[derive(Debug)]
pub struct VerticalTextMeasure {
    font: Arc<FontTableSet>,
    substitution: Option<Arc<VerticalSubstitutionMap>>,
}

impl VerticalTextMeasure {
    /// Prepares measurement with `font`. Fails if the font has no usable
    /// format 12 `cmap` or its metrics tables are malformed.
    pub fn new(font: Arc<FontTableSet>, substitution: &SubstitutionConfig) -> Result<Self> {
        font.char_map()?;
        font.horizontal_metrics()?;
        if font.horizontal_header()?.is_none() {
            tracing::warn!(
                "font {:?} has no hhea, rotated runs use half the font size as extents",
                font.id()
            );
        }
        if font.vertical_metrics()?.is_none() {
            tracing::warn!(
                "font {:?} has no vertical metrics, upright advances use the line height",
                font.id()
            );
        }
        let substitution = font.vertical_substitution(
            substitution.script,
            substitution.language,
            substitution.feature,
        )?;
        if substitution.is_none() {
            tracing::debug!("font {:?} has no vertical substitutions", font.id());
        }
        Ok(Self { font, substitution })
    }

    pub fn font(&self) -> &Arc<FontTableSet> {
        &self.font
    }

    pub fn substitution(&self) -> Option<&VerticalSubstitutionMap> {
        self.substitution.as_deref()
    }

    /// Analyzes and measures `start..end` of `text`.
    pub fn layout_text<T: Spanned + ?Sized>(
        &self,
        text: &T,
        start: usize,
        end: usize,
        orientation: TextOrientation,
        font_size: f32,
        shaper: &mut dyn TextShaper,
    ) -> Result<IntrinsicVerticalLayout> {
        let runs = analyze(text, start, end, orientation)?;
        self.layout_runs(text.text(), start..end, &runs, font_size, shaper)
    }

    /// Total column height of `start..end` of `text`, without line
    /// breaking.
    pub fn height<T: Spanned + ?Sized>(
        &self,
        text: &T,
        start: usize,
        end: usize,
        orientation: TextOrientation,
        font_size: f32,
        shaper: &mut dyn TextShaper,
    ) -> Result<f32> {
        Ok(self
            .layout_text(text, start, end, orientation, font_size, shaper)?
            .height())
    }

    fn layout_runs(
        &self,
        text: &str,
        range: Range<usize>,
        runs: &[DrawOrientationRun],
        font_size: f32,
        shaper: &mut dyn TextShaper,
    ) -> Result<IntrinsicVerticalLayout> {
        let mut measured = Vec::with_capacity(runs.len());
        for run in runs {
            measured.push(self.measure_run(text, run, font_size, shaper)?);
        }
        tracing::trace!("measured {} runs over {:?}", measured.len(), range);
        Ok(IntrinsicVerticalLayout::new(
            range,
            self.vertical_extents(font_size)?,
            measured,
            font_size,
        ))
    }

    fn measure_run(
        &self,
        text: &str,
        run: &DrawOrientationRun,
        font_size: f32,
        shaper: &mut dyn TextShaper,
    ) -> Result<VerticalLayoutRun> {
        let run = match run {
            DrawOrientationRun::Upright(range) => {
                VerticalLayoutRun::Upright(self.upright(text, range.clone(), font_size)?)
            }
            DrawOrientationRun::Rotate(range) => {
                VerticalLayoutRun::Rotate(self.rotate(text, range.clone(), font_size, shaper)?)
            }
            DrawOrientationRun::TateChuYoko(range) => VerticalLayoutRun::TateChuYoko(
                self.tate_chu_yoko(text, range.clone(), font_size, shaper)?,
            ),
            DrawOrientationRun::Ruby(ruby) => {
                let content =
                    self.layout_runs(text, ruby.range.clone(), &ruby.content, font_size, shaper)?;
                let ruby_text = ruby.ruby.text.as_str();
                let annotation = self.layout_runs(
                    ruby_text,
                    0..ruby_text.len(),
                    &ruby.ruby_runs,
                    font_size * ruby.ruby.text_scale,
                    shaper,
                )?;
                VerticalLayoutRun::Ruby(RubyRun::new(
                    ruby.range.clone(),
                    content,
                    annotation,
                    ruby.ruby.clone(),
                    font_size,
                ))
            }
        };
        Ok(run)
    }

    fn upright(&self, text: &str, range: Range<usize>, font_size: f32) -> Result<UprightRun> {
        let hmtx = self.font.horizontal_metrics()?;
        let vmtx = self.font.vertical_metrics()?;
        let fallback_advance = self.line_height(font_size)?;
        let segment = &text[range.clone()];
        let clusters = cluster_starts(segment);

        let mut chars = Vec::with_capacity(segment.len());
        for (offset, c) in segment.char_indices() {
            let cluster_start = clusters.binary_search(&offset).is_ok();
            let offset = range.start + offset;
            let glyph_id = self.font.glyph_id(c)?;
            if glyph_id == 0 {
                chars.push(UprightChar {
                    offset,
                    cluster_start,
                    glyph: None,
                    vertical_advance: 0.0,
                    top_side_bearing: 0.0,
                    horizontal_advance: 0.0,
                });
                continue;
            }
            let glyph_id = match &self.substitution {
                Some(map) => map.get(glyph_id),
                None => glyph_id,
            };
            let horizontal_advance = hmtx.map_or(font_size, |m| m.advance(glyph_id) * font_size);
            let (vertical_advance, top_side_bearing) = match &vmtx {
                Some(m) => (
                    m.advance(glyph_id) * font_size,
                    m.side_bearing(glyph_id) * font_size,
                ),
                None => (fallback_advance, 0.0),
            };
            chars.push(UprightChar {
                offset,
                cluster_start,
                glyph: Some(GlyphRef {
                    font: self.font.id(),
                    id: glyph_id,
                }),
                vertical_advance,
                top_side_bearing,
                horizontal_advance,
            });
        }
        Ok(UprightRun::new(range, chars, font_size))
    }

    fn rotate(
        &self,
        text: &str,
        range: Range<usize>,
        font_size: f32,
        shaper: &mut dyn TextShaper,
    ) -> Result<RotateRun> {
        let segment = &text[range.clone()];
        let clusters = cluster_starts(segment);
        let mut advances = shaper.char_advances(segment, font_size);
        let count = segment.chars().count();
        if advances.len() != count {
            tracing::warn!(
                "shaper returned {} advances for {} characters",
                advances.len(),
                count
            );
            advances.resize(count, 0.0);
        }
        let chars = segment
            .char_indices()
            .zip(advances)
            .map(|((offset, _), advance)| RotatedChar {
                offset: range.start + offset,
                cluster_start: clusters.binary_search(&offset).is_ok(),
                advance,
            })
            .collect();
        Ok(RotateRun::new(
            range,
            chars,
            self.horizontal_extents(font_size)?,
            self.font.id(),
            font_size,
        ))
    }

    fn tate_chu_yoko(
        &self,
        text: &str,
        range: Range<usize>,
        font_size: f32,
        shaper: &mut dyn TextShaper,
    ) -> Result<TateChuYokoRun> {
        let width = shaper
            .shape(&text[range.clone()], font_size)
            .iter()
            .map(|cluster| cluster.advance)
            .sum();
        Ok(TateChuYokoRun::new(
            range,
            width,
            self.horizontal_extents(font_size)?,
            self.font.id(),
            font_size,
        ))
    }

    /// Horizontal ascent/descent from `hhea`, or half the font size each
    /// way without it.
    pub fn horizontal_extents(&self, font_size: f32) -> Result<FontExtents> {
        Ok(match self.font.horizontal_header()? {
            Some(hhea) => FontExtents {
                ascent: -hhea.ascender * font_size,
                descent: -hhea.descender * font_size,
            },
            None => half_extents(font_size),
        })
    }

    /// Vertical ascent/descent from `vhea`, or half the font size each way
    /// without it.
    pub fn vertical_extents(&self, font_size: f32) -> Result<FontExtents> {
        Ok(match self.font.vertical_header()? {
            Some(vhea) => FontExtents {
                ascent: -vhea.ascender * font_size,
                descent: -vhea.descender * font_size,
            },
            None => half_extents(font_size),
        })
    }

    /// Upright advance used when the font has no `vmtx`.
    fn line_height(&self, font_size: f32) -> Result<f32> {
        Ok(match self.font.horizontal_header()? {
            Some(hhea) => hhea.extent() * font_size,
            None => font_size,
        })
    }
}

fn half_extents(font_size: f32) -> FontExtents {
    FontExtents {
        ascent: -0.5 * font_size,
        descent: 0.5 * font_size,
    }
}

fn cluster_starts(text: &str) -> Vec<usize> {
    text.grapheme_indices(true).map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{MetricsShaper, SharedData};
    use crate::layout::span::{AnnotatedText, RubySpan};
    use approx::assert_relative_eq;
    use tategaki_test_data::{
        hiragana_gid, kana_font, CmapTable, TestFont, GID_IDEOGRAPHIC_STOP_VERT,
    };

    fn load(font: TestFont) -> Arc<FontTableSet> {
        Arc::new(FontTableSet::new(SharedData::new(font.build()), 0).unwrap())
    }

    fn measure(font: TestFont) -> (VerticalTextMeasure, MetricsShaper) {
        let font = load(font);
        let shaper = MetricsShaper::new(font.clone());
        let measure = VerticalTextMeasure::new(font, &SubstitutionConfig::default()).unwrap();
        (measure, shaper)
    }

    #[test]
    fn mixed_text_measures_per_orientation() {
        let (measure, mut shaper) = measure(kana_font());
        let layout = measure
            .layout_text("ABあい", 0, 8, TextOrientation::Mixed, 20.0, &mut shaper)
            .unwrap();
        assert_eq!(layout.runs().len(), 2);
        let VerticalLayoutRun::Rotate(rotate) = &layout.runs()[0] else {
            panic!("expected rotate run, got {:?}", layout.runs()[0]);
        };
        for advance in rotate.advances() {
            assert_relative_eq!(advance, 12.0, epsilon = 1e-4);
        }
        assert_relative_eq!(rotate.extents().ascent, -17.6, epsilon = 1e-4);

        let VerticalLayoutRun::Upright(upright) = &layout.runs()[1] else {
            panic!("expected upright run, got {:?}", layout.runs()[1]);
        };
        assert_eq!(
            upright.glyph_ids(),
            vec![Some(hiragana_gid('あ')), Some(hiragana_gid('い'))]
        );
        for advance in upright.vertical_advances() {
            assert_relative_eq!(advance, 20.0, epsilon = 1e-4);
        }
        assert_relative_eq!(upright.chars()[0].top_side_bearing, 2.0, epsilon = 1e-4);
        assert_relative_eq!(layout.height(), 64.0, epsilon = 1e-3);
        assert_relative_eq!(layout.extents().ascent, -10.0, epsilon = 1e-4);
    }

    #[test]
    fn upright_uses_vertical_alternates() {
        let (measure, mut shaper) = measure(kana_font());
        let layout = measure
            .layout_text("あ。", 0, 6, TextOrientation::Mixed, 10.0, &mut shaper)
            .unwrap();
        let VerticalLayoutRun::Upright(run) = &layout.runs()[0] else {
            panic!("expected upright run");
        };
        assert_eq!(run.glyph_ids()[1], Some(GID_IDEOGRAPHIC_STOP_VERT));
        assert_relative_eq!(run.chars()[1].top_side_bearing, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn unmapped_characters_have_no_glyph() {
        let (measure, mut shaper) = measure(kana_font());
        // U+4E00 is not in the test font.
        let layout = measure
            .layout_text("あ一", 0, 6, TextOrientation::Upright, 10.0, &mut shaper)
            .unwrap();
        let VerticalLayoutRun::Upright(run) = &layout.runs()[0] else {
            panic!("expected upright run");
        };
        assert_eq!(run.glyph_ids(), vec![Some(hiragana_gid('あ')), None]);
        let advances = run.vertical_advances();
        assert_relative_eq!(advances[0], 10.0, epsilon = 1e-4);
        assert_eq!(advances[1], 0.0);
        assert_relative_eq!(run.chars()[1].horizontal_advance, 0.0);
    }

    #[test]
    fn missing_vertical_metrics_fall_back_to_line_height() {
        let (measure, mut shaper) = measure(kana_font().without(b"vmtx").without(b"vhea"));
        let layout = measure
            .layout_text("あい", 0, 6, TextOrientation::Mixed, 10.0, &mut shaper)
            .unwrap();
        assert_relative_eq!(layout.height(), 20.0, epsilon = 1e-4);
        assert_relative_eq!(layout.extents().descent, 5.0);
    }

    #[test]
    fn combine_upright_width_and_height() {
        let (measure, mut shaper) = measure(kana_font());
        let mut text = AnnotatedText::new("第12話");
        text.add_combine_upright(3..5).unwrap();
        let layout = measure
            .layout_text(&text, 3, 5, TextOrientation::Mixed, 20.0, &mut shaper)
            .unwrap();
        let VerticalLayoutRun::TateChuYoko(run) = &layout.runs()[0] else {
            panic!("expected combine-upright run");
        };
        assert_relative_eq!(run.width(), 22.0, epsilon = 1e-4);
        assert_relative_eq!(run.height(), 20.0, epsilon = 1e-4);
    }

    #[test]
    fn ruby_is_measured_at_scaled_size() {
        let (measure, mut shaper) = measure(kana_font());
        let mut text = AnnotatedText::new("字");
        text.add_ruby(0..3, RubySpan::new("じじじ")).unwrap();
        let layout = measure
            .layout_text(&text, 0, 3, TextOrientation::Mixed, 20.0, &mut shaper)
            .unwrap();
        let VerticalLayoutRun::Ruby(run) = &layout.runs()[0] else {
            panic!("expected ruby run");
        };
        assert_relative_eq!(run.content().height(), 20.0, epsilon = 1e-4);
        assert_relative_eq!(run.ruby().height(), 30.0, epsilon = 1e-4);
        assert_relative_eq!(run.ruby().font_size(), 10.0);
        assert_relative_eq!(layout.height(), 30.0, epsilon = 1e-4);
        let (content_dy, ruby_dy) = run.draw_offsets();
        assert_relative_eq!(content_dy, 5.0, epsilon = 1e-4);
        assert_eq!(ruby_dy, 0.0);
    }

    #[test]
    fn sideways_policy_rotates_everything() {
        let (measure, mut shaper) = measure(kana_font());
        let height = measure
            .height("Aあ", 0, 4, TextOrientation::Sideways, 10.0, &mut shaper)
            .unwrap();
        assert_relative_eq!(height, 6.0 + 10.0, epsilon = 1e-4);
    }

    #[test]
    fn fonts_without_full_cmap_are_rejected() {
        let font = load(TestFont {
            cmap: CmapTable::Format4Only,
            ..kana_font()
        });
        assert!(VerticalTextMeasure::new(font, &SubstitutionConfig::default()).is_err());
    }
}
