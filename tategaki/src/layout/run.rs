// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Measured vertical runs.
//!
//! A run knows its height along the column, how far it reaches to either
//! side of the column baseline, whether and where it can be split, and how
//! to draw itself with its top at `(x, y)` where `x` is the column
//! baseline.

use super::span::RubySpan;
use crate::draw::{Canvas, DebugMark, DrawParams, GlyphBatch, Point, Rect};
use crate::font::FontId;
use std::ops::Range;
use std::sync::Arc;

/// Upright glyph origins sit this fraction of the font size above the
/// bottom of their cell.
pub const UPRIGHT_BASELINE_SHIFT: f32 = 0.12;
/// Widest combine-upright text set at its natural width, relative to the
/// font size. Wider text is compressed to this width.
pub const TATE_CHU_YOKO_MAX_WIDTH: f32 = 1.1;
/// Left shift of compressed combine-upright text, relative to the font
/// size.
pub const TATE_CHU_YOKO_INSET: f32 = 0.05;

/// Extents of a run or line to the left and right of the column baseline,
/// in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct VerticalFontMetrics {
    pub left: f32,
    pub right: f32,
}

impl VerticalFontMetrics {
    #[inline]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Symmetric extents of `ratio × font_size` on each side.
    #[inline]
    pub fn symmetric(font_size: f32, ratio: f32) -> Self {
        Self::new(font_size * ratio, font_size * ratio)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.left + self.right
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self::new(self.left.max(other.left), self.right.max(other.right))
    }
}

/// Ascent and descent in pixels, y-down: `ascent` is negative.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FontExtents {
    pub ascent: f32,
    pub descent: f32,
}

impl FontExtents {
    #[inline]
    pub fn height(&self) -> f32 {
        self.descent - self.ascent
    }
}

/// A glyph in a specific font.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlyphRef {
    pub font: FontId,
    pub id: u16,
}

/// Measurements of one character of an upright run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UprightChar {
    /// Byte offset of the character in the owning text.
    pub offset: usize,
    /// Whether a grapheme cluster starts at this character.
    pub cluster_start: bool,
    /// The drawn glyph, vertical form if the font has one. `None` when
    /// the font does not map the character; all advances are then zero.
    pub glyph: Option<GlyphRef>,
    pub vertical_advance: f32,
    pub top_side_bearing: f32,
    pub horizontal_advance: f32,
}

/// Characters set upright one below the other.
#[derive(Clone, Debug, PartialEq)]
pub struct UprightRun {
    range: Range<usize>,
    chars: Vec<UprightChar>,
    font_size: f32,
}

impl UprightRun {
    pub fn new(range: Range<usize>, chars: Vec<UprightChar>, font_size: f32) -> Self {
        Self {
            range,
            chars,
            font_size,
        }
    }

    pub fn chars(&self) -> &[UprightChar] {
        &self.chars
    }

    /// Glyph ids per character, `None` for unmapped characters.
    pub fn glyph_ids(&self) -> Vec<Option<u16>> {
        self.chars.iter().map(|c| c.glyph.map(|g| g.id)).collect()
    }

    pub fn vertical_advances(&self) -> Vec<f32> {
        self.chars.iter().map(|c| c.vertical_advance).collect()
    }

    pub fn height(&self) -> f32 {
        self.chars.iter().map(|c| c.vertical_advance).sum()
    }

    /// Splits before the first cluster that does not fit in `height`.
    /// `None` if even the first cluster does not fit, or if everything
    /// fits.
    pub fn split(&self, height: f32) -> Option<(Self, Self)> {
        let end = fitting_prefix(&self.chars, height, |c| c.cluster_start, |c| c.vertical_advance);
        (end > 0 && end < self.chars.len()).then(|| self.split_at(end))
    }

    /// Detaches the first grapheme cluster.
    pub fn split_first(&self) -> (Self, Option<Self>) {
        let end = next_cluster(&self.chars, 0, |c| c.cluster_start);
        if end >= self.chars.len() {
            return (self.clone(), None);
        }
        let (first, rest) = self.split_at(end);
        (first, Some(rest))
    }

    fn split_at(&self, index: usize) -> (Self, Self) {
        let offset = self.chars[index].offset;
        (
            Self::new(
                self.range.start..offset,
                self.chars[..index].to_vec(),
                self.font_size,
            ),
            Self::new(
                offset..self.range.end,
                self.chars[index..].to_vec(),
                self.font_size,
            ),
        )
    }

    /// Sub-run covering `range`, which must start and end on characters
    /// of this run.
    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        let (first, last) = char_span(&self.chars, &self.range, &range, |c| c.offset)?;
        Some(Self::new(
            range,
            self.chars[first..last].to_vec(),
            self.font_size,
        ))
    }

    fn draw(&self, canvas: &mut dyn Canvas, x: f32, y: f32, params: &DrawParams) {
        if params.debug_overlays {
            let metrics = VerticalFontMetrics::symmetric(self.font_size, 0.5);
            canvas.debug_rect(
                Rect::new(x - metrics.left, y, metrics.width(), self.height()),
                DebugMark::Run,
            );
            canvas.debug_line(
                Point::new(x, y),
                Point::new(x, y + self.height()),
                DebugMark::Baseline,
            );
        }

        let mut batch = GlyphBatch::new(self.font_size, params);
        let mut y = y;
        for c in &self.chars {
            let Some(glyph) = c.glyph else {
                continue;
            };
            let half = c.horizontal_advance / 2.0;
            y += c.vertical_advance;
            if params.debug_overlays {
                canvas.debug_rect(
                    Rect::new(x - half, y - c.vertical_advance, c.horizontal_advance, c.vertical_advance),
                    DebugMark::Glyph,
                );
            }
            let origin = Point::new(x - half, y - UPRIGHT_BASELINE_SHIFT * self.font_size);
            batch.push(canvas, glyph.font, glyph.id, origin);
        }
        batch.flush(canvas);
    }
}

/// Advance of one character of a rotated run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RotatedChar {
    pub offset: usize,
    pub cluster_start: bool,
    pub advance: f32,
}

/// Text set horizontally and turned 90° clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct RotateRun {
    range: Range<usize>,
    chars: Vec<RotatedChar>,
    extents: FontExtents,
    font: FontId,
    font_size: f32,
}

impl RotateRun {
    pub fn new(
        range: Range<usize>,
        chars: Vec<RotatedChar>,
        extents: FontExtents,
        font: FontId,
        font_size: f32,
    ) -> Self {
        Self {
            range,
            chars,
            extents,
            font,
            font_size,
        }
    }

    pub fn advances(&self) -> Vec<f32> {
        self.chars.iter().map(|c| c.advance).collect()
    }

    pub fn extents(&self) -> FontExtents {
        self.extents
    }

    pub fn height(&self) -> f32 {
        self.chars.iter().map(|c| c.advance).sum()
    }

    /// Takes as many whole clusters as fit in `height`. Used only to fill
    /// an empty line; `None` if the first cluster alone is too tall or
    /// everything fits.
    pub fn split(&self, height: f32) -> Option<(Self, Self)> {
        let end = fitting_prefix(&self.chars, height, |c| c.cluster_start, |c| c.advance);
        (end > 0 && end < self.chars.len()).then(|| self.split_at(end))
    }

    /// Detaches the first grapheme cluster.
    pub fn split_first(&self) -> (Self, Option<Self>) {
        let end = next_cluster(&self.chars, 0, |c| c.cluster_start);
        if end >= self.chars.len() {
            return (self.clone(), None);
        }
        let (first, rest) = self.split_at(end);
        (first, Some(rest))
    }

    fn split_at(&self, index: usize) -> (Self, Self) {
        let offset = self.chars[index].offset;
        (
            self.with_chars(self.range.start..offset, self.chars[..index].to_vec()),
            self.with_chars(offset..self.range.end, self.chars[index..].to_vec()),
        )
    }

    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        let (first, last) = char_span(&self.chars, &self.range, &range, |c| c.offset)?;
        Some(self.with_chars(range, self.chars[first..last].to_vec()))
    }

    fn with_chars(&self, range: Range<usize>, chars: Vec<RotatedChar>) -> Self {
        Self::new(range, chars, self.extents, self.font, self.font_size)
    }

    fn draw(&self, canvas: &mut dyn Canvas, text: &str, x: f32, y: f32, params: &DrawParams) {
        let Some(text) = text.get(self.range.clone()) else {
            tracing::error!("rotated run {:?} is outside its text", self.range);
            return;
        };
        let shift = self.extents.ascent + self.extents.height() * 0.5;
        let origin = Point::new(x, y - shift);
        canvas.save();
        canvas.rotate(90.0, Point::new(x, y));
        if params.debug_overlays {
            let length = self.height();
            canvas.debug_rect(
                Rect::new(origin.x, origin.y + self.extents.ascent, length, self.extents.height()),
                DebugMark::Run,
            );
            canvas.debug_line(origin, Point::new(origin.x + length, origin.y), DebugMark::Baseline);
        }
        canvas.draw_text(text, origin, &params.paint(self.font, self.font_size));
        canvas.restore();
    }
}

/// Text set horizontally inside the column as one upright unit.
#[derive(Clone, Debug, PartialEq)]
pub struct TateChuYokoRun {
    range: Range<usize>,
    width: f32,
    extents: FontExtents,
    font: FontId,
    font_size: f32,
}

impl TateChuYokoRun {
    pub fn new(
        range: Range<usize>,
        width: f32,
        extents: FontExtents,
        font: FontId,
        font_size: f32,
    ) -> Self {
        Self {
            range,
            width,
            extents,
            font,
            font_size,
        }
    }

    /// Natural horizontal width of the text.
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.extents.height()
    }

    /// Origin and horizontal scale for drawing at column baseline `x`.
    pub fn placement(&self, x: f32, y: f32) -> (Point, f32) {
        let metrics = self.vertical_metrics();
        let size = self.font_size;
        let x = x - metrics.left;
        let y = y - self.extents.ascent;
        if self.width < size * TATE_CHU_YOKO_MAX_WIDTH {
            (Point::new(x + (metrics.width() - self.width) / 2.0, y), 1.0)
        } else {
            (
                Point::new(x - size * TATE_CHU_YOKO_INSET, y),
                TATE_CHU_YOKO_MAX_WIDTH * size / self.width,
            )
        }
    }

    fn vertical_metrics(&self) -> VerticalFontMetrics {
        VerticalFontMetrics::symmetric(self.font_size, 0.55)
    }

    fn draw(&self, canvas: &mut dyn Canvas, text: &str, x: f32, y: f32, params: &DrawParams) {
        let Some(text) = text.get(self.range.clone()) else {
            tracing::error!("combine-upright run {:?} is outside its text", self.range);
            return;
        };
        let (origin, scale_x) = self.placement(x, y);
        if params.debug_overlays {
            let width = self.width * scale_x;
            canvas.debug_rect(
                Rect::new(origin.x, origin.y + self.extents.ascent, width, self.height()),
                DebugMark::Run,
            );
            canvas.debug_point(origin, DebugMark::Baseline);
        }
        let mut paint = params.paint(self.font, self.font_size);
        paint.scale_x = scale_x;
        canvas.draw_text(text, origin, &paint);
    }
}

/// Base text with a ruby annotation beside it. Never split.
#[derive(Clone, Debug, PartialEq)]
pub struct RubyRun {
    range: Range<usize>,
    content: IntrinsicVerticalLayout,
    ruby: IntrinsicVerticalLayout,
    span: Arc<RubySpan>,
    font_size: f32,
}

impl RubyRun {
    pub fn new(
        range: Range<usize>,
        content: IntrinsicVerticalLayout,
        ruby: IntrinsicVerticalLayout,
        span: Arc<RubySpan>,
        font_size: f32,
    ) -> Self {
        Self {
            range,
            content,
            ruby,
            span,
            font_size,
        }
    }

    pub fn content(&self) -> &IntrinsicVerticalLayout {
        &self.content
    }

    pub fn ruby(&self) -> &IntrinsicVerticalLayout {
        &self.ruby
    }

    pub fn span(&self) -> &Arc<RubySpan> {
        &self.span
    }

    pub fn height(&self) -> f32 {
        self.content.height().max(self.ruby.height())
    }

    /// Vertical offsets of the content and the annotation from the top of
    /// the run. The shorter one is centred against the taller.
    pub fn draw_offsets(&self) -> (f32, f32) {
        offsets_centred(self.content.height(), self.ruby.height())
    }

    fn draw(&self, canvas: &mut dyn Canvas, text: &str, x: f32, y: f32, params: &DrawParams) {
        let (content_dy, ruby_dy) = self.draw_offsets();
        self.content.draw(canvas, text, x, y + content_dy, params);
        let ruby_x = x - self.content.extents().ascent + self.ruby.extents().descent;
        self.ruby
            .draw(canvas, self.span.text.as_str(), ruby_x, y + ruby_dy, params);
    }
}

fn offsets_centred(content: f32, ruby: f32) -> (f32, f32) {
    if content > ruby {
        (0.0, (content - ruby) / 2.0)
    } else {
        ((ruby - content) / 2.0, 0.0)
    }
}

/// A measured run.
#[derive(Clone, Debug, PartialEq)]
pub enum VerticalLayoutRun {
    Upright(UprightRun),
    Rotate(RotateRun),
    TateChuYoko(TateChuYokoRun),
    Ruby(RubyRun),
}

impl VerticalLayoutRun {
    pub fn range(&self) -> Range<usize> {
        match self {
            VerticalLayoutRun::Upright(run) => run.range.clone(),
            VerticalLayoutRun::Rotate(run) => run.range.clone(),
            VerticalLayoutRun::TateChuYoko(run) => run.range.clone(),
            VerticalLayoutRun::Ruby(run) => run.range.clone(),
        }
    }

    pub fn start(&self) -> usize {
        self.range().start
    }

    pub fn end(&self) -> usize {
        self.range().end
    }

    pub fn height(&self) -> f32 {
        match self {
            VerticalLayoutRun::Upright(run) => run.height(),
            VerticalLayoutRun::Rotate(run) => run.height(),
            VerticalLayoutRun::TateChuYoko(run) => run.height(),
            VerticalLayoutRun::Ruby(run) => run.height(),
        }
    }

    pub fn font_size(&self) -> f32 {
        match self {
            VerticalLayoutRun::Upright(run) => run.font_size,
            VerticalLayoutRun::Rotate(run) => run.font_size,
            VerticalLayoutRun::TateChuYoko(run) => run.font_size,
            VerticalLayoutRun::Ruby(run) => run.font_size,
        }
    }

    pub fn vertical_metrics(&self) -> VerticalFontMetrics {
        match self {
            VerticalLayoutRun::Upright(run) => VerticalFontMetrics::symmetric(run.font_size, 0.5),
            VerticalLayoutRun::Rotate(run) => VerticalFontMetrics::symmetric(run.font_size, 0.5),
            VerticalLayoutRun::TateChuYoko(run) => run.vertical_metrics(),
            VerticalLayoutRun::Ruby(run) => {
                VerticalFontMetrics::new(run.font_size * 0.5, run.font_size)
            }
        }
    }

    /// Splits so the first part fits in `height`. Only upright runs
    /// split; `None` means the run must move to the next line whole.
    pub fn split(&self, height: f32) -> Option<(Self, Self)> {
        match self {
            VerticalLayoutRun::Upright(run) => run
                .split(height)
                .map(|(a, b)| (VerticalLayoutRun::Upright(a), VerticalLayoutRun::Upright(b))),
            VerticalLayoutRun::Rotate(_)
            | VerticalLayoutRun::TateChuYoko(_)
            | VerticalLayoutRun::Ruby(_) => None,
        }
    }

    /// Fills an empty line of `height` with a run taller than it. Rotated
    /// runs give up as many clusters as fit and upright runs, which only
    /// get here when their first cluster is too tall, give up one.
    /// Runs without per-character advances come back whole.
    pub fn split_to_fill(&self, height: f32) -> (Self, Option<Self>) {
        match self {
            VerticalLayoutRun::Rotate(run) => match run.split(height) {
                Some((head, tail)) => (
                    VerticalLayoutRun::Rotate(head),
                    Some(VerticalLayoutRun::Rotate(tail)),
                ),
                None => self.split_first(),
            },
            _ => self.split_first(),
        }
    }

    /// Detaches the first grapheme cluster. Runs without per-character
    /// advances come back whole.
    pub fn split_first(&self) -> (Self, Option<Self>) {
        match self {
            VerticalLayoutRun::Upright(run) => {
                let (first, rest) = run.split_first();
                (
                    VerticalLayoutRun::Upright(first),
                    rest.map(VerticalLayoutRun::Upright),
                )
            }
            VerticalLayoutRun::Rotate(run) => {
                let (first, rest) = run.split_first();
                (
                    VerticalLayoutRun::Rotate(first),
                    rest.map(VerticalLayoutRun::Rotate),
                )
            }
            VerticalLayoutRun::TateChuYoko(_) | VerticalLayoutRun::Ruby(_) => {
                (self.clone(), None)
            }
        }
    }

    /// Sub-run covering `range`. Atomic runs only return themselves, for
    /// their full range.
    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        if range == self.range() {
            return Some(self.clone());
        }
        match self {
            VerticalLayoutRun::Upright(run) => run.slice(range).map(VerticalLayoutRun::Upright),
            VerticalLayoutRun::Rotate(run) => run.slice(range).map(VerticalLayoutRun::Rotate),
            VerticalLayoutRun::TateChuYoko(_) | VerticalLayoutRun::Ruby(_) => None,
        }
    }

    /// Draws the run with its top at `y` on column baseline `x`. `text` is
    /// the text the run's offsets refer to.
    pub fn draw(&self, canvas: &mut dyn Canvas, text: &str, x: f32, y: f32, params: &DrawParams) {
        match self {
            VerticalLayoutRun::Upright(run) => run.draw(canvas, x, y, params),
            VerticalLayoutRun::Rotate(run) => run.draw(canvas, text, x, y, params),
            VerticalLayoutRun::TateChuYoko(run) => run.draw(canvas, text, x, y, params),
            VerticalLayoutRun::Ruby(run) => run.draw(canvas, text, x, y, params),
        }
    }
}

/// Measured runs of a paragraph before line breaking.
#[derive(Clone, Debug, PartialEq)]
pub struct IntrinsicVerticalLayout {
    range: Range<usize>,
    extents: FontExtents,
    runs: Vec<VerticalLayoutRun>,
    font_size: f32,
}

impl IntrinsicVerticalLayout {
    pub fn new(
        range: Range<usize>,
        extents: FontExtents,
        runs: Vec<VerticalLayoutRun>,
        font_size: f32,
    ) -> Self {
        Self {
            range,
            extents,
            runs,
            font_size,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Vertical ascent/descent of the measuring font, from `vhea`.
    pub fn extents(&self) -> FontExtents {
        self.extents
    }

    pub fn runs(&self) -> &[VerticalLayoutRun] {
        &self.runs
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn height(&self) -> f32 {
        self.runs.iter().map(VerticalLayoutRun::height).sum()
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, text: &str, x: f32, y: f32, params: &DrawParams) {
        let mut y = y;
        for run in &self.runs {
            run.draw(canvas, text, x, y, params);
            y += run.height();
        }
    }
}

/// End index of the grapheme cluster starting at `start`.
fn next_cluster<C>(chars: &[C], start: usize, cluster_start: impl Fn(&C) -> bool) -> usize {
    let mut end = start + 1;
    while end < chars.len() && !cluster_start(&chars[end]) {
        end += 1;
    }
    end
}

/// Index of the first cluster that does not fit in `height`, or
/// `chars.len()` if all of them do.
fn fitting_prefix<C>(
    chars: &[C],
    height: f32,
    cluster_start: impl Fn(&C) -> bool,
    advance: impl Fn(&C) -> f32,
) -> usize {
    let mut remaining = height;
    let mut start = 0;
    while start < chars.len() {
        let end = next_cluster(chars, start, &cluster_start);
        let cluster: f32 = chars[start..end].iter().map(&advance).sum();
        if remaining < cluster {
            return start;
        }
        remaining -= cluster;
        start = end;
    }
    chars.len()
}

/// Index span of the characters covering `range`, if `range` lies inside
/// `run` and both ends fall on character offsets.
fn char_span<C>(
    chars: &[C],
    run: &Range<usize>,
    range: &Range<usize>,
    offset: impl Fn(&C) -> usize,
) -> Option<(usize, usize)> {
    if range.start < run.start || range.end > run.end || range.start >= range.end {
        return None;
    }
    let first = chars.iter().position(|c| offset(c) == range.start)?;
    let last = if range.end == run.end {
        chars.len()
    } else {
        chars.iter().position(|c| offset(c) == range.end)?
    };
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{DrawCommand, RecordingCanvas};
    use approx::assert_relative_eq;

    const FONT: FontId = FontId::from_raw(7);

    fn upright(start: usize, advances: &[f32]) -> UprightRun {
        let chars: Vec<UprightChar> = advances
            .iter()
            .enumerate()
            .map(|(i, &advance)| UprightChar {
                offset: start + i * 3,
                cluster_start: true,
                glyph: Some(GlyphRef {
                    font: FONT,
                    id: 100 + i as u16,
                }),
                vertical_advance: advance,
                top_side_bearing: 0.0,
                horizontal_advance: 10.0,
            })
            .collect();
        UprightRun::new(start..start + advances.len() * 3, chars, 10.0)
    }

    fn intrinsic(height: f32, font_size: f32) -> IntrinsicVerticalLayout {
        let run = upright(0, &[height]);
        IntrinsicVerticalLayout::new(
            0..3,
            FontExtents {
                ascent: -font_size / 2.0,
                descent: font_size / 2.0,
            },
            vec![VerticalLayoutRun::Upright(run)],
            font_size,
        )
    }

    #[test]
    fn upright_split_keeps_what_fits() {
        let run = upright(0, &[10.0, 10.0, 10.0]);
        let (first, rest) = run.split(25.0).unwrap();
        assert_eq!(first.range, 0..6);
        assert_eq!(rest.range, 6..9);
        assert_relative_eq!(first.height(), 20.0);
        assert_relative_eq!(rest.height(), 10.0);

        assert!(run.split(9.0).is_none());
        assert!(run.split(30.0).is_none());
    }

    #[test]
    fn upright_split_respects_clusters() {
        let mut run = upright(0, &[10.0, 0.0, 10.0]);
        run.chars[1].cluster_start = false;
        let (first, rest) = run.split(15.0).unwrap();
        assert_eq!(first.chars.len(), 2);
        assert_eq!(rest.range, 6..9);

        let (head, tail) = run.split_first();
        assert_eq!(head.range, 0..6);
        assert_eq!(tail.unwrap().range, 6..9);
    }

    #[test]
    fn split_first_of_single_cluster_is_whole() {
        let run = upright(3, &[40.0]);
        let (head, tail) = run.split_first();
        assert_eq!(head, run);
        assert!(tail.is_none());
    }

    #[test]
    fn slices_must_fall_on_characters() {
        let run = upright(0, &[10.0, 10.0, 10.0]);
        assert_eq!(run.slice(3..9).unwrap().chars.len(), 2);
        assert!(run.slice(1..9).is_none());
        assert!(run.slice(3..12).is_none());
    }

    #[test]
    fn only_upright_runs_split_by_height() {
        let rotate = VerticalLayoutRun::Rotate(RotateRun::new(
            0..2,
            vec![
                RotatedChar {
                    offset: 0,
                    cluster_start: true,
                    advance: 6.0,
                },
                RotatedChar {
                    offset: 1,
                    cluster_start: true,
                    advance: 6.0,
                },
            ],
            FontExtents {
                ascent: -8.8,
                descent: 1.2,
            },
            FONT,
            10.0,
        ));
        assert!(rotate.split(7.0).is_none());
        let (first, rest) = rotate.split_first();
        assert_eq!(first.range(), 0..1);
        assert_eq!(rest.unwrap().range(), 1..2);
        assert_relative_eq!(rotate.vertical_metrics().left, 5.0);
    }

    #[test]
    fn rotated_runs_fill_an_empty_line() {
        let chars = (0..5)
            .map(|i| RotatedChar {
                offset: i,
                cluster_start: true,
                advance: 6.0,
            })
            .collect();
        let extents = FontExtents {
            ascent: -8.8,
            descent: 1.2,
        };
        let run = VerticalLayoutRun::Rotate(RotateRun::new(0..5, chars, extents, FONT, 10.0));

        let (head, tail) = run.split_to_fill(20.0);
        assert_eq!(head.range(), 0..3);
        assert_relative_eq!(head.height(), 18.0);
        assert_eq!(tail.unwrap().range(), 3..5);

        // Shorter than one letter: a single cluster.
        let (head, tail) = run.split_to_fill(4.0);
        assert_eq!(head.range(), 0..1);
        assert_eq!(tail.unwrap().range(), 1..5);

        let (head, tail) = run.split_to_fill(30.0);
        assert_eq!(head, run);
        assert!(tail.is_none());
    }

    #[test]
    fn upright_draw_positions_glyphs_below_cells() {
        let run = upright(0, &[10.0, 10.0]);
        let mut canvas = RecordingCanvas::new();
        run.draw(&mut canvas, 50.0, 0.0, &DrawParams::default());
        let glyphs = canvas.glyphs();
        assert_eq!(glyphs.len(), 2);
        assert_relative_eq!(glyphs[0].1.x, 45.0);
        assert_relative_eq!(glyphs[0].1.y, 10.0 - 1.2);
        assert_relative_eq!(glyphs[1].1.y, 20.0 - 1.2);
    }

    #[test]
    fn unmapped_characters_are_not_drawn() {
        let mut run = upright(0, &[10.0, 0.0, 10.0]);
        run.chars[1].glyph = None;
        let mut canvas = RecordingCanvas::new();
        run.draw(&mut canvas, 0.0, 0.0, &DrawParams::default());
        let ids: Vec<u16> = canvas.glyphs().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![100, 102]);
        assert_eq!(run.glyph_ids(), vec![Some(100), None, Some(102)]);
    }

    #[test]
    fn rotate_draw_pivots_on_column() {
        let text = "AB";
        let run = RotateRun::new(
            0..2,
            Vec::new(),
            FontExtents {
                ascent: -8.0,
                descent: 2.0,
            },
            FONT,
            10.0,
        );
        let mut canvas = RecordingCanvas::new();
        run.draw(&mut canvas, text, 20.0, 5.0, &DrawParams::default());
        let commands = canvas.take();
        assert_eq!(commands[0], DrawCommand::Save);
        assert_eq!(
            commands[1],
            DrawCommand::Rotate {
                degrees: 90.0,
                pivot: Point::new(20.0, 5.0),
            }
        );
        match &commands[2] {
            DrawCommand::Text { text, origin, .. } => {
                assert_eq!(text, "AB");
                // shift = -8 + 10 / 2 = -3
                assert_relative_eq!(origin.y, 8.0);
                assert_relative_eq!(origin.x, 20.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(commands[3], DrawCommand::Restore);
    }

    #[test]
    fn tate_chu_yoko_centres_narrow_text() {
        let extents = FontExtents {
            ascent: -8.8,
            descent: 1.2,
        };
        let run = TateChuYokoRun::new(0..2, 8.0, extents, FONT, 10.0);
        assert_relative_eq!(run.height(), 10.0);
        let (origin, scale) = run.placement(0.0, 0.0);
        assert_relative_eq!(scale, 1.0);
        // left edge -5.5, column 11 wide, text 8 wide
        assert_relative_eq!(origin.x, -5.5 + 1.5);
        assert_relative_eq!(origin.y, 8.8);
    }

    #[test]
    fn tate_chu_yoko_compresses_wide_text() {
        let extents = FontExtents {
            ascent: -8.8,
            descent: 1.2,
        };
        let run = TateChuYokoRun::new(0..3, 22.0, extents, FONT, 10.0);
        let (origin, scale) = run.placement(0.0, 0.0);
        assert_relative_eq!(scale, 0.5);
        assert_relative_eq!(origin.x, -5.5 - 0.5);
    }

    #[test]
    fn ruby_centres_shorter_part() {
        let ruby = RubyRun::new(
            0..3,
            intrinsic(40.0, 10.0),
            intrinsic(20.0, 5.0),
            Arc::new(RubySpan::new("かな")),
            10.0,
        );
        assert_relative_eq!(ruby.height(), 40.0);
        assert_eq!(ruby.draw_offsets(), (0.0, 10.0));
        assert_eq!(offsets_centred(20.0, 40.0), (10.0, 0.0));

        let run = VerticalLayoutRun::Ruby(ruby);
        assert!(run.split(10.0).is_none());
        assert_eq!(run.vertical_metrics(), VerticalFontMetrics::new(5.0, 10.0));
    }

    #[test]
    fn ruby_annotation_is_drawn_right_of_content() {
        let ruby = RubyRun::new(
            0..3,
            intrinsic(40.0, 10.0),
            intrinsic(20.0, 5.0),
            Arc::new(RubySpan::new("かな")),
            10.0,
        );
        let mut canvas = RecordingCanvas::new();
        ruby.draw(&mut canvas, "漢", 0.0, 0.0, &DrawParams::default());
        let glyphs = canvas.glyphs();
        assert_eq!(glyphs.len(), 2);
        // content at x - 5, annotation on baseline 0 + 5 + 2.5
        assert_relative_eq!(glyphs[0].1.x, -5.0);
        assert_relative_eq!(glyphs[1].1.x, 7.5 - 5.0);
        assert_relative_eq!(glyphs[1].1.y, 10.0 + 20.0 - 1.2);
    }
}
