// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Vertical layout: orientation analysis, measurement, column breaking
//! and assembly of a block.

pub mod line_breaker;
pub mod measure;
pub mod orientation;
pub mod run;
pub mod span;

pub use line_breaker::{break_lines, layout_line, VerticalLine, VerticalLineMetrics};
pub use measure::VerticalTextMeasure;
pub use orientation::{analyze, DrawOrientation, DrawOrientationRun, TextOrientation};
pub use run::{IntrinsicVerticalLayout, VerticalFontMetrics, VerticalLayoutRun};
pub use span::{AnnotatedText, RubySpan, Spanned};

use crate::config::LayoutConfig;
use crate::draw::{Canvas, DrawParams};
use crate::error::{check_range, LayoutError, Result};
use crate::font::TextShaper;
use std::sync::Arc;

/// A block of vertical text broken into columns, right to left.
#[derive(Clone, Debug)]
pub struct VerticalLayout {
    text: Arc<str>,
    lines: Vec<VerticalLineMetrics>,
    line_layouts: Vec<VerticalLine>,
}

impl VerticalLayout {
    /// Lays out `start..end` of `text` in columns of
    /// `config.block_height`. Each `'\n'` starts a new paragraph, which
    /// always starts a new column.
    ///
    /// With `config.compute_full_layout` unset only line metrics are
    /// computed and [`VerticalLayout::draw`] draws nothing.
    pub fn build<T: Spanned + ?Sized>(
        text: &T,
        start: usize,
        end: usize,
        measure: &VerticalTextMeasure,
        shaper: &mut dyn TextShaper,
        config: &LayoutConfig,
    ) -> Result<Self> {
        let source = text.text();
        check_range(source, start, end)?;
        if !(config.block_height.is_finite() && config.block_height > 0.0) {
            return Err(LayoutError::InvalidHeight(config.block_height));
        }
        if !(config.font_size.is_finite() && config.font_size > 0.0) {
            return Err(LayoutError::InvalidFontSize(config.font_size));
        }

        let mut lines = Vec::new();
        let mut line_layouts = Vec::new();
        let mut edge = 0.0;
        for (para_start, para_end) in paragraphs(source, start, end) {
            let intrinsic = measure.layout_text(
                text,
                para_start,
                para_end,
                config.orientation,
                config.font_size,
                shaper,
            )?;
            let para_lines =
                break_lines(&intrinsic, config.block_height, edge, config.line_spacing);
            if config.compute_full_layout {
                line_layouts.extend(
                    para_lines
                        .iter()
                        .map(|line| layout_line(line.start, line.end, &intrinsic)),
                );
            }
            if let Some(last) = para_lines.last() {
                edge = last.left_edge() - config.line_spacing;
            }
            lines.extend(para_lines);
        }
        tracing::debug!(
            "laid out {}..{} in {} columns of height {}",
            start,
            end,
            lines.len(),
            config.block_height
        );

        Ok(Self {
            text: Arc::from(source),
            lines,
            line_layouts,
        })
    }

    pub fn lines(&self) -> &[VerticalLineMetrics] {
        &self.lines
    }

    /// Column layouts, empty unless the full layout was computed.
    pub fn line_layouts(&self) -> &[VerticalLine] {
        &self.line_layouts
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Horizontal extent of the block, from the right edge of the first
    /// column to the left edge of the last.
    pub fn width(&self) -> f32 {
        self.lines.last().map_or(0.0, |line| -line.left_edge())
    }

    /// Draws the block with its top-right corner at `(x, y)`.
    pub fn draw(&self, canvas: &mut dyn Canvas, x: f32, y: f32, params: &DrawParams) {
        if self.line_layouts.is_empty() && !self.lines.is_empty() {
            tracing::error!("drawing a layout built without compute-full-layout");
            return;
        }
        for (line, layout) in self.lines.iter().zip(&self.line_layouts) {
            layout.draw(canvas, &self.text, x + line.baseline, y, params);
        }
    }
}

/// Paragraph ranges of `start..end`, excluding the `'\n'` separators. A
/// trailing separator does not open an empty paragraph; an empty range
/// has none.
fn paragraphs(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut result = Vec::new();
    let mut para_start = start;
    while para_start < end {
        let para_end = text[para_start..end]
            .find('\n')
            .map_or(end, |i| para_start + i);
        result.push((para_start, para_end));
        para_start = para_end + 1;
    }
    result
}
