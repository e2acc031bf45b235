// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Column breaking for vertical text.
//!
//! Lines are columns. They are emitted right to left, so each baseline is
//! further left (more negative) than the one before it.

use super::run::{IntrinsicVerticalLayout, VerticalFontMetrics, VerticalLayoutRun};
use crate::draw::{Canvas, DebugMark, DrawParams, Point};
use std::ops::Range;

/// Position and extents of one column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VerticalLineMetrics {
    pub start: usize,
    pub end: usize,
    pub left: f32,
    pub right: f32,
    /// Horizontal position of the column baseline relative to the right
    /// edge of the layout.
    pub baseline: f32,
}

impl VerticalLineMetrics {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Left edge of the column.
    pub fn left_edge(&self) -> f32 {
        self.baseline - self.left
    }

    pub fn right_edge(&self) -> f32 {
        self.baseline + self.right
    }
}

/// Runs of one column, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct VerticalLine {
    range: Range<usize>,
    runs: Vec<VerticalLayoutRun>,
    font_size: f32,
}

impl VerticalLine {
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn runs(&self) -> &[VerticalLayoutRun] {
        &self.runs
    }

    pub fn height(&self) -> f32 {
        self.runs.iter().map(VerticalLayoutRun::height).sum()
    }

    pub fn vertical_metrics(&self) -> VerticalFontMetrics {
        line_metrics(&self.runs, self.font_size)
    }

    /// Draws the column with its top at `y` on baseline `x`.
    pub fn draw(&self, canvas: &mut dyn Canvas, text: &str, x: f32, y: f32, params: &DrawParams) {
        if params.debug_overlays {
            canvas.debug_line(
                Point::new(x, y),
                Point::new(x, y + self.height()),
                DebugMark::Line,
            );
        }
        let mut y = y;
        for run in &self.runs {
            run.draw(canvas, text, x, y, params);
            y += run.height();
        }
    }
}

/// Extents of a column holding `runs`. A column with no runs takes half
/// the font size on each side.
fn line_metrics(runs: &[VerticalLayoutRun], font_size: f32) -> VerticalFontMetrics {
    if runs.is_empty() {
        return VerticalFontMetrics::symmetric(font_size, 0.5);
    }
    runs.iter()
        .map(VerticalLayoutRun::vertical_metrics)
        .fold(VerticalFontMetrics::default(), VerticalFontMetrics::union)
}

#[derive(Clone, Debug, Default)]
struct BreakerState {
    start: usize,
    runs: Vec<VerticalLayoutRun>,
    height: f32,
}

impl BreakerState {
    fn new(start: usize) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    fn add(&mut self, run: VerticalLayoutRun) {
        self.height += run.height();
        self.runs.push(run);
    }

    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Greedy column breaker over the runs of one paragraph.
struct BreakLines<'a> {
    layout: &'a IntrinsicVerticalLayout,
    max_height: f32,
    line_spacing: f32,
    /// Right edge of the next column.
    edge: f32,
    state: BreakerState,
    lines: Vec<VerticalLineMetrics>,
}

impl<'a> BreakLines<'a> {
    fn new(
        layout: &'a IntrinsicVerticalLayout,
        max_height: f32,
        edge: f32,
        line_spacing: f32,
    ) -> Self {
        Self {
            layout,
            max_height,
            line_spacing,
            edge,
            state: BreakerState::new(layout.start()),
            lines: Vec::new(),
        }
    }

    fn push(&mut self, run: &VerticalLayoutRun) {
        let mut run = run.clone();
        loop {
            if self.state.height + run.height() <= self.max_height {
                self.state.add(run);
                return;
            }
            if let Some((head, tail)) = run.split(self.max_height - self.state.height) {
                self.state.add(head);
                self.commit(tail.start());
                run = tail;
                continue;
            }
            if !self.state.is_empty() {
                self.commit(run.start());
                continue;
            }

            // Taller than a whole column: the head goes on a line of its own.
            let (head, tail) = run.split_to_fill(self.max_height);
            tracing::debug!(
                "run {:?} of height {} overflows column of height {}",
                head.range(),
                head.height(),
                self.max_height
            );
            let end = head.end();
            self.state.add(head);
            match tail {
                Some(tail) => {
                    self.commit(tail.start());
                    run = tail;
                }
                None => {
                    self.commit(end);
                    return;
                }
            }
        }
    }

    fn commit(&mut self, end: usize) {
        let state = std::mem::replace(&mut self.state, BreakerState::new(end));
        let metrics = line_metrics(&state.runs, self.layout.font_size());
        let baseline = self.edge - metrics.right;
        self.edge = baseline - metrics.left - self.line_spacing;
        self.lines.push(VerticalLineMetrics {
            start: state.start,
            end,
            left: metrics.left,
            right: metrics.right,
            baseline,
        });
    }

    fn finish(mut self) -> Vec<VerticalLineMetrics> {
        if !self.state.is_empty() || self.lines.is_empty() {
            self.commit(self.layout.end());
        }
        self.lines
    }
}

/// Breaks `layout` into columns of at most `height`, placing the first
/// column's right edge at `edge`. Consecutive columns are `line_spacing`
/// apart.
///
/// Upright runs split between grapheme clusters. Other runs move to the
/// next column whole. A run taller than an entire column starts a column
/// of its own: a rotated run fills it with as many clusters as fit, and a
/// cluster too tall for any column gets a column to itself.
pub fn break_lines(
    layout: &IntrinsicVerticalLayout,
    height: f32,
    edge: f32,
    line_spacing: f32,
) -> Vec<VerticalLineMetrics> {
    let mut breaker = BreakLines::new(layout, height, edge, line_spacing);
    for run in layout.runs() {
        breaker.push(run);
    }
    breaker.finish()
}

/// Collects the runs of `layout` inside `start..end`, splitting runs that
/// straddle either end.
pub fn layout_line(start: usize, end: usize, layout: &IntrinsicVerticalLayout) -> VerticalLine {
    let mut runs = Vec::new();
    for run in layout.runs() {
        let range = run.range();
        let from = range.start.max(start);
        let to = range.end.min(end);
        if from >= to {
            continue;
        }
        match run.slice(from..to) {
            Some(slice) => runs.push(slice),
            None => {
                tracing::error!(
                    "line {}..{} cuts through unsplittable run {:?}",
                    start,
                    end,
                    range
                );
                runs.push(run.clone());
            }
        }
    }
    VerticalLine {
        range: start..end,
        runs,
        font_size: layout.font_size(),
    }
}
