// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Splits text into orientation runs.
//!
//! Ruby spans are resolved first, then combine-upright spans, and the
//! remaining plain text is classified per grapheme cluster with the
//! Unicode `Vertical_Orientation` property.

use super::span::{RubySpan, SpanKind, SpanType, Spanned};
use crate::error::{check_range, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;
use unicode_vo::Orientation;

/// Requested orientation policy for a block of text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOrientation {
    /// Follow each character's vertical orientation property.
    #[default]
    Mixed,
    /// Everything upright.
    Upright,
    /// Everything rotated 90° clockwise.
    Sideways,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DrawOrientation {
    Upright,
    Rotate,
    TateChuYoko,
    Ruby,
}

/// Resolves the draw orientation of a character under `orientation`.
/// Only characters with the `R` property rotate in mixed text.
pub fn draw_orientation(orientation: TextOrientation, c: char) -> DrawOrientation {
    match orientation {
        TextOrientation::Upright => DrawOrientation::Upright,
        TextOrientation::Sideways => DrawOrientation::Rotate,
        TextOrientation::Mixed => match unicode_vo::char_orientation(c) {
            Orientation::Rotated => DrawOrientation::Rotate,
            _ => DrawOrientation::Upright,
        },
    }
}

/// Ruby run: base text plus annotation, each with its own runs.
#[derive(Clone, Debug, PartialEq)]
pub struct RubyDrawRun {
    pub range: Range<usize>,
    /// Runs of the base text, in offsets of the owning text.
    pub content: Vec<DrawOrientationRun>,
    pub ruby: Arc<RubySpan>,
    /// Runs of the annotation, in offsets of `ruby.text`.
    pub ruby_runs: Vec<DrawOrientationRun>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOrientationRun {
    Upright(Range<usize>),
    Rotate(Range<usize>),
    TateChuYoko(Range<usize>),
    Ruby(RubyDrawRun),
}

impl DrawOrientationRun {
    pub fn range(&self) -> Range<usize> {
        match self {
            DrawOrientationRun::Upright(range)
            | DrawOrientationRun::Rotate(range)
            | DrawOrientationRun::TateChuYoko(range) => range.clone(),
            DrawOrientationRun::Ruby(ruby) => ruby.range.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.range().len()
    }

    pub fn is_empty(&self) -> bool {
        self.range().is_empty()
    }

    pub fn orientation(&self) -> DrawOrientation {
        match self {
            DrawOrientationRun::Upright(_) => DrawOrientation::Upright,
            DrawOrientationRun::Rotate(_) => DrawOrientation::Rotate,
            DrawOrientationRun::TateChuYoko(_) => DrawOrientation::TateChuYoko,
            DrawOrientationRun::Ruby(_) => DrawOrientation::Ruby,
        }
    }
}

/// Segments `start..end` of `text` into contiguous orientation runs.
pub fn analyze<T: Spanned + ?Sized>(
    text: &T,
    start: usize,
    end: usize,
    orientation: TextOrientation,
) -> Result<Vec<DrawOrientationRun>> {
    check_range(text.text(), start, end)?;
    let mut runs = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let next = text.next_span_transition(cursor, end, SpanType::Ruby);
        // A ruby span reaching outside `start..end`, e.g. across a
        // paragraph break, is laid out as plain text.
        let ruby = text
            .span_covering(cursor, next, SpanType::Ruby)
            .filter(|span| span.range.start >= start && span.range.end <= end)
            .and_then(|span| match &span.kind {
                SpanKind::Ruby(ruby) => Some(ruby.clone()),
                SpanKind::CombineUpright => None,
            });
        match ruby {
            Some(ruby) => {
                let mut content = Vec::new();
                combine_upright_runs(text, cursor, next, orientation, &mut content);
                let mut ruby_runs = Vec::new();
                let ruby_len = ruby.text.text().len();
                combine_upright_runs(&ruby.text, 0, ruby_len, ruby.orientation, &mut ruby_runs);
                runs.push(DrawOrientationRun::Ruby(RubyDrawRun {
                    range: cursor..next,
                    content,
                    ruby,
                    ruby_runs,
                }));
            }
            None => combine_upright_runs(text, cursor, next, orientation, &mut runs),
        }
        cursor = next;
    }
    Ok(runs)
}

fn combine_upright_runs<T: Spanned + ?Sized>(
    text: &T,
    start: usize,
    end: usize,
    orientation: TextOrientation,
    runs: &mut Vec<DrawOrientationRun>,
) {
    let mut cursor = start;
    while cursor < end {
        let next = text.next_span_transition(cursor, end, SpanType::CombineUpright);
        if text
            .span_covering(cursor, next, SpanType::CombineUpright)
            .is_some()
        {
            runs.push(DrawOrientationRun::TateChuYoko(cursor..next));
        } else {
            plain_runs(text.text(), cursor, next, orientation, runs);
        }
        cursor = next;
    }
}

/// Coalesces grapheme clusters with the same resolved orientation. A
/// cluster takes the orientation of its first character.
fn plain_runs(
    text: &str,
    start: usize,
    end: usize,
    orientation: TextOrientation,
    runs: &mut Vec<DrawOrientationRun>,
) {
    let mut current: Option<(DrawOrientation, usize)> = None;
    for (offset, grapheme) in text[start..end].grapheme_indices(true) {
        let Some(c) = grapheme.chars().next() else {
            continue;
        };
        let resolved = draw_orientation(orientation, c);
        let offset = start + offset;
        match current {
            Some((prev, run_start)) if prev != resolved => {
                runs.push(plain_run(prev, run_start..offset));
                current = Some((resolved, offset));
            }
            Some(_) => {}
            None => current = Some((resolved, offset)),
        }
    }
    if let Some((prev, run_start)) = current {
        runs.push(plain_run(prev, run_start..end));
    }
}

fn plain_run(orientation: DrawOrientation, range: Range<usize>) -> DrawOrientationRun {
    match orientation {
        DrawOrientation::Rotate => DrawOrientationRun::Rotate(range),
        _ => DrawOrientationRun::Upright(range),
    }
}
