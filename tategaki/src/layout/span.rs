// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Span annotations over text: ruby and combine-upright (tate-chu-yoko).

use super::TextOrientation;
use crate::error::{check_range, Result};
use std::ops::Range;
use std::sync::Arc;

/// Ruby annotation attached to a range of base text.
#[derive(Clone, Debug, PartialEq)]
pub struct RubySpan {
    /// Annotation text. Combine-upright spans inside it are honoured,
    /// ruby spans inside it are ignored.
    pub text: AnnotatedText,
    /// Orientation used for the annotation, independent of the base text.
    pub orientation: TextOrientation,
    /// Annotation size relative to the base font size.
    pub text_scale: f32,
}

impl RubySpan {
    pub fn new(text: impl Into<AnnotatedText>) -> Self {
        Self {
            text: text.into(),
            orientation: TextOrientation::Mixed,
            text_scale: 0.5,
        }
    }

    pub fn with_orientation(mut self, orientation: TextOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_text_scale(mut self, text_scale: f32) -> Self {
        self.text_scale = text_scale;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpanKind {
    Ruby(Arc<RubySpan>),
    /// Set the covered text horizontally as one cluster.
    CombineUpright,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpanType {
    Ruby,
    CombineUpright,
}

impl SpanKind {
    pub fn span_type(&self) -> SpanType {
        match self {
            SpanKind::Ruby(_) => SpanType::Ruby,
            SpanKind::CombineUpright => SpanType::CombineUpright,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub range: Range<usize>,
    pub kind: SpanKind,
}

/// Text plus the spans laid over it, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotatedText {
    text: String,
    spans: Vec<Span>,
}

impl AnnotatedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn add_span(&mut self, range: Range<usize>, kind: SpanKind) -> Result<()> {
        check_range(&self.text, range.start, range.end)?;
        self.spans.push(Span { range, kind });
        Ok(())
    }

    pub fn add_ruby(&mut self, range: Range<usize>, ruby: RubySpan) -> Result<()> {
        self.add_span(range, SpanKind::Ruby(Arc::new(ruby)))
    }

    pub fn add_combine_upright(&mut self, range: Range<usize>) -> Result<()> {
        self.add_span(range, SpanKind::CombineUpright)
    }

    /// Builder form of [`AnnotatedText::add_ruby`].
    pub fn ruby(mut self, range: Range<usize>, ruby: RubySpan) -> Result<Self> {
        self.add_ruby(range, ruby)?;
        Ok(self)
    }

    /// Builder form of [`AnnotatedText::add_combine_upright`].
    pub fn combine_upright(mut self, range: Range<usize>) -> Result<Self> {
        self.add_combine_upright(range)?;
        Ok(self)
    }

    /// Appends `text` with a ruby annotation covering it.
    pub fn push_ruby(&mut self, base: &str, ruby: RubySpan) {
        let start = self.text.len();
        self.text.push_str(base);
        self.spans.push(Span {
            range: start..self.text.len(),
            kind: SpanKind::Ruby(Arc::new(ruby)),
        });
    }

    /// Appends `text` as one combine-upright cluster.
    pub fn push_combine_upright(&mut self, text: &str) {
        let start = self.text.len();
        self.text.push_str(text);
        self.spans.push(Span {
            range: start..self.text.len(),
            kind: SpanKind::CombineUpright,
        });
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

impl From<&str> for AnnotatedText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for AnnotatedText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Read access to text and the spans over it.
pub trait Spanned {
    fn text(&self) -> &str;

    fn spans(&self) -> &[Span] {
        &[]
    }

    /// Returns the first offset in `(start, limit)` where a span of type
    /// `ty` begins or ends, or `limit` if there is none.
    fn next_span_transition(&self, start: usize, limit: usize, ty: SpanType) -> usize {
        let mut next = limit;
        for span in self.spans() {
            if span.kind.span_type() != ty || span.range.is_empty() {
                continue;
            }
            for edge in [span.range.start, span.range.end] {
                if edge > start && edge < next {
                    next = edge;
                }
            }
        }
        next
    }

    /// Returns the first span of type `ty` covering all of `start..end`.
    fn span_covering(&self, start: usize, end: usize, ty: SpanType) -> Option<&Span> {
        self.spans().iter().find(|span| {
            span.kind.span_type() == ty
                && !span.range.is_empty()
                && span.range.start <= start
                && span.range.end >= end
        })
    }
}

impl Spanned for str {
    fn text(&self) -> &str {
        self
    }
}

impl Spanned for String {
    fn text(&self) -> &str {
        self
    }
}

impl Spanned for AnnotatedText {
    fn text(&self) -> &str {
        &self.text
    }

    fn spans(&self) -> &[Span] {
        &self.spans
    }
}
