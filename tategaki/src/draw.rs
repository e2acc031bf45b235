// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Draw contract between layouts and a rendering backend.
//!
//! Layouts never talk to a graphics API directly. They emit glyph runs,
//! plain text and transform calls into a [`Canvas`]. Coordinates are in
//! pixels, y grows downward.

use crate::font::FontId;
use smallvec::SmallVec;

/// Glyphs per upright draw batch.
pub const GLYPH_BATCH_SIZE: usize = 20;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Font, size and color of a draw call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PaintStyle {
    pub font: FontId,
    pub font_size: f32,
    /// Horizontal scale applied to text, 1.0 when uncompressed.
    pub scale_x: f32,
    pub color: [f32; 4],
}

/// Per-call drawing options.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawParams {
    pub color: [f32; 4],
    /// Emit debug overlays through the canvas debug hooks.
    pub debug_overlays: bool,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            debug_overlays: false,
        }
    }
}

impl DrawParams {
    pub(crate) fn paint(&self, font: FontId, font_size: f32) -> PaintStyle {
        PaintStyle {
            font,
            font_size,
            scale_x: 1.0,
            color: self.color,
        }
    }
}

/// What a debug overlay marks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DebugMark {
    Line,
    Baseline,
    Run,
    Glyph,
}

pub trait Canvas {
    fn draw_glyphs(&mut self, glyphs: &[u16], positions: &[Point], paint: &PaintStyle);

    /// Draws `text` horizontally with its baseline origin at `origin`.
    fn draw_text(&mut self, text: &str, origin: Point, paint: &PaintStyle);

    fn save(&mut self);

    fn restore(&mut self);

    /// Rotates subsequent drawing clockwise by `degrees` around `pivot`.
    fn rotate(&mut self, degrees: f32, pivot: Point);

    fn debug_rect(&mut self, _rect: Rect, _mark: DebugMark) {}

    fn debug_line(&mut self, _from: Point, _to: Point, _mark: DebugMark) {}

    fn debug_point(&mut self, _at: Point, _mark: DebugMark) {}
}

/// Accumulates upright glyphs and flushes them as one
/// [`Canvas::draw_glyphs`] call per font and per [`GLYPH_BATCH_SIZE`]
/// glyphs.
pub(crate) struct GlyphBatch {
    font: Option<FontId>,
    glyphs: SmallVec<[u16; GLYPH_BATCH_SIZE]>,
    positions: SmallVec<[Point; GLYPH_BATCH_SIZE]>,
    font_size: f32,
    color: [f32; 4],
}

impl GlyphBatch {
    pub(crate) fn new(font_size: f32, params: &DrawParams) -> Self {
        Self {
            font: None,
            glyphs: SmallVec::new(),
            positions: SmallVec::new(),
            font_size,
            color: params.color,
        }
    }

    pub(crate) fn push(
        &mut self,
        canvas: &mut dyn Canvas,
        font: FontId,
        glyph: u16,
        position: Point,
    ) {
        if self.font != Some(font) || self.glyphs.len() == GLYPH_BATCH_SIZE {
            self.flush(canvas);
            self.font = Some(font);
        }
        self.glyphs.push(glyph);
        self.positions.push(position);
    }

    pub(crate) fn flush(&mut self, canvas: &mut dyn Canvas) {
        let Some(font) = self.font else {
            return;
        };
        if self.glyphs.is_empty() {
            return;
        }
        let paint = PaintStyle {
            font,
            font_size: self.font_size,
            scale_x: 1.0,
            color: self.color,
        };
        canvas.draw_glyphs(&self.glyphs, &self.positions, &paint);
        self.glyphs.clear();
        self.positions.clear();
    }
}

/// A recorded canvas call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Glyphs {
        glyphs: Vec<u16>,
        positions: Vec<Point>,
        paint: PaintStyle,
    },
    Text {
        text: String,
        origin: Point,
        paint: PaintStyle,
    },
    Save,
    Restore,
    Rotate {
        degrees: f32,
        pivot: Point,
    },
    DebugRect(Rect, DebugMark),
    DebugLine(Point, Point, DebugMark),
    DebugPoint(Point, DebugMark),
}

/// Canvas that records every call, for display-list backends and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Every glyph drawn, with its position, in draw order.
    pub fn glyphs(&self) -> Vec<(u16, Point)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Glyphs {
                    glyphs, positions, ..
                } => Some(glyphs.iter().copied().zip(positions.iter().copied())),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Text of every `draw_text` call, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn draw_glyphs(&mut self, glyphs: &[u16], positions: &[Point], paint: &PaintStyle) {
        self.commands.push(DrawCommand::Glyphs {
            glyphs: glyphs.to_vec(),
            positions: positions.to_vec(),
            paint: *paint,
        });
    }

    fn draw_text(&mut self, text: &str, origin: Point, paint: &PaintStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            origin,
            paint: *paint,
        });
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn rotate(&mut self, degrees: f32, pivot: Point) {
        self.commands.push(DrawCommand::Rotate { degrees, pivot });
    }

    fn debug_rect(&mut self, rect: Rect, mark: DebugMark) {
        self.commands.push(DrawCommand::DebugRect(rect, mark));
    }

    fn debug_line(&mut self, from: Point, to: Point, mark: DebugMark) {
        self.commands.push(DrawCommand::DebugLine(from, to, mark));
    }

    fn debug_point(&mut self, at: Point, mark: DebugMark) {
        self.commands.push(DrawCommand::DebugPoint(at, mark));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_flushes_on_font_change_and_when_full() {
        let a = FontId::from_raw(1);
        let b = FontId::from_raw(2);
        let mut canvas = RecordingCanvas::new();
        let mut batch = GlyphBatch::new(16.0, &DrawParams::default());
        for i in 0..25u16 {
            batch.push(&mut canvas, a, i, Point::new(0.0, i as f32));
        }
        batch.push(&mut canvas, b, 99, Point::default());
        batch.flush(&mut canvas);

        let sizes: Vec<(usize, FontId)> = canvas
            .commands()
            .iter()
            .map(|command| match command {
                DrawCommand::Glyphs { glyphs, paint, .. } => (glyphs.len(), paint.font),
                other => panic!("unexpected command {other:?}"),
            })
            .collect();
        assert_eq!(sizes, vec![(20, a), (5, a), (1, b)]);
        assert_eq!(canvas.glyphs().len(), 26);
    }

    #[test]
    fn empty_batch_draws_nothing() {
        let mut canvas = RecordingCanvas::new();
        let mut batch = GlyphBatch::new(16.0, &DrawParams::default());
        batch.flush(&mut canvas);
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn default_debug_hooks_are_no_ops() {
        struct Plain(usize);
        impl Canvas for Plain {
            fn draw_glyphs(&mut self, _: &[u16], _: &[Point], _: &PaintStyle) {
                self.0 += 1;
            }
            fn draw_text(&mut self, _: &str, _: Point, _: &PaintStyle) {
                self.0 += 1;
            }
            fn save(&mut self) {}
            fn restore(&mut self) {}
            fn rotate(&mut self, _: f32, _: Point) {}
        }
        let mut canvas = Plain(0);
        canvas.debug_rect(Rect::default(), DebugMark::Line);
        canvas.debug_point(Point::default(), DebugMark::Glyph);
        assert_eq!(canvas.0, 0);
    }
}
