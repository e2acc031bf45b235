// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

pub mod config;
pub mod draw;
pub mod error;
pub mod font;
pub mod layout;

pub use crate::config::{LayoutConfig, SubstitutionConfig};
pub use crate::draw::{Canvas, DrawCommand, DrawParams, RecordingCanvas};
pub use crate::error::{ConfigError, FontError, LayoutError};
pub use crate::font::{
    FontTableCache, FontTableSet, MetricsShaper, SharedData, SwashShaper, TextShaper,
};
pub use crate::layout::{
    AnnotatedText, RubySpan, TextOrientation, VerticalLayout, VerticalTextMeasure,
};
