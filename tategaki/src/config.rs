// Copyright (c) 2026-present, Tategaki Contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::draw::DrawParams;
use crate::error::ConfigError;
use crate::font::{LoadOptions, Tag};
use crate::layout::TextOrientation;
use serde::{Deserialize, Serialize};

/// GSUB selection used for vertical presentation forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionConfig {
    #[serde(default = "default_script")]
    pub script: Tag,
    #[serde(default = "default_language")]
    pub language: Tag,
    #[serde(default = "default_feature")]
    pub feature: Tag,
}

impl Default for SubstitutionConfig {
    fn default() -> Self {
        Self {
            script: default_script(),
            language: default_language(),
            feature: default_feature(),
        }
    }
}

#[inline]
fn default_script() -> Tag {
    Tag::new(b"kana")
}

#[inline]
fn default_language() -> Tag {
    Tag::new(b"JAN ")
}

#[inline]
fn default_feature() -> Tag {
    Tag::new(b"vrt2")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_font_size", rename = "font-size")]
    pub font_size: f32,
    #[serde(default = "default_block_height", rename = "block-height")]
    pub block_height: f32,
    #[serde(default = "default_line_spacing", rename = "line-spacing")]
    pub line_spacing: f32,
    #[serde(default)]
    pub orientation: TextOrientation,
    #[serde(default = "default_bool_true", rename = "compute-full-layout")]
    pub compute_full_layout: bool,
    #[serde(default, rename = "debug-overlays")]
    pub debug_overlays: bool,
    #[serde(default, rename = "flatten-cmap")]
    pub flatten_cmap: bool,
    #[serde(default, rename = "vertical-substitution")]
    pub vertical_substitution: SubstitutionConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            block_height: default_block_height(),
            line_spacing: default_line_spacing(),
            orientation: TextOrientation::default(),
            compute_full_layout: default_bool_true(),
            debug_overlays: false,
            flatten_cmap: false,
            vertical_substitution: SubstitutionConfig::default(),
        }
    }
}

#[inline]
fn default_font_size() -> f32 {
    24.0
}

#[inline]
fn default_block_height() -> f32 {
    600.0
}

#[inline]
fn default_line_spacing() -> f32 {
    0.0
}

#[inline]
fn default_bool_true() -> bool {
    true
}

impl LayoutConfig {
    /// Parses and validates a TOML document. Missing keys take their
    /// defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: LayoutConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "font-size must be positive, got {}",
                self.font_size
            )));
        }
        if !(self.block_height.is_finite() && self.block_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "block-height must be positive, got {}",
                self.block_height
            )));
        }
        if !self.line_spacing.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "line-spacing must be finite, got {}",
                self.line_spacing
            )));
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            flatten_cmap: self.flatten_cmap,
        }
    }

    /// Draw parameters with the configured debug overlays and the default
    /// colour.
    pub fn draw_params(&self) -> DrawParams {
        DrawParams {
            debug_overlays: self.debug_overlays,
            ..DrawParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = LayoutConfig::from_toml_str("").unwrap();
        assert_eq!(config, LayoutConfig::default());
        assert_eq!(config.font_size, 24.0);
        assert!(config.compute_full_layout);
        assert_eq!(config.orientation, TextOrientation::Mixed);
        assert_eq!(config.vertical_substitution.language, Tag::new(b"JAN "));
    }

    #[test]
    fn parses_kebab_case_keys() {
        let config = LayoutConfig::from_toml_str(
            r#"
            font-size = 32.0
            block-height = 480
            line-spacing = 4.0
            orientation = "upright"
            compute-full-layout = false
            flatten-cmap = true

            [vertical-substitution]
            feature = "vert"
            language = "JAN"
            "#,
        )
        .unwrap();
        assert_eq!(config.font_size, 32.0);
        assert_eq!(config.block_height, 480.0);
        assert_eq!(config.orientation, TextOrientation::Upright);
        assert!(!config.compute_full_layout);
        assert!(config.load_options().flatten_cmap);
        assert_eq!(config.vertical_substitution.feature, Tag::new(b"vert"));
        assert_eq!(config.vertical_substitution.language, Tag::new(b"JAN "));
        assert_eq!(config.vertical_substitution.script, Tag::new(b"kana"));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            LayoutConfig::from_toml_str("font-size = 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LayoutConfig::from_toml_str("block-height = -3.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LayoutConfig::from_toml_str("orientation = \"diagonal\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LayoutConfig::from_toml_str("[vertical-substitution]\nfeature = \"toolong\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
