// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration.
//!
//! Every field has a default, so an empty file (or no file) is valid.

use crate::io::serialization::MAX_SCENE_SIDE;
use crate::models::content::QrType;
use crate::models::design::{Color, ErrorCorrection};
use crate::models::project::Project;
use anyhow::{bail, Context, Result};
use rusttype::Font;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Fonts tried, in order, when no `font_path` is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: Color,
    /// Delay between the last content or design edit and regeneration.
    pub debounce_ms: u64,
    /// Error correction for new projects. Higher than the design default so
    /// a centre logo can cover part of the symbol.
    pub default_error_correction: ErrorCorrection,
    pub thumbnail_scale: f64,
    pub jpeg_quality: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 400,
            canvas_height: 400,
            background: Color::WHITE,
            debounce_ms: 300,
            default_error_correction: ErrorCorrection::Q,
            thumbnail_scale: 0.5,
            jpeg_quality: 92,
            font_path: None,
        }
    }
}

impl EditorConfig {
    /// Load from a YAML or JSON file, by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            other => bail!("Unsupported config extension: {:?}", other),
        };
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            bail!("canvas size {}x{} has no area", self.canvas_width, self.canvas_height);
        }
        if self.canvas_width > MAX_SCENE_SIDE || self.canvas_height > MAX_SCENE_SIDE {
            bail!(
                "canvas size {}x{} exceeds {MAX_SCENE_SIDE}px",
                self.canvas_width,
                self.canvas_height
            );
        }
        if !(self.thumbnail_scale.is_finite() && self.thumbnail_scale > 0.0) {
            bail!("thumbnail_scale must be positive, got {}", self.thumbnail_scale);
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            bail!("jpeg_quality must be between 1 and 100, got {}", self.jpeg_quality);
        }
        Ok(())
    }

    /// A fresh project using this editor's defaults.
    pub fn new_project(&self, id: &str, owner: &str, qr_type: QrType, name: Option<String>) -> Project {
        let mut project = Project::new(id, owner, qr_type, name);
        project.design.error_correction = self.default_error_correction;
        project
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Font for raster text: the configured file, else the first system
    /// font found. `None` (with a warning) when nothing loads.
    pub fn load_font(&self) -> Option<Arc<Font<'static>>> {
        if let Some(path) = &self.font_path {
            match read_font(path) {
                Ok(font) => return Some(font),
                Err(e) => log::warn!("Configured font unusable: {e:#}"),
            }
        }
        let found = FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|p| p.exists())
            .find_map(|p| read_font(p).ok());
        if found.is_none() {
            log::warn!("No usable font found; raster output will not include text layers");
        }
        found
    }
}

fn read_font(path: &Path) -> Result<Arc<Font<'static>>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    let font = Font::try_from_vec(bytes).with_context(|| format!("{} is not a TrueType font", path.display()))?;
    log::debug!("Using font {}", path.display());
    Ok(Arc::new(font))
}
