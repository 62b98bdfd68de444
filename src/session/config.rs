use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::assets::store::AssetStore;
use crate::export::raster::{ExportOptions, MAX_EXPORT_MULTIPLIER};
use crate::foundation::error::{CoverError, CoverResult};
use crate::history::manager::{DEFAULT_HISTORY_CAPACITY, HistoryManager};
use crate::render::compositor::CompositorSettings;
use crate::text::fonts::FontBook;

/// Export defaults inside [`EditorConfig`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    /// Output size multiplier, `(0, 8]`.
    pub multiplier: f64,
    /// JPEG quality, `1..=100`.
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            jpeg_quality: 92,
        }
    }
}

/// Editor-wide settings, loaded from JSON or left at defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Snapshots kept for undo/redo.
    pub history_capacity: usize,
    /// Image bounding box as a fraction of the canvas, `(0, 1]`.
    pub image_fit: f64,
    /// Family used when a text layer names one that is not loaded.
    pub default_font_family: Option<String>,
    /// Font files registered at session start.
    pub font_paths: Vec<PathBuf>,
    /// Base directory for image and SVG sources.
    pub assets_root: Option<PathBuf>,
    /// Export defaults.
    pub export: ExportConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            image_fit: 1.0,
            default_font_family: None,
            font_paths: Vec::new(),
            assets_root: None,
            export: ExportConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Read and validate a JSON config file.
    pub fn from_path(path: &Path) -> CoverResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Parse and validate config JSON; missing keys take their defaults.
    pub fn from_json_str(s: &str) -> CoverResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every field is within its documented range.
    pub fn validate(&self) -> CoverResult<()> {
        if self.history_capacity == 0 {
            return Err(CoverError::validation("historyCapacity must be >= 1"));
        }
        if !self.image_fit.is_finite() || self.image_fit <= 0.0 || self.image_fit > 1.0 {
            return Err(CoverError::validation(format!(
                "imageFit must be in (0, 1], got {}",
                self.image_fit
            )));
        }
        if !self.export.multiplier.is_finite()
            || self.export.multiplier <= 0.0
            || self.export.multiplier > MAX_EXPORT_MULTIPLIER
        {
            return Err(CoverError::validation(format!(
                "export.multiplier must be in (0, {MAX_EXPORT_MULTIPLIER}], got {}",
                self.export.multiplier
            )));
        }
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(CoverError::validation(format!(
                "export.jpegQuality must be in 1..=100, got {}",
                self.export.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Settings for on-screen rendering (multiplier 1).
    pub fn compositor_settings(&self) -> CompositorSettings {
        CompositorSettings::default().with_image_fit(self.image_fit)
    }

    /// Export options built from the `export` section and `imageFit`.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions::default()
            .with_multiplier(self.export.multiplier)
            .with_jpeg_quality(self.export.jpeg_quality)
            .with_image_fit(self.image_fit)
    }

    /// Fresh history with the configured capacity.
    pub fn history(&self) -> HistoryManager {
        HistoryManager::with_capacity(self.history_capacity)
    }

    /// Font book with every configured font file registered.
    pub fn load_fonts(&self) -> CoverResult<FontBook> {
        let mut book = FontBook::new();
        for path in &self.font_paths {
            book.register_file(path)?;
        }
        book.set_default_family(self.default_font_family.clone());
        Ok(book)
    }

    /// Asset store rooted at `assetsRoot`; font files also back SVG text.
    pub fn asset_store(&self) -> AssetStore {
        let store = match &self.assets_root {
            Some(root) => AssetStore::with_root(root.clone()),
            None => AssetStore::new(),
        };
        store.with_svg_fonts(self.font_paths.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
