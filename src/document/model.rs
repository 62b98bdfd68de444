use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::document::color::Color;
use crate::document::typography::{TypographyConfig, finite_or};
use crate::effects::filter::FilterSpec;
use crate::foundation::core::Canvas;
use crate::foundation::error::{CoverError, CoverResult};

/// How a layer's pixels combine with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Plain source-over.
    #[default]
    #[serde(alias = "source-over")]
    Normal,
    /// Product of source and backdrop.
    Multiply,
    /// Inverse product of the inverses.
    Screen,
    /// Multiply or screen depending on the backdrop.
    Overlay,
    /// Per-channel minimum.
    Darken,
    /// Per-channel maximum.
    Lighten,
    /// Brighten the backdrop toward the source.
    ColorDodge,
    /// Darken the backdrop toward the source.
    ColorBurn,
    /// Multiply or screen depending on the source.
    HardLight,
    /// Soft variant of hard light.
    SoftLight,
    /// Absolute channel difference.
    Difference,
    /// Lower-contrast difference.
    Exclusion,
    /// Source hue with backdrop saturation and luminosity.
    Hue,
    /// Source saturation with backdrop hue and luminosity.
    Saturation,
    /// Source hue and saturation with backdrop luminosity.
    Color,
    /// Source luminosity with backdrop hue and saturation.
    Luminosity,
}

impl BlendMode {
    /// Every mode, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::Normal,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];
}

/// Placement of a layer relative to the canvas center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerTransform {
    /// Horizontal offset from the canvas center in canvas pixels.
    pub x: f64,
    /// Vertical offset from the canvas center in canvas pixels.
    pub y: f64,
    /// Horizontal scale, `>= 0`.
    pub scale_x: f64,
    /// Vertical scale, `>= 0`.
    pub scale_y: f64,
    /// Clockwise rotation in degrees.
    pub rotation_deg: f64,
}

impl Default for LayerTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LayerTransform {
    /// No offset, rotation or scaling.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        rotation_deg: 0.0,
    };

    /// Identity transform moved by `(x, y)`.
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::IDENTITY
        }
    }

    /// Copy with non-finite fields reset and scales clamped to `>= 0`.
    pub fn sanitized(&self) -> Self {
        Self {
            x: finite_or(self.x, 0.0),
            y: finite_or(self.y, 0.0),
            scale_x: finite_or(self.scale_x, 1.0).max(0.0),
            scale_y: finite_or(self.scale_y, 1.0).max(0.0),
            rotation_deg: finite_or(self.rotation_deg, 0.0),
        }
    }
}

/// Raster image content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Source key (relative path) resolved through the asset store.
    pub src: String,
}

/// Vector artwork content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorPayload {
    /// Inline SVG markup or a relative path ending in `.svg`.
    pub svg: String,
}

impl VectorPayload {
    /// True when `svg` holds markup rather than a path.
    pub fn is_inline(&self) -> bool {
        self.svg.trim_start().starts_with('<')
    }
}

/// What a layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum LayerContent {
    /// Decoded bitmap from the asset store.
    Image(ImagePayload),
    /// SVG rasterized by the asset store.
    Vector(VectorPayload),
    /// Styled text drawn by the typography renderer.
    Text(TypographyConfig),
}

impl LayerContent {
    /// Short kind name used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Vector(_) => "vector",
            Self::Text(_) => "text",
        }
    }

    /// Asset key this content depends on, if any.
    pub fn asset_source(&self) -> Option<&str> {
        match self {
            Self::Image(p) => Some(&p.src),
            Self::Vector(p) => Some(&p.svg),
            Self::Text(_) => None,
        }
    }
}

/// One entry of the document's bottom-to-top layer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedLayer {
    /// Unique, non-empty id within the document.
    pub id: String,
    /// Hidden layers are skipped entirely.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Locked layers reject restyle and move through the editor session.
    #[serde(default)]
    pub locked: bool,
    /// Layer opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Compositing mode onto the layers below.
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// Placement relative to the canvas center.
    #[serde(default)]
    pub transform: LayerTransform,
    /// Filter chain applied to the layer before compositing.
    #[serde(default)]
    pub filter_chain: FilterSpec,
    /// Kind-specific content, serialized as `kind` + `payload`.
    #[serde(flatten)]
    pub content: LayerContent,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

impl OrderedLayer {
    /// Visible, unlocked, fully opaque layer with identity transform and filters.
    pub fn new(id: impl Into<String>, content: LayerContent) -> Self {
        Self {
            id: id.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            transform: LayerTransform::IDENTITY,
            filter_chain: FilterSpec::IDENTITY,
            content,
        }
    }

    /// Image layer shorthand.
    pub fn image(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(id, LayerContent::Image(ImagePayload { src: src.into() }))
    }

    /// Vector layer shorthand.
    pub fn vector(id: impl Into<String>, svg: impl Into<String>) -> Self {
        Self::new(id, LayerContent::Vector(VectorPayload { svg: svg.into() }))
    }

    /// Text layer shorthand.
    pub fn text(id: impl Into<String>, config: TypographyConfig) -> Self {
        Self::new(id, LayerContent::Text(config))
    }

    /// Set the layer opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the blend mode.
    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Set the placement transform.
    pub fn with_transform(mut self, transform: LayerTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the filter chain.
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter_chain = filter;
        self
    }

    /// Show or hide the layer.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Lock or unlock the layer.
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Opacity clamped to `0..=1`; non-finite values count as opaque.
    pub fn clamped_opacity(&self) -> f64 {
        finite_or(self.opacity, 1.0).clamp(0.0, 1.0)
    }

    fn sanitize(&mut self) {
        self.opacity = self.clamped_opacity();
        self.transform = self.transform.sanitized();
        self.filter_chain = self.filter_chain.clamped();
        if let LayerContent::Text(cfg) = &mut self.content {
            *cfg = cfg.sanitized();
        }
    }
}

/// The editable document: canvas size, background and ordered layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Canvas width in pixels, `1..=16384`.
    pub canvas_width: u32,
    /// Canvas height in pixels, `1..=16384`.
    pub canvas_height: u32,
    /// Fill drawn before any layer; `transparent` leaves the canvas clear.
    #[serde(default = "default_background")]
    pub background: Color,
    /// Layers, bottom to top.
    #[serde(default)]
    pub layers: Vec<OrderedLayer>,
}

fn default_background() -> Color {
    Color::WHITE
}

impl Document {
    /// Empty document with the given canvas size and background.
    pub fn new(canvas_width: u32, canvas_height: u32, background: Color) -> CoverResult<Self> {
        Canvas::new(canvas_width, canvas_height)?;
        Ok(Self {
            canvas_width,
            canvas_height,
            background,
            layers: Vec::new(),
        })
    }

    /// Canvas dimensions, validated.
    pub fn canvas(&self) -> CoverResult<Canvas> {
        Canvas::new(self.canvas_width, self.canvas_height)
    }

    /// Check canvas bounds and layer id uniqueness.
    pub fn validate(&self) -> CoverResult<()> {
        self.canvas()?;
        let mut seen = BTreeSet::new();
        for layer in &self.layers {
            if layer.id.trim().is_empty() {
                return Err(CoverError::validation("layer id must be non-empty"));
            }
            if !seen.insert(layer.id.as_str()) {
                return Err(CoverError::validation(format!(
                    "duplicate layer id \"{}\"",
                    layer.id
                )));
            }
        }
        Ok(())
    }

    /// Clamp every numeric layer field into range; non-finite values take their defaults.
    pub fn sanitize(&mut self) {
        for layer in &mut self.layers {
            layer.sanitize();
        }
    }

    /// Parse, sanitize and validate a JSON document.
    pub fn from_json(s: &str) -> CoverResult<Self> {
        let mut doc: Self = serde_json::from_str(s)?;
        doc.sanitize();
        doc.validate()?;
        Ok(doc)
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> CoverResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> CoverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Position of the layer with `id`.
    pub fn layer_index(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Layer with `id`.
    pub fn layer(&self, id: &str) -> Option<&OrderedLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Mutable layer with `id`.
    pub fn layer_mut(&mut self, id: &str) -> Option<&mut OrderedLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
