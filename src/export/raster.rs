use std::io::Cursor;

use anyhow::Context;

use crate::document::model::Document;
use crate::foundation::error::{CoverError, CoverResult};
use crate::render::compositor::{CompositorSettings, LayerCompositor, RenderResources};
use crate::render::surface::Surface;

/// Largest accepted export multiplier.
pub const MAX_EXPORT_MULTIPLIER: f64 = 8.0;

/// Options shared by PNG and JPEG export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOptions {
    /// Output pixels per canvas pixel, in `(0, 8]`.
    pub multiplier: f64,
    /// JPEG quality, `1..=100`.
    pub jpeg_quality: u8,
    /// Image and vector bounding box as a fraction of the canvas.
    pub image_fit: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            jpeg_quality: 92,
            image_fit: 1.0,
        }
    }
}

impl ExportOptions {
    /// Set the output size multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Set the image bounding-box fraction.
    pub fn with_image_fit(mut self, fit: f64) -> Self {
        self.image_fit = fit;
        self
    }

    /// Check every option is within its documented range.
    pub fn validate(&self) -> CoverResult<()> {
        if !self.multiplier.is_finite()
            || self.multiplier <= 0.0
            || self.multiplier > MAX_EXPORT_MULTIPLIER
        {
            return Err(CoverError::validation(format!(
                "export multiplier must be in (0, {MAX_EXPORT_MULTIPLIER}], got {}",
                self.multiplier
            )));
        }
        validate_quality(self.jpeg_quality)
    }

    /// Compositor settings matching these options.
    pub fn compositor_settings(&self) -> CompositorSettings {
        CompositorSettings::default()
            .with_multiplier(self.multiplier)
            .with_image_fit(self.image_fit)
    }
}

fn validate_quality(quality: u8) -> CoverResult<()> {
    if !(1..=100).contains(&quality) {
        return Err(CoverError::validation(format!(
            "jpeg quality must be in 1..=100, got {quality}"
        )));
    }
    Ok(())
}

/// Render `document` at the export size.
pub fn render_for_export(
    document: &Document,
    resources: RenderResources<'_>,
    opts: &ExportOptions,
) -> CoverResult<Surface> {
    opts.validate()?;
    LayerCompositor::new(opts.compositor_settings()).render_new(document, resources)
}

/// Render and encode as PNG (straight RGBA8).
#[tracing::instrument(skip(document, resources), fields(w = document.canvas_width, h = document.canvas_height))]
pub fn export_png(
    document: &Document,
    resources: RenderResources<'_>,
    opts: &ExportOptions,
) -> CoverResult<Vec<u8>> {
    let surface = render_for_export(document, resources, opts)?;
    encode_png(&surface)
}

/// Render and encode as JPEG, flattening transparency over white.
#[tracing::instrument(skip(document, resources), fields(w = document.canvas_width, h = document.canvas_height))]
pub fn export_jpeg(
    document: &Document,
    resources: RenderResources<'_>,
    quality: u8,
    opts: &ExportOptions,
) -> CoverResult<Vec<u8>> {
    validate_quality(quality)?;
    let surface = render_for_export(document, resources, opts)?;
    encode_jpeg(&surface, quality)
}

/// Encode a surface as PNG.
pub fn encode_png(surface: &Surface) -> CoverResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(
        surface.width(),
        surface.height(),
        surface.to_rgba8_straight(),
    )
    .ok_or_else(|| CoverError::render("surface buffer does not match its size"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Encode a surface as JPEG over a white backdrop.
pub fn encode_jpeg(surface: &Surface, quality: u8) -> CoverResult<Vec<u8>> {
    validate_quality(quality)?;
    let rgb = flatten_over_white(surface.data());
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    image::ImageEncoder::write_image(
        encoder,
        &rgb,
        surface.width(),
        surface.height(),
        image::ExtendedColorType::Rgb8,
    )
    .context("encode jpeg")?;
    Ok(buf)
}

/// Premultiplied RGBA8 composited over opaque white, as packed RGB8.
fn flatten_over_white(premul: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(premul.len() / 4 * 3);
    for px in premul.chunks_exact(4) {
        let inv = 255 - u16::from(px[3]);
        for &c in &px[..3] {
            out.push((u16::from(c) + inv).min(255) as u8);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/export/raster.rs"]
mod tests;
