use kurbo::{Affine, Rect, Vec2};

use crate::assets::store::{AssetState, AssetStore, Bitmap};
use crate::document::model::{Document, LayerContent, OrderedLayer};
use crate::document::typography::FontStyle;
use crate::effects::filter::FilterProgram;
use crate::effects::filter_cpu::apply_filter_program;
use crate::foundation::core::Canvas;
use crate::foundation::error::{CoverError, CoverResult};
use crate::foundation::math::hash_str;
use crate::render::surface::Surface;
use crate::text::fonts::FontBook;
use crate::text::renderer::{TextPlacement, TypographyRenderer};

/// Read-only inputs a render needs besides the document.
#[derive(Clone, Copy, Debug)]
pub struct RenderResources<'a> {
    /// Decoded bitmaps for image and vector layers.
    pub assets: &'a AssetStore,
    /// Faces for text layers.
    pub fonts: &'a FontBook,
}

impl<'a> RenderResources<'a> {
    /// Bundle the asset store and font book.
    pub fn new(assets: &'a AssetStore, fonts: &'a FontBook) -> Self {
        Self { assets, fonts }
    }
}

/// Knobs for [`LayerCompositor`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositorSettings {
    /// Fraction of the canvas used as the bounding box for image and vector layers.
    pub image_fit: f64,
    /// Output pixels per canvas pixel.
    pub multiplier: f64,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            image_fit: 1.0,
            multiplier: 1.0,
        }
    }
}

impl CompositorSettings {
    /// Set the image bounding-box fraction.
    pub fn with_image_fit(mut self, fit: f64) -> Self {
        self.image_fit = fit;
        self
    }

    /// Set the output size multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Reject a non-positive multiplier or an image fit outside `(0, 1]`.
    pub fn validate(&self) -> CoverResult<()> {
        if !self.image_fit.is_finite() || self.image_fit <= 0.0 || self.image_fit > 1.0 {
            return Err(CoverError::validation(format!(
                "image_fit must be in (0, 1], got {}",
                self.image_fit
            )));
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(CoverError::validation(format!(
                "multiplier must be finite and > 0, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Uniform scale that fits `img` inside `bounds` without ever enlarging it.
pub fn fit_scale(img_w: f64, img_h: f64, box_w: f64, box_h: f64) -> f64 {
    if img_w <= 0.0 || img_h <= 0.0 {
        return 1.0;
    }
    (box_w / img_w).min(box_h / img_h).min(1.0).max(0.0)
}

/// Layer-space to device transform: canvas center plus offset, rotation, scale.
pub fn layer_affine(canvas: Canvas, layer: &OrderedLayer, multiplier: f64) -> Affine {
    let t = layer.transform.sanitized();
    let anchor = canvas.center().to_vec2() + Vec2::new(t.x, t.y);
    Affine::scale(multiplier)
        * Affine::translate(anchor)
        * Affine::rotate(t.rotation_deg.to_radians())
        * Affine::scale_non_uniform(t.scale_x, t.scale_y)
}

enum LayerDraw {
    Drawn,
    Skipped,
}

/// Draws a [`Document`] onto a [`Surface`], one isolated layer at a time.
#[derive(Debug, Default)]
pub struct LayerCompositor {
    settings: CompositorSettings,
    text: TypographyRenderer,
}

impl LayerCompositor {
    /// Compositor with the given settings.
    pub fn new(settings: CompositorSettings) -> Self {
        Self {
            settings,
            text: TypographyRenderer::new(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> CompositorSettings {
        self.settings
    }

    /// Replace the settings used by later renders.
    pub fn set_settings(&mut self, settings: CompositorSettings) {
        self.settings = settings;
    }

    /// Output size for `document` under the current multiplier.
    pub fn output_canvas(&self, document: &Document) -> CoverResult<Canvas> {
        document.canvas()?.scaled(self.settings.multiplier)
    }

    /// Render into a freshly allocated surface.
    pub fn render_new(
        &mut self,
        document: &Document,
        resources: RenderResources<'_>,
    ) -> CoverResult<Surface> {
        let mut target = Surface::for_canvas(self.output_canvas(document)?)?;
        self.render(document, resources, &mut target)?;
        Ok(target)
    }

    /// Overwrite `target` with the composited document.
    ///
    /// Layers with pending, failed or missing assets and text layers without a usable font are
    /// skipped with a warning; the rest of the frame still renders.
    #[tracing::instrument(
        skip(self, document, resources, target),
        fields(layers = document.layers.len(), width = target.width(), height = target.height())
    )]
    pub fn render(
        &mut self,
        document: &Document,
        resources: RenderResources<'_>,
        target: &mut Surface,
    ) -> CoverResult<()> {
        self.settings.validate()?;
        let canvas = document.canvas()?;
        let out = canvas.scaled(self.settings.multiplier)?;
        if target.canvas() != out {
            return Err(CoverError::validation(format!(
                "target is {}x{}, expected {}x{}",
                target.width(),
                target.height(),
                out.width,
                out.height
            )));
        }

        target.clear();
        if !document.background.is_transparent() {
            target.fill(document.background.to_premul());
        }

        let mut layer_surface = Surface::for_canvas(out)?;
        for layer in &document.layers {
            let opacity = layer.clamped_opacity();
            if !layer.visible || opacity <= 0.0 {
                continue;
            }
            layer_surface.clear();
            if let LayerDraw::Skipped =
                self.draw_layer(&mut layer_surface, canvas, layer, resources)?
            {
                continue;
            }

            let program =
                FilterProgram::build(&layer.filter_chain).scaled(self.settings.multiplier);
            if !program.is_empty() {
                let (w, h) = (layer_surface.width(), layer_surface.height());
                apply_filter_program(
                    layer_surface.data_mut(),
                    w,
                    h,
                    &program,
                    hash_str(&layer.id),
                )?;
            }

            target.composite(&layer_surface, opacity as f32, layer.blend_mode)?;
        }
        Ok(())
    }

    fn draw_layer(
        &mut self,
        surface: &mut Surface,
        canvas: Canvas,
        layer: &OrderedLayer,
        resources: RenderResources<'_>,
    ) -> CoverResult<LayerDraw> {
        let t = layer.transform.sanitized();
        if t.scale_x == 0.0 || t.scale_y == 0.0 {
            return Ok(LayerDraw::Skipped);
        }
        let base = layer_affine(canvas, layer, self.settings.multiplier);
        match &layer.content {
            LayerContent::Image(_) | LayerContent::Vector(_) => {
                let Some(bitmap) = ready_bitmap(resources.assets, layer) else {
                    return Ok(LayerDraw::Skipped);
                };
                let paint = match bitmap.to_paint_image() {
                    Ok(paint) => paint,
                    Err(err) => {
                        tracing::warn!(
                            layer = %layer.id,
                            %err,
                            "bitmap not drawable, skipping layer"
                        );
                        return Ok(LayerDraw::Skipped);
                    }
                };
                self.draw_bitmap(surface, canvas, bitmap, paint, base)?;
            }
            LayerContent::Text(config) => {
                let italic = config.style == FontStyle::Italic;
                if config.is_blank() {
                    return Ok(LayerDraw::Skipped);
                }
                if resources
                    .fonts
                    .resolve(&config.family, config.weight, italic)
                    .is_none()
                {
                    tracing::warn!(
                        layer = %layer.id,
                        family = %config.family,
                        "no usable font, skipping text layer"
                    );
                    return Ok(LayerDraw::Skipped);
                }
                let placement = TextPlacement::at(0.0, 0.0)
                    .with_base(base)
                    .with_device_scale(self.settings.multiplier);
                self.text
                    .draw_text_placed(surface, resources.fonts, config, placement)?;
            }
        }
        Ok(LayerDraw::Drawn)
    }

    fn draw_bitmap(
        &self,
        surface: &mut Surface,
        canvas: Canvas,
        bitmap: &Bitmap,
        paint: vello_cpu::Image,
        base: Affine,
    ) -> CoverResult<()> {
        let (w, h) = (f64::from(bitmap.width()), f64::from(bitmap.height()));
        let fit = self.settings.image_fit;
        let scale = fit_scale(
            w,
            h,
            f64::from(canvas.width) * fit,
            f64::from(canvas.height) * fit,
        );
        let transform = base * Affine::scale(scale) * Affine::translate((-w / 2.0, -h / 2.0));
        surface.draw_over(|ctx| {
            ctx.set_transform(transform);
            ctx.set_paint(paint);
            ctx.fill_rect(&Rect::new(0.0, 0.0, w, h));
        })
    }
}

fn ready_bitmap<'a>(assets: &'a AssetStore, layer: &OrderedLayer) -> Option<&'a Bitmap> {
    match assets.state_for(&layer.content) {
        Some(AssetState::Ready(bitmap)) => Some(bitmap),
        Some(AssetState::Pending) => {
            tracing::warn!(layer = %layer.id, "asset still pending, skipping layer");
            None
        }
        Some(AssetState::Failed(reason)) => {
            tracing::warn!(layer = %layer.id, %reason, "asset failed to decode, skipping layer");
            None
        }
        None => {
            tracing::warn!(
                layer = %layer.id,
                source = layer.content.asset_source().unwrap_or_default(),
                "asset missing, skipping layer"
            );
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
