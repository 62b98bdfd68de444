use kurbo::{Affine, Rect, Shape, Vec2};

use crate::document::color::Color;
use crate::document::typography::{Decoration, FontStyle, TextAlign, TypographyConfig};
use crate::effects::blend::premul_over_in_place_opacity;
use crate::effects::filter_cpu::blur_rgba8_premul;
use crate::foundation::error::{CoverError, CoverResult};
use crate::render::surface::Surface;
use crate::text::fonts::FontBook;
use crate::text::layout::{ShapeParams, ShapedRun, TextLayoutEngine};

/// Oblique angle used when an italic is requested but only upright faces exist.
const SYNTHETIC_ITALIC_DEG: f64 = 12.0;

/// Geometry of a drawn text block, in layer space before rotation and skew.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBounds {
    /// Tight block around all lines.
    pub text: Rect,
    /// Padded background box, when one was drawn.
    pub background: Option<Rect>,
}

/// Where and how large a text block is placed on the target.
#[derive(Clone, Copy, Debug)]
pub struct TextPlacement {
    /// Layer-to-device transform applied before the text matrix.
    pub base: Affine,
    /// Block center in layer space.
    pub anchor: Vec2,
    /// Device pixels per canvas pixel; scales shadow offsets and blur.
    pub device_scale: f64,
}

impl TextPlacement {
    /// Identity placement centered on `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            base: Affine::IDENTITY,
            anchor: Vec2::new(x, y),
            device_scale: 1.0,
        }
    }

    /// Transform applied before the anchor translation.
    pub fn with_base(mut self, base: Affine) -> Self {
        self.base = base;
        self
    }

    /// Scale for shadow offsets and blur radii.
    pub fn with_device_scale(mut self, scale: f64) -> Self {
        self.device_scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        self
    }
}

/// Rotation and skew matrix for a text block, centered on the origin.
pub fn text_matrix(rotation_deg: f64, skew_x_deg: f64, skew_y_deg: f64) -> Affine {
    let r = rotation_deg.to_radians();
    let (sin_r, cos_r) = r.sin_cos();
    let tan_x = skew_x_deg.to_radians().tan();
    let tan_y = skew_y_deg.to_radians().tan();
    Affine::new([
        cos_r + tan_y * sin_r,
        sin_r + tan_y * cos_r,
        tan_x * cos_r - sin_r,
        tan_x * sin_r + cos_r,
        0.0,
        0.0,
    ])
}

/// A run placed inside the block, ready to hand to `vello_cpu`.
struct PlacedRun<'a> {
    run: &'a ShapedRun,
    origin: Vec2,
}

/// Everything computed once per draw and shared by every pass.
struct Block<'a> {
    runs: Vec<PlacedRun<'a>>,
    decorations: Vec<Rect>,
    text: Rect,
    background: Option<Rect>,
    synthetic_italic: bool,
}

#[derive(Clone, Copy)]
enum GlyphPass {
    Stroke { width: f64 },
    Fill,
}

/// Draws [`TypographyConfig`] blocks onto surfaces.
///
/// Holds the shaping engine so faces are registered with parley only once per renderer.
#[derive(Debug, Default)]
pub struct TypographyRenderer {
    engine: TextLayoutEngine,
}

impl TypographyRenderer {
    /// Renderer with a fresh layout engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `config` centered on `(anchor_x, anchor_y)` with no further transform.
    pub fn draw_text(
        &mut self,
        target: &mut Surface,
        fonts: &FontBook,
        config: &TypographyConfig,
        anchor_x: f64,
        anchor_y: f64,
    ) -> CoverResult<TextBounds> {
        self.draw_text_placed(target, fonts, config, TextPlacement::at(anchor_x, anchor_y))
    }

    /// Draw `config` with an explicit placement; used by the compositor for layer transforms.
    pub fn draw_text_placed(
        &mut self,
        target: &mut Surface,
        fonts: &FontBook,
        config: &TypographyConfig,
        placement: TextPlacement,
    ) -> CoverResult<TextBounds> {
        let cfg = config.sanitized();
        let text = cfg.text_transform.apply(&cfg.text);
        if text.trim().is_empty() {
            return Ok(TextBounds {
                text: Rect::from_origin_size(placement.anchor.to_point(), (0.0, 0.0)),
                background: None,
            });
        }

        let resolved = fonts
            .resolve(&cfg.family, cfg.weight, cfg.style == FontStyle::Italic)
            .ok_or_else(|| {
                CoverError::render(format!("no font available for family \"{}\"", cfg.family))
            })?;
        let face_id = resolved.id;
        let synthetic_italic = resolved.synthetic_italic;

        let shaped = self.engine.shape(
            fonts,
            face_id,
            &text,
            ShapeParams {
                size_px: cfg.size as f32,
                letter_spacing_px: cfg.letter_spacing as f32,
            },
        )?;

        let size = cfg.size;
        let advance = size * cfg.line_height;
        let ascent = shaped.ascent_or(size * 0.8);
        let descent = shaped.descent_or(size * 0.2);
        let width = shaped.width();
        let lines = shaped.lines.len().max(1);
        let height = ascent + descent + advance * (lines - 1) as f64;

        let text_rect = Rect::new(-width / 2.0, -height / 2.0, width / 2.0, height / 2.0);
        let thickness = (size / 20.0).max(1.0);

        let mut runs = Vec::new();
        let mut decorations = Vec::new();
        for (i, line) in shaped.lines.iter().enumerate() {
            let baseline = text_rect.y0 + ascent + advance * i as f64;
            let x0 = match cfg.text_align {
                TextAlign::Left => text_rect.x0,
                TextAlign::Center => -line.width / 2.0,
                TextAlign::Right => text_rect.x1 - line.width,
            };
            for run in &line.runs {
                runs.push(PlacedRun {
                    run,
                    origin: Vec2::new(x0, baseline),
                });
            }
            if line.is_empty() {
                continue;
            }
            let y = match cfg.decoration {
                Decoration::None => continue,
                Decoration::Underline => baseline + size * 0.1,
                Decoration::Overline => baseline - ascent,
                Decoration::LineThrough => baseline - size * 0.3,
            };
            decorations.push(Rect::new(
                x0,
                y - thickness / 2.0,
                x0 + line.width,
                y + thickness / 2.0,
            ));
        }

        let background = (cfg.background.opacity_pct > 0.0)
            .then(|| text_rect.inflate(cfg.background.padding, cfg.background.padding));

        let block = Block {
            runs,
            decorations,
            text: text_rect,
            background,
            synthetic_italic,
        };

        let local = placement.base
            * Affine::translate(placement.anchor)
            * text_matrix(cfg.rotation_deg, cfg.skew_x, cfg.skew_y);

        draw_block(target, &cfg, &block, local, placement.device_scale)?;

        Ok(TextBounds {
            text: block.text + placement.anchor,
            background: block.background.map(|r| r + placement.anchor),
        })
    }
}

fn draw_block(
    target: &mut Surface,
    cfg: &TypographyConfig,
    block: &Block<'_>,
    transform: Affine,
    device_scale: f64,
) -> CoverResult<()> {
    if let Some(bg) = block.background {
        let color = cfg
            .background
            .color
            .multiply_alpha(cfg.background.opacity_pct / 100.0);
        let radius = cfg.background.border_radius;
        target.draw_over(|ctx| {
            ctx.set_transform(transform);
            ctx.set_paint(color.to_paint());
            if radius > 0.0 {
                ctx.fill_path(&bg.to_rounded_rect(radius).to_path(0.1));
            } else {
                ctx.fill_rect(&bg);
            }
        })?;
    }

    let mut passes = Vec::with_capacity(3);
    if cfg.stroke.is_active() {
        passes.push((GlyphPass::Stroke { width: cfg.stroke.width }, Some(cfg.stroke.color)));
    }
    if cfg.outline.is_active() {
        passes.push((GlyphPass::Stroke { width: cfg.outline.width }, Some(cfg.outline.color)));
    }
    let solid_fill = (!cfg.gradient.enabled).then_some(cfg.color);
    passes.push((GlyphPass::Fill, solid_fill));

    for (pass, color) in passes {
        if cfg.shadow.is_active() {
            draw_shadow(target, cfg, block, transform, device_scale, pass)?;
        }
        target.draw_over(|ctx| {
            ctx.set_transform(transform);
            match color {
                Some(c) => ctx.set_paint(c.to_paint()),
                None => ctx.set_paint(gradient_paint(cfg, block.text)),
            }
            draw_glyphs(ctx, block, pass);
        })?;
    }

    if !block.decorations.is_empty() {
        target.draw_over(|ctx| {
            ctx.set_transform(transform);
            ctx.set_paint(cfg.color.to_paint());
            for r in &block.decorations {
                ctx.fill_rect(r);
            }
        })?;
    }
    Ok(())
}

/// Offset, blurred silhouette of one glyph pass in the shadow color.
fn draw_shadow(
    target: &mut Surface,
    cfg: &TypographyConfig,
    block: &Block<'_>,
    transform: Affine,
    device_scale: f64,
    pass: GlyphPass,
) -> CoverResult<()> {
    let offset = Vec2::new(cfg.shadow.offset_x, cfg.shadow.offset_y) * device_scale;
    let shadow_color: Color = cfg.shadow.color;
    let silhouette = target.render_scratch(|ctx| {
        ctx.set_transform(Affine::translate(offset) * transform);
        ctx.set_paint(shadow_color.to_paint());
        draw_glyphs(ctx, block, pass);
    });

    let sigma = (cfg.shadow.blur / 2.0 * device_scale) as f32;
    let pixels = if sigma > 0.0 {
        blur_rgba8_premul(
            silhouette.data_as_u8_slice(),
            target.width(),
            target.height(),
            sigma,
        )?
    } else {
        silhouette.data_as_u8_slice().to_vec()
    };
    premul_over_in_place_opacity(target.data_mut(), &pixels, 1.0)
}

fn draw_glyphs(ctx: &mut vello_cpu::RenderContext, block: &Block<'_>, pass: GlyphPass) {
    if let GlyphPass::Stroke { width } = pass {
        ctx.set_stroke(kurbo::Stroke::new(width));
    }
    let base = *ctx.transform();
    for placed in &block.runs {
        if placed.run.glyphs.is_empty() {
            continue;
        }
        // Paint coordinates stay in block space while glyphs move to their run origin.
        ctx.set_transform(base * Affine::translate(placed.origin));
        ctx.set_paint_transform(Affine::translate(-placed.origin));
        let mut builder = ctx
            .glyph_run(&placed.run.font)
            .font_size(placed.run.font_size)
            .hint(false);
        if block.synthetic_italic {
            builder = builder.glyph_transform(Affine::skew(
                -SYNTHETIC_ITALIC_DEG.to_radians().tan(),
                0.0,
            ));
        }
        let glyphs = placed.run.glyphs.iter().copied();
        match pass {
            GlyphPass::Stroke { .. } => builder.stroke_glyphs(glyphs),
            GlyphPass::Fill => builder.fill_glyphs(glyphs),
        }
    }
    ctx.set_transform(base);
    ctx.reset_paint_transform();
}

/// Linear gradient across the text block along `gradient.angle`.
fn gradient_paint(cfg: &TypographyConfig, text: Rect) -> vello_cpu::peniko::Gradient {
    let theta = cfg.gradient.angle.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let half = (text.width() / 2.0 * cos_t).abs() + (text.height() / 2.0 * sin_t).abs();
    let center = text.center();
    let dir = Vec2::new(cos_t, sin_t) * half.max(0.5);
    vello_cpu::peniko::Gradient::new_linear(center - dir, center + dir).with_stops([
        cfg.gradient.start_color.to_paint(),
        cfg.gradient.end_color.to_paint(),
    ])
}

#[cfg(test)]
#[path = "../../tests/unit/text/renderer.rs"]
mod tests;
