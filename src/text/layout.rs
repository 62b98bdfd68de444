use std::borrow::Cow;
use std::collections::HashMap;

use crate::foundation::error::{CoverError, CoverResult};
use crate::text::fonts::{FontBook, ResolvedFace};

/// Glyphs of one shaped run, positioned relative to the line origin (x) and baseline (y).
#[derive(Clone, Debug)]
pub struct ShapedRun {
    /// Font that produced the glyph ids.
    pub font: parley::FontData,
    /// Size in pixels per em.
    pub font_size: f32,
    /// Positioned glyphs.
    pub glyphs: Vec<vello_cpu::Glyph>,
}

/// One shaped text line.
#[derive(Clone, Debug, Default)]
pub struct ShapedLine {
    /// Runs in visual order.
    pub runs: Vec<ShapedRun>,
    /// Advance width of the line without trailing whitespace.
    pub width: f64,
    /// Typographic ascent (positive, above baseline).
    pub ascent: f64,
    /// Typographic descent (positive, below baseline).
    pub descent: f64,
}

impl ShapedLine {
    /// True when no line has glyphs.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.glyphs.is_empty())
    }
}

/// Shaped multi-line block; every line is shaped independently.
#[derive(Clone, Debug, Default)]
pub struct ShapedText {
    /// Lines in input order.
    pub lines: Vec<ShapedLine>,
}

impl ShapedText {
    /// Widest line.
    pub fn width(&self) -> f64 {
        self.lines.iter().map(|l| l.width).fold(0.0, f64::max)
    }

    /// Largest ascent over all lines, or `fallback` when nothing was shaped.
    pub fn ascent_or(&self, fallback: f64) -> f64 {
        let a = self.lines.iter().map(|l| l.ascent).fold(0.0, f64::max);
        if a > 0.0 { a } else { fallback }
    }

    /// Largest descent over all lines, or `fallback` when nothing was shaped.
    pub fn descent_or(&self, fallback: f64) -> f64 {
        let d = self.lines.iter().map(|l| l.descent).fold(0.0, f64::max);
        if d > 0.0 { d } else { fallback }
    }
}

/// Shaping request for one face.
#[derive(Clone, Copy, Debug)]
pub struct ShapeParams {
    /// Font size in pixels.
    pub size_px: f32,
    /// Extra advance after each glyph, in pixels.
    pub letter_spacing_px: f32,
}

/// Stateful helper that shapes text with faces from a [`FontBook`].
///
/// Each face is registered into the parley collection once, the first time it is used.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    registered: HashMap<usize, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("registered_faces", &self.registered.len())
            .finish()
    }
}

impl TextLayoutEngine {
    /// Engine with a fresh font context.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
        }
    }

    fn family_for(&mut self, face: &ResolvedFace<'_>) -> CoverResult<String> {
        if let Some(name) = self.registered.get(&face.id) {
            return Ok(name.clone());
        }
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(face.face.data().as_ref().clone()),
            None,
        );
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CoverError::render("no font families registered from font bytes"))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CoverError::render("registered font family has no name"))?
            .to_string();
        self.registered.insert(face.id, name.clone());
        Ok(name)
    }

    /// Shape `text` line by line (split on `\n`) with the resolved face.
    pub fn shape(
        &mut self,
        book: &FontBook,
        face_id: usize,
        text: &str,
        params: ShapeParams,
    ) -> CoverResult<ShapedText> {
        if !params.size_px.is_finite() || params.size_px <= 0.0 {
            return Err(CoverError::validation(
                "text size must be finite and > 0",
            ));
        }
        let face = book
            .face(face_id)
            .ok_or_else(|| CoverError::render(format!("unknown font face {face_id}")))?;
        let resolved = ResolvedFace {
            id: face_id,
            face,
            synthetic_italic: false,
        };
        let family_name = self.family_for(&resolved)?;
        let weight = parley::FontWeight::new(f32::from(face.weight()));
        let style = if face.is_italic() {
            parley::FontStyle::Italic
        } else {
            parley::FontStyle::Normal
        };

        let mut out = ShapedText::default();
        for line_text in text.split('\n') {
            let line_text = line_text.strip_suffix('\r').unwrap_or(line_text);
            out.lines.push(self.shape_line(
                line_text,
                &family_name,
                weight,
                style,
                params,
            ));
        }
        Ok(out)
    }

    fn shape_line(
        &mut self,
        text: &str,
        family_name: &str,
        weight: parley::FontWeight,
        style: parley::FontStyle,
        params: ShapeParams,
    ) -> ShapedLine {
        if text.is_empty() {
            return ShapedLine::default();
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::StyleProperty::FontStack(parley::FontStack::Source(
            Cow::Owned(family_name.to_owned()),
        )));
        builder.push_default(parley::StyleProperty::FontSize(params.size_px));
        builder.push_default(parley::StyleProperty::FontWeight(weight));
        builder.push_default(parley::StyleProperty::FontStyle(style));
        if params.letter_spacing_px != 0.0 {
            builder.push_default(parley::StyleProperty::LetterSpacing(
                params.letter_spacing_px,
            ));
        }

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut line_out = ShapedLine::default();
        for line in layout.lines() {
            let m = line.metrics();
            line_out.ascent = line_out.ascent.max(f64::from(m.ascent));
            line_out.descent = line_out.descent.max(f64::from(m.descent));
            line_out.width = line_out
                .width
                .max(f64::from(m.advance - m.trailing_whitespace));
            let baseline = m.baseline;
            for item in line.items() {
                let parley::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run
                    .positioned_glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y - baseline,
                    })
                    .collect();
                line_out.runs.push(ShapedRun {
                    font: run.run().font().clone(),
                    font_size: run.run().font_size(),
                    glyphs,
                });
            }
        }
        line_out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
