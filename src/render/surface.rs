use crate::assets::decode::unpremultiply_rgba8_in_place;
use crate::document::model::BlendMode;
use crate::effects::blend::composite_over;
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{CoverError, CoverResult};

/// Premultiplied RGBA8 raster target backed by a `vello_cpu` pixmap.
#[derive(Clone)]
pub struct Surface {
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Surface {
    /// Transparent surface; both edges must be within the canvas limits.
    pub fn new(width: u32, height: u32) -> CoverResult<Self> {
        let canvas = Canvas::new(width, height)?;
        Self::for_canvas(canvas)
    }

    /// Transparent surface sized to `canvas`.
    pub fn for_canvas(canvas: Canvas) -> CoverResult<Self> {
        canvas.validate()?;
        let w: u16 = canvas
            .width
            .try_into()
            .map_err(|_| CoverError::validation("surface width exceeds u16"))?;
        let h: u16 = canvas
            .height
            .try_into()
            .map_err(|_| CoverError::validation("surface height exceeds u16"))?;
        Ok(Self {
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    /// Size as a [`Canvas`].
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    /// Overwrite every pixel with `px`.
    pub fn fill(&mut self, px: Rgba8Premul) {
        let px = px.to_array();
        for d in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Premultiplied bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Mutable premultiplied bytes, row-major.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn sample_premul(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let idx = ((y as usize) * (self.width() as usize) + (x as usize)) * 4;
        let d = self.data();
        Some(Rgba8Premul {
            r: d[idx],
            g: d[idx + 1],
            b: d[idx + 2],
            a: d[idx + 3],
        })
    }

    /// Straight-alpha pixel at `(x, y)`.
    pub fn sample(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.sample_premul(x, y).map(Rgba8Premul::to_straight_rgba)
    }

    /// Copy of the pixels with premultiplication undone.
    pub fn to_rgba8_straight(&self) -> Vec<u8> {
        let mut out = self.data().to_vec();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Composite another surface of the same size on top of this one.
    pub fn composite(&mut self, src: &Surface, opacity: f32, mode: BlendMode) -> CoverResult<()> {
        if src.canvas() != self.canvas() {
            return Err(CoverError::render("composite expects equal-size surfaces"));
        }
        composite_over(self.data_mut(), src.data(), opacity, mode)
    }

    /// Draw with a fresh `vello_cpu` context and composite the result over this surface.
    ///
    /// `vello_cpu` renders into a fresh buffer, so drawing happens on a scratch pixmap that is then
    /// laid over the existing pixels with source-over.
    pub(crate) fn draw_over<F>(&mut self, draw: F) -> CoverResult<()>
    where
        F: FnOnce(&mut vello_cpu::RenderContext),
    {
        let scratch = self.render_scratch(draw);
        crate::effects::blend::premul_over_in_place_opacity(
            self.data_mut(),
            scratch.data_as_u8_slice(),
            1.0,
        )
    }

    /// Draw with a fresh `vello_cpu` context into a new transparent pixmap of this size.
    pub(crate) fn render_scratch<F>(&self, draw: F) -> vello_cpu::Pixmap
    where
        F: FnOnce(&mut vello_cpu::RenderContext),
    {
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        draw(&mut ctx);
        ctx.flush();
        let mut scratch = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut scratch);
        scratch
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
