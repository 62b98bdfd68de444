use crate::foundation::error::{CoverError, CoverResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Largest accepted canvas edge in pixels.
pub const MAX_CANVAS_DIM: u32 = 16_384;

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Build a canvas, rejecting zero or oversize edges.
    pub fn new(width: u32, height: u32) -> CoverResult<Self> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    /// Check both edges are within `1..=MAX_CANVAS_DIM`.
    pub fn validate(self) -> CoverResult<()> {
        if !(1..=MAX_CANVAS_DIM).contains(&self.width) || !(1..=MAX_CANVAS_DIM).contains(&self.height)
        {
            return Err(CoverError::validation(format!(
                "canvas {}x{} out of range (1..={MAX_CANVAS_DIM})",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Multiply both edges by `multiplier`, rounding and keeping each edge at least 1px.
    pub fn scaled(self, multiplier: f64) -> CoverResult<Self> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(CoverError::validation(format!(
                "scale multiplier must be finite and > 0, got {multiplier}"
            )));
        }
        let w = ((f64::from(self.width) * multiplier).round() as u32).max(1);
        let h = ((f64::from(self.height) * multiplier).round() as u32).max(1);
        Self::new(w, h)
    }

    /// Center of the canvas in pixel coordinates.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) * 0.5, f64::from(self.height) * 0.5)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self::default()
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Undo premultiplication. Fully transparent pixels map to transparent black.
    pub fn to_straight_rgba(self) -> [u8; 4] {
        if self.a == 0 {
            return [0, 0, 0, 0];
        }
        let a = u32::from(self.a);
        let un = |c: u8| -> u8 { ((u32::from(c) * 255 + a / 2) / a).min(255) as u8 };
        [un(self.r), un(self.g), un(self.b), self.a]
    }

    /// Channel array in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
