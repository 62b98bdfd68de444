use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// CSS-filter-like parameters stored on a layer.
///
/// Every field has an identity value (no visible change). Out-of-range values are clamped when a
/// program is built, non-finite values count as identity, and identity fields are omitted from
/// serialized documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    /// Gaussian std-dev in pixels, `[0, 100]`.
    #[serde(skip_serializing_if = "is_zero")]
    pub blur: f64,
    /// Percent, `[0, 200]`, identity 100.
    #[serde(skip_serializing_if = "is_hundred")]
    pub brightness: f64,
    /// Percent, `[0, 200]`, identity 100.
    #[serde(skip_serializing_if = "is_hundred")]
    pub contrast: f64,
    /// Percent, `[0, 200]`, identity 100.
    #[serde(skip_serializing_if = "is_hundred")]
    pub saturation: f64,
    /// Degrees, wraps modulo 360.
    #[serde(skip_serializing_if = "is_zero")]
    pub hue_deg: f64,
    /// Percent, `[0, 100]`.
    #[serde(skip_serializing_if = "is_zero")]
    pub sepia: f64,
    /// Percent, `[0, 100]`.
    #[serde(skip_serializing_if = "is_zero")]
    pub invert: f64,
    /// Percent, `[0, 100]`.
    #[serde(skip_serializing_if = "is_zero")]
    pub grayscale: f64,
    /// Percent, `[0, 100]`.
    #[serde(skip_serializing_if = "is_zero")]
    pub noise: f64,
    /// Horizontal channel split in pixels, `[0, 50]`.
    #[serde(skip_serializing_if = "is_zero")]
    pub chromatic_aberration: f64,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn is_hundred(v: &f64) -> bool {
    *v == 100.0
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FilterSpec {
    /// Spec where every field is at its identity value.
    pub const IDENTITY: Self = Self {
        blur: 0.0,
        brightness: 100.0,
        contrast: 100.0,
        saturation: 100.0,
        hue_deg: 0.0,
        sepia: 0.0,
        invert: 0.0,
        grayscale: 0.0,
        noise: 0.0,
        chromatic_aberration: 0.0,
    };

    /// Copy with every field clamped to its range and non-finite values reset to identity.
    pub fn clamped(&self) -> Self {
        let id = Self::IDENTITY;
        let hue = finite_or(self.hue_deg, id.hue_deg).rem_euclid(360.0);
        Self {
            blur: clamp_field(self.blur, id.blur, 0.0, 100.0),
            brightness: clamp_field(self.brightness, id.brightness, 0.0, 200.0),
            contrast: clamp_field(self.contrast, id.contrast, 0.0, 200.0),
            saturation: clamp_field(self.saturation, id.saturation, 0.0, 200.0),
            // rem_euclid can round up to exactly 360 for tiny negative inputs.
            hue_deg: if hue >= 360.0 { 0.0 } else { hue },
            sepia: clamp_field(self.sepia, id.sepia, 0.0, 100.0),
            invert: clamp_field(self.invert, id.invert, 0.0, 100.0),
            grayscale: clamp_field(self.grayscale, id.grayscale, 0.0, 100.0),
            noise: clamp_field(self.noise, id.noise, 0.0, 100.0),
            chromatic_aberration: clamp_field(self.chromatic_aberration, id.chromatic_aberration, 0.0, 50.0),
        }
    }

    /// True when the clamped spec changes nothing.
    pub fn is_identity(&self) -> bool {
        self.clamped() == Self::IDENTITY
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

fn clamp_field(v: f64, identity: f64, lo: f64, hi: f64) -> f64 {
    finite_or(v, identity).clamp(lo, hi)
}

/// One typed filter operation. Amounts are normalized: `1.0` is 100%.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    /// Gaussian blur with the given std-dev in pixels.
    Blur {
        /// Std-dev in pixels.
        sigma: f64,
    },
    /// Linear RGB multiplier.
    Brightness(f64),
    /// Contrast around mid-gray.
    Contrast(f64),
    /// Saturation multiplier.
    Saturate(f64),
    /// Hue rotation in degrees, `[0, 360)`.
    HueRotate(f64),
    /// Sepia amount, `[0, 1]`.
    Sepia(f64),
    /// Invert amount, `[0, 1]`.
    Invert(f64),
    /// Grayscale amount, `[0, 1]`.
    Grayscale(f64),
    /// Deterministic monochrome noise amount, `[0, 1]`.
    Noise(f64),
    /// Red/blue horizontal split distance in pixels.
    ChromaticAberration {
        /// Offset in pixels applied to red (left) and blue (right).
        offset: f64,
    },
}

impl FilterOp {
    /// True for the ops that are a pure per-pixel color matrix.
    pub fn is_color_matrix(&self) -> bool {
        matches!(
            self,
            Self::Brightness(_)
                | Self::Contrast(_)
                | Self::Saturate(_)
                | Self::HueRotate(_)
                | Self::Sepia(_)
                | Self::Invert(_)
                | Self::Grayscale(_)
        )
    }
}

/// Ordered filter operations produced by [`FilterProgram::build`].
///
/// An empty program means "apply no filter".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterProgram {
    ops: Vec<FilterOp>,
}

impl FilterProgram {
    /// Build the program for `spec`.
    ///
    /// Order: blur, brightness, contrast, saturation, hue-rotate, sepia, invert, grayscale, noise,
    /// chromatic aberration. Ops whose clamped parameter equals identity are left out.
    pub fn build(spec: &FilterSpec) -> Self {
        let s = spec.clamped();
        let id = FilterSpec::IDENTITY;
        let mut ops = Vec::new();

        if s.blur != id.blur {
            ops.push(FilterOp::Blur { sigma: s.blur });
        }
        if s.brightness != id.brightness {
            ops.push(FilterOp::Brightness(s.brightness / 100.0));
        }
        if s.contrast != id.contrast {
            ops.push(FilterOp::Contrast(s.contrast / 100.0));
        }
        if s.saturation != id.saturation {
            ops.push(FilterOp::Saturate(s.saturation / 100.0));
        }
        if s.hue_deg != id.hue_deg {
            ops.push(FilterOp::HueRotate(s.hue_deg));
        }
        if s.sepia != id.sepia {
            ops.push(FilterOp::Sepia(s.sepia / 100.0));
        }
        if s.invert != id.invert {
            ops.push(FilterOp::Invert(s.invert / 100.0));
        }
        if s.grayscale != id.grayscale {
            ops.push(FilterOp::Grayscale(s.grayscale / 100.0));
        }
        if s.noise != id.noise {
            ops.push(FilterOp::Noise(s.noise / 100.0));
        }
        if s.chromatic_aberration != id.chromatic_aberration {
            ops.push(FilterOp::ChromaticAberration {
                offset: s.chromatic_aberration,
            });
        }

        Self { ops }
    }

    /// Operations in application order.
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    /// True when the program applies nothing.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Copy with pixel-distance parameters multiplied by `factor` (export scaling).
    pub fn scaled(&self, factor: f64) -> Self {
        let ops = self
            .ops
            .iter()
            .map(|op| match *op {
                FilterOp::Blur { sigma } => FilterOp::Blur {
                    sigma: sigma * factor,
                },
                FilterOp::ChromaticAberration { offset } => FilterOp::ChromaticAberration {
                    offset: offset * factor,
                },
                other => other,
            })
            .collect();
        Self { ops }
    }

    /// Render as a CSS `filter` value, e.g. `blur(4px) brightness(120%)`.
    ///
    /// Noise and chromatic aberration have no CSS counterpart and are left out. An empty program
    /// renders as `none`.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            let start = out.len();
            if start > 0 {
                out.push(' ');
            }
            let _ = match *op {
                FilterOp::Blur { sigma } => write!(out, "blur({}px)", fmt_num(sigma)),
                FilterOp::Brightness(v) => write!(out, "brightness({}%)", fmt_num(v * 100.0)),
                FilterOp::Contrast(v) => write!(out, "contrast({}%)", fmt_num(v * 100.0)),
                FilterOp::Saturate(v) => write!(out, "saturate({}%)", fmt_num(v * 100.0)),
                FilterOp::HueRotate(deg) => write!(out, "hue-rotate({}deg)", fmt_num(deg)),
                FilterOp::Sepia(v) => write!(out, "sepia({}%)", fmt_num(v * 100.0)),
                FilterOp::Invert(v) => write!(out, "invert({}%)", fmt_num(v * 100.0)),
                FilterOp::Grayscale(v) => write!(out, "grayscale({}%)", fmt_num(v * 100.0)),
                FilterOp::Noise(_) | FilterOp::ChromaticAberration { .. } => {
                    out.truncate(start);
                    Ok(())
                }
            };
        }
        if out.is_empty() {
            "none".to_owned()
        } else {
            out
        }
    }
}

/// Shorthand for [`FilterProgram::build`].
pub fn build_filter_program(spec: &FilterSpec) -> FilterProgram {
    FilterProgram::build(spec)
}

fn fmt_num(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    if r == r.trunc() {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filter.rs"]
mod tests;
