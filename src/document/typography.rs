use serde::{Deserialize, Serialize};

use crate::document::color::Color;

/// Horizontal alignment of lines inside a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Lines start at the block's left edge.
    Left,
    /// Lines are centered on the block.
    #[default]
    Center,
    /// Lines end at the block's right edge.
    Right,
}

/// Case mapping applied before shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    /// Text is drawn as written.
    #[default]
    None,
    /// Every letter upper-cased.
    Uppercase,
    /// Every letter lower-cased.
    Lowercase,
    /// First letter of each word upper-cased.
    Capitalize,
}

impl TextTransform {
    /// Apply the case mapping to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::None => text.to_owned(),
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Capitalize => {
                let mut out = String::with_capacity(text.len());
                let mut at_word_start = true;
                for ch in text.chars() {
                    if ch.is_whitespace() {
                        at_word_start = true;
                        out.push(ch);
                    } else if at_word_start {
                        out.extend(ch.to_uppercase());
                        at_word_start = false;
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
        }
    }
}

/// Requested font style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic; synthesized as an oblique skew when the family has no italic face.
    Italic,
}

/// Line decoration drawn with the text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decoration {
    /// No decoration.
    #[default]
    None,
    /// Line below the baseline.
    Underline,
    /// Line above the ascender.
    Overline,
    /// Line through the middle of the x-height.
    LineThrough,
}

/// Stroke around glyph outlines. A zero width disables it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrokeStyle {
    /// Stroke width in pixels.
    pub width: f64,
    /// Stroke color.
    pub color: Color,
}

impl StrokeStyle {
    /// True when the stroke draws anything.
    pub fn is_active(&self) -> bool {
        self.width > 0.0
    }
}

/// Drop shadow behind stroke, outline and fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShadowStyle {
    /// Horizontal device-space offset.
    pub offset_x: f64,
    /// Vertical device-space offset.
    pub offset_y: f64,
    /// Blur amount; the gaussian std-dev is half of it.
    pub blur: f64,
    /// Shadow color.
    pub color: Color,
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            color: Color::rgba(0, 0, 0, 128),
        }
    }
}

impl ShadowStyle {
    /// Shadow is enabled as soon as any of blur or offsets is non-zero.
    pub fn is_active(&self) -> bool {
        (self.blur != 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0) && self.color.a > 0
    }
}

/// Filled box behind the text block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundBox {
    /// Box color; its alpha is further scaled by `opacity_pct`.
    pub color: Color,
    /// Opacity in percent. Zero disables the box.
    pub opacity_pct: f64,
    /// Padding around the text block on every side.
    pub padding: f64,
    /// Corner radius; zero draws a plain rectangle.
    pub border_radius: f64,
}

impl Default for BackgroundBox {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            opacity_pct: 0.0,
            padding: 8.0,
            border_radius: 0.0,
        }
    }
}

/// Linear gradient fill replacing the solid color when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradientFill {
    /// Whether the gradient replaces the solid fill.
    pub enabled: bool,
    /// Direction in degrees; 0 runs left to right, 90 top to bottom.
    pub angle: f64,
    /// Color at the start of the gradient line.
    pub start_color: Color,
    /// Color at the end of the gradient line.
    pub end_color: Color,
}

impl Default for GradientFill {
    fn default() -> Self {
        Self {
            enabled: false,
            angle: 0.0,
            start_color: Color::BLACK,
            end_color: Color::WHITE,
        }
    }
}

/// Full styling for one text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypographyConfig {
    /// Text content; `\n` separates lines.
    pub text: String,
    /// Font family name resolved through the font book.
    pub family: String,
    /// Font size in pixels.
    pub size: f64,
    /// CSS-style numeric weight (100..=900).
    #[serde(deserialize_with = "deserialize_weight")]
    pub weight: u16,
    /// Upright or italic.
    pub style: FontStyle,
    /// Solid fill color.
    pub color: Color,
    /// Line alignment.
    pub text_align: TextAlign,
    /// Case mapping.
    pub text_transform: TextTransform,
    /// Extra advance between glyphs in pixels.
    pub letter_spacing: f64,
    /// Line advance as a multiple of `size`.
    pub line_height: f64,
    /// Rotation in degrees, clockwise on screen.
    pub rotation_deg: f64,
    /// Horizontal skew in degrees.
    pub skew_x: f64,
    /// Vertical skew in degrees.
    pub skew_y: f64,
    /// First stroke pass.
    pub stroke: StrokeStyle,
    /// Second stroke pass drawn over the first.
    pub outline: StrokeStyle,
    /// Shadow behind stroke, outline and fill.
    pub shadow: ShadowStyle,
    /// Box behind the text block.
    pub background: BackgroundBox,
    /// Decoration line per text line.
    pub decoration: Decoration,
    /// Gradient fill.
    pub gradient: GradientFill,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            family: String::new(),
            size: 48.0,
            weight: 400,
            style: FontStyle::Normal,
            color: Color::BLACK,
            text_align: TextAlign::Center,
            text_transform: TextTransform::None,
            letter_spacing: 0.0,
            line_height: 1.2,
            rotation_deg: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            stroke: StrokeStyle::default(),
            outline: StrokeStyle::default(),
            shadow: ShadowStyle::default(),
            background: BackgroundBox::default(),
            decoration: Decoration::None,
            gradient: GradientFill::default(),
        }
    }
}

/// Largest accepted skew magnitude in degrees; `tan` diverges at 90.
const MAX_SKEW_DEG: f64 = 80.0;

impl TypographyConfig {
    /// Copy with `text` replaced.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Copy with `family` replaced.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Copy with `size` replaced.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Copy with every numeric field forced into its valid range.
    ///
    /// Non-finite values fall back to the defaults; nothing here ever fails.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let mut out = self.clone();
        out.size = finite_or(self.size, d.size).clamp(1.0, 2048.0);
        out.weight = self.weight.clamp(1, 1000);
        out.letter_spacing = finite_or(self.letter_spacing, 0.0);
        out.line_height = finite_or(self.line_height, d.line_height).max(0.0);
        out.rotation_deg = finite_or(self.rotation_deg, 0.0);
        out.skew_x = finite_or(self.skew_x, 0.0).clamp(-MAX_SKEW_DEG, MAX_SKEW_DEG);
        out.skew_y = finite_or(self.skew_y, 0.0).clamp(-MAX_SKEW_DEG, MAX_SKEW_DEG);
        out.stroke.width = finite_or(self.stroke.width, 0.0).max(0.0);
        out.outline.width = finite_or(self.outline.width, 0.0).max(0.0);
        out.shadow.offset_x = finite_or(self.shadow.offset_x, 0.0);
        out.shadow.offset_y = finite_or(self.shadow.offset_y, 0.0);
        out.shadow.blur = finite_or(self.shadow.blur, 0.0).max(0.0);
        out.background.opacity_pct = finite_or(self.background.opacity_pct, 0.0).clamp(0.0, 100.0);
        out.background.padding = finite_or(self.background.padding, 0.0).max(0.0);
        out.background.border_radius = finite_or(self.background.border_radius, 0.0).max(0.0);
        out.gradient.angle = finite_or(self.gradient.angle, 0.0);
        out
    }

    /// True when the text contains nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub(crate) fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

fn deserialize_weight<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Name(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(n) if n.is_finite() => Ok(n.round().clamp(1.0, 1000.0) as u16),
        Repr::Num(_) => Ok(400),
        Repr::Name(s) => match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "regular" => Ok(400),
            "bold" => Ok(700),
            "light" => Ok(300),
            "black" | "heavy" => Ok(900),
            other => other
                .parse::<u16>()
                .map(|w| w.clamp(1, 1000))
                .map_err(|_| serde::de::Error::custom(format!("invalid font weight \"{s}\""))),
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/typography.rs"]
mod tests;
