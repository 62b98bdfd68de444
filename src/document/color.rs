use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::CoverError;

/// Straight-alpha RGBA8 color as written in documents.
///
/// Parses `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)`, `rgba(r,g,b,a)`,
/// `transparent` and a handful of CSS named colors. Always serializes as `#rrggbb`,
/// `#rrggbbaa` or `transparent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (straight).
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Opaque color from channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from straight-alpha channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// True when alpha is zero.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Same color with alpha scaled by `factor` (clamped to `[0,1]`).
    pub fn multiply_alpha(self, factor: f64) -> Self {
        let f = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            a: (f64::from(self.a) * f).round() as u8,
            ..self
        }
    }

    /// Premultiplied pixel value.
    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }

    /// Paint color for the raster backend.
    pub fn to_paint(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Parse any accepted textual color form.
    pub fn parse(s: &str) -> Result<Self, CoverError> {
        let t = s.trim();
        if t.is_empty() {
            return Err(CoverError::validation("empty color string"));
        }
        if let Some(hex) = t.strip_prefix('#') {
            return parse_hex(hex).map_err(CoverError::validation);
        }
        let lower = t.to_ascii_lowercase();
        if let Some(args) = strip_call(&lower, "rgba").or_else(|| strip_call(&lower, "rgb")) {
            return parse_rgb_args(args).map_err(CoverError::validation);
        }
        named(&lower).ok_or_else(|| CoverError::validation(format!("unknown color \"{t}\"")))
    }
}

impl FromStr for Color {
    type Err = CoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0 {
            return f.write_str("transparent");
        }
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_hex(s: &str) -> Result<Color, String> {
    fn nibble(c: u8) -> Result<u8, String> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(format!("invalid hex digit '{}'", c as char)),
        }
    }

    let bytes = s.as_bytes();
    let digits = bytes
        .iter()
        .map(|&c| nibble(c))
        .collect::<Result<Vec<u8>, String>>()?;

    match digits.len() {
        3 | 4 => {
            let ch = |i: usize| digits.get(i).map(|d| d * 17).unwrap_or(255);
            Ok(Color::rgba(ch(0), ch(1), ch(2), ch(3)))
        }
        6 | 8 => {
            let ch = |i: usize| {
                digits
                    .get(2 * i..2 * i + 2)
                    .map(|p| p[0] * 16 + p[1])
                    .unwrap_or(255)
            };
            Ok(Color::rgba(ch(0), ch(1), ch(2), ch(3)))
        }
        _ => Err("hex color must be #rgb, #rgba, #rrggbb or #rrggbbaa".to_owned()),
    }
}

fn strip_call<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_rgb_args(args: &str) -> Result<Color, String> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!("rgb()/rgba() expects 3 or 4 components, got {}", parts.len()));
    }
    let num = |p: &str| -> Result<f64, String> {
        p.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid color component \"{p}\""))
    };
    let channel = |p: &str| -> Result<u8, String> {
        let v = match p.strip_suffix('%') {
            Some(pct) => num(pct)? * 2.55,
            None => num(p)?,
        };
        Ok(v.clamp(0.0, 255.0).round() as u8)
    };
    let a = match parts.get(3) {
        Some(p) => {
            let v = match p.strip_suffix('%') {
                Some(pct) => num(pct)? / 100.0,
                None => num(p)?,
            };
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Ok(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        a,
    ))
}

fn named(s: &str) -> Option<Color> {
    let c = match s {
        "transparent" => Color::TRANSPARENT,
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "lime" => Color::rgb(0, 255, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" | "aqua" => Color::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        "orange" => Color::rgb(255, 165, 0),
        "purple" => Color::rgb(128, 0, 128),
        "pink" => Color::rgb(255, 192, 203),
        "navy" => Color::rgb(0, 0, 128),
        "gold" => Color::rgb(255, 215, 0),
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/document/color.rs"]
mod tests;
