use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{CoverError, CoverResult};

/// One registered font face.
#[derive(Clone, Debug)]
pub struct FontFace {
    family: String,
    weight: u16,
    italic: bool,
    index: u32,
    data: Arc<Vec<u8>>,
}

impl FontFace {
    /// Family name as reported by the font's name table.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Numeric weight (400 regular, 700 bold).
    pub fn weight(&self) -> u16 {
        self.weight
    }

    /// Whether the face is italic or oblique.
    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// Face index inside a collection file.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Raw font file bytes.
    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }
}

/// A face picked for a requested family/weight/style.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedFace<'a> {
    /// Position of the face in the book.
    pub id: usize,
    /// The face itself.
    pub face: &'a FontFace,
    /// Italic was requested but the face is upright; draw with an oblique skew.
    pub synthetic_italic: bool,
}

/// Registered fonts, looked up by family name.
///
/// Resolution order for a family: exact (case-insensitive) family, then the default family, then
/// the first registered face. Within a family the closest style wins, then the closest weight.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
    default_family: Option<String>,
}

impl FontBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Family used when a requested family is not registered.
    pub fn set_default_family(&mut self, family: Option<String>) {
        self.default_family = family;
    }

    /// Configured fallback family, if any.
    pub fn default_family(&self) -> Option<&str> {
        self.default_family.as_deref()
    }

    /// Register every face contained in `bytes`; returns how many faces were added.
    pub fn register_bytes(&mut self, bytes: Vec<u8>) -> CoverResult<usize> {
        let data = Arc::new(bytes);
        let shared: Arc<dyn AsRef<[u8]> + Send + Sync> = data.clone();
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::new(shared), None);

        let mut added = 0usize;
        for (family_id, infos) in families {
            let Some(name) = font_ctx.collection.family_name(family_id) else {
                continue;
            };
            let name = name.to_string();
            for info in infos {
                self.faces.push(FontFace {
                    family: name.clone(),
                    weight: info.weight().value().round().clamp(1.0, 1000.0) as u16,
                    italic: !matches!(info.style(), parley::fontique::FontStyle::Normal),
                    index: info.index(),
                    data: Arc::clone(&data),
                });
                added += 1;
            }
        }

        if added == 0 {
            return Err(CoverError::validation("no font faces found in font data"));
        }
        Ok(added)
    }

    /// Read and register a font file.
    pub fn register_file(&mut self, path: &Path) -> CoverResult<usize> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))?;
        self.register_bytes(bytes)
            .map_err(|e| CoverError::validation(format!("{}: {e}", path.display())))
    }

    /// All registered faces in registration order.
    pub fn faces(&self) -> &[FontFace] {
        &self.faces
    }

    /// Face by id.
    pub fn face(&self, id: usize) -> Option<&FontFace> {
        self.faces.get(id)
    }

    /// Distinct family names, in registration order.
    pub fn families(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for f in &self.faces {
            if !out.iter().any(|n| n.eq_ignore_ascii_case(&f.family)) {
                out.push(&f.family);
            }
        }
        out
    }

    /// True when no face is registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// True once at least one face of `family` is registered.
    pub fn is_font_ready(&self, family: &str) -> bool {
        self.faces
            .iter()
            .any(|f| f.family.eq_ignore_ascii_case(family.trim()))
    }

    /// Best face for the request, following the fallback order.
    pub fn resolve(&self, family: &str, weight: u16, italic: bool) -> Option<ResolvedFace<'_>> {
        let family = family.trim();
        let target = if self.is_font_ready(family) {
            family.to_owned()
        } else if let Some(d) = self.default_family.as_deref().filter(|d| self.is_font_ready(d)) {
            d.to_owned()
        } else {
            self.faces.first()?.family.clone()
        };

        let (id, face) = self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.family.eq_ignore_ascii_case(&target))
            .min_by_key(|(_, f)| {
                let style_miss = u32::from(f.italic != italic);
                (style_miss, weight_distance(f.weight, weight))
            })?;

        Some(ResolvedFace {
            id,
            face,
            synthetic_italic: italic && !face.italic,
        })
    }
}

fn weight_distance(have: u16, want: u16) -> u32 {
    u32::from(have.abs_diff(want))
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
