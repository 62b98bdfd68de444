use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::assets::store::Bitmap;
use crate::foundation::core::MAX_CANVAS_DIM;
use crate::foundation::error::{CoverError, CoverResult};

/// Decode encoded image bytes (PNG, JPEG, ...) into a premultiplied bitmap.
pub fn decode_image(bytes: &[u8]) -> CoverResult<Bitmap> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| CoverError::decode(format!("{e:#}")))?;
    let (width, height) = (dyn_img.width(), dyn_img.height());
    if width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(CoverError::decode(format!(
            "image too large: {width}x{height} (max {MAX_CANVAS_DIM}x{MAX_CANVAS_DIM})"
        )));
    }
    let rgba = dyn_img.to_rgba8();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    Bitmap::new(width, height, rgba8_premul)
}

/// Parse SVG bytes. Relative references resolve against `resources_dir`.
pub fn parse_svg(
    bytes: &[u8],
    resources_dir: Option<&Path>,
    fontdb: Arc<usvg::fontdb::Database>,
) -> CoverResult<usvg::Tree> {
    let opts = usvg::Options {
        resources_dir: resources_dir.map(Path::to_path_buf),
        fontdb,
        ..Default::default()
    };
    usvg::Tree::from_data(bytes, &opts)
        .context("parse svg tree")
        .map_err(|e| CoverError::decode(format!("{e:#}")))
}

/// Rasterize a parsed SVG at its intrinsic size into a premultiplied bitmap.
pub fn rasterize_svg(tree: &usvg::Tree) -> CoverResult<Bitmap> {
    fn to_px(v: f32) -> CoverResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(CoverError::decode("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;
    if width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(CoverError::decode(format!(
            "svg raster size too large: {width}x{height} (max {MAX_CANVAS_DIM}x{MAX_CANVAS_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CoverError::decode("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    resvg::render(
        tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );
    // tiny-skia pixmaps are already premultiplied RGBA8.
    Bitmap::new(width, height, pixmap.take())
}

/// Build the font database used for `<text>` inside SVG artwork.
pub fn build_svg_fontdb(font_files: &[std::path::PathBuf]) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    for path in font_files {
        if let Err(err) = db.load_font_file(path) {
            tracing::warn!(path = %path.display(), %err, "failed to load svg font");
        }
    }
    Arc::new(db)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((u16::from(px[0]) * a + 127) / 255) as u8;
        px[1] = ((u16::from(px[1]) * a + 127) / 255) as u8;
        px[2] = ((u16::from(px[2]) * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in 0..3 {
            px[c] = ((u32::from(px[c]) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
