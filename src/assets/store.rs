use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::assets::decode;
use crate::document::model::{Document, LayerContent, VectorPayload};
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{CoverError, CoverResult};
use crate::foundation::math::Fnv1a64;

/// Decoded raster in premultiplied RGBA8, shared cheaply between renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl Bitmap {
    /// Wrap premultiplied bytes; `pixels.len()` must equal `width * height * 4`.
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> CoverResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoverError::decode("bitmap must be at least 1x1"));
        }
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(CoverError::decode(format!(
                "bitmap byte len {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Premultiply straight-alpha RGBA8 bytes into a bitmap.
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> CoverResult<Self> {
        decode::premultiply_rgba8_in_place(&mut rgba8);
        Self::new(width, height, rgba8)
    }

    /// Bitmap filled with one pixel value.
    pub fn solid(width: u32, height: u32, px: Rgba8Premul) -> CoverResult<Self> {
        let n = (width as usize).saturating_mul(height as usize);
        Self::new(width, height, px.to_array().repeat(n))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major premultiplied RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Image paint for the raster backend.
    pub(crate) fn to_paint_image(&self) -> CoverResult<vello_cpu::Image> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| CoverError::render("bitmap width exceeds u16"))?;
        let h: u16 = self
            .height
            .try_into()
            .map_err(|_| CoverError::render("bitmap height exceeds u16"))?;
        let pixels = self
            .rgba8_premul
            .chunks_exact(4)
            .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
            .collect::<Vec<_>>();
        let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
        Ok(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        })
    }
}

/// Decode status of one asset source.
#[derive(Clone, Debug, PartialEq)]
pub enum AssetState {
    /// Decoded and drawable.
    Ready(Bitmap),
    /// Registered; decoding happens elsewhere. Layers using it are skipped until ready.
    Pending,
    /// Decoding failed with the given reason. Layers using it are skipped.
    Failed(String),
}

/// Outcome counts of [`AssetStore::prepare_document`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrepareReport {
    /// Sources that are decoded and ready.
    pub ready: usize,
    /// Sources still pending an external decode.
    pub pending: usize,
    /// Sources that failed, with their reasons.
    pub failed: Vec<(String, String)>,
}

impl PrepareReport {
    /// Number of failed sources.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Decoded bitmaps keyed by normalized source.
///
/// Decoding happens here, before rendering; the compositor only reads states.
#[derive(Debug, Default)]
pub struct AssetStore {
    root: Option<PathBuf>,
    svg_font_files: Vec<PathBuf>,
    svg_fontdb: Option<Arc<usvg::fontdb::Database>>,
    entries: HashMap<String, AssetState>,
}

impl AssetStore {
    /// Store without a filesystem root; only in-memory inserts and inline SVG work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that resolves relative sources under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Extra font files made available to `<text>` inside SVG artwork.
    pub fn with_svg_fonts(mut self, files: Vec<PathBuf>) -> Self {
        self.svg_font_files = files;
        self.svg_fontdb = None;
        self
    }

    /// Filesystem root, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no source is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store key for a layer's content, or `None` for content without assets.
    pub fn key_for(content: &LayerContent) -> Option<CoverResult<String>> {
        match content {
            LayerContent::Image(p) => Some(normalize_rel_path(&p.src)),
            LayerContent::Vector(v) => Some(Self::vector_key(v)),
            LayerContent::Text(_) => None,
        }
    }

    fn vector_key(v: &VectorPayload) -> CoverResult<String> {
        if v.is_inline() {
            let mut h = Fnv1a64::new_default();
            h.write_bytes(v.svg.as_bytes());
            Ok(format!("inline-svg:{:016x}", h.finish()))
        } else {
            normalize_rel_path(&v.svg)
        }
    }

    /// State for `source` (normalized first).
    pub fn get(&self, source: &str) -> Option<&AssetState> {
        let key = normalize_rel_path(source).ok()?;
        self.entries.get(&key)
    }

    /// State for a layer's content; `None` when missing or not asset-backed.
    pub fn state_for(&self, content: &LayerContent) -> Option<&AssetState> {
        let key = Self::key_for(content)?.ok()?;
        self.entries.get(&key)
    }

    /// Register a decoded bitmap for `source`, replacing any previous state.
    pub fn insert_bitmap(&mut self, source: &str, bitmap: Bitmap) -> CoverResult<()> {
        let key = normalize_rel_path(source)?;
        self.entries.insert(key, AssetState::Ready(bitmap));
        Ok(())
    }

    /// Decode encoded image bytes for `source`, recording the outcome.
    pub fn insert_encoded(&mut self, source: &str, bytes: &[u8]) -> CoverResult<&AssetState> {
        let key = normalize_rel_path(source)?;
        let state = match decode::decode_image(bytes) {
            Ok(bmp) => AssetState::Ready(bmp),
            Err(err) => {
                tracing::warn!(source = %key, %err, "image decode failed");
                AssetState::Failed(err.to_string())
            }
        };
        Ok(self.entries.entry(key).insert_entry(state).into_mut())
    }

    /// Mark `source` as being decoded elsewhere.
    pub fn mark_pending(&mut self, source: &str) -> CoverResult<()> {
        let key = normalize_rel_path(source)?;
        self.entries.insert(key, AssetState::Pending);
        Ok(())
    }

    /// Record a decode failure for `source`.
    pub fn mark_failed(&mut self, source: &str, reason: impl Into<String>) -> CoverResult<()> {
        let key = normalize_rel_path(source)?;
        self.entries.insert(key, AssetState::Failed(reason.into()));
        Ok(())
    }

    /// Forget `source`.
    pub fn remove(&mut self, source: &str) -> Option<AssetState> {
        let key = normalize_rel_path(source).ok()?;
        self.entries.remove(&key)
    }

    /// Decode every asset the document references.
    ///
    /// Ready and pending entries are left alone; missing and failed ones are (re)decoded. Failures
    /// are recorded on the entry and listed in the report, never returned as errors.
    #[tracing::instrument(skip(self, document), fields(layers = document.layers.len()))]
    pub fn prepare_document(&mut self, document: &Document) -> PrepareReport {
        let mut report = PrepareReport::default();

        for layer in &document.layers {
            let Some(key) = Self::key_for(&layer.content) else {
                continue;
            };
            let key = match key {
                Ok(k) => k,
                Err(err) => {
                    let source = layer.content.asset_source().unwrap_or_default();
                    tracing::warn!(layer = %layer.id, %source, %err, "invalid asset source");
                    report.failed.push((source.to_owned(), err.to_string()));
                    continue;
                }
            };

            match self.entries.get(&key) {
                Some(AssetState::Ready(_)) => {
                    report.ready += 1;
                    continue;
                }
                Some(AssetState::Pending) => {
                    report.pending += 1;
                    continue;
                }
                Some(AssetState::Failed(_)) | None => {}
            }

            let state = match self.decode_content(&layer.content, &key) {
                Ok(bmp) => {
                    report.ready += 1;
                    AssetState::Ready(bmp)
                }
                Err(err) => {
                    tracing::warn!(layer = %layer.id, source = %key, %err, "asset decode failed");
                    report.failed.push((key.clone(), err.to_string()));
                    AssetState::Failed(err.to_string())
                }
            };
            self.entries.insert(key, state);
        }

        tracing::debug!(
            ready = report.ready,
            pending = report.pending,
            failed = report.failed.len(),
            "assets prepared"
        );
        report
    }

    fn decode_content(&mut self, content: &LayerContent, key: &str) -> CoverResult<Bitmap> {
        match content {
            LayerContent::Image(_) => {
                let bytes = self.read_bytes(key)?;
                decode::decode_image(&bytes)
            }
            LayerContent::Vector(v) => {
                let fontdb = self.svg_fontdb();
                let tree = if v.is_inline() {
                    decode::parse_svg(v.svg.as_bytes(), self.root.as_deref(), fontdb)?
                } else {
                    let bytes = self.read_bytes(key)?;
                    let resources_dir = self
                        .root
                        .as_ref()
                        .and_then(|r| r.join(key).parent().map(Path::to_path_buf));
                    decode::parse_svg(&bytes, resources_dir.as_deref(), fontdb)?
                };
                decode::rasterize_svg(&tree)
            }
            LayerContent::Text(_) => Err(CoverError::validation("text layers have no asset")),
        }
    }

    fn svg_fontdb(&mut self) -> Arc<usvg::fontdb::Database> {
        let files = &self.svg_font_files;
        self.svg_fontdb
            .get_or_insert_with(|| decode::build_svg_fontdb(files))
            .clone()
    }

    fn read_bytes(&self, norm_path: &str) -> CoverResult<Vec<u8>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| CoverError::decode(format!("no assets root configured for '{norm_path}'")))?;
        let path = root.join(Path::new(norm_path));
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(|e| CoverError::decode(format!("{e:#}")))
    }
}

/// Normalize and validate a document-relative asset path.
///
/// The normalized result uses `/` separators, drops `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> CoverResult<String> {
    let s = source.trim().replace('\\', "/");
    if s.starts_with('/') || s.get(1..3) == Some(":/") {
        return Err(CoverError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(CoverError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(CoverError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(CoverError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
