use crate::assets::store::{AssetStore, PrepareReport};
use crate::document::color::Color;
use crate::document::model::{Document, OrderedLayer};
use crate::export::raster::{self, ExportOptions};
use crate::foundation::error::{CoverError, CoverResult};
use crate::history::manager::HistoryManager;
use crate::render::compositor::{LayerCompositor, RenderResources};
use crate::render::surface::Surface;
use crate::session::config::EditorConfig;
use crate::text::fonts::FontBook;

/// One editing session: the live document, its history and the resources it renders with.
///
/// Every committed mutation takes exactly one snapshot. Rendering never mutates the document.
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    document: Document,
    history: HistoryManager,
    assets: AssetStore,
    fonts: FontBook,
    compositor: LayerCompositor,
}

impl EditorSession {
    /// Blank document of `width x height` with `background`, snapshotted immediately.
    pub fn new(config: EditorConfig, width: u32, height: u32, background: Color) -> CoverResult<Self> {
        let document = Document::new(width, height, background)?;
        Self::open(config, document)
    }

    /// Session around an existing document, which becomes the first snapshot.
    pub fn open(config: EditorConfig, mut document: Document) -> CoverResult<Self> {
        config.validate()?;
        document.sanitize();
        document.validate()?;

        let fonts = config.load_fonts()?;
        let assets = config.asset_store();
        let mut history = config.history();
        history.snapshot(&document)?;
        let compositor = LayerCompositor::new(config.compositor_settings());

        Ok(Self {
            config,
            document,
            history,
            assets,
            fonts,
            compositor,
        })
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Live document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Snapshot history.
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Decoded assets.
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Mutable asset store, e.g. to hand in bitmaps decoded elsewhere.
    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    /// Registered fonts.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Registered fonts, for adding faces.
    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Run `f` on a working copy; on success the copy is validated, committed and snapshotted.
    ///
    /// The live document is untouched when `f` or validation fails.
    pub fn apply<R>(
        &mut self,
        f: impl FnOnce(&mut Document) -> CoverResult<R>,
    ) -> CoverResult<R> {
        let mut working = self.document.clone();
        let out = f(&mut working)?;
        working.sanitize();
        working.validate()?;
        self.history.snapshot(&working)?;
        self.document = working;
        Ok(out)
    }

    /// Append `layer` on top.
    pub fn add_layer(&mut self, layer: OrderedLayer) -> CoverResult<()> {
        tracing::debug!(layer = %layer.id, kind = layer.content.kind_name(), "add layer");
        self.apply(|doc| {
            doc.layers.push(layer);
            Ok(())
        })
    }

    /// Remove and return the layer named `id`.
    pub fn remove_layer(&mut self, id: &str) -> CoverResult<OrderedLayer> {
        self.apply(|doc| {
            let idx = find(doc, id)?;
            Ok(doc.layers.remove(idx))
        })
    }

    /// Move layer `id` to stacking position `to` (0 = bottom), clamped to the top.
    pub fn move_layer(&mut self, id: &str, to: usize) -> CoverResult<()> {
        self.apply(|doc| {
            let idx = find(doc, id)?;
            reject_locked(&doc.layers[idx])?;
            let layer = doc.layers.remove(idx);
            let to = to.min(doc.layers.len());
            doc.layers.insert(to, layer);
            Ok(())
        })
    }

    /// Edit layer `id` in place; locked layers are rejected.
    pub fn update_layer(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut OrderedLayer),
    ) -> CoverResult<()> {
        self.apply(|doc| {
            let idx = find(doc, id)?;
            reject_locked(&doc.layers[idx])?;
            let layer = &mut doc.layers[idx];
            f(layer);
            if layer.id != id {
                return Err(CoverError::validation("update_layer must not change the layer id"));
            }
            Ok(())
        })
    }

    /// Lock or unlock layer `id`; allowed on locked layers.
    pub fn set_locked(&mut self, id: &str, locked: bool) -> CoverResult<()> {
        self.apply(|doc| {
            let idx = find(doc, id)?;
            doc.layers[idx].locked = locked;
            Ok(())
        })
    }

    /// Replace the background color.
    pub fn set_background(&mut self, background: Color) -> CoverResult<()> {
        self.apply(|doc| {
            doc.background = background;
            Ok(())
        })
    }

    /// Restore the previous snapshot; `false` when there is none.
    pub fn undo(&mut self) -> CoverResult<bool> {
        match self.history.undo()? {
            Some(doc) => {
                self.document = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Restore the next snapshot; `false` when there is none.
    pub fn redo(&mut self) -> CoverResult<bool> {
        match self.history.redo()? {
            Some(doc) => {
                self.document = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Decode every asset the document references.
    pub fn prepare_assets(&mut self) -> PrepareReport {
        self.assets.prepare_document(&self.document)
    }

    /// Render the document at canvas size.
    pub fn render(&mut self) -> CoverResult<Surface> {
        let resources = RenderResources::new(&self.assets, &self.fonts);
        self.compositor.render_new(&self.document, resources)
    }

    /// PNG with the configured export options.
    pub fn export_png(&self) -> CoverResult<Vec<u8>> {
        self.export_png_with(&self.config.export_options())
    }

    /// Encode PNG with explicit export options.
    pub fn export_png_with(&self, opts: &ExportOptions) -> CoverResult<Vec<u8>> {
        raster::export_png(&self.document, self.resources(), opts)
    }

    /// JPEG with the configured quality and export options.
    pub fn export_jpeg(&self) -> CoverResult<Vec<u8>> {
        let opts = self.config.export_options();
        raster::export_jpeg(&self.document, self.resources(), opts.jpeg_quality, &opts)
    }

    /// Encode JPEG with explicit quality and export options.
    pub fn export_jpeg_with(&self, quality: u8, opts: &ExportOptions) -> CoverResult<Vec<u8>> {
        raster::export_jpeg(&self.document, self.resources(), quality, opts)
    }

    fn resources(&self) -> RenderResources<'_> {
        RenderResources::new(&self.assets, &self.fonts)
    }
}

fn find(doc: &Document, id: &str) -> CoverResult<usize> {
    doc.layer_index(id)
        .ok_or_else(|| CoverError::validation(format!("no layer with id \"{id}\"")))
}

fn reject_locked(layer: &OrderedLayer) -> CoverResult<()> {
    if layer.locked {
        return Err(CoverError::validation(format!("layer \"{}\" is locked", layer.id)));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
