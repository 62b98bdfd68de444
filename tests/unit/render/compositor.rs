use std::path::PathBuf;

use super::*;
use crate::document::color::Color;
use crate::document::model::{BlendMode, LayerTransform};
use crate::document::typography::TypographyConfig;
use crate::effects::filter::FilterSpec;
use crate::foundation::core::Rgba8Premul;

fn solid(w: u32, h: u32, c: Color) -> Bitmap {
    Bitmap::solid(w, h, c.to_premul()).unwrap()
}

fn store_with(entries: &[(&str, Bitmap)]) -> AssetStore {
    let mut store = AssetStore::new();
    for (src, bmp) in entries {
        store.insert_bitmap(src, bmp.clone()).unwrap();
    }
    store
}

fn render(doc: &Document, assets: &AssetStore, fonts: &FontBook) -> Surface {
    LayerCompositor::default()
        .render_new(doc, RenderResources::new(assets, fonts))
        .unwrap()
}

fn close(px: [u8; 4], want: [u8; 4], tol: i16) -> bool {
    px.iter()
        .zip(want)
        .all(|(&a, b)| (i16::from(a) - i16::from(b)).abs() <= tol)
}

#[test]
fn fit_scale_never_upscales() {
    assert_eq!(fit_scale(10.0, 10.0, 100.0, 100.0), 1.0);
    assert_eq!(fit_scale(200.0, 100.0, 100.0, 100.0), 0.5);
    assert_eq!(fit_scale(100.0, 400.0, 100.0, 100.0), 0.25);
    assert_eq!(fit_scale(0.0, 10.0, 100.0, 100.0), 1.0);
}

#[test]
fn background_only_document_fills_every_pixel() {
    let doc = Document::new(4, 3, Color::rgb(255, 0, 0)).unwrap();
    let out = render(&doc, &AssetStore::new(), &FontBook::new());
    assert!(out.data().chunks_exact(4).all(|px| px == [255, 0, 0, 255]));

    let clear = Document::new(4, 3, Color::TRANSPARENT).unwrap();
    let out = render(&clear, &AssetStore::new(), &FontBook::new());
    assert!(out.data().iter().all(|&b| b == 0));
}

#[test]
fn render_overwrites_previous_contents() {
    let doc = Document::new(4, 4, Color::TRANSPARENT).unwrap();
    let mut target = Surface::new(4, 4).unwrap();
    target.fill(Rgba8Premul::from_straight_rgba(9, 9, 9, 255));
    let (assets, fonts) = (AssetStore::new(), FontBook::new());
    let mut comp = LayerCompositor::default();
    comp.render(&doc, RenderResources::new(&assets, &fonts), &mut target)
        .unwrap();
    assert!(target.data().iter().all(|&b| b == 0));
}

#[test]
fn image_is_centered_on_the_canvas() {
    let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
    doc.layers.push(OrderedLayer::image("img", "blue.png"));
    let assets = store_with(&[("blue.png", solid(2, 2, Color::rgb(0, 0, 255)))]);
    let out = render(&doc, &assets, &FontBook::new());
    assert_eq!(out.sample(4, 4), Some([0, 0, 255, 255]));
    assert_eq!(out.sample(5, 5), Some([0, 0, 255, 255]));
    assert_eq!(out.sample(3, 5), Some([255, 255, 255, 255]));
    assert_eq!(out.sample(6, 5), Some([255, 255, 255, 255]));
}

#[test]
fn layer_offset_moves_the_anchor() {
    let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
    doc.layers.push(
        OrderedLayer::image("img", "blue.png").with_transform(LayerTransform::translate(3.0, 0.0)),
    );
    let assets = store_with(&[("blue.png", solid(2, 2, Color::rgb(0, 0, 255)))]);
    let out = render(&doc, &assets, &FontBook::new());
    assert_eq!(out.sample(7, 4), Some([0, 0, 255, 255]));
    assert_eq!(out.sample(4, 4), Some([255, 255, 255, 255]));
}

#[test]
fn oversized_image_is_scaled_down_to_the_box() {
    let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
    doc.layers.push(OrderedLayer::image("img", "big.png"));
    let assets = store_with(&[("big.png", solid(20, 20, Color::rgb(0, 255, 0)))]);
    let out = render(&doc, &assets, &FontBook::new());
    assert_eq!(out.sample(0, 0), Some([0, 255, 0, 255]));
    assert_eq!(out.sample(9, 9), Some([0, 255, 0, 255]));

    let mut half = LayerCompositor::new(CompositorSettings::default().with_image_fit(0.5));
    let out = half
        .render_new(&doc, RenderResources::new(&assets, &FontBook::new()))
        .unwrap();
    assert_eq!(out.sample(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(out.sample(5, 5), Some([0, 255, 0, 255]));
}

#[test]
fn hidden_and_unready_layers_are_skipped() {
    let mut doc = Document::new(6, 6, Color::WHITE).unwrap();
    doc.layers.push(OrderedLayer::image("hidden", "red.png").with_visible(false));
    doc.layers.push(OrderedLayer::image("broken", "broken.png"));
    doc.layers.push(OrderedLayer::image("later", "later.png"));
    doc.layers.push(OrderedLayer::image("missing", "nowhere.png"));

    let mut assets = store_with(&[("red.png", solid(6, 6, Color::rgb(255, 0, 0)))]);
    assets.mark_failed("broken.png", "bad header").unwrap();
    assets.mark_pending("later.png").unwrap();

    let out = render(&doc, &assets, &FontBook::new());
    assert!(out.data().chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
}

#[test]
fn failed_layer_does_not_stop_the_ones_above() {
    let mut doc = Document::new(6, 6, Color::WHITE).unwrap();
    doc.layers.push(OrderedLayer::image("broken", "broken.png"));
    doc.layers.push(OrderedLayer::image("ok", "red.png"));
    let mut assets = store_with(&[("red.png", solid(6, 6, Color::rgb(255, 0, 0)))]);
    assets.mark_failed("broken.png", "bad header").unwrap();
    let out = render(&doc, &assets, &FontBook::new());
    assert_eq!(out.sample(3, 3), Some([255, 0, 0, 255]));
}

#[test]
fn undrawable_bitmap_is_skipped_without_failing_the_frame() {
    let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
    doc.layers.push(OrderedLayer::image("wide", "wide.png"));
    doc.layers.push(OrderedLayer::image("ok", "red.png"));
    let assets = store_with(&[
        ("wide.png", solid(70_000, 1, Color::rgb(0, 0, 255))),
        ("red.png", solid(10, 10, Color::rgb(255, 0, 0))),
    ]);
    let out = render(&doc, &assets, &FontBook::new());
    assert_eq!(out.sample(5, 5), Some([255, 0, 0, 255]));
}

#[test]
fn raw_layer_values_are_clamped_at_render_time() {
    let assets = store_with(&[("red.png", solid(4, 4, Color::rgb(255, 0, 0)))]);

    let mut mirrored = Document::new(8, 8, Color::WHITE).unwrap();
    mirrored.layers.push(OrderedLayer::image("img", "red.png").with_transform(LayerTransform {
        scale_x: -1.0,
        ..LayerTransform::IDENTITY
    }));
    let out = render(&mirrored, &assets, &FontBook::new());
    assert!(out.data().chunks_exact(4).all(|px| px == [255, 255, 255, 255]));

    let mut loud = Document::new(8, 8, Color::WHITE).unwrap();
    loud.layers.push(OrderedLayer::image("img", "red.png").with_opacity(3.0));
    let out = render(&loud, &assets, &FontBook::new());
    assert_eq!(out.sample(4, 4), Some([255, 0, 0, 255]));

    let mut nan = Document::new(8, 8, Color::WHITE).unwrap();
    nan.layers.push(OrderedLayer::image("img", "red.png").with_transform(LayerTransform {
        rotation_deg: f64::NAN,
        scale_y: f64::NAN,
        ..LayerTransform::IDENTITY
    }));
    let plain = {
        let mut doc = Document::new(8, 8, Color::WHITE).unwrap();
        doc.layers.push(OrderedLayer::image("img", "red.png"));
        doc
    };
    assert_eq!(
        render(&nan, &assets, &FontBook::new()).data(),
        render(&plain, &assets, &FontBook::new()).data()
    );
}

#[test]
fn layer_opacity_and_blend_mode_apply_on_composite() {
    let mut doc = Document::new(4, 4, Color::WHITE).unwrap();
    doc.layers
        .push(OrderedLayer::image("red", "red.png").with_opacity(0.5));
    let assets = store_with(&[
        ("red.png", solid(4, 4, Color::rgb(255, 0, 0))),
        ("gray.png", solid(4, 4, Color::rgb(128, 128, 128))),
    ]);
    let out = render(&doc, &assets, &FontBook::new());
    assert!(close(out.sample(1, 1).unwrap(), [255, 128, 128, 255], 2));

    let mut doc = Document::new(4, 4, Color::rgb(255, 0, 0)).unwrap();
    doc.layers.push(
        OrderedLayer::image("gray", "gray.png").with_blend_mode(BlendMode::Multiply),
    );
    let out = render(&doc, &assets, &FontBook::new());
    assert!(close(out.sample(1, 1).unwrap(), [128, 0, 0, 255], 2));
}

#[test]
fn identity_filter_matches_no_filter() {
    let assets = store_with(&[("img.png", solid(4, 4, Color::rgb(10, 200, 90)))]);
    let mut plain = Document::new(8, 8, Color::WHITE).unwrap();
    plain.layers.push(OrderedLayer::image("img", "img.png"));
    let mut explicit = plain.clone();
    explicit.layers[0].filter_chain = FilterSpec::IDENTITY;

    let a = render(&plain, &assets, &FontBook::new());
    let b = render(&explicit, &assets, &FontBook::new());
    assert_eq!(a.data(), b.data());

    let mut inverted = plain.clone();
    inverted.layers[0].filter_chain.invert = 100.0;
    let c = render(&inverted, &assets, &FontBook::new());
    assert!(close(c.sample(4, 4).unwrap(), [245, 55, 165, 255], 2));
}

#[test]
fn multiplier_scales_the_output() {
    let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
    doc.layers.push(OrderedLayer::image("img", "blue.png"));
    let assets = store_with(&[("blue.png", solid(2, 2, Color::rgb(0, 0, 255)))]);
    let mut comp = LayerCompositor::new(CompositorSettings::default().with_multiplier(2.0));
    let out = comp
        .render_new(&doc, RenderResources::new(&assets, &FontBook::new()))
        .unwrap();
    assert_eq!((out.width(), out.height()), (20, 20));
    assert_eq!(out.sample(8, 8), Some([0, 0, 255, 255]));
    assert_eq!(out.sample(11, 11), Some([0, 0, 255, 255]));
    assert_eq!(out.sample(7, 8), Some([255, 255, 255, 255]));
}

#[test]
fn mismatched_target_is_rejected() {
    let doc = Document::new(4, 4, Color::WHITE).unwrap();
    let mut target = Surface::new(5, 4).unwrap();
    let (assets, fonts) = (AssetStore::new(), FontBook::new());
    let err = LayerCompositor::default()
        .render(&doc, RenderResources::new(&assets, &fonts), &mut target)
        .unwrap_err();
    assert!(matches!(err, CoverError::Validation(_)));
}

#[test]
fn text_without_fonts_is_skipped() {
    let mut doc = Document::new(20, 20, Color::WHITE).unwrap();
    doc.layers.push(OrderedLayer::text(
        "title",
        TypographyConfig::default().with_text("Hi"),
    ));
    let out = render(&doc, &AssetStore::new(), &FontBook::new());
    assert!(out.data().chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
}

#[test]
fn text_layer_draws_around_the_canvas_center() {
    let mut fonts = FontBook::new();
    fonts
        .register_file(
            &PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts/DejaVuSans.ttf"),
        )
        .unwrap();
    let mut doc = Document::new(120, 60, Color::WHITE).unwrap();
    let mut cfg = TypographyConfig::default().with_text("H").with_size(40.0);
    cfg.color = Color::BLACK;
    doc.layers.push(OrderedLayer::text("title", cfg));
    let out = render(&doc, &AssetStore::new(), &fonts);

    let inked = |x0: u32, x1: u32| {
        (x0..x1).any(|x| (0..60).any(|y| out.sample(x, y).unwrap()[0] < 64))
    };
    assert!(inked(40, 80));
    assert!(!inked(0, 30));
    assert!(!inked(90, 120));
}
