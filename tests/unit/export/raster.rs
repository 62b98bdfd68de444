use super::*;
use crate::assets::store::{AssetStore, Bitmap};
use crate::document::color::Color;
use crate::document::model::OrderedLayer;
use crate::text::fonts::FontBook;

fn doc() -> (Document, AssetStore) {
    let mut doc = Document::new(8, 6, Color::TRANSPARENT).unwrap();
    doc.layers.push(OrderedLayer::image("img", "red.png"));
    let mut assets = AssetStore::new();
    assets
        .insert_bitmap(
            "red.png",
            Bitmap::solid(4, 2, Color::rgb(255, 0, 0).to_premul()).unwrap(),
        )
        .unwrap();
    (doc, assets)
}

#[test]
fn options_validate_ranges() {
    assert!(ExportOptions::default().validate().is_ok());
    assert!(ExportOptions::default().with_multiplier(8.0).validate().is_ok());
    assert!(ExportOptions::default().with_multiplier(0.0).validate().is_err());
    assert!(ExportOptions::default().with_multiplier(8.5).validate().is_err());
    assert!(ExportOptions::default().with_jpeg_quality(0).validate().is_err());
    assert!(ExportOptions::default().with_jpeg_quality(101).validate().is_err());
}

#[test]
fn png_keeps_size_and_transparency() {
    let (doc, assets) = doc();
    let fonts = FontBook::new();
    let bytes = export_png(
        &doc,
        RenderResources::new(&assets, &fonts),
        &ExportOptions::default(),
    )
    .unwrap();
    let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (8, 6));
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(img.get_pixel(4, 3).0, [255, 0, 0, 255]);
}

#[test]
fn multiplier_scales_png_dimensions() {
    let (doc, assets) = doc();
    let fonts = FontBook::new();
    let bytes = export_png(
        &doc,
        RenderResources::new(&assets, &fonts),
        &ExportOptions::default().with_multiplier(2.5),
    )
    .unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (20, 15));
}

#[test]
fn jpeg_flattens_over_white() {
    let (doc, assets) = doc();
    let fonts = FontBook::new();
    let bytes = export_jpeg(
        &doc,
        RenderResources::new(&assets, &fonts),
        95,
        &ExportOptions::default(),
    )
    .unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    let img = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (8, 6));
    let corner = img.get_pixel(0, 0).0;
    assert!(corner.iter().all(|&c| c > 235), "corner {corner:?}");
}

#[test]
fn jpeg_rejects_bad_quality() {
    let (doc, assets) = doc();
    let fonts = FontBook::new();
    let err = export_jpeg(
        &doc,
        RenderResources::new(&assets, &fonts),
        0,
        &ExportOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CoverError::Validation(_)));
}

#[test]
fn flatten_composites_premultiplied_pixels() {
    let out = flatten_over_white(&[0, 0, 0, 0, 128, 0, 0, 128, 10, 20, 30, 255]);
    assert_eq!(out, vec![255, 255, 255, 255, 127, 127, 10, 20, 30]);
}
