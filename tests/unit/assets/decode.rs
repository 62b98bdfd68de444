use std::io::Cursor;

use super::*;

fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn decode_png_premultiplies() {
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 100, 128]));
    let bmp = decode_image(&encode_png(&img)).unwrap();
    assert_eq!((bmp.width(), bmp.height()), (3, 2));
    assert_eq!(&bmp.pixels()[0..4], &[128, 0, 50, 128]);
}

#[test]
fn decode_garbage_is_decode_error() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, CoverError::Decode(_)));
}

#[test]
fn decode_rejects_images_wider_than_the_canvas_limit() {
    let img = image::RgbaImage::from_pixel(MAX_CANVAS_DIM + 1, 1, image::Rgba([0, 0, 0, 255]));
    let err = decode_image(&encode_png(&img)).unwrap_err();
    assert!(matches!(err, CoverError::Decode(_)));
}

#[test]
fn svg_rasterizes_at_intrinsic_size() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="3">
        <rect x="0" y="0" width="4" height="3" fill="#0000ff"/>
    </svg>"##;
    let tree = parse_svg(svg, None, Arc::new(usvg::fontdb::Database::new())).unwrap();
    let bmp = rasterize_svg(&tree).unwrap();
    assert_eq!((bmp.width(), bmp.height()), (4, 3));
    assert_eq!(&bmp.pixels()[0..4], &[0, 0, 255, 255]);
}

#[test]
fn malformed_svg_is_decode_error() {
    let err = parse_svg(b"<svg", None, Arc::new(usvg::fontdb::Database::new())).unwrap_err();
    assert!(matches!(err, CoverError::Decode(_)));
}

#[test]
fn premultiply_then_unpremultiply_is_close() {
    let mut px = vec![200u8, 100, 50, 128, 9, 9, 9, 0, 1, 2, 3, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    unpremultiply_rgba8_in_place(&mut px);
    assert!((i16::from(px[0]) - 200).abs() <= 2);
    assert_eq!(&px[8..12], &[1, 2, 3, 255]);
}
