use std::path::PathBuf;

use super::*;

fn font_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data/fonts")
        .join(name)
}

fn dejavu_book() -> FontBook {
    let mut book = FontBook::new();
    book.register_file(&font_path("DejaVuSans.ttf")).unwrap();
    book.register_file(&font_path("DejaVuSans-Bold.ttf")).unwrap();
    book
}

#[test]
fn registers_faces_with_family_and_weight() {
    let book = dejavu_book();
    assert_eq!(book.faces().len(), 2);
    assert_eq!(book.families(), vec!["DejaVu Sans"]);
    assert!(book.is_font_ready("dejavu sans"));
    assert!(!book.is_font_ready("Comic Sans MS"));
    let weights: Vec<u16> = book.faces().iter().map(FontFace::weight).collect();
    assert!(weights.contains(&400));
    assert!(weights.contains(&700));
}

#[test]
fn registered_face_owns_the_caller_bytes() {
    let bytes = std::fs::read(font_path("DejaVuSans.ttf")).unwrap();
    let mut book = FontBook::new();
    assert_eq!(book.register_bytes(bytes.clone()).unwrap(), 1);
    let face = &book.faces()[0];
    assert_eq!(face.data().as_slice(), bytes.as_slice());
}

#[test]
fn resolve_prefers_closest_weight_and_synthesizes_italic() {
    let book = dejavu_book();
    let bold = book.resolve("DejaVu Sans", 800, false).unwrap();
    assert_eq!(bold.face.weight(), 700);
    assert!(!bold.synthetic_italic);

    let italic = book.resolve("DejaVu Sans", 400, true).unwrap();
    assert_eq!(italic.face.weight(), 400);
    assert!(italic.synthetic_italic);
}

#[test]
fn resolve_falls_back_to_default_then_first_face() {
    let mut book = dejavu_book();
    let r = book.resolve("Missing Family", 400, false).unwrap();
    assert_eq!(r.face.family(), "DejaVu Sans");

    book.set_default_family(Some("DejaVu Sans".to_owned()));
    let r = book.resolve("Missing Family", 700, false).unwrap();
    assert_eq!(r.face.weight(), 700);

    assert!(FontBook::new().resolve("DejaVu Sans", 400, false).is_none());
}

#[test]
fn garbage_bytes_are_rejected() {
    let mut book = FontBook::new();
    assert!(book.register_bytes(b"not a font".to_vec()).is_err());
    assert!(book.register_file(&font_path("nope.ttf")).is_err());
    assert!(book.is_empty());
}
