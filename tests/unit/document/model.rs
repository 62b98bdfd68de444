use serde_json::json;

use super::*;

fn sample_doc() -> Document {
    let mut doc = Document::new(400, 300, Color::rgb(16, 16, 16)).unwrap();
    doc.layers.push(
        OrderedLayer::image("bg", "photos/bg.png")
            .with_blend_mode(BlendMode::Multiply)
            .with_opacity(0.75),
    );
    doc.layers.push(OrderedLayer::vector("logo", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>"));
    doc.layers.push(
        OrderedLayer::text("title", TypographyConfig::default().with_text("Hello"))
            .with_transform(LayerTransform::translate(0.0, -40.0)),
    );
    doc
}

#[test]
fn layer_json_is_adjacently_tagged_and_camel_case() {
    let doc = sample_doc();
    let v = serde_json::to_value(&doc).unwrap();
    assert_eq!(v["canvasWidth"], json!(400));
    assert_eq!(v["background"], json!("#101010"));
    let bg = &v["layers"][0];
    assert_eq!(bg["kind"], json!("image"));
    assert_eq!(bg["payload"], json!({ "src": "photos/bg.png" }));
    assert_eq!(bg["blendMode"], json!("multiply"));
    assert_eq!(bg["filterChain"], json!({}));
    assert_eq!(v["layers"][2]["kind"], json!("text"));
    assert_eq!(v["layers"][2]["payload"]["text"], json!("Hello"));
}

#[test]
fn json_roundtrip_is_exact() {
    let doc = sample_doc();
    let back = Document::from_json(&doc.to_json().unwrap()).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn minimal_layer_gets_defaults_and_source_over_alias() {
    let doc = Document::from_json(
        r#"{
            "canvasWidth": 10, "canvasHeight": 10,
            "layers": [
                { "id": "a", "kind": "image", "payload": { "src": "a.png" } },
                { "id": "b", "kind": "image", "payload": { "src": "b.png" }, "blendMode": "source-over" }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(doc.background, Color::WHITE);
    let a = &doc.layers[0];
    assert!(a.visible);
    assert!(!a.locked);
    assert_eq!(a.opacity, 1.0);
    assert_eq!(a.blend_mode, BlendMode::Normal);
    assert_eq!(a.transform, LayerTransform::IDENTITY);
    assert_eq!(doc.layers[1].blend_mode, BlendMode::Normal);
}

#[test]
fn validation_rejects_bad_canvas_and_duplicate_ids() {
    assert!(Document::new(0, 10, Color::WHITE).is_err());
    assert!(Document::new(10, 20_000, Color::WHITE).is_err());

    let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
    doc.layers.push(OrderedLayer::image("x", "a.png"));
    doc.layers.push(OrderedLayer::image("x", "b.png"));
    assert!(matches!(doc.validate(), Err(CoverError::Validation(_))));

    doc.layers[1].id = " ".to_owned();
    assert!(doc.validate().is_err());
}

#[test]
fn sanitize_clamps_layer_numbers() {
    let mut doc = Document::new(10, 10, Color::WHITE).unwrap();
    let mut layer = OrderedLayer::image("x", "a.png").with_opacity(3.0);
    layer.transform.scale_x = -2.0;
    layer.transform.scale_y = f64::NAN;
    layer.filter_chain.hue_deg = -90.0;
    doc.layers.push(layer);
    doc.layers.push(OrderedLayer::image("y", "b.png").with_opacity(f64::NAN));
    doc.sanitize();

    assert_eq!(doc.layers[0].opacity, 1.0);
    assert_eq!(doc.layers[0].transform.scale_x, 0.0);
    assert_eq!(doc.layers[0].transform.scale_y, 1.0);
    assert_eq!(doc.layers[0].filter_chain.hue_deg, 270.0);
    assert_eq!(doc.layers[1].opacity, 1.0);
}

#[test]
fn unknown_kind_is_a_serde_error() {
    let err = Document::from_json(
        r#"{ "canvasWidth": 10, "canvasHeight": 10,
             "layers": [ { "id": "a", "kind": "video", "payload": {} } ] }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CoverError::Serde(_)));
}

#[test]
fn lookup_helpers() {
    let mut doc = sample_doc();
    assert_eq!(doc.layer_index("logo"), Some(1));
    assert!(doc.layer("missing").is_none());
    doc.layer_mut("title").unwrap().visible = false;
    assert!(!doc.layer("title").unwrap().visible);
    assert_eq!(doc.layers[1].content.kind_name(), "vector");
    let LayerContent::Vector(v) = &doc.layers[1].content else {
        panic!("expected vector");
    };
    assert!(v.is_inline());
}
