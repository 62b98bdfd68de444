use serde_json::json;

use super::*;

#[test]
fn identity_spec_builds_empty_program() {
    let p = FilterProgram::build(&FilterSpec::default());
    assert!(p.is_empty());
    assert_eq!(p.to_css(), "none");
    assert!(FilterSpec::IDENTITY.is_identity());
}

#[test]
fn ops_follow_fixed_order_regardless_of_field_order() {
    let spec: FilterSpec = serde_json::from_value(json!({
        "chromaticAberration": 3,
        "grayscale": 20,
        "blur": 4,
        "noise": 10,
        "brightness": 120,
        "hueDeg": 90
    }))
    .unwrap();
    let p = build_filter_program(&spec);
    assert_eq!(
        p.ops(),
        &[
            FilterOp::Blur { sigma: 4.0 },
            FilterOp::Brightness(1.2),
            FilterOp::HueRotate(90.0),
            FilterOp::Grayscale(0.2),
            FilterOp::Noise(0.1),
            FilterOp::ChromaticAberration { offset: 3.0 },
        ]
    );
    assert_eq!(
        p.to_css(),
        "blur(4px) brightness(120%) hue-rotate(90deg) grayscale(20%)"
    );
}

#[test]
fn out_of_range_values_clamp_and_hue_wraps() {
    let spec = FilterSpec {
        blur: -5.0,
        brightness: 500.0,
        hue_deg: 360.0,
        sepia: f64::NAN,
        ..FilterSpec::IDENTITY
    };
    let p = FilterProgram::build(&spec);
    assert_eq!(p.ops(), &[FilterOp::Brightness(2.0)]);

    let wrapped = FilterSpec {
        hue_deg: -90.0,
        ..FilterSpec::IDENTITY
    }
    .clamped();
    assert_eq!(wrapped.hue_deg, 270.0);
}

#[test]
fn identity_fields_are_omitted_when_serialized() {
    let spec = FilterSpec {
        contrast: 80.0,
        ..FilterSpec::IDENTITY
    };
    assert_eq!(serde_json::to_value(spec).unwrap(), json!({ "contrast": 80.0 }));
    assert_eq!(serde_json::to_value(FilterSpec::IDENTITY).unwrap(), json!({}));
    let back: FilterSpec = serde_json::from_value(json!({ "contrast": 80.0 })).unwrap();
    assert_eq!(back, spec);
}

#[test]
fn scaled_only_touches_pixel_distances() {
    let spec = FilterSpec {
        blur: 2.0,
        invert: 100.0,
        chromatic_aberration: 1.5,
        ..FilterSpec::IDENTITY
    };
    let p = FilterProgram::build(&spec).scaled(2.0);
    assert_eq!(
        p.ops(),
        &[
            FilterOp::Blur { sigma: 4.0 },
            FilterOp::Invert(1.0),
            FilterOp::ChromaticAberration { offset: 3.0 },
        ]
    );
}
