use crate::effects::filter::FilterSpec;

use super::*;

fn solid(px: [u8; 4], n: usize) -> Vec<u8> {
    px.repeat(n)
}

#[test]
fn empty_program_leaves_pixels_untouched() {
    let mut px = vec![1u8, 2, 3, 4, 50, 60, 70, 255];
    let before = px.clone();
    apply_filter_program(&mut px, 2, 1, &FilterProgram::default(), 7).unwrap();
    assert_eq!(px, before);
}

#[test]
fn rejects_mismatched_buffer() {
    let mut px = vec![0u8; 12];
    let p = FilterProgram::build(&FilterSpec {
        invert: 100.0,
        ..FilterSpec::IDENTITY
    });
    assert!(apply_filter_program(&mut px, 2, 2, &p, 0).is_err());
}

#[test]
fn consecutive_color_ops_fuse_into_one_matrix() {
    let p = FilterProgram::build(&FilterSpec {
        blur: 1.0,
        brightness: 120.0,
        contrast: 80.0,
        sepia: 50.0,
        noise: 5.0,
        ..FilterSpec::IDENTITY
    });
    let passes = lower_program(&p);
    assert_eq!(passes.len(), 3);
    assert!(matches!(passes[0], RasterPass::Blur { .. }));
    assert!(matches!(passes[1], RasterPass::Matrix(_)));
    assert!(matches!(passes[2], RasterPass::Noise { .. }));
}

#[test]
fn fused_matrix_matches_sequential_application() {
    let a = color_matrix_for(&FilterOp::Brightness(0.8)).unwrap();
    let b = color_matrix_for(&FilterOp::Contrast(1.1)).unwrap();
    let fused = compose_matrices(&a, &b);

    let src = [40u8, 90, 160, 255, 20, 10, 5, 128];
    let mut step = [0u8; 8];
    let mut seq = [0u8; 8];
    color_matrix_rgba8_premul(&src, &mut step, &a);
    color_matrix_rgba8_premul(&step, &mut seq, &b);
    let mut one = [0u8; 8];
    color_matrix_rgba8_premul(&src, &mut one, &fused);

    for (x, y) in seq.iter().zip(one.iter()) {
        assert!((i16::from(*x) - i16::from(*y)).abs() <= 2, "{seq:?} vs {one:?}");
    }
}

#[test]
fn full_invert_flips_opaque_channels() {
    let mut px = solid([0, 100, 255, 255], 4);
    let p = FilterProgram::build(&FilterSpec {
        invert: 100.0,
        ..FilterSpec::IDENTITY
    });
    apply_filter_program(&mut px, 2, 2, &p, 0).unwrap();
    assert_eq!(&px[0..4], &[255, 155, 0, 255]);
}

#[test]
fn full_grayscale_equalizes_channels() {
    let mut px = solid([255, 0, 0, 255], 1);
    let p = FilterProgram::build(&FilterSpec {
        grayscale: 100.0,
        ..FilterSpec::IDENTITY
    });
    apply_filter_program(&mut px, 1, 1, &p, 0).unwrap();
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
    assert_eq!(px[3], 255);
}

#[test]
fn blur_constant_image_is_identity() {
    let (w, h) = (6u32, 5u32);
    let src = solid([10, 20, 30, 40], (w * h) as usize);
    let out = blur_rgba8_premul(&src, w, h, 2.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn blur_spreads_energy_from_single_pixel() {
    let (w, h) = (9u32, 9u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((4 * w + 4) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = blur_rgba8_premul(&src, w, h, 1.0).unwrap();
    let nonzero = out.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(nonzero > 1);
    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 8);
}

#[test]
fn noise_is_deterministic_per_seed_and_keeps_premul_valid() {
    let p = FilterProgram::build(&FilterSpec {
        noise: 60.0,
        ..FilterSpec::IDENTITY
    });
    let base = solid([60, 60, 60, 128], 16);

    let mut a = base.clone();
    let mut b = base.clone();
    let mut c = base.clone();
    apply_filter_program(&mut a, 4, 4, &p, 11).unwrap();
    apply_filter_program(&mut b, 4, 4, &p, 11).unwrap();
    apply_filter_program(&mut c, 4, 4, &p, 12).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, base);
    for px in a.chunks_exact(4) {
        assert_eq!(px[3], 128);
        assert!(px[0] <= px[3] && px[1] <= px[3] && px[2] <= px[3]);
    }
}

#[test]
fn chromatic_aberration_splits_red_and_blue() {
    // One white pixel in the middle of a 7x1 row.
    let mut px = vec![0u8; 7 * 4];
    px[12..16].copy_from_slice(&[255, 255, 255, 255]);
    let p = FilterProgram::build(&FilterSpec {
        chromatic_aberration: 2.0,
        ..FilterSpec::IDENTITY
    });
    apply_filter_program(&mut px, 7, 1, &p, 0).unwrap();

    assert_eq!(&px[4..8], &[255, 0, 0, 255]);
    assert_eq!(&px[12..16], &[0, 255, 0, 255]);
    assert_eq!(&px[20..24], &[0, 0, 255, 255]);
}
