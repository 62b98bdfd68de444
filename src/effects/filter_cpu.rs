use crate::effects::filter::{FilterOp, FilterProgram};
use crate::foundation::error::{CoverError, CoverResult};
use crate::foundation::math::hash_u32;

/// Row-major 4x5 color matrix applied to straight-alpha `[r, g, b, a, 1]` in `0..=1`.
pub type ColorMatrix = [f32; 20];

/// Matrix that leaves every pixel unchanged.
pub const IDENTITY_MATRIX: ColorMatrix = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// One pixel pass of an interpreted program.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RasterPass {
    Blur { sigma: f32 },
    Matrix(ColorMatrix),
    Noise { amount: f32 },
    ChromaticAberration { offset: i32 },
}

/// Lower `program` into raster passes, fusing runs of color-matrix ops into one matrix.
pub(crate) fn lower_program(program: &FilterProgram) -> Vec<RasterPass> {
    let mut passes = Vec::with_capacity(program.ops().len());
    let mut pending: Option<ColorMatrix> = None;

    for op in program.ops() {
        if let Some(m) = color_matrix_for(op) {
            pending = Some(match pending {
                Some(prev) => compose_matrices(&prev, &m),
                None => m,
            });
            continue;
        }
        if let Some(m) = pending.take() {
            passes.push(RasterPass::Matrix(m));
        }
        match *op {
            FilterOp::Blur { sigma } => passes.push(RasterPass::Blur {
                sigma: sigma as f32,
            }),
            FilterOp::Noise(amount) => passes.push(RasterPass::Noise {
                amount: amount as f32,
            }),
            FilterOp::ChromaticAberration { offset } => {
                let offset = offset.round() as i32;
                if offset > 0 {
                    passes.push(RasterPass::ChromaticAberration { offset });
                }
            }
            _ => {}
        }
    }
    if let Some(m) = pending {
        passes.push(RasterPass::Matrix(m));
    }
    passes
}

/// Apply `program` in place to a premultiplied RGBA8 buffer of `width x height`.
///
/// `seed` drives the noise pattern so that the same layer always gets the same grain.
pub fn apply_filter_program(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    program: &FilterProgram,
    seed: u64,
) -> CoverResult<()> {
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if pixels.len() != expected {
        return Err(CoverError::render(format!(
            "filter input has {} bytes, expected {expected} for {width}x{height}",
            pixels.len()
        )));
    }
    if program.is_empty() || expected == 0 {
        return Ok(());
    }

    let mut scratch = vec![0u8; pixels.len()];
    for pass in lower_program(program) {
        match pass {
            RasterPass::Blur { sigma } => {
                let out = blur_rgba8_premul(pixels, width, height, sigma)?;
                pixels.copy_from_slice(&out);
            }
            RasterPass::Matrix(m) => {
                color_matrix_rgba8_premul(pixels, &mut scratch, &m);
                pixels.copy_from_slice(&scratch);
            }
            RasterPass::Noise { amount } => noise_rgba8_premul(pixels, width, amount, seed),
            RasterPass::ChromaticAberration { offset } => {
                chromatic_aberration_rgba8_premul(pixels, &mut scratch, width, height, offset);
                pixels.copy_from_slice(&scratch);
            }
        }
    }
    Ok(())
}

/// Color matrix for a per-pixel op, `None` for raster ops.
pub fn color_matrix_for(op: &FilterOp) -> Option<ColorMatrix> {
    let m = match *op {
        FilterOp::Brightness(b) => {
            let b = b as f32;
            scale_rgb_matrix(b, 0.0)
        }
        FilterOp::Contrast(c) => {
            let c = c as f32;
            scale_rgb_matrix(c, 0.5 - 0.5 * c)
        }
        FilterOp::Saturate(s) => {
            let s = s as f32;
            rgb_matrix([
                [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
            ])
        }
        FilterOp::HueRotate(deg) => {
            let (sin, cos) = (deg.to_radians() as f32).sin_cos();
            rgb_matrix([
                [
                    0.213 + cos * 0.787 - sin * 0.213,
                    0.715 - cos * 0.715 - sin * 0.715,
                    0.072 - cos * 0.072 + sin * 0.928,
                ],
                [
                    0.213 - cos * 0.213 + sin * 0.143,
                    0.715 + cos * 0.285 + sin * 0.140,
                    0.072 - cos * 0.072 - sin * 0.283,
                ],
                [
                    0.213 - cos * 0.213 - sin * 0.787,
                    0.715 - cos * 0.715 + sin * 0.715,
                    0.072 + cos * 0.928 + sin * 0.072,
                ],
            ])
        }
        FilterOp::Sepia(a) => {
            let i = 1.0 - a as f32;
            rgb_matrix([
                [0.393 + 0.607 * i, 0.769 - 0.769 * i, 0.189 - 0.189 * i],
                [0.349 - 0.349 * i, 0.686 + 0.314 * i, 0.168 - 0.168 * i],
                [0.272 - 0.272 * i, 0.534 - 0.534 * i, 0.131 + 0.869 * i],
            ])
        }
        FilterOp::Invert(a) => {
            let a = a as f32;
            scale_rgb_matrix(1.0 - 2.0 * a, a)
        }
        FilterOp::Grayscale(a) => {
            let i = 1.0 - a as f32;
            rgb_matrix([
                [0.2126 + 0.7874 * i, 0.7152 - 0.7152 * i, 0.0722 - 0.0722 * i],
                [0.2126 - 0.2126 * i, 0.7152 + 0.2848 * i, 0.0722 - 0.0722 * i],
                [0.2126 - 0.2126 * i, 0.7152 - 0.7152 * i, 0.0722 + 0.9278 * i],
            ])
        }
        FilterOp::Blur { .. } | FilterOp::Noise(_) | FilterOp::ChromaticAberration { .. } => {
            return None;
        }
    };
    Some(m)
}

fn scale_rgb_matrix(scale: f32, offset: f32) -> ColorMatrix {
    let mut m = IDENTITY_MATRIX;
    for row in 0..3 {
        m[row * 5 + row] = scale;
        m[row * 5 + 4] = offset;
    }
    m
}

fn rgb_matrix(rows: [[f32; 3]; 3]) -> ColorMatrix {
    let mut m = IDENTITY_MATRIX;
    for (r, row) in rows.iter().enumerate() {
        m[r * 5..r * 5 + 3].copy_from_slice(row);
    }
    m
}

/// Matrix equivalent to applying `first` and then `second`.
pub fn compose_matrices(first: &ColorMatrix, second: &ColorMatrix) -> ColorMatrix {
    // Treat each as 5x5 with an implicit last row [0, 0, 0, 0, 1].
    let at = |m: &ColorMatrix, r: usize, c: usize| -> f32 {
        if r < 4 {
            m[r * 5 + c]
        } else if c == 4 {
            1.0
        } else {
            0.0
        }
    };
    let mut out = [0.0f32; 20];
    for r in 0..4 {
        for c in 0..5 {
            out[r * 5 + c] = (0..5).map(|k| at(second, r, k) * at(first, k, c)).sum();
        }
    }
    out
}

pub(crate) fn color_matrix_rgba8_premul(src: &[u8], dst: &mut [u8], m: &ColorMatrix) {
    debug_assert_eq!(src.len(), dst.len());
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pr = s[0] as f32 / 255.0;
        let pg = s[1] as f32 / 255.0;
        let pb = s[2] as f32 / 255.0;
        let pa = s[3] as f32 / 255.0;

        let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
        let r = pr * inv_a;
        let g = pg * inv_a;
        let b = pb * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        d[0] = ((out_r * out_a) * 255.0).round().clamp(0.0, 255.0) as u8;
        d[1] = ((out_g * out_a) * 255.0).round().clamp(0.0, 255.0) as u8;
        d[2] = ((out_b * out_a) * 255.0).round().clamp(0.0, 255.0) as u8;
        d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Separable gaussian blur of a premultiplied RGBA8 buffer. Edges clamp.
pub fn blur_rgba8_premul(src: &[u8], width: u32, height: u32, sigma: f32) -> CoverResult<Vec<u8>> {
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if src.len() != expected {
        return Err(CoverError::render("blur input size mismatch"));
    }
    if !sigma.is_finite() || sigma <= 0.0 || expected == 0 {
        return Ok(src.to_vec());
    }
    let radius = (sigma * 3.0).ceil() as u32;
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    if kernel.len() == 1 {
        return Ok(src.to_vec());
    }

    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];
    horizontal_blur_q16(src, &mut tmp, width, height, &kernel);
    vertical_blur_q16(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CoverResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CoverError::render("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(CoverError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

fn noise_rgba8_premul(pixels: &mut [u8], width: u32, amount: f32, seed: u64) {
    let amount = amount.clamp(0.0, 1.0);
    if amount <= 0.0 || width == 0 {
        return;
    }
    for (i, px) in pixels.chunks_exact_mut(4).enumerate() {
        let a = px[3];
        if a == 0 {
            continue;
        }
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        let h = hash_u32(seed, x, y);
        // Map to [-1, 1].
        let n = (h as f32 / u32::MAX as f32) * 2.0 - 1.0;
        let delta = n * amount * 127.5 * (f32::from(a) / 255.0);
        for c in 0..3 {
            let v = (f32::from(px[c]) + delta).round().clamp(0.0, f32::from(a));
            px[c] = v as u8;
        }
    }
}

fn chromatic_aberration_rgba8_premul(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    offset: i32,
) {
    let w = width as i32;
    let sample = |x: i32, y: i32| -> [u8; 4] {
        if x < 0 || x >= w {
            return [0, 0, 0, 0];
        }
        let idx = ((y * w + x) as usize) * 4;
        [src[idx], src[idx + 1], src[idx + 2], src[idx + 3]]
    };
    for y in 0..height as i32 {
        for x in 0..w {
            let red = sample(x + offset, y);
            let mid = sample(x, y);
            let blue = sample(x - offset, y);
            let out_idx = ((y * w + x) as usize) * 4;
            // Alpha is the max of the three sources so every channel stays <= alpha.
            dst[out_idx] = red[0];
            dst[out_idx + 1] = mid[1];
            dst[out_idx + 2] = blue[2];
            dst[out_idx + 3] = red[3].max(mid[3]).max(blue[3]);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filter_cpu.rs"]
mod tests;
