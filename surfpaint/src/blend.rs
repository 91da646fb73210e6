//! Per-vertex blend algebra used by the layer stack.
//!
//! Buffers are dense RGBA `f32` arrays, four floats per vertex. Source alpha
//! already carries the layer opacity. A source alpha of zero leaves the
//! destination untouched.

use crate::model::BlendMode;

/// Fold one vertex's `src` colour onto `dst`.
#[inline]
pub fn blend_pixel(dst: &mut [f32], src: &[f32], mode: BlendMode) {
    let sa = src[3];
    if !(sa > 0.0) {
        return;
    }
    let da = dst[3];
    match mode {
        BlendMode::Normal => over(dst, [src[0], src[1], src[2]], sa, da),
        BlendMode::Additive => {
            for k in 0..3 {
                dst[k] = (dst[k] + src[k] * sa).min(1.0);
            }
            dst[3] = (da + sa).min(1.0);
        }
        BlendMode::Multiply => {
            for k in 0..3 {
                dst[k] *= (1.0 - sa) + src[k] * sa;
            }
            dst[3] = da + sa * (1.0 - da);
        }
        BlendMode::Screen => {
            let screened = [
                1.0 - (1.0 - dst[0]) * (1.0 - src[0]),
                1.0 - (1.0 - dst[1]) * (1.0 - src[1]),
                1.0 - (1.0 - dst[2]) * (1.0 - src[2]),
            ];
            over(dst, screened, sa, da);
        }
    }
}

// Alpha-over of a straight colour; a zero result alpha leaves dst as is.
#[inline]
fn over(dst: &mut [f32], rgb: [f32; 3], sa: f32, da: f32) {
    let keep = da * (1.0 - sa);
    let out_a = sa + keep;
    if out_a == 0.0 {
        return;
    }
    for k in 0..3 {
        dst[k] = (rgb[k] * sa + dst[k] * keep) / out_a;
    }
    dst[3] = out_a;
}

/// Fold a whole layer buffer onto an accumulated composite.
pub fn blend_buffer(dst: &mut [f32], src: &[f32], mode: BlendMode) {
    let n = dst.len().min(src.len());
    fold_pixels(&mut dst[..n], &src[..n], mode);
}

#[cfg(feature = "threads")]
fn fold_pixels(dst: &mut [f32], src: &[f32], mode: BlendMode) {
    use rayon::prelude::*;
    dst.par_chunks_exact_mut(4)
        .zip(src.par_chunks_exact(4))
        .for_each(|(d, s)| blend_pixel(d, s, mode));
}

#[cfg(not(feature = "threads"))]
fn fold_pixels(dst: &mut [f32], src: &[f32], mode: BlendMode) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        blend_pixel(d, s, mode);
    }
}

/// Fill `buf` with an opaque base colour.
pub fn seed(buf: &mut [f32], base: [f32; 3]) {
    for px in buf.chunks_exact_mut(4) {
        px[0] = base[0];
        px[1] = base[1];
        px[2] = base[2];
        px[3] = 1.0;
    }
}
