// Shared numeric tolerances for colour and statistics code

pub const EPS_COLOR: f32 = 1e-5;          // channel compare slack

// Largest z reported for p == 0 (p-values underflow long before this)
pub const Z_CAP: f64 = 38.0;

#[inline] pub fn clamp01(x: f32) -> f32 { x.max(0.0).min(1.0) }
#[inline] pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool { (a - b).abs() <= eps }

/// Normalised position of `v` inside `[min, max]`, clamped; a collapsed range maps to 0.
#[inline]
pub fn normalize(v: f32, min: f32, max: f32) -> f32 {
    // f64 keeps `max - min` finite for ranges spanning most of f32
    let span = max as f64 - min as f64;
    if span == 0.0 || !span.is_finite() { 0.0 } else { clamp01(((v as f64 - min as f64) / span) as f32) }
}

/// Palette slot for a normalised `t` over `n` entries.
#[inline]
pub fn palette_index(t: f32, n: usize) -> usize {
    if n <= 1 { return 0; }
    let idx = (t * (n - 1) as f32).floor();
    if idx <= 0.0 { 0 } else { (idx as usize).min(n - 1) }
}
