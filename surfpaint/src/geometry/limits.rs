// Ingestion caps for host-supplied arrays

// Surface size caps (high-resolution cortical meshes sit well under these)
pub const MAX_VERTICES: usize = 16_000_000;
pub const MAX_FACES: usize = 32_000_000;

// Palettes
pub const MAX_PALETTE_ENTRIES: usize = 65_536;
pub const PRESET_PALETTE_ENTRIES: usize = 256;

// Two-dimensional colormap grid
pub const MAX_GRID_SIDE: usize = 1_024;

#[inline]
pub fn vertex_count_ok(n: usize) -> bool { n > 0 && n <= MAX_VERTICES }

#[inline]
pub fn channel_ok(c: f32) -> bool { c.is_finite() && (0.0..=1.0).contains(&c) }
