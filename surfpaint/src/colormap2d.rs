//! Two-variable colour lookup for joint maps.

use crate::error::{PaintError, PaintResult};
use crate::geometry::limits::{channel_ok, MAX_GRID_SIDE};
use crate::geometry::tolerance::{normalize, palette_index};
use crate::model::{Rgba, TRANSPARENT};

/// A `width × height` colour grid. `x` selects the column, `y` the row.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap2D {
    /// Row-major: `grid[row * width + col]`.
    grid: Vec<Rgba>,
    width: usize,
    height: usize,
    range_x: [f32; 2],
    range_y: [f32; 2],
    alpha: f32,
    version: u64,
}

impl ColorMap2D {
    pub fn new(grid: Vec<Rgba>, width: usize, height: usize) -> PaintResult<Self> {
        if width == 0 || height == 0 || width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
            return Err(PaintError::input(format!("grid size {}x{} out of bounds", width, height)));
        }
        if grid.len() != width * height {
            return Err(PaintError::input(format!(
                "grid has {} entries, expected {}",
                grid.len(),
                width * height
            )));
        }
        if !grid.iter().all(|c| c.iter().all(|&v| channel_ok(v))) {
            return Err(PaintError::input("grid colour channel outside [0, 1]"));
        }
        Ok(ColorMap2D { grid, width, height, range_x: [0.0, 1.0], range_y: [0.0, 1.0], alpha: 1.0, version: 1 })
    }

    /// Bilinear blend of four corner colours: `c00` at (min x, min y), `c10` at (max x, min y), ...
    pub fn bilinear(c00: Rgba, c10: Rgba, c01: Rgba, c11: Rgba, side: usize) -> PaintResult<Self> {
        if side < 2 || side > MAX_GRID_SIDE {
            return Err(PaintError::input(format!("bilinear grid side must be in 2..={}, got {}", MAX_GRID_SIDE, side)));
        }
        let mut grid = Vec::with_capacity(side * side);
        let last = (side - 1) as f32;
        for row in 0..side {
            let fy = row as f32 / last;
            for col in 0..side {
                let fx = col as f32 / last;
                let mut c = [0.0f32; 4];
                for k in 0..4 {
                    let bottom = c00[k] + (c10[k] - c00[k]) * fx;
                    let top = c01[k] + (c11[k] - c01[k]) * fx;
                    c[k] = bottom + (top - bottom) * fy;
                }
                grid.push(c);
            }
        }
        ColorMap2D::new(grid, side, side)
    }

    pub fn color(&self, x: f32, y: f32) -> Rgba {
        if !x.is_finite() || !y.is_finite() {
            return TRANSPARENT;
        }
        let col = palette_index(normalize(x, self.range_x[0], self.range_x[1]), self.width);
        let row = palette_index(normalize(y, self.range_y[0], self.range_y[1]), self.height);
        let mut c = self.grid[row * self.width + col];
        c[3] *= self.alpha;
        c
    }

    pub fn set_ranges(&mut self, range_x: [f32; 2], range_y: [f32; 2]) -> PaintResult<()> {
        for (param, r) in [("range_x", range_x), ("range_y", range_y)] {
            if !r[0].is_finite() || !r[1].is_finite() || r[0] > r[1] {
                return Err(PaintError::param(param, format!("must be a finite [min, max], got {:?}", r)));
            }
        }
        self.range_x = range_x;
        self.range_y = range_y;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    pub fn set_alpha(&mut self, alpha: f32) -> PaintResult<()> {
        if !channel_ok(alpha) {
            return Err(PaintError::param("alpha", format!("must be in [0, 1], got {}", alpha)));
        }
        self.alpha = alpha;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    pub fn size(&self) -> (usize, usize) { (self.width, self.height) }
    pub fn ranges(&self) -> ([f32; 2], [f32; 2]) { (self.range_x, self.range_y) }
    pub fn version(&self) -> u64 { self.version }
}
