//! Construction options decoded from host objects or JSON.
//!
//! Every field has a default so hosts only pass what they change.

use crate::colormap::{ColorMap, ColorMapRegistry, PaletteSpec};
use crate::colormap2d::ColorMap2D;
use crate::error::{PaintError, PaintResult};
use crate::model::{BlendMode, LabelEntry, Rgba, StatType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StackOptions {
    /// Opaque colour every composite starts from.
    pub base_color: [f32; 3],
}

impl Default for StackOptions {
    fn default() -> Self {
        StackOptions { base_color: [0.8, 0.8, 0.8] }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerOptions {
    pub visible: bool,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    /// Composite ordering key; lower draws first.
    pub order: i32,
}

impl Default for LayerOptions {
    fn default() -> Self {
        LayerOptions { visible: true, opacity: 1.0, blend_mode: BlendMode::Normal, order: 0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorMapOptions {
    pub palette: PaletteSpec,
    /// Display range; defaults to the finite extent of the data.
    pub range: Option<[f32; 2]>,
    /// Hide zone `[lo, hi]`; `lo == hi` disables it.
    pub threshold: Option<[f32; 2]>,
    pub alpha: f32,
}

impl Default for ColorMapOptions {
    fn default() -> Self {
        ColorMapOptions { palette: PaletteSpec::default(), range: None, threshold: None, alpha: 1.0 }
    }
}

impl ColorMapOptions {
    pub fn build(&self, registry: &ColorMapRegistry, data: &[f32]) -> PaintResult<ColorMap> {
        let range = self.range.unwrap_or_else(|| finite_extent(data));
        let mut cm = registry.colormap(&self.palette, range)?;
        if let Some([lo, hi]) = self.threshold {
            cm.set_threshold(lo, hi)?;
        }
        cm.set_alpha(self.alpha)?;
        Ok(cm)
    }
}

/// Sign-routed colouring: positive values through one colormap, negative through another.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DualThresholdOptions {
    pub positive: ColorMapOptions,
    pub negative: ColorMapOptions,
}

impl DualThresholdOptions {
    pub fn build(&self, registry: &ColorMapRegistry) -> PaintResult<(ColorMap, ColorMap)> {
        let pos_range = self
            .positive
            .range
            .ok_or_else(|| PaintError::input("dual threshold needs an explicit positive range"))?;
        let neg_range = self
            .negative
            .range
            .ok_or_else(|| PaintError::input("dual threshold needs an explicit negative range"))?;
        if pos_range[0] < 0.0 {
            return Err(PaintError::param("positive.range", "must not extend below zero"));
        }
        if neg_range[1] > 0.0 {
            return Err(PaintError::param("negative.range", "must not extend above zero"));
        }
        let positive = self.positive.build(registry, &[])?;
        let negative = self.negative.build(registry, &[])?;
        Ok((positive, negative))
    }
}

/// Joint colormap from an explicit grid, or bilinearly from four corners when no grid is given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorMap2DOptions {
    /// Row-major, `width * height` entries.
    pub grid: Option<Vec<Rgba>>,
    pub width: usize,
    pub height: usize,
    /// (min x, min y), (max x, min y), (min x, max y), (max x, max y)
    pub corners: [Rgba; 4],
    pub side: usize,
    pub range_x: Option<[f32; 2]>,
    pub range_y: Option<[f32; 2]>,
    pub alpha: f32,
}

impl Default for ColorMap2DOptions {
    fn default() -> Self {
        ColorMap2DOptions {
            grid: None,
            width: 0,
            height: 0,
            corners: [[0.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0], [1.0, 0.0, 1.0, 1.0]],
            side: 16,
            range_x: None,
            range_y: None,
            alpha: 1.0,
        }
    }
}

impl ColorMap2DOptions {
    pub fn build(&self, x: &[f32], y: &[f32]) -> PaintResult<ColorMap2D> {
        let mut cm = match &self.grid {
            Some(grid) => ColorMap2D::new(grid.clone(), self.width, self.height)?,
            None => {
                let [c00, c10, c01, c11] = self.corners;
                ColorMap2D::bilinear(c00, c10, c01, c11, self.side)?
            }
        };
        let rx = self.range_x.unwrap_or_else(|| finite_extent(x));
        let ry = self.range_y.unwrap_or_else(|| finite_extent(y));
        cm.set_ranges(rx, ry)?;
        cm.set_alpha(self.alpha)?;
        Ok(cm)
    }
}

/// One row of a host-supplied label table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelTableEntry {
    pub label: i32,
    #[serde(default)]
    pub name: String,
    pub color: Rgba,
}

pub fn label_table(entries: &[LabelTableEntry]) -> PaintResult<BTreeMap<i32, LabelEntry>> {
    let mut table = BTreeMap::new();
    for e in entries {
        let entry = LabelEntry { name: e.name.clone(), color: e.color };
        if table.insert(e.label, entry).is_some() {
            return Err(PaintError::input(format!("label {} listed twice", e.label)));
        }
    }
    Ok(table)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatMapOptions {
    pub stat_type: StatType,
    pub degrees_of_freedom: Option<f64>,
}

/// `[min, max]` over finite values; `[0, 1]` when there are none.
pub fn finite_extent(data: &[f32]) -> [f32; 2] {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in data.iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi { [0.0, 1.0] } else { [lo, hi] }
}
