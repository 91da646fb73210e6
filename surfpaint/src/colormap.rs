//! Scalar value to colour lookup.
//!
//! A [`ColorMap`] spreads an ordered palette uniformly over a display range and
//! optionally hides an interval of values (the "hide zone"). Every layer that
//! turns scalars into colours goes through [`ColorMap::color`].

use crate::error::{PaintError, PaintResult};
use crate::geometry::limits::{channel_ok, MAX_PALETTE_ENTRIES, PRESET_PALETTE_ENTRIES};
use crate::geometry::tolerance::{normalize, palette_index};
use crate::model::{Rgba, TRANSPARENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap {
    colors: Vec<Rgba>,
    channels: u8,
    range: [f32; 2],
    threshold: [f32; 2],
    alpha: f32,
    version: u64,
}

impl ColorMap {
    /// Build from explicit entries; every entry must have the first entry's
    /// channel count (3 or 4).
    pub fn new(colors: &[Vec<f32>], range: [f32; 2]) -> PaintResult<Self> {
        let first = colors.first().ok_or_else(|| PaintError::input("palette is empty"))?;
        let channels = first.len();
        if channels != 3 && channels != 4 {
            return Err(PaintError::input(format!("palette entries need 3 or 4 channels, got {}", channels)));
        }
        if colors.len() > MAX_PALETTE_ENTRIES {
            return Err(PaintError::input(format!("palette has {} entries", colors.len())));
        }
        let mut out = Vec::with_capacity(colors.len());
        for (i, c) in colors.iter().enumerate() {
            if c.len() != channels {
                return Err(PaintError::input(format!(
                    "palette entry {} has {} channels, expected {}",
                    i,
                    c.len(),
                    channels
                )));
            }
            if !c.iter().all(|&v| channel_ok(v)) {
                return Err(PaintError::input(format!("palette entry {} has a channel outside [0, 1]", i)));
            }
            out.push([c[0], c[1], c[2], if channels == 4 { c[3] } else { 1.0 }]);
        }
        Self::from_rgba(out, channels as u8, range)
    }

    pub(crate) fn from_rgba(colors: Vec<Rgba>, channels: u8, range: [f32; 2]) -> PaintResult<Self> {
        check_range("range", range)?;
        Ok(ColorMap { colors, channels, range, threshold: [0.0, 0.0], alpha: 1.0, version: 1 })
    }

    /// Colour for `value`. Values inside an active hide zone come back fully
    /// transparent; everything else is clamped onto the palette.
    pub fn color(&self, value: f32) -> Rgba {
        if self.hides(value) {
            return TRANSPARENT;
        }
        let t = normalize(value, self.range[0], self.range[1]);
        let mut c = self.colors[palette_index(t, self.colors.len())];
        if self.channels == 4 {
            c[3] *= self.alpha;
        }
        c
    }

    /// True when the hide zone is active and contains `value`.
    #[inline]
    pub fn hides(&self, value: f32) -> bool {
        let [lo, hi] = self.threshold;
        lo != hi && lo <= value && value <= hi
    }

    pub fn colors(&self) -> &[Rgba] { &self.colors }
    pub fn channels(&self) -> u8 { self.channels }
    pub fn range(&self) -> [f32; 2] { self.range }
    pub fn threshold(&self) -> [f32; 2] { self.threshold }
    pub fn alpha(&self) -> f32 { self.alpha }

    /// Bumped by every setter; layers compare it against the version they last rendered.
    pub fn version(&self) -> u64 { self.version }

    pub fn set_range(&mut self, min: f32, max: f32) -> PaintResult<()> {
        check_range("range", [min, max])?;
        self.range = [min, max];
        self.touch();
        Ok(())
    }

    /// `lo == hi` disables the hide zone.
    pub fn set_threshold(&mut self, lo: f32, hi: f32) -> PaintResult<()> {
        check_range("threshold", [lo, hi])?;
        self.threshold = [lo, hi];
        self.touch();
        Ok(())
    }

    pub fn set_alpha(&mut self, alpha: f32) -> PaintResult<()> {
        if !channel_ok(alpha) {
            return Err(PaintError::param("alpha", format!("must be in [0, 1], got {}", alpha)));
        }
        self.alpha = alpha;
        self.touch();
        Ok(())
    }

    pub fn set_colors(&mut self, colors: &[Vec<f32>]) -> PaintResult<()> {
        let rebuilt = ColorMap::new(colors, self.range)?;
        self.colors = rebuilt.colors;
        self.channels = rebuilt.channels;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

fn check_range(param: &'static str, r: [f32; 2]) -> PaintResult<()> {
    if !r[0].is_finite() || !r[1].is_finite() {
        return Err(PaintError::param(param, "must be finite"));
    }
    if r[0] > r[1] {
        return Err(PaintError::param(param, format!("min {} exceeds max {}", r[0], r[1])));
    }
    Ok(())
}

/// Where a palette comes from: a registry preset or an explicit colour list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaletteSpec {
    Named(String),
    Colors(Vec<Vec<f32>>),
}

impl Default for PaletteSpec {
    fn default() -> Self { PaletteSpec::Named("grayscale".to_string()) }
}

/// Immutable table of named palettes, built once by the host and passed to
/// whatever constructs colormaps.
#[derive(Clone, Debug)]
pub struct ColorMapRegistry {
    presets: BTreeMap<&'static str, Vec<Rgba>>,
}

// Control points, evenly spaced; expanded to PRESET_PALETTE_ENTRIES entries.
const PRESETS: &[(&str, &[[f32; 3]])] = &[
    ("grayscale", &[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]),
    ("hot", &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]]),
    ("cool", &[[0.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
    ("warm", &[[1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]),
    ("winter", &[[0.0, 0.0, 1.0], [0.0, 1.0, 0.5]]),
    (
        "viridis",
        &[
            [0.267, 0.005, 0.329],
            [0.283, 0.141, 0.458],
            [0.254, 0.265, 0.530],
            [0.207, 0.372, 0.553],
            [0.164, 0.471, 0.558],
            [0.128, 0.567, 0.551],
            [0.135, 0.659, 0.518],
            [0.267, 0.749, 0.441],
            [0.478, 0.821, 0.318],
            [0.741, 0.873, 0.150],
            [0.993, 0.906, 0.144],
        ],
    ),
    (
        "jet",
        &[[0.0, 0.0, 0.5], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.0, 0.0]],
    ),
    ("red_blue", &[[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
    ("blue_white_red", &[[0.0, 0.0, 1.0], [1.0, 1.0, 1.0], [1.0, 0.0, 0.0]]),
];

impl ColorMapRegistry {
    pub fn builtin() -> Self {
        let presets = PRESETS
            .iter()
            .map(|(name, stops)| (*name, expand_stops(stops, PRESET_PALETTE_ENTRIES)))
            .collect();
        ColorMapRegistry { presets }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.presets.keys().copied()
    }

    pub fn palette(&self, name: &str) -> Option<&[Rgba]> {
        self.presets.get(name).map(|p| p.as_slice())
    }

    /// Colormap over `range` from a preset or an explicit list.
    pub fn colormap(&self, spec: &PaletteSpec, range: [f32; 2]) -> PaintResult<ColorMap> {
        match spec {
            PaletteSpec::Named(name) => {
                let p = self
                    .palette(name)
                    .ok_or_else(|| PaintError::input(format!("unknown palette '{}'", name)))?;
                ColorMap::from_rgba(p.to_vec(), 3, range)
            }
            PaletteSpec::Colors(colors) => ColorMap::new(colors, range),
        }
    }
}

fn expand_stops(stops: &[[f32; 3]], n: usize) -> Vec<Rgba> {
    let segs = (stops.len() - 1) as f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / (n - 1) as f32 * segs;
            let k = (t.floor() as usize).min(stops.len() - 2);
            let f = t - k as f32;
            let (a, b) = (stops[k], stops[k + 1]);
            [a[0] + (b[0] - a[0]) * f, a[1] + (b[1] - a[1]) * f, a[2] + (b[2] - a[2]) * f, 1.0]
        })
        .collect()
}
