//! Layer variants and the capability set the stack composites through.

pub mod base;
pub mod data;
pub mod label;
pub mod outline;
pub mod rgba;
pub mod stat_map;
pub mod two_data;

pub use base::BaseLayer;
pub use data::DataLayer;
pub use label::LabelLayer;
pub use outline::OutlineLayer;
pub use rgba::RgbaLayer;
pub use stat_map::{CorrectionState, DualThreshold, StatMapLayer, VertexProbe};
pub use two_data::TwoDataLayer;

use crate::error::{PaintError, PaintResult};
use crate::geometry::limits::channel_ok;
use crate::model::{BlendMode, LayerId, LayerKind, Rgba};
use crate::options::LayerOptions;
use serde::{Deserialize, Serialize};

/// State every layer carries regardless of variant.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerProps {
    pub(crate) id: LayerId,
    pub(crate) visible: bool,
    pub(crate) opacity: f32,
    pub(crate) blend_mode: BlendMode,
    pub(crate) order: i32,
    /// Content changed since the last buffer was produced.
    pub(crate) needs_update: bool,
}

impl LayerProps {
    pub fn new(id: impl Into<LayerId>, opts: &LayerOptions) -> PaintResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(PaintError::input("layer id must not be empty"));
        }
        check_opacity(opts.opacity)?;
        Ok(LayerProps {
            id,
            visible: opts.visible,
            opacity: opts.opacity,
            blend_mode: opts.blend_mode,
            order: opts.order,
            needs_update: true,
        })
    }

    // Validates the whole patch before touching anything.
    fn apply(&mut self, patch: &LayerUpdate) -> PaintResult<bool> {
        if let Some(o) = patch.opacity {
            check_opacity(o)?;
        }
        let mut changed = false;
        if let Some(v) = patch.visible {
            changed |= v != self.visible;
            self.visible = v;
        }
        if let Some(o) = patch.opacity {
            if o != self.opacity {
                self.opacity = o;
                self.needs_update = true;
                changed = true;
            }
        }
        if let Some(m) = patch.blend_mode {
            changed |= m != self.blend_mode;
            self.blend_mode = m;
        }
        Ok(changed)
    }
}

fn check_opacity(o: f32) -> PaintResult<()> {
    if channel_ok(o) {
        Ok(())
    } else {
        Err(PaintError::param("opacity", format!("must be in [0, 1], got {}", o)))
    }
}

/// Partial update of the shared layer properties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerUpdate {
    pub visible: Option<bool>,
    pub opacity: Option<f32>,
    pub blend_mode: Option<BlendMode>,
}

/// Layer-owned output buffer, reused across calls.
///
/// The slice handed out by `rgba()` is overwritten by the next call on the
/// same layer; copy it if a stable snapshot is needed.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Scratch {
    buf: Vec<f32>,
    // (vertex count, source version) the buffer was built for
    built: Option<(usize, u64)>,
}

impl Scratch {
    pub(crate) fn is_stale(&self, props: &LayerProps, vertex_count: usize, version: u64) -> bool {
        props.needs_update || self.built != Some((vertex_count, version))
    }

    /// Zeroed buffer of `4 * vertex_count` floats.
    pub(crate) fn reset(&mut self, vertex_count: usize) -> &mut [f32] {
        self.buf.clear();
        self.buf.resize(4 * vertex_count, 0.0);
        &mut self.buf
    }

    pub(crate) fn finish(&mut self, props: &mut LayerProps, vertex_count: usize, version: u64) {
        self.built = Some((vertex_count, version));
        props.needs_update = false;
    }

    pub(crate) fn get(&self) -> &[f32] {
        &self.buf
    }
}

/// Write `color` at vertex `v`, scaling its alpha by `opacity`.
#[inline]
pub(crate) fn put(buf: &mut [f32], v: usize, color: Rgba, opacity: f32) {
    let px = &mut buf[4 * v..4 * v + 4];
    px[0] = color[0];
    px[1] = color[1];
    px[2] = color[2];
    px[3] = color[3] * opacity;
}

/// Values paired with destination vertices; identity mapping when no indices are given.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexField<T> {
    values: Vec<T>,
    indices: Option<Vec<u32>>,
}

impl<T: Copy> VertexField<T> {
    pub fn new(values: Vec<T>, indices: Option<Vec<u32>>) -> PaintResult<Self> {
        if let Some(idx) = &indices {
            if idx.len() != values.len() {
                return Err(PaintError::input(format!(
                    "{} indices for {} values",
                    idx.len(),
                    values.len()
                )));
            }
        }
        Ok(VertexField { values, indices })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    #[inline]
    pub fn destination(&self, i: usize) -> u32 {
        match &self.indices {
            Some(idx) => idx[i],
            None => i as u32,
        }
    }

    /// `(data index, destination vertex, value)` for destinations below `vertex_count`.
    pub fn points(&self, vertex_count: usize) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.values.iter().enumerate().filter_map(move |(i, &val)| {
            let v = self.destination(i) as usize;
            (v < vertex_count).then_some((i, v, val))
        })
    }

    /// Last data entry that lands on vertex `v`.
    pub fn at_vertex(&self, v: u32) -> Option<(usize, T)> {
        match &self.indices {
            None => self.values.get(v as usize).map(|&val| (v as usize, val)),
            Some(idx) => idx.iter().rposition(|&d| d == v).map(|i| (i, self.values[i])),
        }
    }
}

/// Closed set of layer variants.
#[derive(Clone, Debug)]
pub enum Layer {
    Base(BaseLayer),
    Rgba(RgbaLayer),
    Data(DataLayer),
    TwoData(TwoDataLayer),
    Label(LabelLayer),
    StatMap(StatMapLayer),
    Outline(OutlineLayer),
}

macro_rules! each_variant {
    ($self:expr, $l:ident => $body:expr) => {
        match $self {
            Layer::Base($l) => $body,
            Layer::Rgba($l) => $body,
            Layer::Data($l) => $body,
            Layer::TwoData($l) => $body,
            Layer::Label($l) => $body,
            Layer::StatMap($l) => $body,
            Layer::Outline($l) => $body,
        }
    };
}

impl Layer {
    pub fn props(&self) -> &LayerProps {
        each_variant!(self, l => &l.props)
    }

    fn props_mut(&mut self) -> &mut LayerProps {
        each_variant!(self, l => &mut l.props)
    }

    pub fn id(&self) -> &str { &self.props().id }
    pub fn visible(&self) -> bool { self.props().visible }
    pub fn opacity(&self) -> f32 { self.props().opacity }
    pub fn blend_mode(&self) -> BlendMode { self.props().blend_mode }
    pub fn order(&self) -> i32 { self.props().order }
    pub fn needs_update(&self) -> bool { self.props().needs_update }

    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Base(_) => LayerKind::Base,
            Layer::Rgba(_) => LayerKind::Rgba,
            Layer::Data(_) => LayerKind::Data,
            Layer::TwoData(_) => LayerKind::TwoData,
            Layer::Label(_) => LayerKind::Label,
            Layer::StatMap(_) => LayerKind::StatMap,
            Layer::Outline(_) => LayerKind::Outline,
        }
    }

    /// Outline layers are drawn by the host as lines, never blended.
    pub fn is_compositing(&self) -> bool {
        !matches!(self, Layer::Outline(_))
    }

    /// Dense `4 * vertex_count` RGBA buffer, alpha already scaled by opacity.
    pub fn rgba(&mut self, vertex_count: usize) -> &[f32] {
        each_variant!(self, l => l.rgba(vertex_count))
    }

    /// Whether the next `rgba(vertex_count)` call would rebuild the buffer.
    pub fn is_stale(&self, vertex_count: usize) -> bool {
        each_variant!(self, l => l.is_stale(vertex_count))
    }

    /// Apply a property patch; returns whether anything visible changed.
    pub fn update(&mut self, patch: &LayerUpdate) -> PaintResult<bool> {
        self.props_mut().apply(patch)
    }

    /// Force a rebuild on the next `rgba()` call.
    pub fn invalidate(&mut self) {
        self.props_mut().needs_update = true;
    }
}
