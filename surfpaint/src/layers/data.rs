use super::{put, LayerProps, Scratch, VertexField};
use crate::colormap::ColorMap;
use crate::error::PaintResult;
use crate::options::LayerOptions;

/// Scalar field coloured through a [`ColorMap`].
#[derive(Clone, Debug)]
pub struct DataLayer {
    pub(crate) props: LayerProps,
    field: VertexField<f32>,
    colormap: ColorMap,
    scratch: Scratch,
}

impl DataLayer {
    pub fn new(
        id: impl Into<String>,
        data: Vec<f32>,
        indices: Option<Vec<u32>>,
        colormap: ColorMap,
        opts: &LayerOptions,
    ) -> PaintResult<Self> {
        Ok(DataLayer {
            props: LayerProps::new(id, opts)?,
            field: VertexField::new(data, indices)?,
            colormap,
            scratch: Scratch::default(),
        })
    }

    pub fn field(&self) -> &VertexField<f32> {
        &self.field
    }

    pub fn set_data(&mut self, data: Vec<f32>, indices: Option<Vec<u32>>) -> PaintResult<()> {
        self.field = VertexField::new(data, indices)?;
        self.props.needs_update = true;
        Ok(())
    }

    pub fn colormap(&self) -> &ColorMap {
        &self.colormap
    }

    /// Edits through this handle are picked up on the next `rgba()` via the colormap version.
    pub fn colormap_mut(&mut self) -> &mut ColorMap {
        &mut self.colormap
    }

    pub fn set_colormap(&mut self, colormap: ColorMap) {
        self.colormap = colormap;
        self.props.needs_update = true;
    }

    pub fn set_range(&mut self, min: f32, max: f32) -> PaintResult<()> {
        self.colormap.set_range(min, max)
    }

    pub fn set_threshold(&mut self, lo: f32, hi: f32) -> PaintResult<()> {
        self.colormap.set_threshold(lo, hi)
    }

    pub fn value_at(&self, vertex: u32) -> Option<f32> {
        self.field.at_vertex(vertex).map(|(_, v)| v)
    }

    pub fn is_stale(&self, vertex_count: usize) -> bool {
        self.scratch.is_stale(&self.props, vertex_count, self.colormap.version())
    }

    pub fn rgba(&mut self, vertex_count: usize) -> &[f32] {
        let version = self.colormap.version();
        if self.is_stale(vertex_count) {
            let opacity = self.props.opacity;
            let buf = self.scratch.reset(vertex_count);
            for (_, v, value) in self.field.points(vertex_count) {
                if value.is_finite() {
                    put(buf, v, self.colormap.color(value), opacity);
                }
            }
            self.scratch.finish(&mut self.props, vertex_count, version);
        }
        self.scratch.get()
    }
}
