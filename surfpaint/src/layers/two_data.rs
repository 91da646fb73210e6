use super::{put, LayerProps, Scratch, VertexField};
use crate::colormap2d::ColorMap2D;
use crate::error::{PaintError, PaintResult};
use crate::options::LayerOptions;

/// Joint map of two scalar fields sharing one vertex mapping.
#[derive(Clone, Debug)]
pub struct TwoDataLayer {
    pub(crate) props: LayerProps,
    x: VertexField<f32>,
    y: Vec<f32>,
    colormap: ColorMap2D,
    scratch: Scratch,
}

impl TwoDataLayer {
    pub fn new(
        id: impl Into<String>,
        x: Vec<f32>,
        y: Vec<f32>,
        indices: Option<Vec<u32>>,
        colormap: ColorMap2D,
        opts: &LayerOptions,
    ) -> PaintResult<Self> {
        let props = LayerProps::new(id, opts)?;
        let (x, y) = paired(x, y, indices)?;
        Ok(TwoDataLayer { props, x, y, colormap, scratch: Scratch::default() })
    }

    pub fn set_data(&mut self, x: Vec<f32>, y: Vec<f32>, indices: Option<Vec<u32>>) -> PaintResult<()> {
        let (x, y) = paired(x, y, indices)?;
        self.x = x;
        self.y = y;
        self.props.needs_update = true;
        Ok(())
    }

    pub fn colormap(&self) -> &ColorMap2D {
        &self.colormap
    }

    pub fn colormap_mut(&mut self) -> &mut ColorMap2D {
        &mut self.colormap
    }

    pub fn values_at(&self, vertex: u32) -> Option<(f32, f32)> {
        self.x.at_vertex(vertex).map(|(i, xv)| (xv, self.y[i]))
    }

    pub fn is_stale(&self, vertex_count: usize) -> bool {
        self.scratch.is_stale(&self.props, vertex_count, self.colormap.version())
    }

    pub fn rgba(&mut self, vertex_count: usize) -> &[f32] {
        let version = self.colormap.version();
        if self.is_stale(vertex_count) {
            let opacity = self.props.opacity;
            let buf = self.scratch.reset(vertex_count);
            for (i, v, xv) in self.x.points(vertex_count) {
                put(buf, v, self.colormap.color(xv, self.y[i]), opacity);
            }
            self.scratch.finish(&mut self.props, vertex_count, version);
        }
        self.scratch.get()
    }
}

fn paired(x: Vec<f32>, y: Vec<f32>, indices: Option<Vec<u32>>) -> PaintResult<(VertexField<f32>, Vec<f32>)> {
    if x.len() != y.len() {
        return Err(PaintError::input(format!("x has {} values but y has {}", x.len(), y.len())));
    }
    Ok((VertexField::new(x, indices)?, y))
}
