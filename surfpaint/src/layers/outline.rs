use super::{LayerProps, Scratch};
use crate::error::{PaintError, PaintResult};
use crate::geometry::adjacency::MeshAdjacency;
use crate::geometry::limits::channel_ok;
use crate::model::Rgba;
use crate::options::LayerOptions;
use std::sync::Arc;

/// Boundaries between label regions, drawn by the host as line segments.
///
/// Never blended: its colour buffer is all zeros.
#[derive(Clone, Debug)]
pub struct OutlineLayer {
    pub(crate) props: LayerProps,
    labels: Vec<i32>,
    adjacency: Arc<MeshAdjacency>,
    color: Rgba,
    width: f32,
    edges: Vec<[u32; 2]>,
    scratch: Scratch,
}

impl OutlineLayer {
    /// `labels` holds one label per mesh vertex.
    pub fn new(
        id: impl Into<String>,
        labels: Vec<i32>,
        adjacency: Arc<MeshAdjacency>,
        color: Rgba,
        width: f32,
        opts: &LayerOptions,
    ) -> PaintResult<Self> {
        let props = LayerProps::new(id, opts)?;
        check_style(color, width)?;
        check_labels(&labels, &adjacency)?;
        let edges = boundary_edges(&labels, &adjacency);
        log::debug!("outline '{}': {} boundary edges", props.id, edges.len());
        Ok(OutlineLayer { props, labels, adjacency, color, width, edges, scratch: Scratch::default() })
    }

    pub fn set_labels(&mut self, labels: Vec<i32>) -> PaintResult<()> {
        check_labels(&labels, &self.adjacency)?;
        self.edges = boundary_edges(&labels, &self.adjacency);
        self.labels = labels;
        self.props.needs_update = true;
        Ok(())
    }

    pub fn set_style(&mut self, color: Rgba, width: f32) -> PaintResult<()> {
        check_style(color, width)?;
        self.color = color;
        self.width = width;
        self.props.needs_update = true;
        Ok(())
    }

    pub fn color(&self) -> Rgba { self.color }
    pub fn width(&self) -> f32 { self.width }

    /// Mesh edges whose endpoints carry different labels, as `[lo, hi]`.
    pub fn boundary_edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    /// Flattened edge endpoints, ready for a line-segment index buffer.
    pub fn segment_indices(&self) -> Vec<u32> {
        self.edges.iter().flat_map(|e| e.iter().copied()).collect()
    }

    /// Vertices touching at least one boundary edge, ascending.
    pub fn boundary_vertices(&self) -> Vec<u32> {
        let mut vs: Vec<u32> = self.segment_indices();
        vs.sort_unstable();
        vs.dedup();
        vs
    }

    pub fn is_stale(&self, vertex_count: usize) -> bool {
        self.scratch.is_stale(&self.props, vertex_count, 0)
    }

    pub fn rgba(&mut self, vertex_count: usize) -> &[f32] {
        if self.is_stale(vertex_count) {
            self.scratch.reset(vertex_count);
            self.scratch.finish(&mut self.props, vertex_count, 0);
        }
        self.scratch.get()
    }
}

fn check_labels(labels: &[i32], adjacency: &MeshAdjacency) -> PaintResult<()> {
    if labels.len() != adjacency.vertex_count() {
        return Err(PaintError::input(format!(
            "outline needs one label per vertex ({}), got {}",
            adjacency.vertex_count(),
            labels.len()
        )));
    }
    Ok(())
}

fn check_style(color: Rgba, width: f32) -> PaintResult<()> {
    if !color.iter().all(|&c| channel_ok(c)) {
        return Err(PaintError::input("outline colour has a channel outside [0, 1]"));
    }
    if !(width.is_finite() && width > 0.0) {
        return Err(PaintError::param("width", format!("must be positive, got {}", width)));
    }
    Ok(())
}

fn boundary_edges(labels: &[i32], adjacency: &MeshAdjacency) -> Vec<[u32; 2]> {
    adjacency
        .edges()
        .filter(|&(a, b)| labels[a as usize] != labels[b as usize])
        .map(|(a, b)| [a, b])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_edges_between_regions() {
        // two triangles sharing edge 1-2; vertex 3 in a different region
        let adj = Arc::new(MeshAdjacency::build(&[0, 1, 2, 1, 3, 2], 4).unwrap());
        let mut o =
            OutlineLayer::new("o", vec![5, 5, 5, 6], adj, [0.0, 0.0, 0.0, 1.0], 1.0, &LayerOptions::default()).unwrap();
        assert_eq!(o.boundary_edges(), &[[1, 3], [2, 3]]);
        assert_eq!(o.boundary_vertices(), vec![1, 2, 3]);
        assert!(o.rgba(4).iter().all(|&c| c == 0.0));
        o.set_labels(vec![5, 5, 5, 5]).unwrap();
        assert!(o.boundary_edges().is_empty());
        assert!(o.set_labels(vec![1]).is_err());
    }
}
