//! Vertex neighbourhoods derived from a triangle list.

use crate::error::{PaintError, PaintResult};
use crate::geometry::limits::{vertex_count_ok, MAX_FACES, MAX_VERTICES};

/// Vertex-to-vertex and vertex-to-triangle relations of a triangulated surface.
///
/// Built once and read-only afterwards; share it between layers behind an `Arc`.
#[derive(Clone, Debug, Default)]
pub struct MeshAdjacency {
    neighbors: Vec<Vec<u32>>,
    vertex_faces: Vec<Vec<u32>>,
    vertex_count: usize,
}

impl MeshAdjacency {
    /// Build from a flat `[a0, b0, c0, a1, b1, c1, ...]` index list.
    pub fn build(faces: &[u32], vertex_count: usize) -> PaintResult<Self> {
        if !vertex_count_ok(vertex_count) {
            return Err(PaintError::input(format!(
                "vertex count must be in 1..={}, got {}",
                MAX_VERTICES, vertex_count
            )));
        }
        if faces.len() % 3 != 0 {
            return Err(PaintError::input(format!("face index count {} is not divisible by 3", faces.len())));
        }
        let tri_count = faces.len() / 3;
        if tri_count > MAX_FACES {
            return Err(PaintError::input(format!("too many faces ({})", tri_count)));
        }
        if let Some(&bad) = faces.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(PaintError::input(format!(
                "face references vertex {} but vertex count is {}",
                bad, vertex_count
            )));
        }

        let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
        let mut vertex_faces: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
        let mut degenerate = 0usize;

        for (t, tri) in faces.chunks_exact(3).enumerate() {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            if a == b || b == c || a == c {
                degenerate += 1;
            }
            for &(u, v) in &[(a, b), (b, c), (c, a)] {
                if u != v {
                    neighbors[u as usize].push(v);
                    neighbors[v as usize].push(u);
                }
            }
            let t = t as u32;
            vertex_faces[a as usize].push(t);
            if b != a { vertex_faces[b as usize].push(t); }
            if c != a && c != b { vertex_faces[c as usize].push(t); }
        }

        for list in neighbors.iter_mut() {
            list.sort_unstable();
            list.dedup();
        }

        if degenerate > 0 {
            log::warn!("mesh adjacency: {} degenerate triangles with repeated vertices", degenerate);
        }
        log::debug!("mesh adjacency: {} vertices, {} triangles", vertex_count, tri_count);

        Ok(MeshAdjacency { neighbors, vertex_faces, vertex_count })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Neighbours of every vertex, indexed by vertex id.
    pub fn neighbors(&self) -> &[Vec<u32>] {
        &self.neighbors
    }

    pub fn neighbors_of(&self, v: u32) -> &[u32] {
        self.neighbors.get(v as usize).map(|n| n.as_slice()).unwrap_or(&[])
    }

    pub fn faces_of(&self, v: u32) -> &[u32] {
        self.vertex_faces.get(v as usize).map(|f| f.as_slice()).unwrap_or(&[])
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Each undirected edge once, as `(lo, hi)`.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(v, ns)| {
            let v = v as u32;
            ns.iter().copied().filter(move |&n| n > v).map(move |n| (v, n))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two triangles sharing the 1-2 edge, plus an isolated vertex 4.
    fn quad() -> MeshAdjacency {
        MeshAdjacency::build(&[0, 1, 2, 1, 3, 2], 5).unwrap()
    }

    #[test]
    fn neighbors_are_mutual() {
        let adj = quad();
        assert_eq!(adj.neighbors_of(0), &[1, 2]);
        assert_eq!(adj.neighbors_of(1), &[0, 2, 3]);
        assert_eq!(adj.neighbors_of(2), &[0, 1, 3]);
        assert_eq!(adj.neighbors_of(3), &[1, 2]);
        assert!(adj.neighbors_of(4).is_empty());
        assert!(adj.neighbors_of(99).is_empty());
        assert_eq!(adj.edge_count(), 5);
    }

    #[test]
    fn vertex_faces_recorded() {
        let adj = quad();
        assert_eq!(adj.faces_of(0), &[0]);
        assert_eq!(adj.faces_of(1), &[0, 1]);
        assert_eq!(adj.faces_of(3), &[1]);
    }

    #[test]
    fn edges_listed_once() {
        let adj = quad();
        let edges: Vec<_> = adj.edges().collect();
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(MeshAdjacency::build(&[0, 1], 3).unwrap_err().code(), "invalid_input");
        assert_eq!(MeshAdjacency::build(&[0, 1, 2], 0).unwrap_err().code(), "invalid_input");
        assert_eq!(MeshAdjacency::build(&[0, 1, 5], 3).unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn empty_face_list_is_valid() {
        let adj = MeshAdjacency::build(&[], 3).unwrap();
        assert_eq!(adj.vertex_count(), 3);
        assert_eq!(adj.edge_count(), 0);
    }
}
