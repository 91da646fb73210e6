use serde::Serialize;
use std::collections::VecDeque;

/// Connected components of active vertices.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResult {
    /// Per vertex; -1 for vertices outside every cluster.
    pub cluster_ids: Vec<i32>,
    /// Vertex count per cluster id.
    pub cluster_sizes: Vec<usize>,
    pub cluster_count: usize,
}

impl ClusterResult {
    pub fn cluster_of(&self, v: u32) -> Option<usize> {
        match self.cluster_ids.get(v as usize) {
            Some(&id) if id >= 0 => Some(id as usize),
            _ => None,
        }
    }

    pub fn largest(&self) -> Option<(usize, usize)> {
        self.cluster_sizes
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
    }
}

/// Breadth-first flood fill over `active_mask[v] == 1`.
///
/// Cluster ids follow the order of each component's lowest vertex. Neighbours
/// outside the mask are ignored. O(V + E).
pub fn find_clusters(active_mask: &[u8], neighbors: &[Vec<u32>]) -> ClusterResult {
    let n = active_mask.len();
    let mut cluster_ids = vec![-1i32; n];
    let mut cluster_sizes = Vec::new();
    let mut queue = VecDeque::new();

    for seed in 0..n {
        if active_mask[seed] != 1 || cluster_ids[seed] >= 0 {
            continue;
        }
        let id = cluster_sizes.len() as i32;
        cluster_ids[seed] = id;
        queue.push_back(seed);
        let mut size = 0usize;

        while let Some(v) = queue.pop_front() {
            size += 1;
            let Some(ns) = neighbors.get(v) else { continue };
            for &nb in ns {
                let nb = nb as usize;
                if nb < n && active_mask[nb] == 1 && cluster_ids[nb] < 0 {
                    cluster_ids[nb] = id;
                    queue.push_back(nb);
                }
            }
        }
        cluster_sizes.push(size);
    }

    let cluster_count = cluster_sizes.len();
    ClusterResult { cluster_ids, cluster_sizes, cluster_count }
}

/// 1 where the vertex belongs to a cluster of at least `min_size` vertices.
pub fn filter_clusters_by_size(cluster_ids: &[i32], cluster_sizes: &[usize], min_size: usize) -> Vec<u8> {
    cluster_ids
        .iter()
        .map(|&id| {
            let keep = id >= 0 && cluster_sizes.get(id as usize).is_some_and(|&s| s >= min_size);
            keep as u8
        })
        .collect()
}

/// Extent and peak of one cluster, for inspection panels.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub id: usize,
    pub size: usize,
    pub peak_vertex: u32,
    pub peak_value: f32,
}

/// Per-cluster size and peak (largest |value|), given one value per vertex.
/// Non-finite values never become a peak.
pub fn cluster_summaries(result: &ClusterResult, vertex_values: &[f32]) -> Vec<ClusterSummary> {
    let mut out: Vec<ClusterSummary> = result
        .cluster_sizes
        .iter()
        .enumerate()
        .map(|(id, &size)| ClusterSummary { id, size, peak_vertex: 0, peak_value: f32::NAN })
        .collect();
    for (v, &id) in result.cluster_ids.iter().enumerate() {
        if id < 0 {
            continue;
        }
        let Some(&val) = vertex_values.get(v) else { continue };
        if !val.is_finite() {
            continue;
        }
        let s = &mut out[id as usize];
        if s.peak_value.is_nan() || val.abs() > s.peak_value.abs() {
            s.peak_value = val;
            s.peak_vertex = v as u32;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::adjacency::MeshAdjacency;

    // 0-1-2 triangle, 2-4 via a second triangle (2, 3, 4) with 3 inactive.
    fn mesh() -> MeshAdjacency {
        MeshAdjacency::build(&[0, 1, 2, 2, 3, 4], 5).unwrap()
    }

    #[test]
    fn connected_active_vertices_share_a_cluster() {
        let adj = mesh();
        let r = find_clusters(&[1, 1, 1, 0, 1], adj.neighbors());
        assert_eq!(r.cluster_count, 1);
        assert_eq!(r.cluster_sizes, vec![4]);
        assert_eq!(r.cluster_ids, vec![0, 0, 0, -1, 0]);

        assert_eq!(filter_clusters_by_size(&r.cluster_ids, &r.cluster_sizes, 2), vec![1, 1, 1, 0, 1]);
        assert_eq!(filter_clusters_by_size(&r.cluster_ids, &r.cluster_sizes, 5), vec![0; 5]);
    }

    #[test]
    fn inactive_bridge_splits_clusters() {
        let adj = mesh();
        let r = find_clusters(&[1, 1, 0, 0, 1], adj.neighbors());
        assert_eq!(r.cluster_count, 2);
        assert_eq!(r.cluster_ids, vec![0, 0, -1, -1, 1]);
        assert_eq!(r.cluster_sizes, vec![2, 1]);
        assert_eq!(r.largest(), Some((0, 2)));
        assert_eq!(r.cluster_of(4), Some(1));
        assert_eq!(r.cluster_of(3), None);
    }

    #[test]
    fn empty_mask_has_no_clusters() {
        let adj = mesh();
        let r = find_clusters(&[0; 5], adj.neighbors());
        assert_eq!(r.cluster_count, 0);
        assert!(r.largest().is_none());
        assert!(r.cluster_ids.iter().all(|&id| id == -1));
    }

    #[test]
    fn summaries_track_peak_magnitude() {
        let adj = mesh();
        let r = find_clusters(&[1, 1, 0, 0, 1], adj.neighbors());
        let s = cluster_summaries(&r, &[2.0, -5.0, 9.0, 9.0, f32::NAN]);
        assert_eq!(s[0].size, 2);
        assert_eq!(s[0].peak_vertex, 1);
        assert_eq!(s[0].peak_value, -5.0);
        assert!(s[1].peak_value.is_nan());
    }
}
