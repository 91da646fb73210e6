//! Statistical map layer: a data layer gated by multiple-comparison correction.
//!
//! A vertex is drawn only when it survives the active correction and is not
//! inside the primary colormap's hide zone. FDR and Bonferroni masks are keyed
//! by data index; the cluster mask is keyed by destination vertex. At most one
//! correction is active, and replacing the data drops it.

use super::{put, LayerProps, Scratch, VertexField};
use crate::algorithms::clusters::{cluster_summaries, filter_clusters_by_size, find_clusters, ClusterResult, ClusterSummary};
use crate::algorithms::stats::{bonferroni_threshold, fdr_threshold, p_to_z, t_to_z, Correction};
use crate::colormap::ColorMap;
use crate::error::{PaintError, PaintResult};
use crate::geometry::adjacency::MeshAdjacency;
use crate::model::{CorrectionMethod, Rgba, StatType, TRANSPARENT};
use crate::options::{LayerOptions, StatMapOptions};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum CorrectionState {
    #[default]
    None,
    Fdr { q: f64, result: Correction },
    Bonferroni { alpha: f64, result: Correction },
    Cluster { threshold: f32, min_cluster_size: usize, clusters: ClusterResult, mask: Vec<u8> },
}

impl CorrectionState {
    pub fn method(&self) -> CorrectionMethod {
        match self {
            CorrectionState::None => CorrectionMethod::None,
            CorrectionState::Fdr { .. } => CorrectionMethod::Fdr,
            CorrectionState::Bonferroni { .. } => CorrectionMethod::Bonferroni,
            CorrectionState::Cluster { .. } => CorrectionMethod::Cluster,
        }
    }

    /// Survival of data point `i` landing on vertex `v`.
    #[inline]
    fn passes(&self, i: usize, v: usize) -> bool {
        match self {
            CorrectionState::None => true,
            CorrectionState::Fdr { result, .. } | CorrectionState::Bonferroni { result, .. } => {
                result.mask.get(i) == Some(&1)
            }
            CorrectionState::Cluster { mask, .. } => mask.get(v) == Some(&1),
        }
    }
}

/// Positive and negative colormaps used when colouring is routed by sign.
#[derive(Clone, Debug, PartialEq)]
pub struct DualThreshold {
    pub positive: ColorMap,
    pub negative: ColorMap,
}

impl DualThreshold {
    /// Colour for `value`; zero and the gap between the two ranges are transparent.
    pub fn color(&self, value: f32) -> Rgba {
        if value > 0.0 {
            if value < self.positive.range()[0] {
                return TRANSPARENT;
            }
            self.positive.color(value)
        } else if value < 0.0 {
            if value > self.negative.range()[1] {
                return TRANSPARENT;
            }
            self.negative.color(value)
        } else {
            TRANSPARENT
        }
    }

    fn version(&self) -> u64 {
        self.positive.version().wrapping_add(self.negative.version())
    }
}

/// What a tooltip shows for one vertex.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexProbe {
    pub vertex: u32,
    pub value: f32,
    pub p_value: Option<f64>,
    pub z: Option<f64>,
    pub cluster: Option<usize>,
    pub survives: bool,
}

#[derive(Clone, Debug)]
pub struct StatMapLayer {
    pub(crate) props: LayerProps,
    field: VertexField<f32>,
    colormap: ColorMap,
    p_values: Option<Vec<f64>>,
    stat_type: StatType,
    dof: Option<f64>,
    correction: CorrectionState,
    adjacency: Option<Arc<MeshAdjacency>>,
    dual: Option<DualThreshold>,
    scratch: Scratch,
}

impl StatMapLayer {
    pub fn new(
        id: impl Into<String>,
        data: Vec<f32>,
        indices: Option<Vec<u32>>,
        p_values: Option<Vec<f64>>,
        colormap: ColorMap,
        stat: &StatMapOptions,
        opts: &LayerOptions,
    ) -> PaintResult<Self> {
        let props = LayerProps::new(id, opts)?;
        check_p_values(p_values.as_deref(), data.len())?;
        if let Some(df) = stat.degrees_of_freedom {
            check_dof(df)?;
        }
        Ok(StatMapLayer {
            props,
            field: VertexField::new(data, indices)?,
            colormap,
            p_values,
            stat_type: stat.stat_type,
            dof: stat.degrees_of_freedom,
            correction: CorrectionState::None,
            adjacency: None,
            dual: None,
            scratch: Scratch::default(),
        })
    }

    pub fn field(&self) -> &VertexField<f32> { &self.field }
    pub fn p_values(&self) -> Option<&[f64]> { self.p_values.as_deref() }
    pub fn stat_type(&self) -> StatType { self.stat_type }
    pub fn degrees_of_freedom(&self) -> Option<f64> { self.dof }
    pub fn correction(&self) -> &CorrectionState { &self.correction }
    pub fn correction_method(&self) -> CorrectionMethod { self.correction.method() }
    pub fn dual_threshold(&self) -> Option<&DualThreshold> { self.dual.as_ref() }
    pub fn colormap(&self) -> &ColorMap { &self.colormap }

    pub fn colormap_mut(&mut self) -> &mut ColorMap {
        &mut self.colormap
    }

    pub fn set_range(&mut self, min: f32, max: f32) -> PaintResult<()> {
        self.colormap.set_range(min, max)
    }

    pub fn set_threshold(&mut self, lo: f32, hi: f32) -> PaintResult<()> {
        self.colormap.set_threshold(lo, hi)
    }

    /// Replace the scalar data (and optionally p-values); any active correction is dropped.
    pub fn set_data(&mut self, data: Vec<f32>, indices: Option<Vec<u32>>, p_values: Option<Vec<f64>>) -> PaintResult<()> {
        check_p_values(p_values.as_deref(), data.len())?;
        self.field = VertexField::new(data, indices)?;
        self.p_values = p_values;
        if self.correction != CorrectionState::None {
            log::debug!("stat map '{}': data replaced, clearing {:?} correction", self.props.id, self.correction.method());
        }
        self.correction = CorrectionState::None;
        self.props.needs_update = true;
        Ok(())
    }

    /// Attach mesh adjacency. An active cluster correction is recomputed on the new topology.
    pub fn set_mesh_adjacency(&mut self, adjacency: Arc<MeshAdjacency>) {
        self.adjacency = Some(adjacency);
        if let CorrectionState::Cluster { threshold, min_cluster_size, .. } = self.correction {
            if let Err(e) = self.apply_cluster_threshold(threshold, min_cluster_size) {
                log::debug!("stat map '{}': dropping cluster correction after mesh change: {}", self.props.id, e);
                self.correction = CorrectionState::None;
            }
            self.props.needs_update = true;
        }
    }

    pub fn apply_fdr(&mut self, q: f64) -> PaintResult<()> {
        let p = self.p_values.as_deref().ok_or(PaintError::MissingPrerequisite("FDR correction needs p-values"))?;
        let result = fdr_threshold(p, q)?;
        self.correction = CorrectionState::Fdr { q, result };
        self.props.needs_update = true;
        Ok(())
    }

    pub fn apply_bonferroni(&mut self, alpha: f64) -> PaintResult<()> {
        let p = self
            .p_values
            .as_deref()
            .ok_or(PaintError::MissingPrerequisite("Bonferroni correction needs p-values"))?;
        let result = bonferroni_threshold(p, alpha)?;
        self.correction = CorrectionState::Bonferroni { alpha, result };
        self.props.needs_update = true;
        Ok(())
    }

    /// Keep only connected groups of `|value| > threshold` vertices with at
    /// least `min_cluster_size` members.
    pub fn apply_cluster_threshold(&mut self, threshold: f32, min_cluster_size: usize) -> PaintResult<()> {
        let adjacency =
            self.adjacency.as_ref().ok_or(PaintError::MissingPrerequisite("cluster thresholding needs mesh adjacency"))?;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(PaintError::param("threshold", format!("must be finite and >= 0, got {}", threshold)));
        }
        let n = adjacency.vertex_count();
        let mut active = vec![0u8; n];
        for (_, v, value) in self.field.points(n) {
            if value.is_finite() && value.abs() > threshold {
                active[v] = 1;
            }
        }
        let clusters = find_clusters(&active, adjacency.neighbors());
        let mask = filter_clusters_by_size(&clusters.cluster_ids, &clusters.cluster_sizes, min_cluster_size);
        log::debug!(
            "stat map '{}': {} clusters above |{}|, {} vertices kept at size >= {}",
            self.props.id,
            clusters.cluster_count,
            threshold,
            mask.iter().filter(|&&m| m == 1).count(),
            min_cluster_size
        );
        self.correction = CorrectionState::Cluster { threshold, min_cluster_size, clusters, mask };
        self.props.needs_update = true;
        Ok(())
    }

    pub fn cluster_result(&self) -> Option<&ClusterResult> {
        match &self.correction {
            CorrectionState::Cluster { clusters, .. } => Some(clusters),
            _ => None,
        }
    }

    /// Size and peak value of every cluster found by the active cluster correction.
    pub fn cluster_summaries(&self) -> Option<Vec<ClusterSummary>> {
        let clusters = self.cluster_result()?;
        let n = clusters.cluster_ids.len();
        let mut values = vec![f32::NAN; n];
        for (_, v, value) in self.field.points(n) {
            values[v] = value;
        }
        Some(cluster_summaries(clusters, &values))
    }

    /// Threshold and per-data-point mask of an active FDR or Bonferroni correction.
    pub fn p_correction(&self) -> Option<&Correction> {
        match &self.correction {
            CorrectionState::Fdr { result, .. } | CorrectionState::Bonferroni { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Active survival mask: per data point for FDR/Bonferroni, per vertex for clusters.
    pub fn survival_mask(&self) -> Option<&[u8]> {
        match &self.correction {
            CorrectionState::None => None,
            CorrectionState::Fdr { result, .. } | CorrectionState::Bonferroni { result, .. } => Some(&result.mask),
            CorrectionState::Cluster { mask, .. } => Some(mask),
        }
    }

    pub fn clear_correction(&mut self) {
        if self.correction != CorrectionState::None {
            self.correction = CorrectionState::None;
            self.props.needs_update = true;
        }
    }

    pub fn set_dual_threshold(&mut self, positive: ColorMap, negative: ColorMap) -> PaintResult<()> {
        if positive.range()[0] < 0.0 {
            return Err(PaintError::param("positive.range", "must not extend below zero"));
        }
        if negative.range()[1] > 0.0 {
            return Err(PaintError::param("negative.range", "must not extend above zero"));
        }
        self.dual = Some(DualThreshold { positive, negative });
        self.props.needs_update = true;
        Ok(())
    }

    pub fn clear_dual_threshold(&mut self) {
        if self.dual.take().is_some() {
            self.props.needs_update = true;
        }
    }

    /// Whether data point `i` on vertex `v` survives correction and the hide zone.
    pub fn survives(&self, i: usize, v: usize) -> bool {
        match self.field.values().get(i) {
            Some(&value) => value.is_finite() && self.correction.passes(i, v) && !self.colormap.hides(value),
            None => false,
        }
    }

    fn color_for(&self, value: f32) -> Rgba {
        match &self.dual {
            Some(dual) => dual.color(value),
            None => self.colormap.color(value),
        }
    }

    /// z-equivalent of data point `i` according to the statistic type.
    pub fn z_score(&self, i: usize) -> Option<f64> {
        let value = *self.field.values().get(i)? as f64;
        if !value.is_finite() {
            return None;
        }
        match self.stat_type {
            StatType::Z => Some(value),
            StatType::T => t_to_z(value, self.dof?).ok(),
            StatType::F | StatType::Generic => {
                let p = *self.p_values.as_ref()?.get(i)?;
                p_to_z(p).ok().map(|z| z.copysign(value))
            }
        }
    }

    pub fn probe(&self, vertex: u32) -> Option<VertexProbe> {
        let (i, value) = self.field.at_vertex(vertex)?;
        Some(VertexProbe {
            vertex,
            value,
            p_value: self.p_values.as_ref().and_then(|p| p.get(i).copied()),
            z: self.z_score(i),
            cluster: self.cluster_result().and_then(|c| c.cluster_of(vertex)),
            survives: self.survives(i, vertex as usize),
        })
    }

    fn version(&self) -> u64 {
        let dual = self.dual.as_ref().map_or(0, |d| d.version());
        self.colormap.version().wrapping_add(dual)
    }

    pub fn is_stale(&self, vertex_count: usize) -> bool {
        self.scratch.is_stale(&self.props, vertex_count, self.version())
    }

    pub fn rgba(&mut self, vertex_count: usize) -> &[f32] {
        let version = self.version();
        if self.is_stale(vertex_count) {
            let opacity = self.props.opacity;
            let mut buf = std::mem::take(&mut self.scratch);
            let out = buf.reset(vertex_count);
            for (i, v, value) in self.field.points(vertex_count) {
                if self.survives(i, v) {
                    put(out, v, self.color_for(value), opacity);
                }
            }
            self.scratch = buf;
            self.scratch.finish(&mut self.props, vertex_count, version);
        }
        self.scratch.get()
    }
}

fn check_p_values(p: Option<&[f64]>, n: usize) -> PaintResult<()> {
    match p {
        Some(p) if p.len() != n => Err(PaintError::input(format!("{} p-values for {} data points", p.len(), n))),
        _ => Ok(()),
    }
}

fn check_dof(df: f64) -> PaintResult<()> {
    if df >= 1.0 {
        Ok(())
    } else {
        Err(PaintError::param("degrees_of_freedom", format!("must be >= 1, got {}", df)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(range: [f32; 2]) -> ColorMap {
        ColorMap::new(&[vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]], range).unwrap()
    }

    fn alpha_mask(buf: &[f32]) -> Vec<u8> {
        buf.chunks_exact(4).map(|px| (px[3] > 0.0) as u8).collect()
    }

    fn layer(data: Vec<f32>, p: Option<Vec<f64>>) -> StatMapLayer {
        StatMapLayer::new("stat", data, None, p, ramp([0.0, 5.0]), &StatMapOptions::default(), &LayerOptions::default())
            .unwrap()
    }

    #[test]
    fn fdr_needs_p_values() {
        let mut l = layer(vec![1.0, 2.0], None);
        assert_eq!(l.apply_fdr(0.05).unwrap_err().code(), "missing_prerequisite");
        assert_eq!(l.apply_bonferroni(0.05).unwrap_err().code(), "missing_prerequisite");
        assert_eq!(l.apply_cluster_threshold(1.0, 1).unwrap_err().code(), "missing_prerequisite");
    }

    #[test]
    fn bonferroni_gates_by_data_index() {
        let mut l = layer(vec![4.0, 3.0, 2.0, 1.0], Some(vec![0.001, 0.01, 0.05, 0.1]));
        assert_eq!(alpha_mask(l.rgba(4)), vec![1, 1, 1, 1]);
        l.apply_bonferroni(0.05).unwrap();
        assert_eq!(l.correction_method(), CorrectionMethod::Bonferroni);
        assert_eq!(alpha_mask(l.rgba(4)), vec![1, 1, 0, 0]);
        l.clear_correction();
        assert_eq!(alpha_mask(l.rgba(4)), vec![1, 1, 1, 1]);
    }

    #[test]
    fn switching_methods_replaces_mask() {
        let mut l = layer(vec![4.0, 3.0, 2.0, 1.0], Some(vec![0.001, 0.01, 0.05, 0.1]));
        l.apply_bonferroni(0.05).unwrap();
        assert_eq!(l.survival_mask(), Some(&[1u8, 1, 0, 0][..]));
        l.apply_fdr(0.2).unwrap();
        assert_eq!(l.p_correction().unwrap().mask, vec![1, 1, 1, 1]);
        assert_eq!(l.correction_method(), CorrectionMethod::Fdr);
        assert_eq!(alpha_mask(l.rgba(4)), vec![1, 1, 1, 1]);
    }

    #[test]
    fn failed_correction_leaves_state() {
        let mut l = layer(vec![4.0], Some(vec![0.001]));
        l.apply_bonferroni(0.05).unwrap();
        assert!(l.apply_fdr(2.0).is_err());
        assert_eq!(l.correction_method(), CorrectionMethod::Bonferroni);
    }

    #[test]
    fn new_data_drops_correction() {
        let mut l = layer(vec![4.0, 1.0], Some(vec![0.001, 0.9]));
        l.apply_fdr(0.05).unwrap();
        l.set_data(vec![1.0, 1.0], None, Some(vec![0.5, 0.5])).unwrap();
        assert_eq!(l.correction_method(), CorrectionMethod::None);
        assert!(l.set_data(vec![1.0], None, Some(vec![0.5, 0.5])).is_err());
    }

    #[test]
    fn new_mesh_recomputes_cluster_correction() {
        let mut l = layer(vec![3.0, 3.0, 3.0], None);
        l.set_mesh_adjacency(Arc::new(MeshAdjacency::build(&[0, 1, 2], 3).unwrap()));
        l.apply_cluster_threshold(1.0, 3).unwrap();
        assert_eq!(alpha_mask(l.rgba(3)), vec![1, 1, 1]);

        l.set_mesh_adjacency(Arc::new(MeshAdjacency::build(&[], 3).unwrap()));
        assert_eq!(l.correction_method(), CorrectionMethod::Cluster);
        assert_eq!(l.cluster_result().unwrap().cluster_sizes, vec![1, 1, 1]);
        assert_eq!(alpha_mask(l.rgba(3)), vec![0, 0, 0]);
    }

    #[test]
    fn cluster_threshold_keys_by_vertex() {
        // vertices 0-1-2 form a triangle, 3-4-5 another; 2-3 share no face
        let adj = Arc::new(MeshAdjacency::build(&[0, 1, 2, 3, 4, 5], 6).unwrap());
        let data = vec![3.0, -3.0, 3.0, 3.0, 0.5, 0.5];
        let mut l = StatMapLayer::new(
            "stat",
            data,
            Some(vec![0, 1, 2, 3, 4, 5]),
            None,
            ramp([0.0, 5.0]),
            &StatMapOptions::default(),
            &LayerOptions::default(),
        )
        .unwrap();
        l.set_mesh_adjacency(adj);
        l.apply_cluster_threshold(1.0, 2).unwrap();
        let clusters = l.cluster_result().unwrap().clone();
        assert_eq!(clusters.cluster_count, 2);
        assert_eq!(clusters.cluster_sizes, vec![3, 1]);
        assert_eq!(alpha_mask(l.rgba(6)), vec![1, 1, 1, 0, 0, 0]);
        assert_eq!(l.probe(1).unwrap().cluster, Some(0));
        assert!(!l.probe(3).unwrap().survives);

        let summaries = l.cluster_summaries().unwrap();
        assert_eq!((summaries[0].size, summaries[0].peak_vertex), (3, 0));
        assert_eq!((summaries[1].size, summaries[1].peak_vertex), (1, 3));
        l.clear_correction();
        assert!(l.cluster_summaries().is_none());
    }

    #[test]
    fn dual_threshold_routes_by_sign() {
        let mut l = layer(vec![4.0, -4.0, 0.0, 1.0, -1.0], None);
        let pos = ColorMap::new(&[vec![1.0, 0.0, 0.0]], [2.0, 6.0]).unwrap();
        let neg = ColorMap::new(&[vec![0.0, 0.0, 1.0]], [-6.0, -2.0]).unwrap();
        l.set_dual_threshold(pos, neg).unwrap();
        let buf = l.rgba(5).to_vec();
        assert_eq!(&buf[0..4], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&buf[4..8], &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(alpha_mask(&buf), vec![1, 1, 0, 0, 0]);
        l.clear_dual_threshold();
        assert_eq!(alpha_mask(l.rgba(5)), vec![1, 1, 1, 1, 1]);
    }

    #[test]
    fn hide_zone_applies_before_colour() {
        let mut l = layer(vec![0.5, 3.0], Some(vec![0.001, 0.001]));
        l.set_threshold(-1.0, 1.0).unwrap();
        l.apply_bonferroni(0.05).unwrap();
        assert_eq!(alpha_mask(l.rgba(2)), vec![0, 1]);
        l.clear_correction();
        assert_eq!(alpha_mask(l.rgba(2)), vec![0, 1]);
    }

    #[test]
    fn z_scores_follow_stat_type() {
        let stat = StatMapOptions { stat_type: StatType::T, degrees_of_freedom: Some(40.0) };
        let l = StatMapLayer::new("t", vec![-2.021], None, None, ramp([0.0, 5.0]), &stat, &LayerOptions::default())
            .unwrap();
        let z = l.z_score(0).unwrap();
        assert!(z < 0.0 && (z + 1.96).abs() < 0.05);

        let g = layer(vec![-1.0], Some(vec![0.05]));
        assert!((g.z_score(0).unwrap() + 1.96).abs() < 1e-3);
    }
}
