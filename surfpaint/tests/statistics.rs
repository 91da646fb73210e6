use surfpaint::{
    bonferroni_threshold, cluster_summaries, fdr_threshold, filter_clusters_by_size, find_clusters, p_to_z, t_to_z,
    z_to_p, ColorMap, LayerOptions, MeshAdjacency, StatMapLayer, StatMapOptions, StatType,
};
use std::sync::Arc;

const PS: [f64; 10] = [0.001, 0.004, 0.008, 0.010, 0.15, 0.20, 0.30, 0.50, 0.70, 0.90];

#[test]
fn fdr_example() {
    let c = fdr_threshold(&PS, 0.05).unwrap();
    assert_eq!(c.mask, vec![1, 1, 1, 1, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn bonferroni_example() {
    let c = bonferroni_threshold(&[0.001, 0.01, 0.05, 0.1], 0.05).unwrap();
    assert_eq!(c.threshold, 0.05 / 4.0);
    assert_eq!(c.mask, vec![1, 1, 0, 0]);
}

#[test]
fn domain_errors_are_invalid_parameter() {
    for q in [0.0, -0.1, 1.5, f64::NAN] {
        assert_eq!(fdr_threshold(&PS, q).unwrap_err().code(), "invalid_parameter");
        assert_eq!(bonferroni_threshold(&PS, q).unwrap_err().code(), "invalid_parameter");
    }
    assert_eq!(t_to_z(2.0, 0.5).unwrap_err().code(), "invalid_parameter");
    assert!(p_to_z(1.5).is_err());
}

#[test]
fn five_vertex_cluster_example() {
    let adj = MeshAdjacency::build(&[0, 1, 2, 2, 3, 4], 5).unwrap();
    let r = find_clusters(&[1, 1, 1, 0, 1], adj.neighbors());
    assert_eq!(r.cluster_count, 1);
    assert_eq!(r.cluster_ids, vec![0, 0, 0, -1, 0]);
    assert_eq!(r.cluster_sizes, vec![4]);
    assert_eq!(filter_clusters_by_size(&r.cluster_ids, &r.cluster_sizes, 2), vec![1, 1, 1, 0, 1]);
    assert_eq!(filter_clusters_by_size(&r.cluster_ids, &r.cluster_sizes, 5), vec![0, 0, 0, 0, 0]);

    let summary = cluster_summaries(&r, &[1.0, -6.0, 2.0, 9.0, 3.0]);
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].peak_vertex, 1);
    assert_eq!(summary[0].peak_value, -6.0);
}

#[test]
fn conversions() {
    assert!((p_to_z(0.05).unwrap() - 1.96).abs() < 1e-2);
    assert_eq!(p_to_z(1.0).unwrap(), 0.0);
    assert!((z_to_p(1.96) - 0.05).abs() < 1e-3);
    assert!(t_to_z(-3.0, 10.0).unwrap() < 0.0);
    assert!(t_to_z(3.0, 100.0).unwrap() > 0.0);
}

fn visible(buf: &[f32]) -> Vec<bool> {
    buf.chunks_exact(4).map(|px| px[3] > 0.0).collect()
}

fn stat_layer() -> StatMapLayer {
    let cm = ColorMap::new(&[vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0]], [-5.0, 5.0]).unwrap();
    let stat = StatMapOptions { stat_type: StatType::T, degrees_of_freedom: Some(20.0) };
    let mut l = StatMapLayer::new(
        "tmap",
        vec![4.0, -4.5, 0.5, 3.0, -1.0],
        None,
        Some(vec![0.0007, 0.0002, 0.62, 0.007, 0.33]),
        cm,
        &stat,
        &LayerOptions::default(),
    )
    .unwrap();
    l.set_threshold(-1.0, 1.0).unwrap();
    l
}

#[test]
fn clearing_any_correction_restores_hide_zone_visibility() {
    let mut l = stat_layer();
    let baseline = l.rgba(5).to_vec();
    assert_eq!(visible(&baseline), vec![true, true, false, true, false]);

    l.apply_fdr(0.01).unwrap();
    l.clear_correction();
    assert_eq!(l.rgba(5), baseline.as_slice());

    l.apply_bonferroni(0.001).unwrap();
    assert_eq!(visible(l.rgba(5)), vec![false, true, false, false, false]);
    l.clear_correction();
    assert_eq!(l.rgba(5), baseline.as_slice());

    l.set_mesh_adjacency(Arc::new(MeshAdjacency::build(&[0, 1, 2, 2, 3, 4], 5).unwrap()));
    l.apply_cluster_threshold(2.0, 3).unwrap();
    assert_eq!(visible(l.rgba(5)), vec![false; 5]);
    l.clear_correction();
    assert_eq!(l.rgba(5), baseline.as_slice());
}

#[test]
fn cluster_threshold_keeps_large_components() {
    let mut l = stat_layer();
    assert_eq!(l.apply_cluster_threshold(2.0, 1).unwrap_err().code(), "missing_prerequisite");
    l.set_mesh_adjacency(Arc::new(MeshAdjacency::build(&[0, 1, 2, 2, 3, 4], 5).unwrap()));
    l.apply_cluster_threshold(2.0, 2).unwrap();
    let clusters = l.cluster_result().unwrap();
    assert_eq!(clusters.cluster_ids, vec![0, 0, -1, 1, -1]);
    assert_eq!(visible(l.rgba(5)), vec![true, true, false, false, false]);

    let probe = l.probe(0).unwrap();
    assert_eq!(probe.cluster, Some(0));
    assert!(probe.survives);
    assert!(probe.z.unwrap() > 0.0);
    assert!(!l.probe(3).unwrap().survives);
}

#[test]
fn dual_threshold_routes_by_sign() {
    let mut l = stat_layer();
    l.set_threshold(0.0, 0.0).unwrap();
    let pos = ColorMap::new(&[vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]], [3.5, 5.0]).unwrap();
    let neg = ColorMap::new(&[vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 1.0]], [-5.0, -2.0]).unwrap();
    l.set_dual_threshold(pos.clone(), neg.clone()).unwrap();
    let buf = l.rgba(5).to_vec();
    assert_eq!(&buf[0..4], &pos.color(4.0));
    assert_eq!(&buf[4..8], &neg.color(-4.5));
    assert_eq!(visible(&buf), vec![true, true, false, false, false]);
    assert!(l.set_dual_threshold(neg, pos).is_err());
}
