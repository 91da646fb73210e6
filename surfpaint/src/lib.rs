//! Per-vertex layer compositing for scalar and categorical maps on triangle
//! meshes, with the multiple-comparison machinery statistical overlays need.
//!
//! A [`LayerStack`] owns an ordered set of [`Layer`]s. Each layer turns its
//! data into a dense `4 * vertex_count` RGBA buffer; the stack folds the
//! visible buffers over an opaque base colour using per-layer blend modes.

pub mod error;
pub mod model;
pub mod geometry {
    pub mod adjacency;
    pub mod limits;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod clusters;
    pub mod stats;
}
pub mod blend;
pub mod colormap;
pub mod colormap2d;
pub mod layers;
pub mod options;
pub mod stack;
mod json;

pub use algorithms::clusters::{cluster_summaries, filter_clusters_by_size, find_clusters, ClusterResult, ClusterSummary};
pub use algorithms::stats::{bonferroni_threshold, fdr_threshold, p_to_z, t_to_z, z_to_p, Correction};
pub use colormap::{ColorMap, ColorMapRegistry, PaletteSpec};
pub use colormap2d::ColorMap2D;
pub use error::{PaintError, PaintResult};
pub use geometry::adjacency::MeshAdjacency;
pub use layers::{
    BaseLayer, CorrectionState, DataLayer, DualThreshold, LabelLayer, Layer, LayerUpdate, OutlineLayer, RgbaLayer,
    StatMapLayer, TwoDataLayer, VertexProbe,
};
pub use model::{BlendMode, CorrectionMethod, LabelEntry, LayerKind, Rgba, StatType};
pub use options::{
    label_table, ColorMap2DOptions, ColorMapOptions, DualThresholdOptions, LabelTableEntry, LayerOptions, StackOptions,
    StatMapOptions,
};
pub use stack::LayerStack;
