use std::sync::Arc;
use surfpaint::{ColorMapRegistry, LayerStack, MeshAdjacency, PaintResult, StackOptions};
use wasm_bindgen::prelude::*;

mod api;
mod error;
mod interop;
mod logger;

pub use api::{bonferroni_threshold_res, fdr_threshold_res, p_to_z_res, palette_names, t_to_z_res, z_to_p_js};
pub use logger::{init_logging, set_panic_hook};

/// One mesh surface: its layer stack, the preset palettes and, once supplied, its topology.
#[wasm_bindgen]
pub struct Surface {
    pub(crate) inner: LayerStack,
    pub(crate) registry: ColorMapRegistry,
    pub(crate) adjacency: Option<Arc<MeshAdjacency>>,
}

impl Surface {
    pub fn rs_new(vertex_count: usize, opts: &StackOptions) -> PaintResult<Surface> {
        Ok(Surface { inner: LayerStack::new(vertex_count, opts)?, registry: ColorMapRegistry::builtin(), adjacency: None })
    }
    pub fn stack(&self) -> &LayerStack { &self.inner }
}
