use crate::blend::{blend_buffer, seed};
use crate::error::{PaintError, PaintResult};
use crate::geometry::limits::{vertex_count_ok, MAX_VERTICES};
use crate::json;
use crate::layers::{Layer, LayerUpdate};
use crate::options::StackOptions;
use serde_json::Value;

/// Ordered collection of layers composited into one per-vertex RGBA buffer.
///
/// Layers keep their insertion order; compositing walks them by ascending
/// `order`, ties broken by insertion.
#[derive(Clone, Debug)]
pub struct LayerStack {
    vertex_count: usize,
    base_color: [f32; 3],
    layers: Vec<Layer>,
    composite: Vec<f32>,
    needs_composite: bool,
}

impl LayerStack {
    pub fn new(vertex_count: usize, opts: &StackOptions) -> PaintResult<Self> {
        if !vertex_count_ok(vertex_count) {
            return Err(PaintError::input(format!(
                "vertex count must be in 1..={}, got {}",
                MAX_VERTICES, vertex_count
            )));
        }
        if !opts.base_color.iter().all(|c| (0.0..=1.0).contains(c)) {
            return Err(PaintError::input("base colour has a channel outside [0, 1]"));
        }
        Ok(LayerStack {
            vertex_count,
            base_color: opts.base_color,
            layers: Vec::new(),
            composite: Vec::new(),
            needs_composite: true,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn base_color(&self) -> [f32; 3] {
        self.base_color
    }

    pub fn set_base_color(&mut self, color: [f32; 3]) -> PaintResult<()> {
        if !color.iter().all(|c| (0.0..=1.0).contains(c)) {
            return Err(PaintError::input("base colour has a channel outside [0, 1]"));
        }
        self.base_color = color;
        self.needs_composite = true;
        Ok(())
    }

    pub fn needs_composite(&self) -> bool {
        self.needs_composite
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id() == id)
    }

    pub fn add_layer(&mut self, layer: Layer) -> PaintResult<()> {
        if self.contains(layer.id()) {
            return Err(PaintError::input(format!("layer '{}' already exists", layer.id())));
        }
        log::debug!("stack: add {} layer '{}' at order {}", layer.kind().as_str(), layer.id(), layer.order());
        self.layers.push(layer);
        self.needs_composite = true;
        Ok(())
    }

    pub fn remove_layer(&mut self, id: &str) -> Option<Layer> {
        let idx = self.layers.iter().position(|l| l.id() == id)?;
        self.needs_composite = true;
        Some(self.layers.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    /// Mutable access; the stack assumes the layer changed and recomposites.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        let layer = self.layers.iter_mut().find(|l| l.id() == id)?;
        self.needs_composite = true;
        Some(layer)
    }

    /// Run a fallible edit on one layer. The stack is marked dirty only when the
    /// edit succeeds; `None` when no layer has this id.
    pub fn edit_layer<R, E>(&mut self, id: &str, edit: impl FnOnce(&mut Layer) -> Result<R, E>) -> Option<Result<R, E>> {
        let layer = self.layers.iter_mut().find(|l| l.id() == id)?;
        let r = edit(layer);
        if r.is_ok() {
            self.needs_composite = true;
        }
        Some(r)
    }

    /// One layer's RGBA buffer. Refreshing the layer's own cache leaves the composite clean.
    pub fn layer_rgba(&mut self, id: &str) -> Option<&[f32]> {
        let n = self.vertex_count;
        let layer = self.layers.iter_mut().find(|l| l.id() == id)?;
        Some(layer.rgba(n))
    }

    /// Apply a property patch; only a visible change marks the stack dirty.
    pub fn update_layer(&mut self, id: &str, patch: &LayerUpdate) -> PaintResult<bool> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or_else(|| PaintError::input(format!("no layer '{}'", id)))?;
        let changed = layer.update(patch)?;
        if changed {
            self.needs_composite = true;
        }
        Ok(changed)
    }

    /// Layers in insertion order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Mutable walk over every layer; marks the stack for recomposite.
    pub fn layers_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.needs_composite = true;
        self.layers.iter_mut()
    }

    fn sorted_indices(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.layers.len()).collect();
        // stable: equal orders keep insertion order
        idx.sort_by_key(|&i| self.layers[i].order());
        idx
    }

    /// Layer ids in composite order (all layers, visible or not).
    pub fn composite_order(&self) -> Vec<&str> {
        self.sorted_indices().into_iter().map(|i| self.layers[i].id()).collect()
    }

    fn any_layer_stale(&self) -> bool {
        let n = self.vertex_count;
        self.layers.iter().any(|l| l.visible() && l.is_compositing() && l.is_stale(n))
    }

    /// Current composite, rebuilt only when something changed since the last pass.
    ///
    /// The returned slice is overwritten by the next rebuild.
    pub fn composite(&mut self) -> &[f32] {
        let n = self.vertex_count;
        if self.needs_composite || self.composite.len() != 4 * n || self.any_layer_stale() {
            let mut out = std::mem::take(&mut self.composite);
            out.clear();
            out.resize(4 * n, 0.0);
            seed(&mut out, self.base_color);

            let mut drawn = 0usize;
            for i in self.sorted_indices() {
                let layer = &mut self.layers[i];
                if !layer.visible() || !layer.is_compositing() {
                    continue;
                }
                let mode = layer.blend_mode();
                blend_buffer(&mut out, layer.rgba(n), mode);
                drawn += 1;
            }
            log::debug!("stack: composited {} of {} layers over {} vertices", drawn, self.layers.len(), n);

            self.composite = out;
            self.needs_composite = false;
        }
        &self.composite
    }

    /// Summary of each layer in composite order, for host-side layer panels.
    pub fn describe(&self) -> Value {
        json::describe_impl(self, &self.sorted_indices())
    }
}
