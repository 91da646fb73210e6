use crate::error::{self, paint};
use crate::interop::{arr_f32, arr_u32, arr_u8, from_js, new_obj, set_kv, to_js};
use crate::Surface;
use js_sys::{Float32Array, Float64Array, Int32Array, Uint32Array};
use serde_json::json;
use std::sync::Arc;
use surfpaint::{
    bonferroni_threshold, fdr_threshold, label_table, p_to_z, t_to_z, z_to_p, BaseLayer, ColorMap2DOptions,
    ColorMapOptions, DataLayer, DualThresholdOptions, LabelLayer, LabelTableEntry, Layer, LayerKind, LayerOptions,
    LayerUpdate, MeshAdjacency, OutlineLayer, PaintResult, RgbaLayer, StackOptions, StatMapLayer, StatMapOptions,
    TwoDataLayer,
};
use wasm_bindgen::prelude::*;

type Res = Result<JsValue, JsValue>;

fn finish(r: Res) -> JsValue {
    match r {
        Ok(v) => error::ok(v),
        Err(e) => e,
    }
}

fn finite(param: &str, v: f64) -> Result<(), JsValue> {
    if v.is_finite() { Ok(()) } else { Err(error::non_finite(param)) }
}

fn indices_vec(indices: Option<Uint32Array>) -> Option<Vec<u32>> {
    indices.map(|a| a.to_vec())
}

#[wasm_bindgen]
pub fn palette_names() -> JsValue {
    let reg = surfpaint::ColorMapRegistry::builtin();
    to_js(&reg.names().collect::<Vec<_>>())
}

#[wasm_bindgen]
pub fn p_to_z_res(p: f64) -> JsValue {
    match p_to_z(p) {
        Ok(z) => error::ok(JsValue::from_f64(z)),
        Err(e) => paint(e),
    }
}

#[wasm_bindgen(js_name = zToP)]
pub fn z_to_p_js(z: f64) -> f64 {
    z_to_p(z)
}

#[wasm_bindgen]
pub fn t_to_z_res(t: f64, df: f64) -> JsValue {
    match t_to_z(t, df) {
        Ok(z) => error::ok(JsValue::from_f64(z)),
        Err(e) => paint(e),
    }
}

#[wasm_bindgen]
pub fn fdr_threshold_res(p_values: &Float64Array, q: f64) -> JsValue {
    match fdr_threshold(&p_values.to_vec(), q) {
        Ok(c) => error::ok(to_js(&c)),
        Err(e) => paint(e),
    }
}

#[wasm_bindgen]
pub fn bonferroni_threshold_res(p_values: &Float64Array, alpha: f64) -> JsValue {
    match bonferroni_threshold(&p_values.to_vec(), alpha) {
        Ok(c) => error::ok(to_js(&c)),
        Err(e) => paint(e),
    }
}

#[wasm_bindgen]
impl Surface {
    #[wasm_bindgen(constructor)]
    pub fn new(vertex_count: u32, options: JsValue) -> Result<Surface, JsValue> {
        let opts: StackOptions = from_js(options, "stack options")?;
        Surface::rs_new(vertex_count as usize, &opts).map_err(paint)
    }

    pub fn vertex_count(&self) -> u32 {
        self.inner.vertex_count() as u32
    }
    pub fn layer_count(&self) -> u32 {
        self.inner.len() as u32
    }
    pub fn has_mesh(&self) -> bool {
        self.adjacency.is_some()
    }
    pub fn needs_composite(&self) -> bool {
        self.inner.needs_composite()
    }

    pub fn set_base_color_res(&mut self, r: f32, g: f32, b: f32) -> JsValue {
        match self.inner.set_base_color([r, g, b]) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => paint(e),
        }
    }

    // Mesh topology
    pub fn set_mesh_res(&mut self, faces: &Uint32Array) -> JsValue {
        finish(self.set_mesh_impl(&faces.to_vec()))
    }

    // Layer construction
    pub fn add_base_layer_res(&mut self, id: &str, r: f32, g: f32, b: f32, a: f32, options: JsValue) -> JsValue {
        finish(self.add_base_impl(id, [r, g, b, a], options))
    }
    pub fn add_rgba_layer_res(&mut self, id: &str, data: &Float32Array, options: JsValue) -> JsValue {
        finish(self.add_rgba_impl(id, data.to_vec(), options))
    }
    pub fn add_data_layer_res(
        &mut self,
        id: &str,
        data: &Float32Array,
        indices: Option<Uint32Array>,
        colormap: JsValue,
        options: JsValue,
    ) -> JsValue {
        finish(self.add_data_impl(id, data.to_vec(), indices_vec(indices), colormap, options))
    }
    pub fn add_two_data_layer_res(
        &mut self,
        id: &str,
        x: &Float32Array,
        y: &Float32Array,
        indices: Option<Uint32Array>,
        colormap: JsValue,
        options: JsValue,
    ) -> JsValue {
        finish(self.add_two_data_impl(id, x.to_vec(), y.to_vec(), indices_vec(indices), colormap, options))
    }
    pub fn add_label_layer_res(
        &mut self,
        id: &str,
        labels: &Int32Array,
        indices: Option<Uint32Array>,
        table: JsValue,
        options: JsValue,
    ) -> JsValue {
        finish(self.add_label_impl(id, labels.to_vec(), indices_vec(indices), table, options))
    }
    #[allow(clippy::too_many_arguments)]
    pub fn add_stat_map_layer_res(
        &mut self,
        id: &str,
        data: &Float32Array,
        indices: Option<Uint32Array>,
        p_values: Option<Float64Array>,
        colormap: JsValue,
        stat: JsValue,
        options: JsValue,
    ) -> JsValue {
        let p = p_values.map(|a| a.to_vec());
        finish(self.add_stat_map_impl(id, data.to_vec(), indices_vec(indices), p, colormap, stat, options))
    }
    #[allow(clippy::too_many_arguments)]
    pub fn add_outline_layer_res(
        &mut self,
        id: &str,
        labels: &Int32Array,
        r: f32,
        g: f32,
        b: f32,
        a: f32,
        width: f32,
        options: JsValue,
    ) -> JsValue {
        finish(self.add_outline_impl(id, labels.to_vec(), [r, g, b, a], width, options))
    }

    pub fn remove_layer_res(&mut self, id: &str) -> JsValue {
        match self.inner.remove_layer(id) {
            Some(_) => error::ok(JsValue::TRUE),
            None => error::invalid_id("layer", id),
        }
    }
    pub fn update_layer_res(&mut self, id: &str, patch: JsValue) -> JsValue {
        finish(self.update_impl(id, patch))
    }

    // Layer content
    pub fn set_layer_data_res(
        &mut self,
        id: &str,
        data: &Float32Array,
        indices: Option<Uint32Array>,
        p_values: Option<Float64Array>,
    ) -> JsValue {
        let p = p_values.map(|a| a.to_vec());
        finish(self.set_data_impl(id, data.to_vec(), indices_vec(indices), p))
    }
    pub fn set_range_res(&mut self, id: &str, min: f32, max: f32) -> JsValue {
        finish(self.scalar_impl(id, "min", min, "max", max, |cm, a, b| cm.set_range(a, b)))
    }
    pub fn set_threshold_res(&mut self, id: &str, lo: f32, hi: f32) -> JsValue {
        finish(self.scalar_impl(id, "lo", lo, "hi", hi, |cm, a, b| cm.set_threshold(a, b)))
    }
    pub fn set_label_visible_res(&mut self, id: &str, label: i32, visible: bool) -> JsValue {
        finish(self.label_visible_impl(id, label, visible))
    }

    // Statistical corrections
    pub fn apply_fdr_res(&mut self, id: &str, q: f64) -> JsValue {
        finish(self.correction_impl(id, |l| l.apply_fdr(q)))
    }
    pub fn apply_bonferroni_res(&mut self, id: &str, alpha: f64) -> JsValue {
        finish(self.correction_impl(id, |l| l.apply_bonferroni(alpha)))
    }
    pub fn apply_cluster_threshold_res(&mut self, id: &str, threshold: f32, min_cluster_size: u32) -> JsValue {
        if !threshold.is_finite() {
            return error::non_finite("threshold");
        }
        finish(self.correction_impl(id, |l| l.apply_cluster_threshold(threshold, min_cluster_size as usize)))
    }
    pub fn clear_correction_res(&mut self, id: &str) -> JsValue {
        finish(self.correction_impl(id, |l| {
            l.clear_correction();
            Ok(())
        }))
    }
    pub fn set_dual_threshold_res(&mut self, id: &str, options: JsValue) -> JsValue {
        finish(self.dual_threshold_impl(id, options))
    }
    pub fn clear_dual_threshold_res(&mut self, id: &str) -> JsValue {
        finish(self.correction_impl(id, |l| {
            l.clear_dual_threshold();
            Ok(())
        }))
    }

    // Outputs
    /// Copy of the composite; `4 * vertex_count` floats.
    pub fn composite(&mut self) -> Float32Array {
        arr_f32(self.inner.composite())
    }
    pub fn layer_rgba_res(&mut self, id: &str) -> JsValue {
        match self.inner.layer_rgba(id) {
            Some(buf) => error::ok(arr_f32(buf).into()),
            None => error::invalid_id("layer", id),
        }
    }
    pub fn survival_mask_res(&self, id: &str) -> JsValue {
        finish(self.stat_map(id).map(|l| match l.survival_mask() {
            Some(mask) => arr_u8(mask).into(),
            None => JsValue::NULL,
        }))
    }
    pub fn correction_res(&self, id: &str) -> JsValue {
        finish(self.stat_map(id).map(|l| {
            let o = new_obj();
            set_kv(&o, "method", &to_js(&l.correction_method()));
            if let Some(c) = l.p_correction() {
                set_kv(&o, "threshold", &JsValue::from_f64(c.threshold));
                set_kv(&o, "surviving", &JsValue::from_f64(c.surviving as f64));
                set_kv(&o, "tests", &JsValue::from_f64(c.tests as f64));
            }
            o.into()
        }))
    }
    pub fn cluster_result_res(&self, id: &str) -> JsValue {
        finish(self.stat_map(id).map(|l| match l.cluster_result() {
            Some(c) => to_js(c),
            None => JsValue::NULL,
        }))
    }
    pub fn cluster_summaries_res(&self, id: &str) -> JsValue {
        finish(self.stat_map(id).map(|l| match l.cluster_summaries() {
            Some(s) => to_js(&s),
            None => JsValue::NULL,
        }))
    }
    pub fn probe_res(&self, id: &str, vertex: u32) -> JsValue {
        finish(self.probe_impl(id, vertex))
    }
    pub fn boundary_edges_res(&self, id: &str) -> JsValue {
        finish(self.outline(id).map(|l| {
            let o = new_obj();
            set_kv(&o, "segments", &arr_u32(&l.segment_indices()).into());
            set_kv(&o, "vertices", &arr_u32(&l.boundary_vertices()).into());
            set_kv(&o, "color", &arr_f32(&l.color()).into());
            set_kv(&o, "width", &JsValue::from_f64(l.width() as f64));
            o.into()
        }))
    }
    pub fn composite_order(&self) -> JsValue {
        to_js(&self.inner.composite_order())
    }
    pub fn describe(&self) -> JsValue {
        to_js(&self.inner.describe())
    }
}

impl Surface {
    fn layer_options(options: JsValue) -> Result<LayerOptions, JsValue> {
        from_js(options, "layer options")
    }

    fn push(&mut self, layer: PaintResult<Layer>) -> Res {
        let layer = layer.map_err(paint)?;
        self.inner.add_layer(layer).map_err(paint)?;
        Ok(JsValue::TRUE)
    }

    fn kind_of(&self, id: &str) -> Result<LayerKind, JsValue> {
        self.inner.get(id).map(|l| l.kind()).ok_or_else(|| error::invalid_id("layer", id))
    }

    fn stat_map(&self, id: &str) -> Result<&StatMapLayer, JsValue> {
        match self.inner.get(id) {
            Some(Layer::StatMap(l)) => Ok(l),
            Some(other) => Err(error::wrong_kind(id, "stat_map", other.kind())),
            None => Err(error::invalid_id("layer", id)),
        }
    }

    fn outline(&self, id: &str) -> Result<&OutlineLayer, JsValue> {
        match self.inner.get(id) {
            Some(Layer::Outline(l)) => Ok(l),
            Some(other) => Err(error::wrong_kind(id, "outline", other.kind())),
            None => Err(error::invalid_id("layer", id)),
        }
    }

    // Rejected or failed edits leave the stack clean.
    fn edit_stat_map(&mut self, id: &str, edit: impl FnOnce(&mut StatMapLayer) -> PaintResult<()>) -> Res {
        let r = self.inner.edit_layer(id, |layer| match layer {
            Layer::StatMap(l) => edit(l).map_err(paint),
            other => Err(error::wrong_kind(id, "stat_map", other.kind())),
        });
        r.unwrap_or_else(|| Err(error::invalid_id("layer", id)))?;
        Ok(JsValue::TRUE)
    }

    fn set_mesh_impl(&mut self, faces: &[u32]) -> Res {
        let adjacency = Arc::new(MeshAdjacency::build(faces, self.inner.vertex_count()).map_err(paint)?);
        for layer in self.inner.layers_mut() {
            if let Layer::StatMap(l) = layer {
                l.set_mesh_adjacency(Arc::clone(&adjacency));
            }
        }
        let summary = json!({
            "vertexCount": adjacency.vertex_count(),
            "edgeCount": adjacency.edge_count(),
        });
        self.adjacency = Some(adjacency);
        Ok(to_js(&summary))
    }

    fn add_base_impl(&mut self, id: &str, color: [f32; 4], options: JsValue) -> Res {
        for (param, c) in ["r", "g", "b", "a"].into_iter().zip(color) {
            finite(param, c as f64)?;
        }
        let opts = Self::layer_options(options)?;
        self.push(BaseLayer::new(id, color, &opts).map(Layer::Base))
    }

    fn add_rgba_impl(&mut self, id: &str, data: Vec<f32>, options: JsValue) -> Res {
        let opts = Self::layer_options(options)?;
        self.push(RgbaLayer::new(id, data, &opts).map(Layer::Rgba))
    }

    fn add_data_impl(
        &mut self,
        id: &str,
        data: Vec<f32>,
        indices: Option<Vec<u32>>,
        colormap: JsValue,
        options: JsValue,
    ) -> Res {
        let cm_opts: ColorMapOptions = from_js(colormap, "colormap options")?;
        let opts = Self::layer_options(options)?;
        let cm = cm_opts.build(&self.registry, &data).map_err(paint)?;
        self.push(DataLayer::new(id, data, indices, cm, &opts).map(Layer::Data))
    }

    fn add_two_data_impl(
        &mut self,
        id: &str,
        x: Vec<f32>,
        y: Vec<f32>,
        indices: Option<Vec<u32>>,
        colormap: JsValue,
        options: JsValue,
    ) -> Res {
        let cm_opts: ColorMap2DOptions = from_js(colormap, "2d colormap options")?;
        let opts = Self::layer_options(options)?;
        let cm = cm_opts.build(&x, &y).map_err(paint)?;
        self.push(TwoDataLayer::new(id, x, y, indices, cm, &opts).map(Layer::TwoData))
    }

    fn add_label_impl(
        &mut self,
        id: &str,
        labels: Vec<i32>,
        indices: Option<Vec<u32>>,
        table: JsValue,
        options: JsValue,
    ) -> Res {
        let rows: Vec<LabelTableEntry> = from_js(table, "label table")?;
        let opts = Self::layer_options(options)?;
        let table = label_table(&rows).map_err(paint)?;
        self.push(LabelLayer::new(id, labels, indices, table, &opts).map(Layer::Label))
    }

    #[allow(clippy::too_many_arguments)]
    fn add_stat_map_impl(
        &mut self,
        id: &str,
        data: Vec<f32>,
        indices: Option<Vec<u32>>,
        p_values: Option<Vec<f64>>,
        colormap: JsValue,
        stat: JsValue,
        options: JsValue,
    ) -> Res {
        let cm_opts: ColorMapOptions = from_js(colormap, "colormap options")?;
        let stat: StatMapOptions = from_js(stat, "stat map options")?;
        let opts = Self::layer_options(options)?;
        let cm = cm_opts.build(&self.registry, &data).map_err(paint)?;
        let mut layer = StatMapLayer::new(id, data, indices, p_values, cm, &stat, &opts).map_err(paint)?;
        if let Some(adjacency) = &self.adjacency {
            layer.set_mesh_adjacency(Arc::clone(adjacency));
        }
        self.push(Ok(Layer::StatMap(layer)))
    }

    fn add_outline_impl(&mut self, id: &str, labels: Vec<i32>, color: [f32; 4], width: f32, options: JsValue) -> Res {
        let adjacency = self
            .adjacency
            .clone()
            .ok_or_else(|| paint(surfpaint::PaintError::MissingPrerequisite("outline layers need mesh adjacency")))?;
        let opts = Self::layer_options(options)?;
        self.push(OutlineLayer::new(id, labels, adjacency, color, width, &opts).map(Layer::Outline))
    }

    fn update_impl(&mut self, id: &str, patch: JsValue) -> Res {
        let patch: LayerUpdate = from_js(patch, "layer update")?;
        if let Some(o) = patch.opacity {
            finite("opacity", o as f64)?;
        }
        self.kind_of(id)?;
        let changed = self.inner.update_layer(id, &patch).map_err(paint)?;
        Ok(JsValue::from_bool(changed))
    }

    fn set_data_impl(
        &mut self,
        id: &str,
        data: Vec<f32>,
        indices: Option<Vec<u32>>,
        p_values: Option<Vec<f64>>,
    ) -> Res {
        let r = self.inner.edit_layer(id, |layer| match layer {
            Layer::Data(l) => l.set_data(data, indices).map_err(paint),
            Layer::StatMap(l) => l.set_data(data, indices, p_values).map_err(paint),
            other => Err(error::wrong_kind(id, "data or stat_map", other.kind())),
        });
        r.unwrap_or_else(|| Err(error::invalid_id("layer", id)))?;
        Ok(JsValue::TRUE)
    }

    fn scalar_impl(
        &mut self,
        id: &str,
        pa: &str,
        a: f32,
        pb: &str,
        b: f32,
        apply: impl FnOnce(&mut surfpaint::ColorMap, f32, f32) -> PaintResult<()>,
    ) -> Res {
        finite(pa, a as f64)?;
        finite(pb, b as f64)?;
        let r = self.inner.edit_layer(id, |layer| match layer {
            Layer::Data(l) => apply(l.colormap_mut(), a, b).map_err(paint),
            Layer::StatMap(l) => apply(l.colormap_mut(), a, b).map_err(paint),
            other => Err(error::wrong_kind(id, "data or stat_map", other.kind())),
        });
        r.unwrap_or_else(|| Err(error::invalid_id("layer", id)))?;
        Ok(JsValue::TRUE)
    }

    fn label_visible_impl(&mut self, id: &str, label: i32, visible: bool) -> Res {
        let r = self.inner.edit_layer(id, |layer| match layer {
            Layer::Label(l) => Ok(JsValue::from_bool(l.set_label_visible(label, visible))),
            other => Err(error::wrong_kind(id, "label", other.kind())),
        });
        r.unwrap_or_else(|| Err(error::invalid_id("layer", id)))
    }

    fn correction_impl(&mut self, id: &str, apply: impl FnOnce(&mut StatMapLayer) -> PaintResult<()>) -> Res {
        self.edit_stat_map(id, apply)
    }

    fn dual_threshold_impl(&mut self, id: &str, options: JsValue) -> Res {
        let opts: DualThresholdOptions = from_js(options, "dual threshold options")?;
        let (positive, negative) = opts.build(&self.registry).map_err(paint)?;
        self.edit_stat_map(id, |l| l.set_dual_threshold(positive, negative))
    }

    fn probe_impl(&self, id: &str, vertex: u32) -> Res {
        let layer = self.inner.get(id).ok_or_else(|| error::invalid_id("layer", id))?;
        let value = match layer {
            Layer::StatMap(l) => l.probe(vertex).map(|p| to_js(&p)),
            Layer::Data(l) => l.value_at(vertex).map(|v| to_js(&json!({ "vertex": vertex, "value": v }))),
            Layer::TwoData(l) => {
                l.values_at(vertex).map(|(x, y)| to_js(&json!({ "vertex": vertex, "x": x, "y": y })))
            }
            Layer::Label(l) => l.label_at(vertex).map(|(label, entry)| {
                to_js(&json!({
                    "vertex": vertex,
                    "label": label,
                    "name": entry.map(|e| e.name.as_str()),
                    "visible": l.is_label_visible(label),
                }))
            }),
            other => return Err(error::wrong_kind(id, "data, two_data, label or stat_map", other.kind())),
        };
        Ok(value.unwrap_or(JsValue::NULL))
    }
}
