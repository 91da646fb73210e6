use crate::layers::{CorrectionState, Layer};
use crate::model::{BlendMode, CorrectionMethod, LayerKind};
use crate::stack::LayerStack;
use serde::Serialize;
use serde_json::Value;

pub fn describe_impl(stack: &LayerStack, order: &[usize]) -> Value {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct CorrectionSer {
        method: CorrectionMethod,
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        surviving: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cluster_count: Option<usize>,
    }
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct LayerSer<'a> {
        id: &'a str,
        kind: LayerKind,
        visible: bool,
        opacity: f32,
        blend_mode: BlendMode,
        order: i32,
        compositing: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        range: Option<[f32; 2]>,
        #[serde(skip_serializing_if = "Option::is_none")]
        correction: Option<CorrectionSer>,
    }
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct StackSer<'a> {
        vertex_count: usize,
        base_color: [f32; 3],
        needs_composite: bool,
        layers: Vec<LayerSer<'a>>,
    }

    let all: Vec<&Layer> = stack.layers().collect();
    let layers = order
        .iter()
        .filter_map(|&i| all.get(i).copied())
        .map(|l| {
            let range = match l {
                Layer::Data(d) => Some(d.colormap().range()),
                Layer::StatMap(s) => Some(s.colormap().range()),
                _ => None,
            };
            let correction = match l {
                Layer::StatMap(s) => Some(correction_ser(s.correction())),
                _ => None,
            };
            LayerSer {
                id: l.id(),
                kind: l.kind(),
                visible: l.visible(),
                opacity: l.opacity(),
                blend_mode: l.blend_mode(),
                order: l.order(),
                compositing: l.is_compositing(),
                range,
                correction,
            }
        })
        .collect();

    fn correction_ser(c: &CorrectionState) -> CorrectionSer {
        let mut out = CorrectionSer { method: c.method(), threshold: None, surviving: None, cluster_count: None };
        match c {
            CorrectionState::None => {}
            CorrectionState::Fdr { result, .. } | CorrectionState::Bonferroni { result, .. } => {
                out.threshold = Some(result.threshold);
                out.surviving = Some(result.surviving);
            }
            CorrectionState::Cluster { threshold, clusters, mask, .. } => {
                out.threshold = Some(*threshold as f64);
                out.surviving = Some(mask.iter().filter(|&&m| m == 1).count());
                out.cluster_count = Some(clusters.cluster_count);
            }
        }
        out
    }

    let ser = StackSer {
        vertex_count: stack.vertex_count(),
        base_color: stack.base_color(),
        needs_composite: stack.needs_composite(),
        layers,
    };
    serde_json::to_value(&ser).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use crate::layers::{BaseLayer, Layer, StatMapLayer};
    use crate::colormap::ColorMap;
    use crate::options::{LayerOptions, StackOptions, StatMapOptions};
    use crate::stack::LayerStack;

    #[test]
    fn describe_lists_layers_in_composite_order() {
        let mut s = LayerStack::new(2, &StackOptions::default()).unwrap();
        let top = LayerOptions { order: 3, opacity: 0.5, ..Default::default() };
        s.add_layer(Layer::Base(BaseLayer::new("top", [1.0; 4], &top).unwrap())).unwrap();
        let cm = ColorMap::new(&[vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]], [0.0, 4.0]).unwrap();
        let stat = StatMapLayer::new(
            "t",
            vec![1.0, 2.0],
            None,
            Some(vec![0.001, 0.5]),
            cm,
            &StatMapOptions::default(),
            &LayerOptions::default(),
        )
        .unwrap();
        s.add_layer(Layer::StatMap(stat)).unwrap();
        if let Some(Layer::StatMap(l)) = s.get_mut("t") {
            l.apply_fdr(0.05).unwrap();
        }

        let v = s.describe();
        assert_eq!(v["vertexCount"], 2);
        let layers = v["layers"].as_array().unwrap();
        assert_eq!(layers[0]["id"], "t");
        assert_eq!(layers[0]["kind"], "stat_map");
        assert_eq!(layers[0]["range"], serde_json::json!([0.0, 4.0]));
        assert_eq!(layers[0]["correction"]["method"], "fdr");
        assert_eq!(layers[0]["correction"]["surviving"], 1);
        assert_eq!(layers[1]["id"], "top");
        assert_eq!(layers[1]["blendMode"], "normal");
        assert_eq!(layers[1]["opacity"], 0.5);
        assert!(layers[1].get("correction").is_none());
    }
}
