use surfpaint::blend::blend_buffer;
use surfpaint::{
    BaseLayer, BlendMode, ColorMap, DataLayer, Layer, LayerOptions, LayerStack, LayerUpdate, MeshAdjacency,
    OutlineLayer, RgbaLayer, StackOptions,
};
use std::sync::Arc;

fn rgba_layer(id: &str, data: Vec<f32>, order: i32, mode: BlendMode) -> Layer {
    let opts = LayerOptions { order, blend_mode: mode, ..Default::default() };
    Layer::Rgba(RgbaLayer::new(id, data, &opts).unwrap())
}

fn layers_abc(mode: BlendMode) -> [Layer; 3] {
    [
        rgba_layer("a", vec![1.0, 0.0, 0.0, 0.5, 0.2, 0.2, 0.2, 0.0, 0.9, 0.9, 0.1, 1.0], 0, mode),
        rgba_layer("b", vec![0.0, 1.0, 0.0, 0.25, 0.6, 0.1, 0.3, 0.8, 0.0, 0.0, 0.0, 0.0], 1, mode),
        rgba_layer("c", vec![0.0, 0.0, 1.0, 0.75, 0.5, 0.5, 0.5, 0.5, 0.3, 0.7, 0.2, 0.4], 2, mode),
    ]
}

#[test]
fn folding_in_a_layer_matches_a_longer_stack() {
    for mode in [BlendMode::Normal, BlendMode::Additive, BlendMode::Multiply, BlendMode::Screen] {
        let [a, b, c] = layers_abc(mode);
        let opts = StackOptions { base_color: [0.3, 0.4, 0.5] };

        let mut two = LayerStack::new(3, &opts).unwrap();
        two.add_layer(a.clone()).unwrap();
        two.add_layer(b.clone()).unwrap();
        let mut folded = two.composite().to_vec();
        let mut c_alone = c.clone();
        blend_buffer(&mut folded, c_alone.rgba(3), mode);

        let mut three = LayerStack::new(3, &opts).unwrap();
        three.add_layer(c).unwrap();
        three.add_layer(a).unwrap();
        three.add_layer(b).unwrap();
        assert_eq!(three.composite(), folded.as_slice(), "mode {:?}", mode);
    }
}

#[test]
fn transparent_vertices_leave_composite_untouched() {
    let mut s = LayerStack::new(2, &StackOptions { base_color: [0.25, 0.5, 0.75] }).unwrap();
    s.add_layer(rgba_layer("sparse", vec![1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0], 0, BlendMode::Normal))
        .unwrap();
    let out = s.composite();
    assert_eq!(&out[0..4], &[0.25, 0.5, 0.75, 1.0]);
    assert_eq!(&out[4..8], &[1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn opacity_is_applied_once() {
    let mut s = LayerStack::new(1, &StackOptions { base_color: [0.0, 0.0, 0.0] }).unwrap();
    let opts = LayerOptions { opacity: 0.5, ..Default::default() };
    s.add_layer(Layer::Base(BaseLayer::new("white", [1.0, 1.0, 1.0, 1.0], &opts).unwrap())).unwrap();
    let out = s.composite();
    for k in 0..3 {
        assert!((out[k] - 0.5).abs() < 1e-6);
    }
    assert_eq!(out[3], 1.0);
}

#[test]
fn data_layer_threshold_change_reaches_composite() {
    let cm = ColorMap::new(&[vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]], [0.0, 10.0]).unwrap();
    let data = DataLayer::new("d", vec![2.0, 8.0], None, cm, &LayerOptions::default()).unwrap();
    let mut s = LayerStack::new(2, &StackOptions { base_color: [0.0, 0.0, 0.0] }).unwrap();
    s.add_layer(Layer::Data(data)).unwrap();
    assert_eq!(s.composite()[0], 1.0);

    if let Some(Layer::Data(d)) = s.get_mut("d") {
        d.set_threshold(0.0, 5.0).unwrap();
    }
    let out = s.composite();
    assert_eq!(&out[0..4], &[0.0, 0.0, 0.0, 1.0]);
    assert_eq!(out[4], 1.0);
}

#[test]
fn stale_layer_is_noticed_without_stack_mutation() {
    let mut s = LayerStack::new(1, &StackOptions::default()).unwrap();
    s.add_layer(rgba_layer("r", vec![1.0, 0.0, 0.0, 1.0], 0, BlendMode::Normal)).unwrap();
    s.composite();
    assert!(!s.needs_composite());
    let changed = s.update_layer("r", &LayerUpdate { opacity: Some(0.0), ..Default::default() }).unwrap();
    assert!(changed);
    assert_eq!(s.composite(), &[0.8, 0.8, 0.8, 1.0]);
}

#[test]
fn outline_sits_in_order_but_never_blends() {
    let adj = Arc::new(MeshAdjacency::build(&[0, 1, 2, 2, 1, 3], 4).unwrap());
    let outline =
        OutlineLayer::new("edges", vec![1, 1, 2, 2], adj, [1.0, 1.0, 1.0, 1.0], 2.0, &LayerOptions::default())
            .unwrap();
    assert!(!outline.boundary_edges().is_empty());

    let mut s = LayerStack::new(4, &StackOptions { base_color: [0.1, 0.1, 0.1] }).unwrap();
    s.add_layer(Layer::Outline(outline)).unwrap();
    assert_eq!(s.composite_order(), vec!["edges"]);
    assert!(s.composite().chunks_exact(4).all(|px| px == [0.1, 0.1, 0.1, 1.0]));
}

#[test]
fn invalid_stack_inputs() {
    assert_eq!(LayerStack::new(0, &StackOptions::default()).unwrap_err().code(), "invalid_input");
    assert!(LayerStack::new(1, &StackOptions { base_color: [2.0, 0.0, 0.0] }).is_err());
    let mut s = LayerStack::new(1, &StackOptions::default()).unwrap();
    assert!(s.update_layer("nope", &LayerUpdate::default()).is_err());
    s.add_layer(rgba_layer("r", vec![0.0; 4], 0, BlendMode::Normal)).unwrap();
    let bad = LayerUpdate { opacity: Some(-0.1), visible: Some(false), ..Default::default() };
    assert_eq!(s.update_layer("r", &bad).unwrap_err().code(), "invalid_parameter");
    assert!(s.get("r").unwrap().visible());
}
