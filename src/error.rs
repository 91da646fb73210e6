use crate::interop::{new_obj, set_kv};
use surfpaint::{LayerKind, PaintError};
use wasm_bindgen::JsValue;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data { set_kv(&e, "data", &d); }
    set_kv(&root, "error", &e.into());
    root.into()
}

/// Core errors keep their code; parameter errors also name the parameter.
pub fn paint(e: PaintError) -> JsValue {
    let data = match &e {
        PaintError::InvalidParameter { param, .. } => {
            let d = new_obj();
            set_kv(&d, "param", &JsValue::from_str(param));
            Some(d.into())
        }
        _ => None,
    };
    err(e.code(), e.to_string(), data)
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("non_finite", format!("parameter '{}' must be finite", param), Some(d.into()))
}

#[inline]
pub fn invalid_id(kind: &str, id: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "kind", &JsValue::from_str(kind));
    set_kv(&d, "id", &JsValue::from_str(id));
    err("invalid_id", format!("no {} '{}'", kind, id), Some(d.into()))
}

pub fn wrong_kind(id: &str, expected: &str, got: LayerKind) -> JsValue {
    let d = new_obj();
    set_kv(&d, "id", &JsValue::from_str(id));
    set_kv(&d, "expected", &JsValue::from_str(expected));
    set_kv(&d, "got", &JsValue::from_str(got.as_str()));
    err("wrong_kind", format!("layer '{}' is a {} layer, expected {}", id, got.as_str(), expected), Some(d.into()))
}

pub fn invalid_options(what: &str, message: impl Into<String>) -> JsValue {
    let d = new_obj(); set_kv(&d, "what", &JsValue::from_str(what));
    err("invalid_options", format!("{}: {}", what, message.into()), Some(d.into()))
}
