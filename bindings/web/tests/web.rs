#![cfg(target_arch = "wasm32")]

use drivetime_web::DriveTime;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn default_scene_has_marker_and_no_overlays() {
    let viewer = DriveTime::new(JsValue::UNDEFINED, 800.0, 600.0).expect("viewer");

    let snapshot = viewer.snapshot().expect("snapshot");
    let entities = js_sys::Reflect::get(&snapshot, &"entities".into()).unwrap();
    let overlays = js_sys::Reflect::get(&snapshot, &"overlays".into()).unwrap();

    assert_eq!(js_sys::Array::from(&entities).length(), 1);
    assert_eq!(js_sys::Array::from(&overlays).length(), 0);
    assert_eq!(viewer.pending_queries(), 0);
}

#[wasm_bindgen_test]
fn rejects_malformed_config() {
    assert!(DriveTime::new(JsValue::from_str("not a config"), 800.0, 600.0).is_err());
}
