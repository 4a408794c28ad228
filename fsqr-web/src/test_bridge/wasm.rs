use fsqr_widgets::{ConsentCookie, WidgetsConfig};
use js_sys::{Object, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::collect_state;
use crate::dom;

pub(super) fn install(cfg: &WidgetsConfig) {
    if !dom::test_mode_enabled() {
        return;
    }
    let Some(win) = dom::window() else {
        return;
    };

    let state = {
        let cfg = cfg.clone();
        Closure::<dyn Fn() -> JsValue>::new(move || {
            let serializer = serde_wasm_bindgen::Serializer::json_compatible();
            collect_state(&cfg)
                .serialize(&serializer)
                .unwrap_or(JsValue::NULL)
        })
    };
    let reset = {
        let cookie = ConsentCookie::new(&cfg.consent);
        Closure::<dyn Fn()>::new(move || {
            if let Some(doc) = dom::document() {
                dom::write_cookie(&doc, &cookie.deletion_header());
            }
        })
    };
    let enhance = {
        let select_cfg = cfg.select.clone();
        Closure::<dyn Fn() -> JsValue>::new(move || {
            let enhanced = crate::retention_select::init_all(&select_cfg);
            JsValue::from(u32::try_from(enhanced).unwrap_or(u32::MAX))
        })
    };

    let bridge = Object::new();
    let bound = [
        ("state", state.into_js_value()),
        ("reset", reset.into_js_value()),
        ("enhance", enhance.into_js_value()),
    ]
    .into_iter()
    .all(|(name, func)| Reflect::set(&bridge, &JsValue::from_str(name), &func).is_ok());

    if bound && Reflect::set(&win, &JsValue::from_str("__fsqrTest"), &bridge).is_ok() {
        log::info!("test bridge exposed as window.__fsqrTest");
    } else {
        log::warn!("test bridge could not be installed");
    }
}
