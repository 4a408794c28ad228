use wasm_bindgen::JsValue;

use crate::dom::js_error_message;

/// Why a widget could not be wired up.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("DOM error: {0}")]
    Dom(String),
    #[error("element is not a {0}")]
    WrongElement(&'static str),
}

impl From<JsValue> for WidgetError {
    fn from(value: JsValue) -> Self {
        Self::Dom(js_error_message(&value))
    }
}
