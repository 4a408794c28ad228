//! Progressive enhancement of `[data-retention-select]` wrappers.
//!
//! Each wrapper's native `<select>` stays in the form and remains the source
//! of truth; a trigger button and an ARIA listbox are layered on top of it.
use std::cell::RefCell;
use std::rc::Rc;

use fsqr_widgets::{ListboxState, SelectConfig};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlSelectElement};

use crate::dom;
use crate::error::WidgetError;

mod controller;
mod render;

pub use controller::{RetentionSelect, SelectState};

thread_local! {
    static INSTANCES: RefCell<Vec<Rc<RetentionSelect>>> = const { RefCell::new(Vec::new()) };
}

/// Enhance every marked wrapper in the document; returns how many were newly enhanced.
pub fn init_all(cfg: &SelectConfig) -> usize {
    let Some(doc) = dom::document() else {
        return 0;
    };
    let Some(root) = doc.document_element() else {
        return 0;
    };
    let wrappers = match dom::query_all(&root, &cfg.wrapper_selector()) {
        Ok(wrappers) => wrappers,
        Err(err) => {
            log::warn!("retention select scan failed: {}", dom::js_error_message(&err));
            return 0;
        }
    };
    wrappers
        .iter()
        .filter(|wrapper| match enhance(wrapper, cfg) {
            Ok(enhanced) => enhanced.is_some(),
            Err(err) => {
                log::warn!("retention select skipped: {err}");
                false
            }
        })
        .count()
}

/// Enhance one wrapper.
///
/// Returns `Ok(None)` when the wrapper is already enhanced, has no native
/// select, or the select has no options.
///
/// # Errors
///
/// Returns an error if building or inserting the custom controls fails.
pub fn enhance(
    wrapper: &Element,
    cfg: &SelectConfig,
) -> Result<Option<Rc<RetentionSelect>>, WidgetError> {
    if wrapper.get_attribute(&cfg.enhanced_attr).as_deref() == Some("true") {
        log::debug!("retention select already enhanced");
        return Ok(None);
    }
    let Some(native) = wrapper
        .query_selector("select")?
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
    else {
        log::debug!("retention select wrapper has no <select>");
        return Ok(None);
    };
    let options = render::snapshot_options(&native);
    if options.is_empty() {
        log::debug!("retention select `{}` has no options", native.id());
        return Ok(None);
    }
    let Some(doc) = dom::document() else {
        return Ok(None);
    };

    let view = render::render(&doc, wrapper, native, &options, cfg)?;
    let widget = RetentionSelect::new(doc, view, cfg.clone(), ListboxState::new(options));
    widget.sync_initial();
    widget.bind();
    INSTANCES.with(|instances| instances.borrow_mut().push(Rc::clone(&widget)));
    Ok(Some(widget))
}

/// Every select enhanced on this page, in enhancement order.
#[must_use]
pub fn instances() -> Vec<Rc<RetentionSelect>> {
    INSTANCES.with(|instances| instances.borrow().clone())
}
