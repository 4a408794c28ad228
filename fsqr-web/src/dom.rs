use chrono::{DateTime, Utc};
use gloo::events::EventListener;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, FocusOptions, HtmlDocument, HtmlElement, Node,
    ScrollIntoViewOptions, ScrollLogicalPosition, Window,
};

/// Retrieve the global `window` object, if running in a browser.
#[must_use]
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Retrieve the document object for DOM interactions.
#[must_use]
pub fn document() -> Option<Document> {
    window().and_then(|win| win.document())
}

/// Convert a JavaScript value into a readable string for error reporting.
#[must_use]
pub fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| err.message().into())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Current time from the browser clock.
#[must_use]
pub fn now_utc() -> DateTime<Utc> {
    #[allow(clippy::cast_possible_truncation)]
    let millis = js_sys::Date::now() as i64;
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// `document.cookie`, or an empty string when cookies are unavailable.
#[must_use]
pub fn read_cookies(doc: &Document) -> String {
    doc.dyn_ref::<HtmlDocument>()
        .and_then(|html| html.cookie().ok())
        .unwrap_or_default()
}

/// Assign to `document.cookie`. Browsers reject writes silently; so do we.
pub fn write_cookie(doc: &Document, assignment: &str) {
    if let Some(html) = doc.dyn_ref::<HtmlDocument>()
        && let Err(err) = html.set_cookie(assignment)
    {
        log::debug!("cookie write ignored: {}", js_error_message(&err));
    }
}

/// Focus without scrolling the page.
pub fn focus_quietly(el: &HtmlElement) {
    let opts = FocusOptions::new();
    opts.set_prevent_scroll(true);
    let _ = el.focus_with_options(&opts);
}

/// Scroll just enough to bring `el` into view.
pub fn scroll_nearest(el: &Element) {
    let opts = ScrollIntoViewOptions::new();
    opts.set_block(ScrollLogicalPosition::Nearest);
    el.scroll_into_view_with_scroll_into_view_options(&opts);
}

/// Whether the event's target lies inside `container`.
#[must_use]
pub fn event_within(event: &Event, container: &Node) -> bool {
    let target = event.target().and_then(|t| t.dyn_into::<Node>().ok());
    container.contains(target.as_ref())
}

/// Every element under `root` matching `selector`, in document order.
///
/// # Errors
/// Returns the browser's error when `selector` is invalid.
pub fn query_all(root: &Element, selector: &str) -> Result<Vec<Element>, JsValue> {
    let list = root.query_selector_all(selector)?;
    Ok((0..list.length())
        .filter_map(|idx| list.item(idx))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

/// Run `f` once the document is parsed, immediately if that already happened.
pub fn on_ready(f: impl FnOnce() + 'static) {
    let Some(doc) = document() else {
        return;
    };
    if doc.ready_state() == "loading" {
        EventListener::once(&doc, "DOMContentLoaded", move |_| f()).forget();
    } else {
        f();
    }
}

/// True when the page was opened with `?test=1`.
#[must_use]
pub fn test_mode_enabled() -> bool {
    window()
        .and_then(|win| win.location().search().ok())
        .is_some_and(|search| search.contains("test=1"))
}
