#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fsqr_widgets::{SelectConfig, WidgetsConfig};
use gloo::events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{
    Element, HtmlElement, HtmlSelectElement, KeyboardEvent, KeyboardEventInit, PointerEvent,
    PointerEventInit,
};

use fsqr_web::dom;
use fsqr_web::retention_select::{self, RetentionSelect};

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

const RETENTION: &str = r#"
<div class="retention-select" data-retention-select>
  <select id="retention" name="retention">
    <option value="1">1 day</option>
    <option value="7" selected>7 days</option>
    <option value="30">30 days</option>
  </select>
  <span class="retention-select-arrow"></span>
</div>
<button id="elsewhere" type="button">Elsewhere</button>
"#;

const WITH_DISABLED: &str = r#"
<div class="retention-select" data-retention-select>
  <select id="retention" name="retention">
    <option value="a" disabled selected>A</option>
    <option value="b">B</option>
    <option value="c" disabled>C</option>
    <option value="d">D</option>
  </select>
</div>
"#;

fn cfg() -> SelectConfig {
    WidgetsConfig::default_config().select
}

fn mount(markup: &str) -> Element {
    let doc = dom::document().expect("document");
    if let Some(old) = doc.get_element_by_id("selectFixture") {
        old.remove();
    }
    let host = doc.create_element("div").expect("create fixture host");
    host.set_id("selectFixture");
    host.set_inner_html(markup);
    doc.body()
        .expect("document body")
        .append_child(&host)
        .expect("append fixture");
    host
}

fn wrapper(host: &Element) -> Element {
    host.query_selector("[data-retention-select]")
        .expect("query wrapper")
        .expect("wrapper exists")
}

fn enhanced(markup: &str) -> (Element, Rc<RetentionSelect>) {
    let host = mount(markup);
    let widget = retention_select::enhance(&wrapper(&host), &cfg())
        .expect("enhance succeeds")
        .expect("wrapper gets enhanced");
    (host, widget)
}

fn find(host: &Element, selector: &str) -> HtmlElement {
    host.query_selector(selector)
        .expect("query")
        .unwrap_or_else(|| panic!("{selector} exists"))
        .dyn_into()
        .expect("HtmlElement")
}

fn native(host: &Element) -> HtmlSelectElement {
    host.query_selector("select")
        .expect("query select")
        .expect("select exists")
        .dyn_into()
        .expect("HtmlSelectElement")
}

fn items(host: &Element) -> Vec<HtmlElement> {
    dom::query_all(host, ".retention-select-option")
        .expect("query options")
        .into_iter()
        .map(|el| el.dyn_into().expect("HtmlElement"))
        .collect()
}

fn press(target: &HtmlElement, key: &str) {
    let init = KeyboardEventInit::new();
    init.set_key(key);
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).expect("event");
    target.dispatch_event(&event).expect("dispatch keydown");
}

fn pointer_down(target: &HtmlElement) {
    let init = PointerEventInit::new();
    init.set_bubbles(true);
    let event = PointerEvent::new_with_event_init_dict("pointerdown", &init).expect("event");
    target.dispatch_event(&event).expect("dispatch pointerdown");
}

fn count_changes(target: &Element) -> (Rc<Cell<u32>>, EventListener) {
    let count = Rc::new(Cell::new(0));
    let listener = {
        let count = Rc::clone(&count);
        EventListener::new(target, "change", move |_| count.set(count.get() + 1))
    };
    (count, listener)
}

fn has_focus(el: &HtmlElement) -> bool {
    dom::document()
        .and_then(|doc| doc.active_element())
        .is_some_and(|active| &active == el.unchecked_ref::<Element>())
}

fn active_item(host: &Element) -> Option<usize> {
    items(host)
        .iter()
        .position(|item| item.class_list().contains("is-active"))
}

#[wasm_bindgen_test]
fn builds_trigger_and_listbox_with_aria() {
    let (host, widget) = enhanced(RETENTION);
    let wrapper = wrapper(&host);
    assert_eq!(wrapper.get_attribute("data-retention-enhanced").as_deref(), Some("true"));
    assert!(wrapper.class_list().contains("is-enhanced"));

    let select = native(&host);
    assert_eq!(select.get_attribute("aria-hidden").as_deref(), Some("true"));
    assert_eq!(select.tab_index(), -1);

    let trigger = find(&host, ".retention-select-trigger");
    let menu = find(&host, ".retention-select-menu");
    assert_eq!(trigger.get_attribute("aria-haspopup").as_deref(), Some("listbox"));
    assert_eq!(trigger.get_attribute("aria-expanded").as_deref(), Some("false"));
    assert_eq!(trigger.get_attribute("aria-controls"), Some(menu.id()));
    assert!(menu.id().starts_with("retention-menu-"));
    assert_eq!(menu.get_attribute("role").as_deref(), Some("listbox"));
    assert_eq!(trigger.text_content().as_deref(), Some("7 days"));

    let arrow = find(&host, ".retention-select-arrow");
    assert_eq!(arrow.get_attribute("aria-hidden").as_deref(), Some("true"));
    assert_eq!(
        trigger.next_element_sibling().map(|el| el.class_name()).as_deref(),
        Some("retention-select-arrow"),
        "trigger sits in front of the arrow"
    );

    let items = items(&host);
    assert_eq!(items.len(), 3);
    for (idx, item) in items.iter().enumerate() {
        assert_eq!(item.get_attribute("role").as_deref(), Some("option"));
        assert_eq!(item.id(), format!("{}-option-{idx}", menu.id()));
    }
    assert_eq!(items[1].get_attribute("aria-selected").as_deref(), Some("true"));
    assert!(items[1].class_list().contains("is-selected"));
    assert_eq!(widget.state().value.as_deref(), Some("7"));
}

#[wasm_bindgen_test]
fn second_enhance_is_a_no_op() {
    let (host, _widget) = enhanced(RETENTION);
    let again = retention_select::enhance(&wrapper(&host), &cfg()).expect("enhance succeeds");
    assert!(again.is_none());
    let triggers = dom::query_all(&host, ".retention-select-trigger").expect("query");
    assert_eq!(triggers.len(), 1);
    let menus = dom::query_all(&host, ".retention-select-menu").expect("query");
    assert_eq!(menus.len(), 1);
}

#[wasm_bindgen_test]
fn wrappers_without_options_are_skipped() {
    let host = mount(r#"<div data-retention-select><select id="empty"></select></div>"#);
    assert!(retention_select::enhance(&wrapper(&host), &cfg()).expect("ok").is_none());
    assert!(!wrapper(&host).has_attribute("data-retention-enhanced"));

    let host = mount(r#"<div data-retention-select><span>no select</span></div>"#);
    assert!(retention_select::enhance(&wrapper(&host), &cfg()).expect("ok").is_none());
}

#[wasm_bindgen_test]
fn disabled_initial_selection_falls_back_silently() {
    let host = mount(WITH_DISABLED);
    let (changes, _guard) = count_changes(&host);
    let widget = retention_select::enhance(&wrapper(&host), &cfg())
        .expect("enhance succeeds")
        .expect("enhanced");

    assert_eq!(native(&host).selected_index(), 1);
    assert_eq!(native(&host).value(), "b");
    let trigger = find(&host, ".retention-select-trigger");
    assert_eq!(trigger.text_content().as_deref(), Some("B"));
    assert_eq!(changes.get(), 0, "initial correction must not fire change");

    let items = items(&host);
    assert_eq!(items[0].get_attribute("aria-disabled").as_deref(), Some("true"));
    assert_eq!(items[0].get_attribute("aria-selected"), None);
    assert_eq!(widget.state().selected, Some(1));
}

#[wasm_bindgen_test]
fn arrow_keys_skip_disabled_and_wrap() {
    let (host, widget) = enhanced(WITH_DISABLED);
    let trigger = find(&host, ".retention-select-trigger");
    let menu = find(&host, ".retention-select-menu");

    press(&trigger, "ArrowDown");
    assert!(widget.is_open());
    assert_eq!(trigger.get_attribute("aria-expanded").as_deref(), Some("true"));
    assert_eq!(active_item(&host), Some(3));

    press(&menu, "ArrowDown");
    assert_eq!(active_item(&host), Some(1), "wraps past the end");
    press(&menu, "ArrowUp");
    assert_eq!(active_item(&host), Some(3), "wraps past the start");
    press(&menu, "Home");
    assert_eq!(active_item(&host), Some(1));
    press(&menu, "End");
    assert_eq!(active_item(&host), Some(3));

    let active = items(&host)[3].id();
    assert_eq!(menu.get_attribute("aria-activedescendant"), Some(active));

    press(&menu, "Escape");
    assert!(!widget.is_open());
    assert_eq!(widget.state().selected, Some(1), "escape does not commit");
}

#[wasm_bindgen_test]
fn enter_commits_and_fires_one_change() {
    let (host, widget) = enhanced(RETENTION);
    let (changes, _guard) = count_changes(&host);
    let trigger = find(&host, ".retention-select-trigger");
    let menu = find(&host, ".retention-select-menu");

    press(&trigger, "Enter");
    assert!(widget.is_open());
    press(&menu, "ArrowDown");
    press(&menu, "Enter");

    assert!(!widget.is_open());
    assert_eq!(native(&host).value(), "30");
    assert_eq!(trigger.text_content().as_deref(), Some("30 days"));
    assert_eq!(changes.get(), 1);
    assert_eq!(widget.state().value.as_deref(), Some("30"));
    let focused = dom::document()
        .expect("document")
        .active_element()
        .expect("something has focus");
    assert_eq!(focused, trigger.unchecked_into::<Element>());
}

#[wasm_bindgen_test]
fn change_listeners_see_the_updated_label() {
    let (host, _widget) = enhanced(RETENTION);
    let trigger = find(&host, ".retention-select-trigger");
    let seen = Rc::new(RefCell::new(None));
    // Capture phase on the host runs before the widget's own listener on the select.
    let _guard = {
        let seen = Rc::clone(&seen);
        let trigger = trigger.clone();
        let host_for_items = host.clone();
        EventListener::new_with_options(
            &host,
            "change",
            EventListenerOptions::run_in_capture_phase(),
            move |_| {
                let selected = items(&host_for_items)
                    .iter()
                    .position(|item| item.class_list().contains("is-selected"));
                *seen.borrow_mut() = Some((trigger.text_content(), selected));
            },
        )
    };

    trigger.click();
    items(&host)[2].click();

    assert_eq!(
        seen.borrow().clone(),
        Some((Some("30 days".to_string()), Some(2)))
    );
}

#[wasm_bindgen_test]
fn clicks_commit_enabled_options_only() {
    let (host, widget) = enhanced(WITH_DISABLED);
    let (changes, _guard) = count_changes(&host);
    let trigger = find(&host, ".retention-select-trigger");
    trigger.click();
    assert!(widget.is_open());

    let items = items(&host);
    items[2].click();
    assert!(widget.is_open(), "disabled option keeps the menu open");
    assert_eq!(native(&host).value(), "b");
    assert_eq!(changes.get(), 0);

    items[3].click();
    assert!(!widget.is_open());
    assert_eq!(native(&host).value(), "d");
    assert_eq!(changes.get(), 1);
}

#[wasm_bindgen_test]
fn pointer_down_outside_closes_and_unsubscribes() {
    let (host, widget) = enhanced(RETENTION);
    let trigger = find(&host, ".retention-select-trigger");
    trigger.click();
    assert!(widget.state().listening);

    pointer_down(&items(&host)[0]);
    assert!(widget.is_open(), "pointer inside keeps it open");

    pointer_down(&find(&host, "#elsewhere"));
    assert!(!widget.is_open());
    assert!(!widget.state().listening);
    assert!(!wrapper(&host).class_list().contains("is-open"));

    // Reopening subscribes again; a second click closes without leaking listeners.
    trigger.click();
    assert!(widget.state().listening);
    trigger.click();
    assert!(!widget.state().listening);
}

#[wasm_bindgen_test]
fn tab_in_menu_closes_without_refocusing_trigger() {
    let (host, widget) = enhanced(RETENTION);
    let trigger = find(&host, ".retention-select-trigger");
    let menu = find(&host, ".retention-select-menu");
    trigger.click();
    assert!(widget.state().listening);

    press(&menu, "Tab");
    assert!(!widget.is_open());
    assert!(!widget.state().listening);
    assert_eq!(trigger.get_attribute("aria-expanded").as_deref(), Some("false"));
    assert!(!has_focus(&trigger), "Tab must not pull focus back");
    assert_eq!(widget.state().selected, Some(1), "Tab does not commit");
}

#[wasm_bindgen_test]
fn tab_outside_wrapper_closes_via_document_listener() {
    let (host, widget) = enhanced(RETENTION);
    let trigger = find(&host, ".retention-select-trigger");

    trigger.click();
    press(&find(&host, "#elsewhere"), "Tab");
    assert!(!widget.is_open());
    assert!(!widget.state().listening);
    assert!(!wrapper(&host).class_list().contains("is-open"));

    // Tab originating inside the wrapper is left to the widget's own handlers;
    // on the trigger those ignore it, so the menu stays open.
    trigger.click();
    press(&trigger, "Tab");
    assert!(widget.is_open());
    assert!(widget.state().listening);
}

#[wasm_bindgen_test]
fn native_change_is_reflected() {
    let (host, widget) = enhanced(RETENTION);
    let select = native(&host);
    select.set_selected_index(0);
    select
        .dispatch_event(&web_sys::Event::new("change").expect("event"))
        .expect("dispatch change");

    let trigger = find(&host, ".retention-select-trigger");
    assert_eq!(trigger.text_content().as_deref(), Some("1 day"));
    assert_eq!(widget.state().selected, Some(0));
    assert!(items(&host)[0].class_list().contains("is-selected"));
    assert!(!items(&host)[1].class_list().contains("is-selected"));
}

#[wasm_bindgen_test]
fn init_all_enhances_each_wrapper_once() {
    let host = mount(&format!("{RETENTION}{RETENTION}"));
    let before = retention_select::instances().len();
    assert_eq!(retention_select::init_all(&cfg()), 2);
    assert_eq!(retention_select::init_all(&cfg()), 0);
    assert_eq!(retention_select::instances().len(), before + 2);
    assert_eq!(dom::query_all(&host, ".retention-select-trigger").expect("query").len(), 2);
}
