#![cfg(target_arch = "wasm32")]

use std::rc::Rc;

use fsqr_widgets::{
    ConsentCookie, ConsentRecord, ConsentView, OverlayPhase, WidgetsConfig, find_cookie,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Element, Event, HtmlElement, HtmlInputElement};

use fsqr_web::consent::{self, ConsentOverlay};
use fsqr_web::dom;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

const FIXTURE: &str = r#"
<div id="cookieConsent" aria-hidden="true">
  <section data-cookie-consent-view="summary">
    <h2 id="summaryHeading" tabindex="-1" data-cookie-consent-focus>Cookies</h2>
    <button type="button" data-cookie-consent="accept">Accept</button>
    <button type="button" data-cookie-consent="reject">Reject</button>
    <button type="button" data-cookie-consent="customize">Customize</button>
  </section>
  <section data-cookie-consent-view="settings" hidden>
    <h2 id="settingsHeading" tabindex="-1" data-cookie-consent-focus="settings">Settings</h2>
    <input id="analytics" type="checkbox" data-cookie-category="analytics" />
    <input id="marketing" type="checkbox" data-cookie-category="marketing" />
    <button type="button" data-cookie-consent="back">Back</button>
    <button type="button" data-cookie-consent="save">Save</button>
  </section>
</div>
"#;

fn cfg() -> WidgetsConfig {
    WidgetsConfig::default_config()
}

fn clear_cookie() {
    let doc = dom::document().expect("document");
    dom::write_cookie(&doc, &ConsentCookie::new(&cfg().consent).deletion_header());
}

fn mount(markup: &str) -> Element {
    let doc = dom::document().expect("document");
    if let Some(old) = doc.get_element_by_id("consentFixture") {
        old.remove();
    }
    let host = doc.create_element("div").expect("create fixture host");
    host.set_id("consentFixture");
    host.set_inner_html(markup);
    doc.body()
        .expect("document body")
        .append_child(&host)
        .expect("append fixture");
    host
}

fn fresh_overlay() -> Rc<ConsentOverlay> {
    clear_cookie();
    mount(FIXTURE);
    consent::init(&cfg().consent).expect("overlay should initialize without a cookie")
}

fn overlay_el() -> HtmlElement {
    dom::document()
        .expect("document")
        .get_element_by_id("cookieConsent")
        .expect("overlay")
        .dyn_into()
        .expect("overlay is an HtmlElement")
}

fn click(action: &str) {
    overlay_el()
        .query_selector(&format!("[data-cookie-consent=\"{action}\"]"))
        .expect("query control")
        .expect("control exists")
        .dyn_into::<HtmlElement>()
        .expect("control is an HtmlElement")
        .click();
}

fn stored_record() -> Option<ConsentRecord> {
    let jar = dom::read_cookies(&dom::document().expect("document"));
    find_cookie(&jar, &cfg().consent.cookie_name)
        .map(|raw| ConsentRecord::decode(raw).expect("cookie decodes"))
}

fn active_id() -> String {
    dom::document()
        .expect("document")
        .active_element()
        .map(|el| el.id())
        .unwrap_or_default()
}

fn view_hidden(view: &str) -> bool {
    overlay_el()
        .query_selector(&format!("[data-cookie-consent-view=\"{view}\"]"))
        .expect("query view")
        .expect("view exists")
        .has_attribute("hidden")
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        dom::window()
            .expect("window")
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .expect("schedule timeout");
    });
    JsFuture::from(promise).await.expect("timeout resolves");
}

#[wasm_bindgen_test]
fn shows_summary_and_focuses_its_target() {
    let overlay = fresh_overlay();
    let el = overlay_el();
    assert!(el.class_list().contains("is-visible"));
    assert_eq!(el.get_attribute("aria-hidden").as_deref(), Some("false"));
    assert_eq!(el.get_attribute("data-active-view").as_deref(), Some("summary"));
    assert!(!view_hidden("summary"));
    assert!(view_hidden("settings"));
    assert_eq!(overlay.view(), Some(ConsentView::Summary));
    assert_eq!(active_id(), "summaryHeading");
}

#[wasm_bindgen_test]
fn accept_persists_and_later_loads_stay_hidden() {
    let overlay = fresh_overlay();
    click("accept");
    assert_eq!(stored_record(), Some(ConsentRecord::Accepted));
    assert_eq!(overlay.phase(), OverlayPhase::Dismissing);
    assert!(!overlay_el().class_list().contains("is-visible"));

    mount(FIXTURE);
    assert!(
        consent::init(&cfg().consent).is_none(),
        "cookie must suppress the overlay"
    );
    assert!(!overlay_el().class_list().contains("is-visible"));
}

#[wasm_bindgen_test]
fn reject_stores_the_rejected_sentinel() {
    fresh_overlay();
    click("reject");
    assert_eq!(stored_record(), Some(ConsentRecord::Rejected));
}

#[wasm_bindgen_test]
fn customize_and_back_switch_views_and_focus() {
    let overlay = fresh_overlay();
    click("customize");
    assert_eq!(overlay.view(), Some(ConsentView::Settings));
    assert!(view_hidden("summary"));
    assert!(!view_hidden("settings"));
    assert_eq!(
        overlay_el().get_attribute("data-active-view").as_deref(),
        Some("settings")
    );
    assert_eq!(active_id(), "settingsHeading");

    click("back");
    assert_eq!(overlay.view(), Some(ConsentView::Summary));
    assert!(!view_hidden("summary"));
    assert_eq!(active_id(), "summaryHeading");
    assert!(stored_record().is_none(), "navigation alone never writes the cookie");
}

#[wasm_bindgen_test]
fn settings_without_focus_target_focuses_first_toggle() {
    clear_cookie();
    mount(&FIXTURE.replace(
        r#"<h2 id="settingsHeading" tabindex="-1" data-cookie-consent-focus="settings">Settings</h2>"#,
        "<h2>Settings</h2>",
    ));
    let overlay = consent::init(&cfg().consent).expect("overlay initializes");
    assert!(
        overlay_el()
            .query_selector("[data-cookie-consent-focus=\"settings\"]")
            .expect("query")
            .is_none()
    );

    click("customize");
    assert_eq!(overlay.view(), Some(ConsentView::Settings));
    assert_eq!(active_id(), "analytics");
}

#[wasm_bindgen_test]
fn save_records_toggles_with_necessary_forced_on() {
    fresh_overlay();
    click("customize");
    let doc = dom::document().expect("document");
    let analytics: HtmlInputElement = doc
        .get_element_by_id("analytics")
        .expect("analytics toggle")
        .dyn_into()
        .expect("checkbox");
    analytics.set_checked(true);
    click("save");

    let Some(ConsentRecord::Categories(map)) = stored_record() else {
        panic!("expected a categories record");
    };
    assert_eq!(map.get("necessary"), Some(&true));
    assert_eq!(map.get("analytics"), Some(&true));
    assert_eq!(map.get("marketing"), Some(&false));
}

#[wasm_bindgen_test]
fn transition_end_on_overlay_clears_the_view_marker() {
    let overlay = fresh_overlay();
    click("accept");
    let el = overlay_el();

    // A child's transition must not count.
    let child = el.query_selector("h2").expect("query").expect("heading");
    let bubbling = web_sys::EventInit::new();
    bubbling.set_bubbles(true);
    let from_child =
        Event::new_with_event_init_dict("transitionend", &bubbling).expect("event");
    child.dispatch_event(&from_child).expect("dispatch");
    assert!(el.has_attribute("data-active-view"));

    el.dispatch_event(&Event::new("transitionend").expect("event"))
        .expect("dispatch");
    assert!(!el.has_attribute("data-active-view"));
    assert_eq!(overlay.phase(), OverlayPhase::Hidden);
}

#[wasm_bindgen_test]
async fn fallback_timer_finishes_teardown_once() {
    let overlay = fresh_overlay();
    click("reject");
    assert!(overlay_el().has_attribute("data-active-view"));
    sleep(450).await;
    assert!(!overlay_el().has_attribute("data-active-view"));
    assert_eq!(overlay.phase(), OverlayPhase::Hidden);

    // A late transitionend after the fallback is a no-op.
    overlay_el()
        .dispatch_event(&Event::new("transitionend").expect("event"))
        .expect("dispatch");
    assert_eq!(overlay.phase(), OverlayPhase::Hidden);
}

#[wasm_bindgen_test]
fn missing_accept_control_leaves_overlay_untouched() {
    clear_cookie();
    mount(r#"<div id="cookieConsent"><button data-cookie-consent="reject">No</button></div>"#);
    assert!(consent::init(&cfg().consent).is_none());
    assert!(!overlay_el().class_list().contains("is-visible"));
}
