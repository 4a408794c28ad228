use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fsqr_widgets::{
    ConsentCookie, ConsentRecord, ConsentView, CookieJar, Key, ListboxEffect, ListboxState,
    OptionSnapshot, OverlayAction, OverlayEffect, OverlaySession, WidgetsConfig, find_cookie,
    overlay_required,
};

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-15T08:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Plays an overlay session against an in-memory cookie jar.
fn run_overlay(jar: &mut CookieJar, actions: Vec<OverlayAction>) -> Option<OverlaySession> {
    let cfg = WidgetsConfig::default_config();
    if !overlay_required(&jar.to_document_string(), &cfg.consent) {
        return None;
    }
    let cookie = ConsentCookie::new(&cfg.consent);
    let mut session = OverlaySession::new();
    session.show();
    for action in actions {
        for effect in session.apply(action) {
            if let OverlayEffect::Persist(record) = effect {
                jar.store(&cookie.header(&record, now()), now());
            }
        }
    }
    Some(session)
}

/// Applies listbox effects to a pretend native select.
#[derive(Default)]
struct FakeSelect {
    selected_index: Option<usize>,
    change_events: usize,
    trigger_focused: bool,
}

impl FakeSelect {
    fn apply(&mut self, effects: &[ListboxEffect]) {
        for effect in effects {
            match *effect {
                ListboxEffect::Commit { index } => self.selected_index = Some(index),
                ListboxEffect::Notify => self.change_events += 1,
                ListboxEffect::FocusTrigger => self.trigger_focused = true,
                _ => {}
            }
        }
    }
}

#[test]
fn any_consent_cookie_suppresses_the_overlay() {
    for action in [
        OverlayAction::Accept,
        OverlayAction::Reject,
        OverlayAction::Save(BTreeMap::new()),
    ] {
        let mut jar = CookieJar::default();
        assert!(run_overlay(&mut jar, vec![OverlayAction::Customize, action]).is_some());
        assert!(run_overlay(&mut jar, Vec::new()).is_none());
    }

    let mut jar = CookieJar::default();
    jar.store("fsqr_cookie_consent=whatever; path=/", now());
    assert!(run_overlay(&mut jar, Vec::new()).is_none());
}

#[test]
fn customized_choice_round_trips_through_cookie() {
    let mut jar = CookieJar::default();
    let choices: BTreeMap<String, bool> = [
        ("analytics".to_string(), true),
        ("marketing".to_string(), false),
    ]
    .into_iter()
    .collect();
    run_overlay(
        &mut jar,
        vec![OverlayAction::Customize, OverlayAction::Save(choices)],
    );

    let document_cookie = jar.to_document_string();
    let raw = find_cookie(&document_cookie, "fsqr_cookie_consent").expect("cookie written");
    let decoded = percent_encoding::percent_decode_str(raw).decode_utf8().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&decoded).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({ "necessary": true, "analytics": true, "marketing": false })
    );
    assert!(matches!(
        ConsentRecord::decode(raw).unwrap(),
        ConsentRecord::Categories(_)
    ));
}

#[test]
fn customize_then_back_swaps_visible_view() {
    let mut session = OverlaySession::new();
    session.show();
    let effects = session.apply(OverlayAction::Customize);
    assert!(effects.contains(&OverlayEffect::ShowView(ConsentView::Settings)));
    assert!(effects.contains(&OverlayEffect::FocusView(ConsentView::Settings)));
    let effects = session.apply(OverlayAction::Back);
    assert!(effects.contains(&OverlayEffect::ShowView(ConsentView::Summary)));
    assert_eq!(session.view(), Some(ConsentView::Summary));
}

#[test]
fn disabled_initial_selection_falls_forward() {
    let state = ListboxState::new(vec![
        OptionSnapshot::new("A", "a").disabled().selected(),
        OptionSnapshot::new("B", "b"),
        OptionSnapshot::new("C", "c"),
    ]);
    assert_eq!(state.selected(), Some(1));
    assert_eq!(state.active(), 1);
    assert_eq!(state.selected_option().map(|o| o.label.as_str()), Some("B"));
}

#[test]
fn arrow_down_skips_disabled_and_wraps() {
    let mut state = ListboxState::new(vec![
        OptionSnapshot::new("A", "a"),
        OptionSnapshot::new("B", "b").disabled(),
        OptionSnapshot::new("C", "c"),
    ]);
    state.open();
    assert_eq!(state.active(), 0);
    state.menu_key(Key::ArrowDown);
    assert_eq!(state.active(), 2);
    state.menu_key(Key::ArrowDown);
    assert_eq!(state.active(), 0);
    state.menu_key(Key::ArrowUp);
    assert_eq!(state.active(), 2);
}

#[test]
fn enter_commit_fires_one_change() {
    let mut state = ListboxState::new(vec![
        OptionSnapshot::new("1 day", "1").selected(),
        OptionSnapshot::new("7 days", "7"),
        OptionSnapshot::new("30 days", "30"),
    ]);
    let mut select = FakeSelect {
        selected_index: Some(0),
        ..FakeSelect::default()
    };
    select.apply(&state.initial_effects(select.selected_index));
    assert_eq!(select.change_events, 0);

    select.apply(&state.trigger_click());
    select.apply(&state.menu_key(Key::ArrowDown).effects);
    select.apply(&state.menu_key(Key::ArrowDown).effects);
    select.apply(&state.menu_key(Key::Enter).effects);

    assert_eq!(select.selected_index, Some(2));
    assert_eq!(select.change_events, 1);
    assert!(select.trigger_focused);
    assert!(!state.is_open());
    // The dispatched change comes back through the native listener without side effects on the count.
    select.apply(&state.native_changed(Some(2)));
    assert_eq!(select.change_events, 1);
}

#[test]
fn outside_pointer_closes_without_committing() {
    let mut state = ListboxState::new(vec![
        OptionSnapshot::new("1 day", "1"),
        OptionSnapshot::new("7 days", "7").selected(),
        OptionSnapshot::new("30 days", "30"),
    ]);
    state.open();
    state.menu_key(Key::ArrowDown);
    assert!(state.outside_pointer(true).is_empty());
    let effects = state.outside_pointer(false);
    assert!(!effects.contains(&ListboxEffect::FocusTrigger));
    assert!(effects.contains(&ListboxEffect::Unlisten));
    assert!(!state.is_open());
    assert_eq!(state.selected(), Some(1));
}

#[test]
fn repeated_open_close_cycles_never_double_subscribe() {
    let mut state = ListboxState::new(vec![OptionSnapshot::new("A", "a")]);
    let mut listeners = 0_i32;
    for _ in 0..5 {
        for effect in state.trigger_click().into_iter().chain(state.open()) {
            match effect {
                ListboxEffect::Listen => listeners += 1,
                ListboxEffect::Unlisten => listeners -= 1,
                _ => {}
            }
        }
        assert_eq!(listeners, 1);
        for effect in state.close(false).into_iter().chain(state.close(true)) {
            match effect {
                ListboxEffect::Listen => listeners += 1,
                ListboxEffect::Unlisten => listeners -= 1,
                _ => {}
            }
        }
        assert_eq!(listeners, 0);
    }
}
