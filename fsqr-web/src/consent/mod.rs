//! Cookie-consent overlay bound to the host page's `#cookieConsent` markup.
use std::cell::RefCell;
use std::rc::Rc;

use fsqr_widgets::{
    ConsentConfig, ConsentCookie, ConsentView, OverlayAction, OverlayEffect, OverlayPhase,
    OverlaySession, overlay_required,
};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use web_sys::{Document, EventTarget};

use crate::dom;
use crate::error::WidgetError;

mod anchors;

use anchors::OverlayAnchors;

thread_local! {
    static ACTIVE: RefCell<Option<Rc<ConsentOverlay>>> = const { RefCell::new(None) };
}

/// Keeps the fade-out watchers alive until one of them finishes the teardown.
struct Teardown {
    _transition: EventListener,
    _fallback: Timeout,
}

pub struct ConsentOverlay {
    doc: Document,
    anchors: OverlayAnchors,
    cfg: ConsentConfig,
    cookie: ConsentCookie,
    session: RefCell<OverlaySession>,
    listeners: RefCell<Vec<EventListener>>,
    teardown: RefCell<Option<Teardown>>,
}

/// Show the overlay unless consent was already given.
///
/// Returns `None` when the page has no overlay, a consent cookie exists, or
/// the accept control is missing.
pub fn init(cfg: &ConsentConfig) -> Option<Rc<ConsentOverlay>> {
    let doc = dom::document()?;
    let Some(overlay) = doc.get_element_by_id(&cfg.overlay_id) else {
        log::debug!("no #{} on this page", cfg.overlay_id);
        return None;
    };
    if !overlay_required(&dom::read_cookies(&doc), cfg) {
        log::debug!("consent cookie present; overlay stays hidden");
        return None;
    }
    let anchors = match OverlayAnchors::collect(&overlay, cfg) {
        Ok(Some(anchors)) => anchors,
        Ok(None) => {
            log::debug!("consent overlay has no accept control");
            return None;
        }
        Err(err) => {
            log::warn!("consent overlay skipped: {err}");
            return None;
        }
    };

    let controller = Rc::new(ConsentOverlay {
        doc,
        anchors,
        cfg: cfg.clone(),
        cookie: ConsentCookie::new(cfg),
        session: RefCell::new(OverlaySession::new()),
        listeners: RefCell::new(Vec::new()),
        teardown: RefCell::new(None),
    });
    controller.bind_controls();
    let effects = controller.session.borrow_mut().show();
    controller.apply_all(effects);
    ACTIVE.with(|slot| slot.replace(Some(Rc::clone(&controller))));
    Some(controller)
}

/// The overlay wired up on this page, if any.
#[must_use]
pub fn active() -> Option<Rc<ConsentOverlay>> {
    ACTIVE.with(|slot| slot.borrow().clone())
}

impl ConsentOverlay {
    #[must_use]
    pub fn phase(&self) -> OverlayPhase {
        self.session.borrow().phase()
    }

    /// Run a user action through the session and apply the outcome.
    pub fn perform(self: &Rc<Self>, action: OverlayAction) {
        let effects = self.session.borrow_mut().apply(action);
        self.apply_all(effects);
    }

    fn bind_controls(self: &Rc<Self>) {
        let mut listeners = Vec::with_capacity(self.anchors.controls.len());
        for (name, control) in &self.anchors.controls {
            let weak = Rc::downgrade(self);
            let name = name.clone();
            listeners.push(EventListener::new(control, "click", move |_| {
                let Some(this) = weak.upgrade() else {
                    return;
                };
                let action = if name == "save" {
                    Some(OverlayAction::Save(this.anchors.choices()))
                } else {
                    OverlayAction::from_control(&name)
                };
                if let Some(action) = action {
                    this.perform(action);
                }
            }));
        }
        self.listeners.borrow_mut().extend(listeners);
    }

    fn apply_all(self: &Rc<Self>, effects: Vec<OverlayEffect>) {
        for effect in effects {
            if let Err(err) = self.apply(effect) {
                log::warn!("consent overlay update failed: {err}");
            }
        }
    }

    fn apply(self: &Rc<Self>, effect: OverlayEffect) -> Result<(), WidgetError> {
        let overlay = &self.anchors.overlay;
        match effect {
            OverlayEffect::Reveal => {
                overlay.class_list().add_1(&self.cfg.visible_class)?;
                overlay.set_attribute("aria-hidden", "false")?;
                if let Some(body) = self.doc.body() {
                    body.style().set_property("overflow", "hidden")?;
                }
            }
            OverlayEffect::ShowView(target) => {
                for (view, el) in &self.anchors.views {
                    if *view == target {
                        el.remove_attribute("hidden")?;
                        el.set_attribute("aria-hidden", "false")?;
                    } else {
                        el.set_attribute("hidden", "")?;
                        el.set_attribute("aria-hidden", "true")?;
                    }
                }
                overlay.set_attribute(&self.cfg.active_view_attr, target.as_str())?;
            }
            OverlayEffect::FocusView(view) => {
                if let Some(target) = self.anchors.focus_target(view) {
                    dom::focus_quietly(&target);
                }
            }
            OverlayEffect::Persist(record) => {
                let assignment = self.cookie.header(&record, dom::now_utc());
                dom::write_cookie(&self.doc, &assignment);
            }
            OverlayEffect::Conceal => {
                overlay.class_list().remove_1(&self.cfg.visible_class)?;
                overlay.set_attribute("aria-hidden", "true")?;
                if let Some(body) = self.doc.body() {
                    body.style().remove_property("overflow")?;
                }
                self.arm_teardown();
            }
            OverlayEffect::ClearViewMarker => {
                overlay.remove_attribute(&self.cfg.active_view_attr)?;
            }
        }
        Ok(())
    }

    /// Clear the view marker after the fade-out, or after the fallback delay
    /// if `transitionend` never arrives. The session ignores the second call.
    fn arm_teardown(self: &Rc<Self>) {
        let on_end = {
            let weak = Rc::downgrade(self);
            let overlay_target: EventTarget = self.anchors.overlay.clone().into();
            EventListener::new(&self.anchors.overlay, "transitionend", move |event| {
                // Transitions of child elements bubble up; only the overlay's own fade counts.
                if event.target().as_ref() != Some(&overlay_target) {
                    return;
                }
                if let Some(this) = weak.upgrade() {
                    this.finish_teardown();
                }
            })
        };
        let fallback = {
            let weak = Rc::downgrade(self);
            Timeout::new(self.cfg.teardown_fallback_ms, move || {
                if let Some(this) = weak.upgrade() {
                    this.finish_teardown();
                }
            })
        };
        self.teardown.replace(Some(Teardown {
            _transition: on_end,
            _fallback: fallback,
        }));
    }

    fn finish_teardown(self: &Rc<Self>) {
        let effects = self.session.borrow_mut().finish_teardown();
        self.apply_all(effects);
    }

    /// The view currently on screen, if the overlay is visible.
    #[must_use]
    pub fn view(&self) -> Option<ConsentView> {
        self.session.borrow().view()
    }
}
