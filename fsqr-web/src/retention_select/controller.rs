use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fsqr_widgets::{Key, KeyOutcome, ListboxEffect, ListboxState, SelectConfig};
use gloo::events::{EventListener, EventListenerOptions};
use serde::Serialize;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, EventInit, EventTarget, KeyboardEvent};

use super::render::RenderedSelect;
use crate::dom;
use crate::error::WidgetError;

/// Capture-phase listeners that exist only while the menu is open.
struct DocumentListeners {
    _pointer: EventListener,
    _keys: EventListener,
}

/// What the test bridge reports for one enhanced select.
#[derive(Debug, Clone, Serialize)]
pub struct SelectState {
    pub id: String,
    pub open: bool,
    pub active: usize,
    pub selected: Option<usize>,
    pub value: Option<String>,
    pub listening: bool,
}

/// One enhanced select: DOM handles plus its own listbox state.
pub struct RetentionSelect {
    doc: Document,
    view: RenderedSelect,
    cfg: SelectConfig,
    state: RefCell<ListboxState>,
    listeners: RefCell<Vec<EventListener>>,
    document_listeners: RefCell<Option<DocumentListeners>>,
}

impl RetentionSelect {
    pub(super) fn new(
        doc: Document,
        view: RenderedSelect,
        cfg: SelectConfig,
        state: ListboxState,
    ) -> Rc<Self> {
        Rc::new(Self {
            doc,
            view,
            cfg,
            state: RefCell::new(state),
            listeners: RefCell::new(Vec::new()),
            document_listeners: RefCell::new(None),
        })
    }

    #[must_use]
    pub fn state(&self) -> SelectState {
        let state = self.state.borrow();
        let snapshot = state.snapshot();
        SelectState {
            id: self.view.native.id(),
            open: snapshot.open,
            active: snapshot.active,
            selected: snapshot.selected,
            value: state.selected_option().map(|opt| opt.value.clone()),
            listening: snapshot.listening,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    /// Close the menu programmatically; a no-op when already closed.
    pub fn close(self: &Rc<Self>, focus_trigger: bool) {
        let effects = self.state.borrow_mut().close(focus_trigger);
        self.apply_all(&effects);
    }

    pub(super) fn sync_initial(self: &Rc<Self>) {
        let native_index = usize::try_from(self.view.native.selected_index()).ok();
        let effects = self.state.borrow().initial_effects(native_index);
        self.apply_all(&effects);
    }

    pub(super) fn bind(self: &Rc<Self>) {
        let mut listeners = Vec::with_capacity(4 + self.view.items.len() * 2);

        listeners.push(self.listen(&self.view.trigger, "click", |this, _| {
            let effects = this.state.borrow_mut().trigger_click();
            this.apply_all(&effects);
        }));

        listeners.push(self.listen_keys(&self.view.trigger, |this, key| {
            this.state.borrow_mut().trigger_key(key)
        }));

        listeners.push(self.listen_keys(&self.view.menu, |this, key| {
            this.state.borrow_mut().menu_key(key)
        }));

        listeners.push(self.listen(&self.view.native, "change", |this, _| {
            let index = usize::try_from(this.view.native.selected_index()).ok();
            let effects = this.state.borrow_mut().native_changed(index);
            this.apply_all(&effects);
        }));

        for (index, item) in self.view.items.iter().enumerate() {
            listeners.push(self.listen(item, "click", move |this, event| {
                event.prevent_default();
                let effects = this.state.borrow_mut().option_click(index);
                this.apply_all(&effects);
            }));
            listeners.push(self.listen(item, "mouseenter", move |this, _| {
                let effects = this.state.borrow_mut().option_hover(index);
                this.apply_all(&effects);
            }));
        }

        self.listeners.borrow_mut().extend(listeners);
    }

    fn listen<F>(
        self: &Rc<Self>,
        target: &EventTarget,
        event: &'static str,
        handler: F,
    ) -> EventListener
    where
        F: Fn(&Rc<Self>, &Event) + 'static,
    {
        let weak = Rc::downgrade(self);
        EventListener::new_with_options(
            target,
            event,
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                if let Some(this) = weak.upgrade() {
                    handler(&this, event);
                }
            },
        )
    }

    fn listen_keys<F>(self: &Rc<Self>, target: &EventTarget, handler: F) -> EventListener
    where
        F: Fn(&Rc<Self>, Key) -> KeyOutcome + 'static,
    {
        self.listen(target, "keydown", move |this, event| {
            let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let outcome = handler(this, Key::from_key(&key_event.key()));
            if outcome.prevent_default {
                event.prevent_default();
            }
            this.apply_all(&outcome.effects);
        })
    }

    fn subscribe_document(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let pointer = document_listener(&self.doc, "pointerdown", weak.clone(), |this, event| {
            let inside = dom::event_within(event, &this.view.wrapper);
            let effects = this.state.borrow_mut().outside_pointer(inside);
            this.apply_all(&effects);
        });
        let keys = document_listener(&self.doc, "keydown", weak, |this, event| {
            let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let inside = dom::event_within(event, &this.view.wrapper);
            let key = Key::from_key(&key_event.key());
            let effects = this.state.borrow_mut().document_key(key, inside);
            this.apply_all(&effects);
        });
        self.document_listeners.replace(Some(DocumentListeners {
            _pointer: pointer,
            _keys: keys,
        }));
    }

    fn apply_all(self: &Rc<Self>, effects: &[ListboxEffect]) {
        for effect in effects {
            if let Err(err) = self.apply(*effect) {
                log::warn!("retention select update failed: {err}");
            }
        }
    }

    fn apply(self: &Rc<Self>, effect: ListboxEffect) -> Result<(), WidgetError> {
        let view = &self.view;
        match effect {
            ListboxEffect::Expand => {
                view.wrapper.class_list().add_1(&self.cfg.open_class)?;
                view.trigger.set_attribute("aria-expanded", "true")?;
            }
            ListboxEffect::Collapse => {
                view.wrapper.class_list().remove_1(&self.cfg.open_class)?;
                view.trigger.set_attribute("aria-expanded", "false")?;
            }
            ListboxEffect::Listen => self.subscribe_document(),
            ListboxEffect::Unlisten => {
                self.document_listeners.take();
            }
            ListboxEffect::Highlight { index, focus } => {
                let Some(item) = view.items.get(index) else {
                    return Ok(());
                };
                for other in &view.items {
                    other.class_list().remove_1(&self.cfg.active_class)?;
                }
                item.class_list().add_1(&self.cfg.active_class)?;
                view.menu.set_attribute("aria-activedescendant", &item.id())?;
                if focus {
                    dom::focus_quietly(item);
                    dom::scroll_nearest(item);
                }
            }
            ListboxEffect::Commit { index } => {
                let index = i32::try_from(index)
                    .map_err(|_| WidgetError::Dom(format!("option index {index} out of range")))?;
                view.native.set_selected_index(index);
            }
            ListboxEffect::Notify => {
                let init = EventInit::new();
                init.set_bubbles(true);
                let change = Event::new_with_event_init_dict("change", &init)?;
                view.native.dispatch_event(&change)?;
            }
            ListboxEffect::Reflect { index } => {
                let label = self
                    .state
                    .borrow()
                    .options()
                    .get(index)
                    .map(|opt| opt.label.clone())
                    .unwrap_or_default();
                view.trigger.set_text_content(Some(&label));
                for (idx, item) in view.items.iter().enumerate() {
                    if idx == index {
                        item.class_list().add_1(&self.cfg.selected_class)?;
                        item.set_attribute("aria-selected", "true")?;
                    } else {
                        item.class_list().remove_1(&self.cfg.selected_class)?;
                        item.remove_attribute("aria-selected")?;
                    }
                }
            }
            ListboxEffect::FocusTrigger => dom::focus_quietly(&view.trigger),
        }
        Ok(())
    }
}

fn document_listener<F>(
    doc: &Document,
    event: &'static str,
    weak: Weak<RetentionSelect>,
    handler: F,
) -> EventListener
where
    F: Fn(&Rc<RetentionSelect>, &Event) + 'static,
{
    EventListener::new_with_options(
        doc,
        event,
        EventListenerOptions::run_in_capture_phase(),
        move |event| {
            if let Some(this) = weak.upgrade() {
                handler(&this, event);
            }
        },
    )
}
