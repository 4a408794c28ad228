use serde::Serialize;

use super::navigation::{Direction, first_enabled, last_enabled, resolve_initial, step_enabled};
use super::{Key, OptionSnapshot};

/// DOM work requested by a [`ListboxState`] transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListboxEffect {
    /// Add the open class and set `aria-expanded="true"`.
    Expand,
    /// Remove the open class and set `aria-expanded="false"`.
    Collapse,
    /// Install the document-level outside-pointer and Tab listeners.
    Listen,
    /// Remove the document-level listeners.
    Unlisten,
    /// Move `is-active` / `aria-activedescendant`; optionally focus the option.
    Highlight { index: usize, focus: bool },
    /// Write `selectedIndex` on the native select.
    Commit { index: usize },
    /// Update the trigger label and the single selected item.
    Reflect { index: usize },
    /// Dispatch a bubbling `change` on the native select.
    Notify,
    FocusTrigger,
}

/// Result of a keydown: effects plus whether the browser default must be suppressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    pub effects: Vec<ListboxEffect>,
    pub prevent_default: bool,
}

impl KeyOutcome {
    const fn handled(effects: Vec<ListboxEffect>) -> Self {
        Self {
            effects,
            prevent_default: true,
        }
    }

    const fn passthrough(effects: Vec<ListboxEffect>) -> Self {
        Self {
            effects,
            prevent_default: false,
        }
    }
}

/// Observable state, as exposed to the test bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListboxSnapshot {
    pub open: bool,
    pub active: usize,
    pub selected: Option<usize>,
    pub listening: bool,
}

/// Open/closed state machine for one enhanced select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListboxState {
    options: Vec<OptionSnapshot>,
    open: bool,
    active: usize,
    selected: Option<usize>,
    listening: bool,
}

impl ListboxState {
    #[must_use]
    pub fn new(options: Vec<OptionSnapshot>) -> Self {
        let active = resolve_initial(&options);
        let selected = (!options.is_empty()).then_some(active);
        Self {
            options,
            open: false,
            active,
            selected,
            listening: false,
        }
    }

    #[must_use]
    pub fn options(&self) -> &[OptionSnapshot] {
        &self.options
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub const fn active(&self) -> usize {
        self.active
    }

    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub const fn snapshot(&self) -> ListboxSnapshot {
        ListboxSnapshot {
            open: self.open,
            active: self.active,
            selected: self.selected,
            listening: self.listening,
        }
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<&OptionSnapshot> {
        self.selected.and_then(|idx| self.options.get(idx))
    }

    fn is_selectable(&self, index: usize) -> bool {
        self.options.get(index).is_some_and(OptionSnapshot::is_enabled)
    }

    /// Effects that bring a freshly built widget in line with the resolved selection.
    ///
    /// When the native select points elsewhere (a disabled selection, say) it
    /// is corrected silently before anything is rendered.
    #[must_use]
    pub fn initial_effects(&self, native_index: Option<usize>) -> Vec<ListboxEffect> {
        let Some(index) = self.selected else {
            return Vec::new();
        };
        let mut effects = Vec::with_capacity(3);
        if native_index != Some(index) {
            effects.push(ListboxEffect::Commit { index });
        }
        effects.push(ListboxEffect::Reflect { index });
        if self.is_selectable(index) {
            effects.push(ListboxEffect::Highlight {
                index,
                focus: false,
            });
        }
        effects
    }

    pub fn open(&mut self) -> Vec<ListboxEffect> {
        if self.open {
            return Vec::new();
        }
        self.open = true;
        let mut effects = vec![ListboxEffect::Expand];
        effects.extend(self.highlight(self.active, true));
        if !self.listening {
            self.listening = true;
            effects.push(ListboxEffect::Listen);
        }
        effects
    }

    pub fn close(&mut self, focus_trigger: bool) -> Vec<ListboxEffect> {
        if !self.open {
            return Vec::new();
        }
        self.open = false;
        let mut effects = vec![ListboxEffect::Collapse];
        if self.listening {
            self.listening = false;
            effects.push(ListboxEffect::Unlisten);
        }
        if focus_trigger {
            effects.push(ListboxEffect::FocusTrigger);
        }
        effects
    }

    pub fn toggle(&mut self) -> Vec<ListboxEffect> {
        if self.open {
            self.close(false)
        } else {
            self.open()
        }
    }

    /// Move the highlight; disabled or unknown indexes are ignored.
    pub fn highlight(&mut self, index: usize, focus: bool) -> Vec<ListboxEffect> {
        if !self.is_selectable(index) {
            return Vec::new();
        }
        self.active = index;
        vec![ListboxEffect::Highlight { index, focus }]
    }

    /// Commit `index` as the selection: native control, then the rendered
    /// layer, and `change` only once both agree.
    pub fn commit(&mut self, index: usize, close_after: bool) -> Vec<ListboxEffect> {
        if !self.is_selectable(index) {
            return Vec::new();
        }
        self.selected = Some(index);
        self.active = index;
        let mut effects = vec![
            ListboxEffect::Commit { index },
            ListboxEffect::Reflect { index },
            ListboxEffect::Highlight {
                index,
                focus: false,
            },
            ListboxEffect::Notify,
        ];
        if close_after {
            effects.extend(self.close(true));
        }
        effects
    }

    fn step(&mut self, direction: Direction) -> Vec<ListboxEffect> {
        step_enabled(&self.options, self.active, direction)
            .map(|idx| self.highlight(idx, true))
            .unwrap_or_default()
    }

    pub fn trigger_click(&mut self) -> Vec<ListboxEffect> {
        self.toggle()
    }

    pub fn trigger_key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::ArrowDown | Key::ArrowUp => {
                let mut effects = self.open();
                let direction = if key == Key::ArrowDown {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                effects.extend(self.step(direction));
                KeyOutcome::handled(effects)
            }
            Key::Enter | Key::Space => KeyOutcome::handled(self.toggle()),
            Key::Escape => KeyOutcome::handled(self.close(false)),
            Key::Home | Key::End | Key::Tab | Key::Other => KeyOutcome::default(),
        }
    }

    pub fn menu_key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::ArrowDown => KeyOutcome::handled(self.step(Direction::Forward)),
            Key::ArrowUp => KeyOutcome::handled(self.step(Direction::Backward)),
            Key::Home => KeyOutcome::handled(
                first_enabled(&self.options)
                    .map(|idx| self.highlight(idx, true))
                    .unwrap_or_default(),
            ),
            Key::End => KeyOutcome::handled(
                last_enabled(&self.options)
                    .map(|idx| self.highlight(idx, true))
                    .unwrap_or_default(),
            ),
            Key::Enter | Key::Space => KeyOutcome::handled(self.commit(self.active, true)),
            Key::Escape => KeyOutcome::handled(self.close(true)),
            Key::Tab => KeyOutcome::passthrough(self.close(false)),
            Key::Other => KeyOutcome::default(),
        }
    }

    pub fn option_click(&mut self, index: usize) -> Vec<ListboxEffect> {
        self.commit(index, true)
    }

    pub fn option_hover(&mut self, index: usize) -> Vec<ListboxEffect> {
        self.highlight(index, false)
    }

    /// Document-level pointer-down while open.
    pub fn outside_pointer(&mut self, inside_widget: bool) -> Vec<ListboxEffect> {
        if inside_widget {
            return Vec::new();
        }
        self.close(false)
    }

    /// Document-level keydown while open; only Tab outside the widget closes.
    pub fn document_key(&mut self, key: Key, inside_widget: bool) -> Vec<ListboxEffect> {
        if key != Key::Tab || inside_widget {
            return Vec::new();
        }
        self.close(false)
    }

    /// The native select changed; follow it unless it points at nothing or a disabled option.
    pub fn native_changed(&mut self, index: Option<usize>) -> Vec<ListboxEffect> {
        let Some(index) = index.filter(|&idx| self.is_selectable(idx)) else {
            return Vec::new();
        };
        self.selected = Some(index);
        self.active = index;
        vec![
            ListboxEffect::Reflect { index },
            ListboxEffect::Highlight {
                index,
                focus: false,
            },
        ]
    }
}
