//! Listbox model behind the retention select.
//!
//! The native `<select>` stays the source of truth; this module keeps the
//! snapshot of its options and the open/active/selected state of the custom
//! widget, and turns pointer and keyboard input into [`ListboxEffect`]s.

use serde::{Deserialize, Serialize};

pub mod keys;
pub mod navigation;
pub mod state;

pub use keys::Key;
pub use navigation::{Direction, first_enabled, last_enabled, resolve_initial, step_enabled};
pub use state::{KeyOutcome, ListboxEffect, ListboxSnapshot, ListboxState};

/// One native `<option>`, captured once at enhancement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OptionSnapshot {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub selected: bool,
}

impl OptionSnapshot {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            disabled: false,
            selected: false,
        }
    }

    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub const fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

/// `<select id or fallback>-menu-<6 base-36 chars>`; `entropy` picks the suffix.
#[must_use]
pub fn menu_id(select_id: Option<&str>, fallback: &str, entropy: u64) -> String {
    let base = select_id.filter(|id| !id.is_empty()).unwrap_or(fallback);
    let mut suffix = [b'0'; SUFFIX_LEN];
    let mut rest = entropy;
    for slot in suffix.iter_mut().rev() {
        *slot = BASE36[(rest % 36) as usize];
        rest /= 36;
    }
    format!("{base}-menu-{}", String::from_utf8_lossy(&suffix))
}

#[must_use]
pub fn option_id(menu_id: &str, index: usize) -> String {
    format!("{menu_id}-option-{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_id_prefers_select_id() {
        assert_eq!(menu_id(Some("retention_days"), "retention", 0), "retention_days-menu-000000");
        assert_eq!(menu_id(Some(""), "retention", 35), "retention-menu-00000z");
        assert_eq!(menu_id(None, "retention", 36), "retention-menu-000010");
    }

    #[test]
    fn option_ids_are_indexed_under_menu() {
        assert_eq!(option_id("m-menu-abc123", 2), "m-menu-abc123-option-2");
    }
}
