//! Widget configuration: DOM markers, class names and cookie settings
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_WIDGETS_DATA: &str =
    include_str!("../../fsqr-web/static/assets/data/widgets.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{section}.{field} must not be empty")]
    EmptyField {
        section: &'static str,
        field: &'static str,
    },
    #[error("consent.duration_days must be at least 1 (got {0})")]
    ZeroDuration(u32),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WidgetsConfig {
    #[serde(default)]
    pub consent: ConsentConfig,
    #[serde(default)]
    pub select: SelectConfig,
}

/// Markers and cookie settings for the consent overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    pub overlay_id: String,
    pub cookie_name: String,
    pub duration_days: u32,
    pub action_attr: String,
    pub category_attr: String,
    pub focus_attr: String,
    pub view_attr: String,
    pub active_view_attr: String,
    pub visible_class: String,
    pub teardown_fallback_ms: u32,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            overlay_id: String::from("cookieConsent"),
            cookie_name: String::from("fsqr_cookie_consent"),
            duration_days: 365,
            action_attr: String::from("data-cookie-consent"),
            category_attr: String::from("data-cookie-category"),
            focus_attr: String::from("data-cookie-consent-focus"),
            view_attr: String::from("data-cookie-consent-view"),
            active_view_attr: String::from("data-active-view"),
            visible_class: String::from("is-visible"),
            teardown_fallback_ms: 400,
        }
    }
}

impl ConsentConfig {
    /// Selector for one of the overlay's action controls (`accept`, `reject`, ...).
    #[must_use]
    pub fn action_selector(&self, action: &str) -> String {
        format!("[{}=\"{action}\"]", self.action_attr)
    }

    #[must_use]
    pub fn category_selector(&self) -> String {
        format!("input[{}]", self.category_attr)
    }

    #[must_use]
    pub fn focus_selector(&self) -> String {
        format!("[{}]", self.focus_attr)
    }

    #[must_use]
    pub fn view_selector(&self) -> String {
        format!("[{}]", self.view_attr)
    }
}

/// Markers and class names for the enhanced retention select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    pub wrapper_attr: String,
    pub enhanced_attr: String,
    pub enhanced_class: String,
    pub open_class: String,
    pub active_class: String,
    pub selected_class: String,
    pub trigger_class: String,
    pub menu_class: String,
    pub option_class: String,
    pub arrow_class: String,
    pub fallback_id: String,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            wrapper_attr: String::from("data-retention-select"),
            enhanced_attr: String::from("data-retention-enhanced"),
            enhanced_class: String::from("is-enhanced"),
            open_class: String::from("is-open"),
            active_class: String::from("is-active"),
            selected_class: String::from("is-selected"),
            trigger_class: String::from("retention-select-trigger"),
            menu_class: String::from("retention-select-menu"),
            option_class: String::from("retention-select-option"),
            arrow_class: String::from("retention-select-arrow"),
            fallback_id: String::from("retention"),
        }
    }
}

impl SelectConfig {
    #[must_use]
    pub fn wrapper_selector(&self) -> String {
        format!("[{}]", self.wrapper_attr)
    }

    #[must_use]
    pub fn arrow_selector(&self) -> String {
        format!(".{}", self.arrow_class)
    }
}

impl WidgetsConfig {
    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a required marker is empty.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_WIDGETS_DATA).unwrap_or_else(|err| {
            log::warn!("embedded widgets.json rejected ({err}); using built-in defaults");
            Self::default()
        })
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self::load_from_static()
    }

    /// Check that every marker the DOM bindings rely on is present.
    ///
    /// # Errors
    ///
    /// Returns the first empty marker or a zero cookie lifetime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let consent = [
            ("overlay_id", &self.consent.overlay_id),
            ("cookie_name", &self.consent.cookie_name),
            ("action_attr", &self.consent.action_attr),
            ("category_attr", &self.consent.category_attr),
            ("focus_attr", &self.consent.focus_attr),
            ("view_attr", &self.consent.view_attr),
            ("active_view_attr", &self.consent.active_view_attr),
            ("visible_class", &self.consent.visible_class),
        ];
        let select = [
            ("wrapper_attr", &self.select.wrapper_attr),
            ("enhanced_attr", &self.select.enhanced_attr),
            ("enhanced_class", &self.select.enhanced_class),
            ("open_class", &self.select.open_class),
            ("active_class", &self.select.active_class),
            ("selected_class", &self.select.selected_class),
            ("trigger_class", &self.select.trigger_class),
            ("menu_class", &self.select.menu_class),
            ("option_class", &self.select.option_class),
            ("arrow_class", &self.select.arrow_class),
            ("fallback_id", &self.select.fallback_id),
        ];
        for (field, value) in consent {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField {
                    section: "consent",
                    field,
                });
            }
        }
        for (field, value) in select {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField {
                    section: "select",
                    field,
                });
            }
        }
        if self.consent.duration_days == 0 {
            return Err(ConfigError::ZeroDuration(self.consent.duration_days));
        }
        Ok(())
    }
}
