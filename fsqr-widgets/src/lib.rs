//! FSQR widgets core
//!
//! Platform-agnostic state for the cookie-consent overlay and the enhanced
//! retention select. Nothing here touches the DOM: every transition returns
//! effects that a platform binding (see `fsqr-web`) applies.

pub mod config;
pub mod consent;
pub mod listbox;

// Re-export commonly used types
pub use config::{ConfigError, ConsentConfig, SelectConfig, WidgetsConfig};
pub use consent::{
    ConsentCookie, ConsentError, ConsentRecord, ConsentView, CookieJar, NECESSARY_CATEGORY,
    OverlayAction, OverlayEffect, OverlayPhase, OverlaySession, find_cookie, has_cookie,
};
pub use listbox::{
    Key, KeyOutcome, ListboxEffect, ListboxSnapshot, ListboxState, OptionSnapshot, menu_id,
    option_id,
};

/// Whether the overlay should be shown for the given `document.cookie` string.
///
/// Any consent cookie, whatever its value, keeps the overlay hidden.
#[must_use]
pub fn overlay_required(cookie_jar: &str, cfg: &ConsentConfig) -> bool {
    !has_cookie(cookie_jar, &cfg.cookie_name)
}
