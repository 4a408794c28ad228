//! `window.__fsqrTest`, exposed only when the page is opened with `?test=1`.
#[cfg(target_arch = "wasm32")]
mod wasm;

use fsqr_widgets::{ConsentRecord, OverlayPhase, WidgetsConfig, find_cookie};
use serde::Serialize;

use crate::retention_select::SelectState;

#[derive(Debug, Clone, Serialize)]
pub struct ConsentState {
    pub present: bool,
    pub record: Option<ConsentRecord>,
    pub error: Option<String>,
    pub phase: Option<OverlayPhase>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeState {
    pub consent: ConsentState,
    pub selects: Vec<SelectState>,
}

/// Describe the consent cookie found in `cookie_jar`.
#[must_use]
pub fn consent_state(
    cookie_jar: &str,
    cookie_name: &str,
    phase: Option<OverlayPhase>,
) -> ConsentState {
    let raw = find_cookie(cookie_jar, cookie_name);
    let (record, error) = match raw.map(ConsentRecord::decode) {
        Some(Ok(record)) => (Some(record), None),
        Some(Err(err)) => (None, Some(err.to_string())),
        None => (None, None),
    };
    ConsentState {
        present: raw.is_some(),
        record,
        error,
        phase,
    }
}

/// Snapshot of both widgets on the current page.
#[must_use]
pub fn collect_state(cfg: &WidgetsConfig) -> BridgeState {
    let jar = crate::dom::document()
        .map(|doc| crate::dom::read_cookies(&doc))
        .unwrap_or_default();
    let phase = crate::consent::active().map(|overlay| overlay.phase());
    BridgeState {
        consent: consent_state(&jar, &cfg.consent.cookie_name, phase),
        selects: crate::retention_select::instances()
            .iter()
            .map(|select| select.state())
            .collect(),
    }
}

pub fn install(cfg: &WidgetsConfig) {
    #[cfg(target_arch = "wasm32")]
    wasm::install(cfg);
    #[cfg(not(target_arch = "wasm32"))]
    let _ = cfg;
}
