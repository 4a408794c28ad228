#![forbid(unsafe_code)]
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod consent;
pub mod dom;
pub mod error;
pub mod logging;
pub mod retention_select;
pub mod test_bridge;

pub use error::WidgetError;

use fsqr_widgets::WidgetsConfig;

/// Wire both widgets into the current document.
///
/// Returns the configuration in use so callers can hand it to the test bridge.
pub fn init() -> WidgetsConfig {
    let cfg = WidgetsConfig::default_config();
    let overlay = consent::init(&cfg.consent);
    let selects = retention_select::init_all(&cfg.select);
    log::info!(
        "widgets ready: consent overlay {}, {selects} retention select(s) enhanced",
        if overlay.is_some() { "shown" } else { "skipped" },
    );
    cfg
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let test_mode = dom::test_mode_enabled();
    logging::init(if test_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
    dom::on_ready(move || {
        let cfg = init();
        if test_mode {
            test_bridge::install(&cfg);
        }
    });
}
