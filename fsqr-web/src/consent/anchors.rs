use std::collections::BTreeMap;

use fsqr_widgets::{ConsentConfig, ConsentView};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlInputElement};

use crate::dom::query_all;
use crate::error::WidgetError;

/// Elements of the host page the overlay works with.
pub(super) struct OverlayAnchors {
    pub overlay: HtmlElement,
    pub controls: Vec<(String, HtmlElement)>,
    pub toggles: Vec<(String, HtmlInputElement)>,
    pub views: Vec<(ConsentView, Element)>,
    pub summary_focus: Option<HtmlElement>,
    pub settings_focus: Option<HtmlElement>,
}

const OPTIONAL_CONTROLS: [&str; 4] = ["reject", "customize", "back", "save"];

impl OverlayAnchors {
    /// Look up every anchor; `Ok(None)` when the required accept control is missing.
    pub fn collect(overlay: &Element, cfg: &ConsentConfig) -> Result<Option<Self>, WidgetError> {
        let overlay: HtmlElement = overlay
            .clone()
            .dyn_into()
            .map_err(|_| WidgetError::WrongElement("HTMLElement"))?;

        let Some(accept) = find_html(&overlay, &cfg.action_selector("accept"))? else {
            return Ok(None);
        };
        let mut controls = vec![(String::from("accept"), accept)];
        for name in OPTIONAL_CONTROLS {
            if let Some(control) = find_html(&overlay, &cfg.action_selector(name))? {
                controls.push((name.to_string(), control));
            }
        }

        let toggles = query_all(&overlay, &cfg.category_selector())?
            .into_iter()
            .filter_map(|el| {
                let name = el.get_attribute(&cfg.category_attr)?;
                let input = el.dyn_into::<HtmlInputElement>().ok()?;
                (!name.trim().is_empty()).then(|| (name.trim().to_string(), input))
            })
            .collect();

        let views = query_all(&overlay, &cfg.view_selector())?
            .into_iter()
            .filter_map(|el| {
                let view = ConsentView::parse(&el.get_attribute(&cfg.view_attr)?)?;
                Some((view, el))
            })
            .collect();

        let mut summary_focus = None;
        let mut settings_focus = None;
        for el in query_all(&overlay, &cfg.focus_selector())? {
            let Ok(el) = el.dyn_into::<HtmlElement>() else {
                continue;
            };
            // A bare attribute marks the summary target.
            let view = el
                .get_attribute(&cfg.focus_attr)
                .and_then(|raw| ConsentView::parse(&raw))
                .unwrap_or(ConsentView::Summary);
            let slot = match view {
                ConsentView::Summary => &mut summary_focus,
                ConsentView::Settings => &mut settings_focus,
            };
            if slot.is_none() {
                *slot = Some(el);
            }
        }

        Ok(Some(Self {
            overlay,
            controls,
            toggles,
            views,
            summary_focus,
            settings_focus,
        }))
    }

    /// Where focus goes when `view` is shown.
    pub fn focus_target(&self, view: ConsentView) -> Option<HtmlElement> {
        match view {
            ConsentView::Summary => self.summary_focus.clone(),
            ConsentView::Settings => self.settings_focus.clone().or_else(|| {
                self.toggles
                    .first()
                    .map(|(_, input)| input.clone().unchecked_into())
            }),
        }
    }

    /// Checked state of every category toggle.
    pub fn choices(&self) -> BTreeMap<String, bool> {
        self.toggles
            .iter()
            .map(|(name, input)| (name.clone(), input.checked()))
            .collect()
    }
}

fn find_html(root: &Element, selector: &str) -> Result<Option<HtmlElement>, WidgetError> {
    Ok(root
        .query_selector(selector)?
        .and_then(|el| el.dyn_into::<HtmlElement>().ok()))
}
