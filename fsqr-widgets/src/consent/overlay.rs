//! Consent overlay session: summary/settings navigation and teardown.
//!
//! The session never touches the DOM. Every call returns the effects the
//! caller must apply, in order.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ConsentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentView {
    Summary,
    Settings,
}

impl ConsentView {
    pub const ALL: [Self; 2] = [Self::Summary, Self::Settings];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Settings => "settings",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "summary" => Some(Self::Summary),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayAction {
    Customize,
    Back,
    Accept,
    Reject,
    /// Toggle states read from the settings view.
    Save(BTreeMap<String, bool>),
}

impl OverlayAction {
    /// Map a control's action attribute to an action. `save` is resolved by
    /// the caller since it needs the toggle states.
    #[must_use]
    pub fn from_control(name: &str) -> Option<Self> {
        match name {
            "customize" => Some(Self::Customize),
            "back" => Some(Self::Back),
            "accept" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", content = "view", rename_all = "lowercase")]
pub enum OverlayPhase {
    #[default]
    Hidden,
    Visible(ConsentView),
    /// Hidden, but the fade-out has not finished and the view marker is still set.
    Dismissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEffect {
    /// Show the container, set `aria-hidden="false"` and lock page scroll.
    Reveal,
    /// Unhide `view`, hide every other view and mark the container.
    ShowView(ConsentView),
    FocusView(ConsentView),
    Persist(ConsentRecord),
    /// Hide the container, unlock page scroll and arm the teardown.
    Conceal,
    ClearViewMarker,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlaySession {
    phase: OverlayPhase,
}

impl OverlaySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> OverlayPhase {
        self.phase
    }

    #[must_use]
    pub const fn view(&self) -> Option<ConsentView> {
        match self.phase {
            OverlayPhase::Visible(view) => Some(view),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self.phase, OverlayPhase::Visible(_))
    }

    /// Reveal the overlay on its summary view. No-op unless fully hidden.
    pub fn show(&mut self) -> Vec<OverlayEffect> {
        if self.phase != OverlayPhase::Hidden {
            return Vec::new();
        }
        self.phase = OverlayPhase::Visible(ConsentView::Summary);
        vec![
            OverlayEffect::Reveal,
            OverlayEffect::ShowView(ConsentView::Summary),
            OverlayEffect::FocusView(ConsentView::Summary),
        ]
    }

    /// Apply a user action. Actions arriving while the overlay is not visible are ignored.
    pub fn apply(&mut self, action: OverlayAction) -> Vec<OverlayEffect> {
        if !self.is_visible() {
            return Vec::new();
        }
        match action {
            OverlayAction::Customize => self.switch_to(ConsentView::Settings),
            OverlayAction::Back => self.switch_to(ConsentView::Summary),
            OverlayAction::Accept => self.dismiss(ConsentRecord::Accepted),
            OverlayAction::Reject => self.dismiss(ConsentRecord::Rejected),
            OverlayAction::Save(choices) => self.dismiss(ConsentRecord::from_categories(choices)),
        }
    }

    /// Called when the fade-out ends or the fallback timer fires; only the first call counts.
    pub fn finish_teardown(&mut self) -> Vec<OverlayEffect> {
        if self.phase != OverlayPhase::Dismissing {
            return Vec::new();
        }
        self.phase = OverlayPhase::Hidden;
        vec![OverlayEffect::ClearViewMarker]
    }

    fn switch_to(&mut self, view: ConsentView) -> Vec<OverlayEffect> {
        self.phase = OverlayPhase::Visible(view);
        vec![OverlayEffect::ShowView(view), OverlayEffect::FocusView(view)]
    }

    fn dismiss(&mut self, record: ConsentRecord) -> Vec<OverlayEffect> {
        log::debug!("consent recorded: {record}");
        self.phase = OverlayPhase::Dismissing;
        vec![OverlayEffect::Persist(record), OverlayEffect::Conceal]
    }
}
