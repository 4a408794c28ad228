use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use chrono::Utc;
use fsqr_widgets::{
    ConsentCookie, ConsentRecord, ConsentView, CookieJar, OverlayAction, OverlayEffect,
    OverlayPhase, OverlaySession, WidgetsConfig, find_cookie, overlay_required,
};
use thirtyfour::prelude::*;

use super::{BrowserScenario, CombinedScenario, ScenarioCtx, TestScenario};

const OVERLAY: &str = "#cookieConsent";
const ACTIVE_VIEW: &str = "data-active-view";

fn control(name: &str) -> String {
    format!("{OVERLAY} [data-cookie-consent=\"{name}\"]")
}

fn view(name: &str) -> String {
    format!("{OVERLAY} [data-cookie-consent-view=\"{name}\"]")
}

/// Play an overlay session against `jar`; `None` when the overlay would stay hidden.
fn play(jar: &mut CookieJar, actions: Vec<OverlayAction>) -> Option<OverlaySession> {
    let cfg = WidgetsConfig::default_config();
    if !overlay_required(&jar.to_document_string(), &cfg.consent) {
        return None;
    }
    let cookie = ConsentCookie::new(&cfg.consent);
    let now = Utc::now();
    let mut session = OverlaySession::new();
    session.show();
    for action in actions {
        for effect in session.apply(action) {
            if let OverlayEffect::Persist(record) = effect {
                jar.store(&cookie.header(&record, now), now);
            }
        }
    }
    Some(session)
}

fn stored(jar: &CookieJar) -> Result<ConsentRecord> {
    let cfg = WidgetsConfig::default_config();
    let document_cookie = jar.to_document_string();
    let raw = find_cookie(&document_cookie, &cfg.consent.cookie_name)
        .context("consent cookie was not written")?;
    Ok(ConsentRecord::decode(raw)?)
}

pub struct CookieIdempotence;

fn cookie_idempotence_check() -> Result<()> {
    let choices = [
        OverlayAction::Accept,
        OverlayAction::Reject,
        OverlayAction::Save(BTreeMap::new()),
    ];
    for action in choices {
        let label = format!("{action:?}");
        let mut jar = CookieJar::default();
        ensure!(
            play(&mut jar, vec![action]).is_some(),
            "overlay must show on first visit ({label})"
        );
        ensure!(
            play(&mut jar, Vec::new()).is_none(),
            "overlay must stay hidden once {label} was stored"
        );
    }
    Ok(())
}

#[async_trait::async_trait]
impl BrowserScenario for CookieIdempotence {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        ctx.fresh_page(driver).await?;
        ensure!(
            ctx.bridge.has_class(OVERLAY, "is-visible").await?,
            "overlay should be visible without a cookie"
        );

        ctx.bridge.click(&control("accept")).await?;
        let state = ctx.bridge.state().await?;
        ensure!(
            state.consent.record == Some(ConsentRecord::Accepted),
            "expected an accepted record, got {:?}",
            state.consent.record
        );
        ctx.note("🍪 accepted; reloading");

        ctx.reload(driver).await?;
        ensure!(
            !ctx.bridge.has_class(OVERLAY, "is-visible").await?,
            "overlay reappeared although consent was stored"
        );
        let state = ctx.bridge.state().await?;
        ensure!(
            state.consent.present && state.consent.error.is_none(),
            "stored cookie should still decode after reload: {:?}",
            state.consent
        );
        Ok(())
    }
}

impl CombinedScenario for CookieIdempotence {
    fn name(&self) -> &'static str {
        "Cookie Idempotence"
    }

    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario {
            name: self.name().to_string(),
            check: cookie_idempotence_check,
        })
    }
}

pub struct CustomizeRoundtrip;

fn expected_categories() -> BTreeMap<String, bool> {
    [("necessary", true), ("analytics", true), ("marketing", false)]
        .into_iter()
        .map(|(name, on)| (name.to_string(), on))
        .collect()
}

fn customize_roundtrip_check() -> Result<()> {
    let mut jar = CookieJar::default();
    let choices = [("analytics", true), ("marketing", false)]
        .into_iter()
        .map(|(name, on)| (name.to_string(), on))
        .collect();
    play(
        &mut jar,
        vec![OverlayAction::Customize, OverlayAction::Save(choices)],
    )
    .context("overlay should show")?;
    let record = stored(&jar)?;
    ensure!(
        record == ConsentRecord::Categories(expected_categories()),
        "unexpected stored record {record:?}"
    );
    Ok(())
}

#[async_trait::async_trait]
impl BrowserScenario for CustomizeRoundtrip {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        ctx.fresh_page(driver).await?;
        ctx.bridge.click(&control("customize")).await?;
        ctx.bridge
            .click(&format!("{OVERLAY} [data-cookie-category=\"analytics\"]"))
            .await?;
        ctx.bridge.click(&control("save")).await?;

        let state = ctx.bridge.state().await?;
        ensure!(
            state.consent.record == Some(ConsentRecord::Categories(expected_categories())),
            "unexpected stored record {:?}",
            state.consent.record
        );
        Ok(())
    }
}

impl CombinedScenario for CustomizeRoundtrip {
    fn name(&self) -> &'static str {
        "Customize Roundtrip"
    }

    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario {
            name: self.name().to_string(),
            check: customize_roundtrip_check,
        })
    }
}

pub struct ViewTransitions;

fn view_transitions_check() -> Result<()> {
    let mut session = OverlaySession::new();
    session.show();
    let effects = session.apply(OverlayAction::Customize);
    ensure!(
        effects.contains(&OverlayEffect::ShowView(ConsentView::Settings))
            && effects.contains(&OverlayEffect::FocusView(ConsentView::Settings)),
        "customize must show and focus settings, got {effects:?}"
    );
    let effects = session.apply(OverlayAction::Back);
    ensure!(
        effects.contains(&OverlayEffect::ShowView(ConsentView::Summary)),
        "back must show the summary, got {effects:?}"
    );

    session.apply(OverlayAction::Reject);
    ensure!(session.phase() == OverlayPhase::Dismissing, "reject must start teardown");
    ensure!(
        session.finish_teardown() == vec![OverlayEffect::ClearViewMarker],
        "first teardown completion clears the marker"
    );
    ensure!(
        session.finish_teardown().is_empty(),
        "second teardown completion must be a no-op"
    );
    Ok(())
}

#[async_trait::async_trait]
impl BrowserScenario for ViewTransitions {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        ctx.fresh_page(driver).await?;
        ctx.bridge.click(&control("customize")).await?;
        ensure!(
            ctx.bridge.attribute(OVERLAY, ACTIVE_VIEW).await?.as_deref() == Some("settings"),
            "settings view should be marked active"
        );
        ensure!(
            ctx.bridge.attribute(&view("summary"), "hidden").await?.is_some(),
            "summary should be hidden while settings show"
        );

        ctx.bridge.click(&control("back")).await?;
        ensure!(
            ctx.bridge.attribute(OVERLAY, ACTIVE_VIEW).await?.as_deref() == Some("summary"),
            "summary view should be marked active after back"
        );
        ensure!(
            ctx.bridge.attribute(&view("settings"), "hidden").await?.is_some(),
            "settings should be hidden after back"
        );

        ctx.bridge.click(&control("reject")).await?;
        tokio::time::sleep(Duration::from_millis(600)).await;
        ensure!(
            ctx.bridge.attribute(OVERLAY, ACTIVE_VIEW).await?.is_none(),
            "view marker should be cleared after the fade-out"
        );
        Ok(())
    }
}

impl CombinedScenario for ViewTransitions {
    fn name(&self) -> &'static str {
        "View Transitions"
    }

    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario {
            name: self.name().to_string(),
            check: view_transitions_check,
        })
    }
}
