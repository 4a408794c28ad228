use anyhow::{Result, ensure};
use fsqr_widgets::{Key, ListboxEffect, ListboxState, OptionSnapshot};
use thirtyfour::prelude::*;

use super::{BrowserScenario, CombinedScenario, ScenarioCtx, TestScenario};

const SELECT_ID: &str = "retention";
const TRIGGER: &str = "[data-retention-select] .retention-select-trigger";
const MENU: &str = "[data-retention-select] .retention-select-menu";
const OUTSIDE: &str = "h1";

const FALLBACK_FIXTURE: &str = r#"
<div class="retention-select" data-retention-select>
  <select id="fallbackProbe">
    <option value="a" disabled selected>A</option>
    <option value="b">B</option>
    <option value="c">C</option>
  </select>
</div>
"#;

fn option_item(index: usize) -> String {
    format!("{MENU} [role=\"option\"]:nth-child({})", index + 1)
}

/// The demo page's choices: 1, 7 and 30 days with 7 preselected.
fn retention_options() -> Vec<OptionSnapshot> {
    vec![
        OptionSnapshot::new("1 day", "1"),
        OptionSnapshot::new("7 days", "7").selected(),
        OptionSnapshot::new("30 days", "30"),
    ]
}

fn count_changes(effects: &[ListboxEffect]) -> usize {
    effects
        .iter()
        .filter(|effect| **effect == ListboxEffect::Notify)
        .count()
}

pub struct InitialFallback;

fn initial_fallback_check() -> Result<()> {
    let state = ListboxState::new(vec![
        OptionSnapshot::new("A", "a").disabled().selected(),
        OptionSnapshot::new("B", "b"),
        OptionSnapshot::new("C", "c"),
    ]);
    ensure!(
        state.selected() == Some(1),
        "expected B to be selected, got {:?}",
        state.selected()
    );
    let effects = state.initial_effects(Some(0));
    ensure!(
        effects.contains(&ListboxEffect::Commit { index: 1 }),
        "native select must be corrected silently, got {effects:?}"
    );
    ensure!(count_changes(&effects) == 0, "initial sync must not fire change");
    Ok(())
}

#[async_trait::async_trait]
impl BrowserScenario for InitialFallback {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        ctx.fresh_page(driver).await?;
        ctx.bridge.inject(FALLBACK_FIXTURE).await?;
        let enhanced = ctx.bridge.enhance().await?;
        ensure!(enhanced == 1, "expected one new select, enhanced {enhanced}");

        let state = ctx.bridge.state().await?;
        let probe = state.select("fallbackProbe")?;
        ensure!(
            probe.selected == Some(1) && probe.value.as_deref() == Some("b"),
            "expected B selected, got {probe:?}"
        );
        let expanded = ctx
            .bridge
            .attribute("#fallbackProbe ~ .retention-select-trigger", "aria-expanded")
            .await?;
        ensure!(
            expanded.as_deref() == Some("false"),
            "probe trigger should start collapsed"
        );
        Ok(())
    }
}

impl CombinedScenario for InitialFallback {
    fn name(&self) -> &'static str {
        "Initial Fallback"
    }

    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario {
            name: self.name().to_string(),
            check: initial_fallback_check,
        })
    }
}

pub struct KeyboardWrap;

fn keyboard_wrap_check() -> Result<()> {
    let mut state = ListboxState::new(vec![
        OptionSnapshot::new("A", "a"),
        OptionSnapshot::new("B", "b").disabled(),
        OptionSnapshot::new("C", "c"),
    ]);
    state.open();
    let mut visited = Vec::new();
    for key in [Key::ArrowDown, Key::ArrowDown, Key::ArrowUp, Key::End, Key::Home] {
        state.menu_key(key);
        visited.push(state.active());
    }
    ensure!(
        visited == vec![2, 0, 2, 2, 0],
        "unexpected highlight path {visited:?}"
    );
    Ok(())
}

#[async_trait::async_trait]
impl BrowserScenario for KeyboardWrap {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        ctx.fresh_page(driver).await?;

        ctx.bridge.key(TRIGGER, "ArrowDown").await?;
        let state = ctx.bridge.state().await?;
        let select = state.select(SELECT_ID)?;
        ensure!(select.open, "ArrowDown on the trigger should open the menu");
        ensure!(select.active == 2, "expected 30 days highlighted, got {}", select.active);

        let mut path = Vec::new();
        for key in ["ArrowDown", "ArrowUp", "Home", "End"] {
            ctx.bridge.key(MENU, key).await?;
            path.push(ctx.bridge.state().await?.select(SELECT_ID)?.active);
        }
        ensure!(path == vec![0, 2, 0, 2], "unexpected highlight path {path:?}");
        ctx.note(&format!("⌨️  highlight path {path:?}"));

        ctx.bridge.key(MENU, "Escape").await?;
        let state = ctx.bridge.state().await?;
        let select = state.select(SELECT_ID)?;
        ensure!(!select.open, "Escape should close the menu");
        ensure!(select.selected == Some(1), "Escape must not commit");
        Ok(())
    }
}

impl CombinedScenario for KeyboardWrap {
    fn name(&self) -> &'static str {
        "Keyboard Wrap"
    }

    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario {
            name: self.name().to_string(),
            check: keyboard_wrap_check,
        })
    }
}

pub struct CommitChange;

fn commit_change_check() -> Result<()> {
    let mut state = ListboxState::new(retention_options());
    let mut effects = state.trigger_click();
    effects.extend(state.menu_key(Key::ArrowDown).effects);
    effects.extend(state.menu_key(Key::Enter).effects);
    ensure!(count_changes(&effects) == 1, "expected one change, got {effects:?}");
    ensure!(!state.is_open(), "commit should close the menu");
    ensure!(
        effects.contains(&ListboxEffect::FocusTrigger),
        "commit should return focus to the trigger"
    );
    ensure!(
        state
            .native_changed(Some(2))
            .iter()
            .all(|effect| !matches!(effect, ListboxEffect::Commit { .. })),
        "the echoed change must not commit again"
    );
    Ok(())
}

#[async_trait::async_trait]
impl BrowserScenario for CommitChange {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        ctx.fresh_page(driver).await?;
        ctx.bridge.watch_changes(&format!("#{SELECT_ID}")).await?;

        ctx.bridge.click(TRIGGER).await?;
        ctx.bridge.click(&option_item(2)).await?;

        let changes = ctx.bridge.change_count().await?;
        ensure!(changes == 1, "expected exactly one change event, saw {changes}");
        let state = ctx.bridge.state().await?;
        let select = state.select(SELECT_ID)?;
        ensure!(!select.open, "clicking an option should close the menu");
        ensure!(
            select.value.as_deref() == Some("30"),
            "expected 30 committed, got {:?}",
            select.value
        );
        Ok(())
    }
}

impl CombinedScenario for CommitChange {
    fn name(&self) -> &'static str {
        "Commit Change"
    }

    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario {
            name: self.name().to_string(),
            check: commit_change_check,
        })
    }
}

pub struct DoubleEnhance;

#[async_trait::async_trait]
impl BrowserScenario for DoubleEnhance {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        ctx.fresh_page(driver).await?;
        let before = ctx.bridge.count(".retention-select-trigger").await?;
        let enhanced = ctx.bridge.enhance().await?;
        ensure!(enhanced == 0, "re-running enhancement enhanced {enhanced} wrappers");
        let after = ctx.bridge.count(".retention-select-trigger").await?;
        ensure!(before == after, "trigger count changed from {before} to {after}");
        Ok(())
    }
}

impl CombinedScenario for DoubleEnhance {
    fn name(&self) -> &'static str {
        "Double Enhance"
    }

    fn as_logic_scenario(&self) -> Option<TestScenario> {
        None
    }
}

pub struct OutsideClose;

fn outside_close_check() -> Result<()> {
    let mut state = ListboxState::new(retention_options());
    state.open();
    state.menu_key(Key::ArrowDown);
    ensure!(state.outside_pointer(true).is_empty(), "inside pointer must not close");
    let effects = state.outside_pointer(false);
    ensure!(!state.is_open(), "outside pointer should close");
    ensure!(
        effects.contains(&ListboxEffect::Unlisten),
        "closing must drop the document listeners"
    );
    ensure!(
        !effects.contains(&ListboxEffect::FocusTrigger),
        "outside close must not steal focus"
    );
    ensure!(state.selected() == Some(1), "outside close must not commit");
    Ok(())
}

#[async_trait::async_trait]
impl BrowserScenario for OutsideClose {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()> {
        ctx.fresh_page(driver).await?;
        ctx.bridge.click(TRIGGER).await?;
        let state = ctx.bridge.state().await?;
        let select = state.select(SELECT_ID)?;
        ensure!(select.open && select.listening, "menu should be open and listening");

        ctx.bridge.pointer_down(OUTSIDE).await?;
        let state = ctx.bridge.state().await?;
        let select = state.select(SELECT_ID)?;
        ensure!(!select.open, "pointer-down outside should close the menu");
        ensure!(!select.listening, "document listeners should be released");
        ensure!(select.selected == Some(1), "outside close must not commit");
        Ok(())
    }
}

impl CombinedScenario for OutsideClose {
    fn name(&self) -> &'static str {
        "Outside Close"
    }

    fn as_logic_scenario(&self) -> Option<TestScenario> {
        Some(TestScenario {
            name: self.name().to_string(),
            check: outside_close_check,
        })
    }
}
