use anyhow::Result;
use thirtyfour::prelude::*;

use crate::browser::TestBridge;

pub mod consent;
pub mod select;

#[derive(Debug, Clone)]
pub struct ScenarioCtx<'a> {
    pub base_url: String,
    pub bridge: TestBridge<'a>,
    pub verbose: bool,
}

impl ScenarioCtx<'_> {
    /// Load the page with no consent cookie and wait for the bridge.
    pub async fn fresh_page(&self, driver: &WebDriver) -> Result<()> {
        driver.goto(&self.base_url).await?;
        self.bridge.ensure_available().await?;
        self.bridge.reset().await?;
        self.reload(driver).await
    }

    /// Load the page again, keeping cookies.
    pub async fn reload(&self, driver: &WebDriver) -> Result<()> {
        driver.goto(&self.base_url).await?;
        self.bridge.ensure_available().await
    }

    pub fn note(&self, message: &str) {
        if self.verbose {
            println!("  {message}");
        }
    }
}

pub type LogicCheck = fn() -> Result<()>;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub check: LogicCheck,
}

// Browser test scenario
#[async_trait::async_trait]
pub trait BrowserScenario {
    async fn run_browser(&self, driver: &WebDriver, ctx: &ScenarioCtx<'_>) -> Result<()>;
}

// Combined scenario that can run both logic and browser tests
pub trait CombinedScenario: BrowserScenario {
    fn name(&self) -> &'static str;
    fn as_logic_scenario(&self) -> Option<TestScenario>;
}

const CATALOG: [(&str, &str); 8] = [
    ("cookie-idempotence", "Any stored choice suppresses the overlay"),
    ("customize-roundtrip", "Saved category choices round-trip through the cookie"),
    ("view-transitions", "Customize and back swap views; dismissal clears the marker"),
    ("initial-fallback", "A disabled initial selection falls forward to an enabled option"),
    ("keyboard-wrap", "Arrow keys skip disabled options and wrap"),
    ("commit-change", "Committing fires exactly one change and closes"),
    ("double-enhance", "Enhancing a wrapper twice is a no-op"),
    ("outside-close", "Pointer-down outside closes without committing"),
];

pub fn get_scenario(name: &str) -> Option<Box<dyn CombinedScenario + Send + Sync>> {
    match name.to_lowercase().as_str() {
        "cookie-idempotence" | "cookie" => Some(Box::new(consent::CookieIdempotence)),
        "customize-roundtrip" | "customize" => Some(Box::new(consent::CustomizeRoundtrip)),
        "view-transitions" | "views" => Some(Box::new(consent::ViewTransitions)),
        "initial-fallback" | "fallback" => Some(Box::new(select::InitialFallback)),
        "keyboard-wrap" | "keyboard" => Some(Box::new(select::KeyboardWrap)),
        "commit-change" | "commit" => Some(Box::new(select::CommitChange)),
        "double-enhance" => Some(Box::new(select::DoubleEnhance)),
        "outside-close" | "outside" => Some(Box::new(select::OutsideClose)),
        _ => None,
    }
}

pub fn list_scenarios() -> &'static [(&'static str, &'static str)] {
    &CATALOG
}

pub fn all_scenario_keys() -> Vec<String> {
    CATALOG.iter().map(|(key, _)| (*key).to_string()).collect()
}
