use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use fsqr_widgets::ConsentRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thirtyfour::prelude::*;

const BRIDGE_ATTEMPTS: u32 = 50;
const BRIDGE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsentState {
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub record: Option<ConsentRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectState {
    pub id: String,
    pub open: bool,
    pub active: usize,
    pub selected: Option<usize>,
    pub value: Option<String>,
    #[serde(default)]
    pub listening: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeState {
    #[serde(default)]
    pub consent: ConsentState,
    #[serde(default)]
    pub selects: Vec<SelectState>,
}

impl BridgeState {
    pub fn select(&self, id: &str) -> Result<&SelectState> {
        self.selects
            .iter()
            .find(|select| select.id == id)
            .ok_or_else(|| anyhow!("no enhanced select with id `{id}`"))
    }
}

/// Thin wrapper over `window.__fsqrTest` plus DOM pokes done in page script.
#[derive(Debug, Clone)]
pub struct TestBridge<'a> {
    driver: &'a WebDriver,
}

impl<'a> TestBridge<'a> {
    pub const fn new(driver: &'a WebDriver) -> Self {
        Self { driver }
    }

    /// Wait for the wasm module to start and publish the bridge.
    pub async fn ensure_available(&self) -> Result<()> {
        for _ in 0..BRIDGE_ATTEMPTS {
            let result = self
                .driver
                .execute("return !!window.__fsqrTest", vec![])
                .await?;
            if result.json().as_bool().unwrap_or(false) {
                return Ok(());
            }
            tokio::time::sleep(BRIDGE_POLL).await;
        }
        bail!("__fsqrTest is not available. Did you pass ?test=1 to the page?");
    }

    pub async fn state(&self) -> Result<BridgeState> {
        let result = self
            .driver
            .execute("return window.__fsqrTest.state()", vec![])
            .await?;
        serde_json::from_value(result.json().clone()).context("parsing bridge state")
    }

    /// Delete the consent cookie.
    pub async fn reset(&self) -> Result<()> {
        self.driver
            .execute("window.__fsqrTest.reset()", vec![])
            .await?;
        Ok(())
    }

    /// Re-run select enhancement; returns how many wrappers were newly enhanced.
    pub async fn enhance(&self) -> Result<u64> {
        let result = self
            .driver
            .execute("return window.__fsqrTest.enhance()", vec![])
            .await?;
        result
            .json()
            .as_u64()
            .ok_or_else(|| anyhow!("enhance() returned {}", result.json()))
    }

    /// Run `body` with the element matching `arguments[0]` bound to `el`.
    async fn on_element(&self, selector: &str, body: &str, extra: Vec<Value>) -> Result<Value> {
        let script = format!(
            "const el = document.querySelector(arguments[0]); if (!el) return null; {body}"
        );
        let mut args = vec![Value::from(selector)];
        args.extend(extra);
        let result = self.driver.execute(&script, args).await?;
        Ok(result.json().clone())
    }

    async fn on_required(&self, selector: &str, body: &str, extra: Vec<Value>) -> Result<Value> {
        let value = self.on_element(selector, body, extra).await?;
        if value.is_null() {
            bail!("no element matches `{selector}`");
        }
        Ok(value)
    }

    /// `el.click()` from script, so overlays stacked above the target don't intercept it.
    pub async fn click(&self, selector: &str) -> Result<()> {
        self.on_required(selector, "el.click(); return true;", vec![])
            .await
            .map(drop)
    }

    pub async fn key(&self, selector: &str, key: &str) -> Result<()> {
        self.on_required(
            selector,
            "el.dispatchEvent(new KeyboardEvent('keydown', \
             { key: arguments[1], bubbles: true, cancelable: true })); return true;",
            vec![Value::from(key)],
        )
        .await
        .map(drop)
    }

    pub async fn pointer_down(&self, selector: &str) -> Result<()> {
        self.on_required(
            selector,
            "el.dispatchEvent(new PointerEvent('pointerdown', { bubbles: true })); return true;",
            vec![],
        )
        .await
        .map(drop)
    }

    pub async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let value = self
            .on_required(
                selector,
                "return { value: el.getAttribute(arguments[1]) };",
                vec![Value::from(name)],
            )
            .await?;
        Ok(value["value"].as_str().map(str::to_owned))
    }

    pub async fn has_class(&self, selector: &str, class: &str) -> Result<bool> {
        let value = self
            .on_required(
                selector,
                "return el.classList.contains(arguments[1]);",
                vec![Value::from(class)],
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn count(&self, selector: &str) -> Result<u64> {
        let result = self
            .driver
            .execute(
                "return document.querySelectorAll(arguments[0]).length;",
                vec![Value::from(selector)],
            )
            .await?;
        Ok(result.json().as_u64().unwrap_or(0))
    }

    /// Append `markup` to the body inside a fresh host element.
    pub async fn inject(&self, markup: &str) -> Result<()> {
        self.driver
            .execute(
                "const host = document.createElement('div'); \
                 host.innerHTML = arguments[0]; document.body.appendChild(host);",
                vec![Value::from(markup)],
            )
            .await?;
        Ok(())
    }

    /// Start counting `change` events that reach `selector`.
    pub async fn watch_changes(&self, selector: &str) -> Result<()> {
        self.on_required(
            selector,
            "window.__fsqrChanges = 0; \
             el.addEventListener('change', () => { window.__fsqrChanges += 1; }); return true;",
            vec![],
        )
        .await
        .map(drop)
    }

    pub async fn change_count(&self) -> Result<u64> {
        let result = self
            .driver
            .execute("return window.__fsqrChanges || 0;", vec![])
            .await?;
        Ok(result.json().as_u64().unwrap_or(0))
    }
}
