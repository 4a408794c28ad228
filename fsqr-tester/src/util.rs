use anyhow::{Context, Result};
use chrono::Utc;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thirtyfour::prelude::*;

use crate::browser::TestBridge;
use crate::browser::bridge::BridgeState;

/// `<base>/<browser>/<scenario>/<UTC timestamp>`
pub fn artifacts_dir(base: &str, browser: &str, scenario: &str) -> PathBuf {
    let ts = Utc::now().format("%Y%m%dT%H%M%S");
    Path::new(base).join(browser).join(scenario).join(ts.to_string())
}

/// What a failed browser scenario leaves behind.
#[derive(Debug, Default)]
pub struct FailureArtifacts {
    pub screenshot: Option<Vec<u8>>,
    pub dom: Option<String>,
    pub state: Option<BridgeState>,
    pub error_chain: String,
}

impl FailureArtifacts {
    /// Collect whatever the page still offers; a dead session only loses its share.
    pub async fn collect(
        driver: &WebDriver,
        bridge: &TestBridge<'_>,
        err: &anyhow::Error,
    ) -> Self {
        let state = match bridge.state().await {
            Ok(state) => Some(state),
            Err(state_err) => {
                log::warn!("bridge state unavailable for artifacts: {state_err:#}");
                None
            }
        };
        Self {
            screenshot: driver.screenshot_as_png().await.ok(),
            dom: driver.source().await.ok(),
            state,
            error_chain: format!("{err:#}"),
        }
    }

    /// Human-readable digest of the widget state at the time of failure.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "error: {}", self.error_chain);
        let Some(state) = &self.state else {
            out.push_str("bridge: unavailable\n");
            return out;
        };
        let consent = &state.consent;
        match (&consent.record, &consent.error) {
            (_, Some(decode_err)) => {
                let _ = writeln!(out, "consent: cookie present but undecodable ({decode_err})");
            }
            (Some(record), None) => {
                let _ = writeln!(out, "consent: {record:?}");
            }
            (None, None) if consent.present => out.push_str("consent: cookie present\n"),
            (None, None) => out.push_str("consent: no cookie\n"),
        }
        if state.selects.is_empty() {
            out.push_str("selects: none enhanced\n");
        }
        for select in &state.selects {
            let _ = writeln!(
                out,
                "select #{}: {} active={} selected={} value={} listeners={}",
                select.id,
                if select.open { "open" } else { "closed" },
                select.active,
                select
                    .selected
                    .map_or_else(|| "-".to_string(), |idx| idx.to_string()),
                select.value.as_deref().unwrap_or("-"),
                if select.listening { "on" } else { "off" },
            );
        }
        out
    }

    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating artifacts dir {}", dir.display()))?;
        if let Some(png) = &self.screenshot {
            write_file(dir, "screenshot.png", png)?;
        }
        if let Some(dom) = &self.dom {
            write_file(dir, "dom.html", dom.as_bytes())?;
        }
        if let Some(state) = &self.state {
            let payload = serde_json::to_vec_pretty(state).context("encoding bridge state")?;
            write_file(dir, "state.json", &payload)?;
        }
        write_file(dir, "summary.txt", self.summary().as_bytes())
    }
}

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}
