use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;

use super::ConsentRecord;
use crate::config::ConsentConfig;

const RFC1123_GMT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Builds `document.cookie` assignments for the consent cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentCookie {
    name: String,
    duration_days: u32,
}

impl ConsentCookie {
    #[must_use]
    pub fn new(cfg: &ConsentConfig) -> Self {
        Self {
            name: cfg.cookie_name.clone(),
            duration_days: cfg.duration_days,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + TimeDelta::days(i64::from(self.duration_days))
    }

    /// `name=value; expires=...; path=/; SameSite=Lax`
    #[must_use]
    pub fn header(&self, record: &ConsentRecord, now: DateTime<Utc>) -> String {
        format!(
            "{}={}; expires={}; path=/; SameSite=Lax",
            self.name,
            record.to_cookie_value(),
            self.expires_at(now).format(RFC1123_GMT)
        )
    }

    /// Assignment that makes the browser drop the cookie.
    #[must_use]
    pub fn deletion_header(&self) -> String {
        format!(
            "{}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/; SameSite=Lax",
            self.name
        )
    }
}

/// Value of `name` in a `document.cookie` string, if present.
#[must_use]
pub fn find_cookie<'a>(jar: &'a str, name: &str) -> Option<&'a str> {
    jar.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Presence check only; the value is never inspected.
#[must_use]
pub fn has_cookie(jar: &str, name: &str) -> bool {
    find_cookie(jar, name).is_some()
}

/// In-memory stand-in for `document.cookie`, for running the overlay outside a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: BTreeMap<String, String>,
}

impl CookieJar {
    /// Apply a `document.cookie` assignment; expired cookies are removed.
    pub fn store(&mut self, assignment: &str, now: DateTime<Utc>) {
        let mut parts = assignment.split(';');
        let Some((name, value)) = parts.next().and_then(|p| p.trim().split_once('=')) else {
            return;
        };
        let expired = parts
            .filter_map(|attr| attr.trim().split_once('='))
            .filter(|(key, _)| key.eq_ignore_ascii_case("expires"))
            .filter_map(|(_, when)| DateTime::parse_from_rfc2822(&when.replace("GMT", "+0000")).ok())
            .any(|when| when.with_timezone(&Utc) <= now);
        if expired {
            self.entries.remove(name);
        } else {
            self.entries.insert(name.to_string(), value.to_string());
        }
    }

    /// Serialized the way `document.cookie` reads back.
    #[must_use]
    pub fn to_document_string(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
