//! Consent record and its cookie encoding
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod cookie;
pub mod overlay;

pub use cookie::{ConsentCookie, CookieJar, find_cookie, has_cookie};
pub use overlay::{ConsentView, OverlayAction, OverlayEffect, OverlayPhase, OverlaySession};

/// Category that is always granted, whatever the toggles say.
pub const NECESSARY_CATEGORY: &str = "necessary";

const ACCEPTED_TOKEN: &str = "accepted";
const REJECTED_TOKEN: &str = "rejected";
/// Value written by the first release of the overlay, which only knew "accept".
const LEGACY_ACCEPTED_TOKEN: &str = "1";

/// Characters `encodeURIComponent` escapes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("cookie value is not valid UTF-8 after percent-decoding: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("cookie value is neither a sentinel nor a category map: {0}")]
    Json(#[from] serde_json::Error),
    #[error("category map does not grant `{NECESSARY_CATEGORY}`")]
    NecessaryNotGranted,
}

/// What the visitor agreed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "categories", rename_all = "lowercase")]
pub enum ConsentRecord {
    Accepted,
    Rejected,
    Categories(BTreeMap<String, bool>),
}

impl ConsentRecord {
    /// Build a per-category record; `necessary` is always forced to `true`.
    pub fn from_categories<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let mut map: BTreeMap<String, bool> = choices
            .into_iter()
            .map(|(name, granted)| (name.into(), granted))
            .collect();
        map.insert(NECESSARY_CATEGORY.to_string(), true);
        Self::Categories(map)
    }

    /// Raw value before percent-encoding.
    #[must_use]
    pub fn to_plain_value(&self) -> String {
        match self {
            Self::Accepted => ACCEPTED_TOKEN.to_string(),
            Self::Rejected => REJECTED_TOKEN.to_string(),
            // A string-keyed map of booleans always serializes.
            Self::Categories(map) => serde_json::to_string(map).unwrap_or_default(),
        }
    }

    /// Percent-encoded value as stored in the cookie.
    #[must_use]
    pub fn to_cookie_value(&self) -> String {
        utf8_percent_encode(&self.to_plain_value(), URI_COMPONENT).to_string()
    }

    /// Parse a stored cookie value back into a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not decode to a sentinel or a
    /// category map granting `necessary`.
    pub fn decode(raw: &str) -> Result<Self, ConsentError> {
        let decoded = percent_decode_str(raw.trim()).decode_utf8()?;
        match decoded.as_ref() {
            ACCEPTED_TOKEN | LEGACY_ACCEPTED_TOKEN => Ok(Self::Accepted),
            REJECTED_TOKEN => Ok(Self::Rejected),
            json => {
                let map: BTreeMap<String, bool> = serde_json::from_str(json)?;
                if map.get(NECESSARY_CATEGORY) != Some(&true) {
                    return Err(ConsentError::NecessaryNotGranted);
                }
                Ok(Self::Categories(map))
            }
        }
    }
}

impl fmt::Display for ConsentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_value())
    }
}
