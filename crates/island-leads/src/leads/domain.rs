use chrono::{SecondsFormat, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SITE_SOURCE;

/// Prefix shared by every stored lead key; exports scan on it.
pub const LEAD_KEY_PREFIX: &str = "lead_";

const ID_SUFFIX_LEN: usize = 9;

/// A prospective buyer's contact record. Write-once: intake creates it,
/// exports read it, nothing updates or deletes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub whatsapp: String,
    pub email: String,
    pub timestamp: String,
    pub source: String,
}

/// Raw intake payload from the landing-page form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl LeadSubmission {
    /// Missing and empty fields are rejected alike; values are otherwise
    /// free-form (phone handles and email formats are not validated).
    pub fn has_required_fields(&self) -> bool {
        !self.name.is_empty() && !self.whatsapp.is_empty() && !self.email.is_empty()
    }

    /// Materialize the stored record, stamping receipt time when the client
    /// did not supply one.
    pub fn into_lead(self) -> Lead {
        let timestamp = match self.timestamp {
            Some(value) if !value.is_empty() => value,
            _ => now_iso8601(),
        };

        Lead {
            name: self.name,
            whatsapp: self.whatsapp,
            email: self.email,
            timestamp,
            source: SITE_SOURCE.to_string(),
        }
    }
}

/// Generate a storage key of the form `lead_<epoch-millis>_<suffix>`. The
/// random suffix keeps two submissions in the same millisecond distinct.
pub fn new_lead_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|byte| (byte as char).to_ascii_lowercase())
        .collect();
    format!("{LEAD_KEY_PREFIX}{millis}_{suffix}")
}

pub(crate) fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
