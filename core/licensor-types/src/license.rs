//! The license record and its validity rules.

use crate::ids::LicenseId;
use crate::Error;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Module id → enabled flag.
pub type FeatureSet = BTreeMap<String, bool>;

/// Administrative state of a license.
///
/// Expiry is never stored; it is derived from `validUntil` at check time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// Issued and usable until `validUntil`.
    #[default]
    Active,
    /// Revoked by the admin.
    Suspended,
    /// Legacy value written by older dashboards. Treated like `Active`.
    Expired,
}

impl LicenseStatus {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "expired" => Ok(Self::Expired),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// A per-domain license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: LicenseId,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub organization: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub contact_person: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Normalized domain (no scheme, path or port).
    #[serde(deserialize_with = "crate::wire::null_as_default")]
    pub domain: String,
    /// Opaque random key, e.g. `FFW-X9K2-M3P9`.
    #[serde(deserialize_with = "crate::wire::null_as_default")]
    pub key: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[serde(deserialize_with = "crate::wire::null_as_default")]
    pub valid_until: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub status: LicenseStatus,
    #[serde(default, deserialize_with = "lenient_features")]
    pub features: FeatureSet,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl License {
    /// Returns the instant the license stops being valid, if `validUntil` parses.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        parse_valid_until(&self.valid_until)
    }

    /// Returns true once `now` is past the expiry. Unparseable dates count as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|exp| exp < now)
    }

    /// Returns true if the admin revoked the license.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.status == LicenseStatus::Suspended
    }

    /// Whole days left until expiry, 0 once expired.
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        match self.expires_at() {
            Some(exp) if exp >= now => (exp - now).num_days(),
            _ => 0,
        }
    }

    /// Returns the ids of all enabled modules, in id order.
    #[must_use]
    pub fn enabled_modules(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Returns true if the given module is enabled.
    #[must_use]
    pub fn has_feature(&self, module_id: &str) -> bool {
        self.features.get(module_id).copied().unwrap_or(false)
    }
}

/// Parses a `validUntil` value.
///
/// Plain dates resolve to midnight UTC of that day.
#[must_use]
pub fn parse_valid_until(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Accepts a feature map, `null`, or an empty JSON array.
///
/// PHP encodes an empty associative array as `[]`, so remote stores send
/// that for licenses without features.
fn lenient_features<'de, D>(deserializer: D) -> Result<FeatureSet, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Map(FeatureSet),
        List(Vec<serde_json::Value>),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Map(map) => Ok(map),
        Raw::List(items) if items.is_empty() => Ok(FeatureSet::new()),
        Raw::List(_) => Err(serde::de::Error::custom(
            "features must be an object of module id to bool",
        )),
        Raw::Null => Ok(FeatureSet::new()),
    }
}
