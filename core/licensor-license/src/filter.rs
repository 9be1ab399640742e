//! Dashboard search and status filter.

use chrono::{DateTime, Utc};
use licensor_types::{License, LicenseStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status tab of the license list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// Active and not expired.
    Active,
    /// Past `validUntil`, whatever the status.
    Expired,
    Suspended,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "suspended" => Ok(Self::Suspended),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

/// Free-text search plus status tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseFilter {
    /// Matched case-insensitively against organization, key and domain.
    pub search: String,
    pub status: StatusFilter,
}

impl LicenseFilter {
    pub fn new(search: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    /// Returns true if the license should be listed.
    #[must_use]
    pub fn matches(&self, license: &License, now: DateTime<Utc>) -> bool {
        let needle = self.search.trim().to_lowercase();
        let hit = needle.is_empty()
            || [&license.organization, &license.key, &license.domain]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }

        match self.status {
            StatusFilter::All => true,
            StatusFilter::Suspended => license.is_suspended(),
            StatusFilter::Expired => license.is_expired(now),
            StatusFilter::Active => {
                license.status != LicenseStatus::Suspended && !license.is_expired(now)
            }
        }
    }

    /// Keeps the matching licenses, preserving order.
    #[must_use]
    pub fn apply<'a>(&self, licenses: &'a [License], now: DateTime<Utc>) -> Vec<&'a License> {
        licenses.iter().filter(|l| self.matches(l, now)).collect()
    }
}
