//! Identifier types for stored records.
//!
//! Identifiers are opaque strings. Locally generated ids carry a record
//! prefix followed by a UUID v7, so they sort by creation time. Ids coming
//! from a remote store (e.g. `lic_1`) are kept verbatim.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used for locally generated ids.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a fresh, time-ordered id.
            #[must_use]
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::now_v7().simple()))
            }

            /// Parses an id, rejecting blank strings.
            pub fn parse(s: &str) -> Result<Self, Error> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(Error::InvalidId(s.to_string()));
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the id and returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

prefixed_id!(
    /// Identifier of a [`License`](crate::License).
    LicenseId,
    "lic"
);

prefixed_id!(
    /// Identifier of a [`LicenseRequest`](crate::LicenseRequest).
    RequestId,
    "req"
);

prefixed_id!(
    /// Identifier of an [`ApiLogEntry`](crate::ApiLogEntry).
    LogId,
    "log"
);
