//! Lenient decoding for rows written by older stores.
//!
//! Legacy databases have no NOT NULL constraints, so any text column may
//! arrive as `null`.

use serde::{Deserialize, Deserializer};

/// Decodes `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
