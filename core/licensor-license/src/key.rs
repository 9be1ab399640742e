//! License key generation.
//!
//! Keys are opaque random tokens in the form `PREFIX-XXXX-XXXX`, drawn from
//! `[0-9A-Z]`. They carry no signature; the store is the only authority on
//! whether a key is valid.

use crate::error::{LicenseError, LicenseResult};
use licensor_store::LicenseStore;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix used by the default key format.
pub const DEFAULT_KEY_PREFIX: &str = "FFW";

/// Attempts before [`generate_unique_key`] gives up.
pub const MAX_KEY_ATTEMPTS: u32 = 16;

const KEY_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Shape of generated keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFormat {
    /// Leading segment, e.g. `FFW`.
    pub prefix: String,
    /// Number of random groups after the prefix.
    pub groups: usize,
    /// Characters per random group.
    pub group_len: usize,
}

impl Default for KeyFormat {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            groups: 2,
            group_len: 4,
        }
    }
}

impl KeyFormat {
    /// Generates a key using the thread-local RNG.
    #[must_use]
    pub fn generate(&self) -> String {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Generates a key from the given RNG.
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> String {
        let mut key = self.prefix.clone();
        for _ in 0..self.groups {
            key.push('-');
            for _ in 0..self.group_len {
                let idx = rng.gen_range(0..KEY_ALPHABET.len());
                key.push(KEY_ALPHABET[idx] as char);
            }
        }
        key
    }

    /// Returns true if the key has this format's shape.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        let mut parts = key.split('-');
        if parts.next() != Some(self.prefix.as_str()) {
            return false;
        }
        let groups: Vec<&str> = parts.collect();
        groups.len() == self.groups
            && groups.iter().all(|g| {
                g.len() == self.group_len && g.bytes().all(|b| KEY_ALPHABET.contains(&b))
            })
    }
}

/// Generates a key that no stored license uses yet.
pub fn generate_unique_key(store: &LicenseStore, format: &KeyFormat) -> LicenseResult<String> {
    for attempt in 1..=MAX_KEY_ATTEMPTS {
        let key = format.generate();
        if !store.key_exists(&key)? {
            return Ok(key);
        }
        debug!("Generated key collided with an existing license (attempt {})", attempt);
    }
    Err(LicenseError::KeySpaceExhausted(MAX_KEY_ATTEMPTS))
}
