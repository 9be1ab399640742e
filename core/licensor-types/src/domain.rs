//! Domain normalization.
//!
//! Every comparison between a requesting origin and a stored license or
//! request domain goes through [`normalize_domain`].

/// Placeholder returned for a missing origin.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Reduces an origin, referer or bare host to its lowercase host name.
///
/// Strips a leading `http://` or `https://`, everything from the first `/`,
/// and a trailing `:port`. Blank input yields [`UNKNOWN_DOMAIN`].
///
/// ```
/// use licensor_types::normalize_domain;
///
/// assert_eq!(normalize_domain("https://FFW-Musterstadt.de:8443/app"), "ffw-musterstadt.de");
/// assert_eq!(normalize_domain(""), "unknown");
/// ```
#[must_use]
pub fn normalize_domain(url: &str) -> String {
    let lowered = url.trim().to_lowercase();
    if lowered.is_empty() {
        return UNKNOWN_DOMAIN.to_string();
    }

    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);

    let host_and_port = without_scheme.split('/').next().unwrap_or_default();
    host_and_port
        .split(':')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Returns true if a normalized domain may receive an automatic request.
#[must_use]
pub fn is_registrable_domain(domain: &str) -> bool {
    !domain.is_empty() && domain != UNKNOWN_DOMAIN
}
