//! Licensing for Licensor.
//!
//! - Random license keys in the form `FFW-XXXX-XXXX`
//! - The verification engine behind the public endpoint
//! - Builders for manually created licenses, approvals and auto-requests
//! - The dashboard filter
//!
//! Keys are plain random tokens. Whether a key is valid is decided only by
//! looking it up in the store.

mod error;
mod filter;
mod key;
mod lifecycle;
mod verify;

pub use error::{LicenseError, LicenseResult};
pub use filter::{LicenseFilter, StatusFilter};
pub use key::{generate_unique_key, KeyFormat, DEFAULT_KEY_PREFIX, MAX_KEY_ATTEMPTS};
pub use lifecycle::{
    approve_request, auto_request, default_features, default_valid_until, ContactDetails,
    LicenseDraft, RequestDraft, AUTO_REQUEST_CONTACT, AUTO_REQUEST_MESSAGE, AUTO_REQUEST_NOTE,
    AUTO_REQUEST_ORGANIZATION, BASE_MODULE,
};
pub use verify::{
    rich_modules, ErrorBody, LicenseGrant, RequestNotice, RichModule, Verification, Verifier,
    VerifierConfig, VerifyResponse, VerifyStatus, ERR_DOMAIN_MISMATCH, ERR_INVALID_DOMAIN,
    ERR_INVALID_KEY, ERR_REGISTRATION_CLOSED, ERR_SUSPENDED, MSG_DOMAIN_MATCH, MSG_PENDING,
    MSG_REQUESTED, VERIFY_ENDPOINT,
};
