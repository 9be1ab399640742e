//! Pending license requests.

use crate::ids::RequestId;
use serde::{Deserialize, Serialize};

/// A request for a license, awaiting admin approval or rejection.
///
/// Created manually by the admin or automatically when an unknown domain
/// calls the verification endpoint without a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRequest {
    pub id: RequestId,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub organization: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub contact_person: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(deserialize_with = "crate::wire::null_as_default")]
    pub requested_domain: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub request_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Message returned to the installation while the request is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}
