//! Domain verification.
//!
//! An installation calls the public endpoint with its origin and, once it
//! has one, its key. Without a key the engine recovers the license by
//! domain, reports a pending request, or registers a new request. With a
//! key it checks existence, domain binding, suspension and expiry.
//!
//! Every call is appended to the API log, including rejected ones.

use crate::error::LicenseResult;
use crate::lifecycle::auto_request;
use chrono::{DateTime, Utc};
use licensor_store::LicenseStore;
use licensor_types::{
    is_registrable_domain, normalize_domain, ApiLogEntry, FeatureSet, License, LogId,
    ModuleDefinition, RequestId, LOG_METHOD,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Path recorded in log entries by default.
pub const VERIFY_ENDPOINT: &str = "/v1/license/verify";

pub const MSG_DOMAIN_MATCH: &str = "License found via Domain Match.";
pub const MSG_PENDING: &str = "Registrierungsanfrage wartet auf Freigabe.";
pub const MSG_REQUESTED: &str = "Registrierungsanfrage erfolgreich erstellt. Wir werden Ihre Anfrage prüfen und uns bei Ihnen melden.";
pub const ERR_INVALID_DOMAIN: &str =
    "Invalid domain. Please ensure your request includes a valid Origin or Referer header.";
pub const ERR_INVALID_KEY: &str = "Invalid License Key";
pub const ERR_DOMAIN_MISMATCH: &str = "Domain Mismatch";
pub const ERR_SUSPENDED: &str = "License Suspended";
pub const ERR_REGISTRATION_CLOSED: &str = "Automatic registration is disabled.";

/// Outcome reported in the `status` field of a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    /// License recovered by domain and not expired.
    Active,
    /// Key validated and not expired.
    Valid,
    /// License found but past `validUntil`.
    Expired,
    /// License found by domain but revoked.
    Suspended,
    /// A request for the domain awaits approval.
    Pending,
    /// A request was just created for the domain.
    Requested,
}

/// A catalog module annotated with the license's activation flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichModule {
    pub technical_name: String,
    pub title: String,
    pub description: String,
    pub icon_name: String,
    pub active: bool,
}

/// Body returned when a license was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseGrant {
    pub status: VerifyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Only present on domain-match recovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub valid_until: String,
    pub days_remaining: i64,
    pub modules: Vec<RichModule>,
    /// Empty unless the license is usable.
    pub features: FeatureSet,
}

/// Body returned for pending or freshly created requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestNotice {
    pub status: VerifyStatus,
    pub message: String,
    pub request_id: RequestId,
}

/// Body returned for rejected calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Any verification response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerifyResponse {
    License(LicenseGrant),
    Request(RequestNotice),
    Error(ErrorBody),
}

impl VerifyResponse {
    fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorBody {
            error: message.into(),
        })
    }

    /// Returns the `status` field, or `None` for error bodies.
    #[must_use]
    pub fn status(&self) -> Option<VerifyStatus> {
        match self {
            Self::License(grant) => Some(grant.status),
            Self::Request(notice) => Some(notice.status),
            Self::Error(_) => None,
        }
    }

    /// Returns the error message, if this is an error body.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(body) => Some(&body.error),
            _ => None,
        }
    }
}

/// Result of one verification call.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    /// HTTP status code to answer with.
    pub status_code: u16,
    pub body: VerifyResponse,
    /// The entry appended to the API log.
    pub log: ApiLogEntry,
}

/// Verifier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Endpoint path recorded in the API log.
    pub endpoint: String,
    /// Create requests for unknown domains calling without a key.
    pub auto_register: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            endpoint: VERIFY_ENDPOINT.to_string(),
            auto_register: true,
        }
    }
}

/// The verification engine.
#[derive(Clone)]
pub struct Verifier {
    store: LicenseStore,
    config: VerifierConfig,
}

impl Verifier {
    /// Creates a verifier with the default configuration.
    pub fn new(store: LicenseStore) -> Self {
        Self::with_config(store, VerifierConfig::default())
    }

    /// Creates a verifier with a custom configuration.
    pub fn with_config(store: LicenseStore, config: VerifierConfig) -> Self {
        Self { store, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verifies a call from `origin`, optionally carrying a key.
    ///
    /// A blank key counts as no key. Lookup failures are logged as a 500
    /// and then propagate; a failure while auto-creating a request is
    /// answered with a 500 body instead.
    pub fn verify(
        &self,
        origin: &str,
        key: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<Verification> {
        let domain = normalize_domain(origin);
        let key = key.map(str::trim).filter(|k| !k.is_empty());

        let outcome = match key {
            None => self.check_domain(&domain, now),
            Some(key) => self.check_key(&domain, key, now),
        };
        let (status_code, body) = match outcome {
            Ok(answer) => answer,
            Err(e) => {
                let failed = VerifyResponse::error(e.to_string());
                self.record(&domain, key, 500, &failed, now)?;
                return Err(e);
            }
        };
        let log = self.record(&domain, key, status_code, &body, now)?;

        debug!(domain = %domain, status_code, "Verification answered");
        Ok(Verification {
            status_code,
            body,
            log,
        })
    }

    /// Appends a log entry. A failed write is only reported.
    fn record(
        &self,
        domain: &str,
        key: Option<&str>,
        status_code: u16,
        body: &VerifyResponse,
        now: DateTime<Utc>,
    ) -> LicenseResult<ApiLogEntry> {
        let log = ApiLogEntry {
            id: LogId::new(),
            timestamp: now.to_rfc3339(),
            method: LOG_METHOD.to_string(),
            endpoint: self.config.endpoint.clone(),
            source_url: domain.to_string(),
            provided_key: key.map(str::to_string),
            response_status: status_code,
            response_body: serde_json::to_string(body)?,
        };
        if let Err(e) = self.store.append_log(&log) {
            warn!("Failed to append API log entry: {}", e);
        }
        Ok(log)
    }

    fn check_domain(
        &self,
        domain: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<(u16, VerifyResponse)> {
        if let Some(license) = self.store.find_license_by_domain(domain)? {
            let catalog = self.store.list_modules()?;
            return Ok((200, domain_grant(&license, &catalog, now)));
        }

        if let Some(request) = self.store.find_request_by_domain(domain)? {
            let message = request
                .custom_message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| MSG_PENDING.to_string());
            return Ok((
                200,
                VerifyResponse::Request(RequestNotice {
                    status: VerifyStatus::Pending,
                    message,
                    request_id: request.id,
                }),
            ));
        }

        if !is_registrable_domain(domain) {
            return Ok((400, VerifyResponse::error(ERR_INVALID_DOMAIN)));
        }
        if !self.config.auto_register {
            return Ok((403, VerifyResponse::error(ERR_REGISTRATION_CLOSED)));
        }

        let request = auto_request(domain, now);
        match self.store.insert_request(&request) {
            Ok(()) => {
                info!("Registered automatic license request for {}", domain);
                Ok((
                    201,
                    VerifyResponse::Request(RequestNotice {
                        status: VerifyStatus::Requested,
                        message: MSG_REQUESTED.to_string(),
                        request_id: request.id,
                    }),
                ))
            }
            Err(e) => {
                warn!("Failed to create request for {}: {}", domain, e);
                Ok((
                    500,
                    VerifyResponse::error(format!("Failed to create request: {e}")),
                ))
            }
        }
    }

    fn check_key(
        &self,
        domain: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> LicenseResult<(u16, VerifyResponse)> {
        let Some(license) = self.store.find_license_by_key(key)? else {
            return Ok((403, VerifyResponse::error(ERR_INVALID_KEY)));
        };
        if normalize_domain(&license.domain) != domain {
            return Ok((403, VerifyResponse::error(ERR_DOMAIN_MISMATCH)));
        }
        if license.is_suspended() {
            return Ok((403, VerifyResponse::error(ERR_SUSPENDED)));
        }

        let catalog = self.store.list_modules()?;
        let expired = license.is_expired(now);
        let status = if expired {
            VerifyStatus::Expired
        } else {
            VerifyStatus::Valid
        };
        Ok((200, VerifyResponse::License(grant(&license, &catalog, status, None, None, now))))
    }
}

fn domain_grant(license: &License, catalog: &[ModuleDefinition], now: DateTime<Utc>) -> VerifyResponse {
    let response = if license.is_suspended() {
        grant(
            license,
            catalog,
            VerifyStatus::Suspended,
            Some(ERR_SUSPENDED.to_string()),
            None,
            now,
        )
    } else {
        let status = if license.is_expired(now) {
            VerifyStatus::Expired
        } else {
            VerifyStatus::Active
        };
        grant(
            license,
            catalog,
            status,
            Some(MSG_DOMAIN_MATCH.to_string()),
            Some(license.key.clone()),
            now,
        )
    };
    VerifyResponse::License(response)
}

fn grant(
    license: &License,
    catalog: &[ModuleDefinition],
    status: VerifyStatus,
    message: Option<String>,
    key: Option<String>,
    now: DateTime<Utc>,
) -> LicenseGrant {
    let usable = matches!(status, VerifyStatus::Active | VerifyStatus::Valid);
    LicenseGrant {
        status,
        message,
        key,
        valid_until: license.valid_until.clone(),
        days_remaining: license.days_remaining(now),
        // expired licenses still show what they would unlock
        modules: rich_modules(license, catalog, status != VerifyStatus::Suspended),
        features: if usable {
            license.features.clone()
        } else {
            FeatureSet::new()
        },
    }
}

/// Annotates every catalog module with the license's flag.
///
/// With `enabled == false` every module is reported inactive.
#[must_use]
pub fn rich_modules(license: &License, catalog: &[ModuleDefinition], enabled: bool) -> Vec<RichModule> {
    catalog
        .iter()
        .map(|module| RichModule {
            technical_name: module.id.clone(),
            title: module.label.clone(),
            description: module.description.clone(),
            icon_name: module.icon_name.clone(),
            active: enabled && license.has_feature(&module.id),
        })
        .collect()
}
