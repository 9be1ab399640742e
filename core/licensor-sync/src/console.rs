//! Admin console: local mutations mirrored to the remote.
//!
//! Each operation writes the local store first and then pushes the change.
//! Without a sync engine the console works purely locally.

use crate::engine::{PushOutcome, SyncConfig, SyncEngine, SyncReport};
use crate::error::{SyncError, SyncResult};
use crate::protocol::AdminAction;
use chrono::Utc;
use licensor_license::{
    approve_request, generate_unique_key, ContactDetails, KeyFormat, LicenseDraft, LicenseError,
    RequestDraft, Verification, Verifier,
};
use licensor_store::{LicenseStore, StoreError};
use licensor_types::{
    normalize_domain, parse_valid_until, FeatureSet, License, LicenseId, LicenseRequest,
    ModuleDefinition, RequestId, SETTING_API_URL,
};
use tracing::info;

/// Where a change ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirrored {
    /// No remote configured.
    LocalOnly,
    Delivered,
    Queued,
}

impl From<PushOutcome> for Mirrored {
    fn from(outcome: PushOutcome) -> Self {
        match outcome {
            PushOutcome::Delivered => Self::Delivered,
            PushOutcome::Queued => Self::Queued,
        }
    }
}

/// Partial update of a license's master data. `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseUpdate {
    pub contact: Option<ContactDetails>,
    pub domain: Option<String>,
    pub valid_until: Option<String>,
    /// `Some("")` clears the note.
    pub note: Option<String>,
}

/// The admin's entry point for changing licensing data.
#[derive(Clone)]
pub struct AdminConsole {
    store: LicenseStore,
    engine: Option<SyncEngine>,
    verifier: Verifier,
    key_format: KeyFormat,
}

impl AdminConsole {
    /// A console without a remote.
    pub fn local(store: LicenseStore) -> Self {
        Self {
            verifier: Verifier::new(store.clone()),
            store,
            engine: None,
            key_format: KeyFormat::default(),
        }
    }

    /// A console that mirrors every change through `engine`.
    pub fn with_engine(engine: SyncEngine) -> Self {
        let store = engine.store().clone();
        Self {
            verifier: Verifier::new(store.clone()),
            store,
            engine: Some(engine),
            key_format: KeyFormat::default(),
        }
    }

    /// Mirrors through the backend `config` points at, or works locally when
    /// neither the config nor the store settings name one.
    pub fn from_config(store: LicenseStore, config: &SyncConfig) -> SyncResult<Self> {
        match SyncEngine::from_config(store.clone(), config) {
            Ok(engine) => Ok(Self::with_engine(engine)),
            Err(SyncError::NotConfigured(setting)) => {
                info!("No {} configured, changes stay local", setting);
                Ok(Self::local(store))
            }
            Err(e) => Err(e),
        }
    }

    /// True if changes are pushed to a remote.
    pub fn is_mirrored(&self) -> bool {
        self.engine.is_some()
    }

    /// Uses a different key format for new licenses.
    #[must_use]
    pub fn with_key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_format = key_format;
        self
    }

    pub fn store(&self) -> &LicenseStore {
        &self.store
    }

    async fn mirror(&self, action: AdminAction) -> SyncResult<Mirrored> {
        match &self.engine {
            Some(engine) => Ok(engine.push(action).await?.into()),
            None => Ok(Mirrored::LocalOnly),
        }
    }

    fn license(&self, id: &LicenseId) -> SyncResult<License> {
        self.store
            .get_license(id)?
            .ok_or_else(|| StoreError::NotFound(format!("license {id}")).into())
    }

    /// Creates a license with a fresh key.
    pub async fn create_license(&self, draft: LicenseDraft) -> SyncResult<License> {
        let key = generate_unique_key(&self.store, &self.key_format)?;
        let license = draft.build(key, Utc::now())?;
        self.store.insert_license(&license)?;
        info!("Created license {} for {}", license.id, license.domain);

        self.mirror(AdminAction::PushLicense {
            license: license.clone(),
        })
        .await?;
        Ok(license)
    }

    /// Turns a request into a license and removes the request.
    pub async fn approve_request(
        &self,
        request_id: &RequestId,
        contact: ContactDetails,
        features: FeatureSet,
        valid_until: &str,
    ) -> SyncResult<License> {
        let request = self
            .store
            .get_request(request_id)?
            .ok_or_else(|| StoreError::NotFound(format!("request {request_id}")))?;
        let key = generate_unique_key(&self.store, &self.key_format)?;
        let license = approve_request(&request, contact, features, valid_until, key, Utc::now())?;

        self.store.issue_for_request(&license, request_id)?;
        info!(
            "Approved request {} as license {} for {}",
            request_id, license.id, license.domain
        );

        self.mirror(AdminAction::PushLicense {
            license: license.clone(),
        })
        .await?;
        self.mirror(AdminAction::DeleteRequest {
            id: request_id.clone(),
        })
        .await?;
        Ok(license)
    }

    /// Deletes a request without issuing a license.
    pub async fn reject_request(&self, request_id: &RequestId) -> SyncResult<bool> {
        let existed = self.store.delete_request(request_id)?;
        self.mirror(AdminAction::DeleteRequest {
            id: request_id.clone(),
        })
        .await?;
        Ok(existed)
    }

    /// Records a request entered by hand.
    pub async fn create_request(&self, draft: RequestDraft) -> SyncResult<LicenseRequest> {
        let request = draft.build(Utc::now())?;
        self.store.insert_request(&request)?;
        self.mirror(AdminAction::CreateRequest {
            request: request.clone(),
        })
        .await?;
        Ok(request)
    }

    /// Updates contact data, note and custom message of a request.
    pub async fn update_request(&self, request: LicenseRequest) -> SyncResult<Mirrored> {
        self.store.update_request(&request)?;
        self.mirror(AdminAction::UpdateRequest { request }).await
    }

    /// Replaces the feature flags of a license.
    pub async fn update_features(
        &self,
        id: &LicenseId,
        features: FeatureSet,
    ) -> SyncResult<License> {
        self.store.update_license_features(id, &features)?;
        let license = self.license(id)?;
        self.mirror(AdminAction::PushLicense {
            license: license.clone(),
        })
        .await?;
        Ok(license)
    }

    /// Applies a partial master-data update.
    pub async fn update_details(&self, id: &LicenseId, update: LicenseUpdate) -> SyncResult<License> {
        let mut license = self.license(id)?;
        if let Some(contact) = update.contact {
            license.organization = contact.organization;
            license.contact_person = contact.contact_person;
            license.email = contact.email;
            license.phone_number = contact.phone_number;
        }
        if let Some(domain) = update.domain {
            license.domain = normalize_domain(&domain);
        }
        if let Some(valid_until) = update.valid_until {
            if parse_valid_until(&valid_until).is_none() {
                return Err(LicenseError::InvalidDate(valid_until).into());
            }
            license.valid_until = valid_until;
        }
        if let Some(note) = update.note {
            license.note = (!note.trim().is_empty()).then_some(note);
        }

        self.store.update_license(&license)?;
        self.mirror(AdminAction::PushLicense {
            license: license.clone(),
        })
        .await?;
        Ok(license)
    }

    /// Suspends a license.
    pub async fn revoke(&self, id: &LicenseId) -> SyncResult<License> {
        self.store.revoke_license(id)?;
        let license = self.license(id)?;
        info!("Revoked license {} ({})", id, license.domain);
        self.mirror(AdminAction::PushLicense {
            license: license.clone(),
        })
        .await?;
        Ok(license)
    }

    /// Deletes a license for good.
    pub async fn delete_license(&self, id: &LicenseId) -> SyncResult<bool> {
        let existed = self.store.delete_license(id)?;
        self.mirror(AdminAction::DeleteLicense { id: id.clone() })
            .await?;
        Ok(existed)
    }

    /// Adds a module to the catalog.
    pub async fn add_module(&self, module: ModuleDefinition) -> SyncResult<Mirrored> {
        self.store.add_module(&module)?;
        self.mirror(AdminAction::AddModule { module }).await
    }

    /// Removes a module from the catalog.
    pub async fn delete_module(&self, id: &str) -> SyncResult<bool> {
        let existed = self.store.delete_module(id)?;
        self.mirror(AdminAction::DeleteModule { id: id.to_string() })
            .await?;
        Ok(existed)
    }

    /// Runs a verification against the local store, as the API console does.
    ///
    /// The call is logged like any other.
    pub fn simulate_verify(&self, origin: &str, key: Option<&str>) -> SyncResult<Verification> {
        Ok(self.verifier.verify(origin, key, Utc::now())?)
    }

    /// Runs one sync round. Fails with `NotConfigured` without a remote.
    pub async fn sync(&self) -> SyncResult<SyncReport> {
        match &self.engine {
            Some(engine) => engine.sync_once().await,
            None => Err(SyncError::NotConfigured(SETTING_API_URL)),
        }
    }
}
