//! Upsert merge of a remote snapshot into the local store.
//!
//! The incoming row wins for licenses and requests (the remote is the last
//! writer once local changes have been pushed). Logs are append-only, so
//! only unknown ids are inserted. Local rows missing from the snapshot are
//! kept.

use crate::error::StoreResult;
use crate::{licenses, logs, requests, LicenseStore};
use licensor_types::{ApiLogEntry, License, LicenseRequest};
use serde::Serialize;
use tracing::debug;

/// Per-table outcome of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounts {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl MergeCounts {
    /// Returns true if the merge wrote anything.
    pub fn changed(&self) -> bool {
        self.inserted + self.updated > 0
    }
}

/// Outcome of [`LicenseStore::merge_snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub licenses: MergeCounts,
    pub requests: MergeCounts,
    pub logs_added: usize,
}

impl MergeReport {
    /// Returns true if any table changed.
    pub fn changed(&self) -> bool {
        self.licenses.changed() || self.requests.changed() || self.logs_added > 0
    }
}

impl LicenseStore {
    /// Merges remote records in a single transaction.
    pub fn merge_snapshot(
        &self,
        incoming_licenses: &[License],
        incoming_requests: &[LicenseRequest],
        incoming_logs: &[ApiLogEntry],
    ) -> StoreResult<MergeReport> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut report = MergeReport::default();

        for license in incoming_licenses {
            match licenses::load(&tx, &license.id)? {
                None => {
                    licenses::write(&tx, license, true)?;
                    report.licenses.inserted += 1;
                }
                Some(existing) if existing == *license => report.licenses.unchanged += 1,
                Some(_) => {
                    licenses::write(&tx, license, true)?;
                    report.licenses.updated += 1;
                }
            }
        }

        for request in incoming_requests {
            match requests::load(&tx, &request.id)? {
                None => {
                    requests::write(&tx, request, true)?;
                    report.requests.inserted += 1;
                }
                Some(existing) if existing == *request => report.requests.unchanged += 1,
                Some(_) => {
                    requests::write(&tx, request, true)?;
                    report.requests.updated += 1;
                }
            }
        }

        for entry in incoming_logs {
            if logs::insert_if_absent(&tx, entry)? {
                report.logs_added += 1;
            }
        }

        tx.commit()?;
        debug!(?report, "Merged remote snapshot");
        Ok(report)
    }
}
