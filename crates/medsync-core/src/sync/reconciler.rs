//! Last-writer-wins reconciliation
//!
//! A sync unit (one medication, or a user's whole collection) collects its
//! local writes in a `ChangeSet` and commits them once at the end. A
//! failure anywhere in the unit leaves the local store untouched.
//!
//! Only `RemoteError::NotFound` is handled here: on `get` it means the
//! record was never pushed, on `delete` it means the deletion already
//! happened. Every other error aborts the unit.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{SyncError, SyncReport};
use crate::models::Medication;
use crate::remote::{RemoteClient, RemoteMedication};
use crate::storage::{ChangeSet, LocalStore, SharedStore};

/// Merges local medications with the remote collection
pub struct Reconciler<S: LocalStore> {
    store: SharedStore<S>,
    remote: Arc<dyn RemoteClient>,
}

impl<S: LocalStore> Reconciler<S> {
    pub fn new(store: SharedStore<S>, remote: Arc<dyn RemoteClient>) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &SharedStore<S> {
        &self.store
    }

    /// Synchronize one medication
    ///
    /// A medication that does not exist locally is left alone.
    pub async fn sync_one(&self, id: &str, owner: &str) -> Result<SyncReport, SyncError> {
        debug!("Syncing medication {} for {}", id, owner);
        let result = self.sync_one_inner(id, owner).await;
        if let Err(ref e) = result {
            warn!("Sync of medication {} failed: {}", id, e);
        }
        result
    }

    /// Synchronize every medication of `owner`
    pub async fn sync_all(&self, owner: &str) -> Result<SyncReport, SyncError> {
        info!("Starting full sync for {}", owner);
        match self.sync_all_inner(owner).await {
            Ok(report) => {
                info!("Sync complete for {}: {}", owner, report);
                Ok(report)
            }
            Err(e) => {
                warn!("Sync failed for {}: {}", owner, e);
                Err(e)
            }
        }
    }

    async fn sync_one_inner(&self, id: &str, owner: &str) -> Result<SyncReport, SyncError> {
        let local = {
            let store = self.store.lock().await;
            store.find_by_id_and_owner(id, owner)?
        };

        let mut unit = Unit::default();

        let Some(local) = local else {
            debug!("Medication {} not found locally, nothing to sync", id);
            return Ok(unit.report);
        };

        if local.is_deleted() {
            self.propagate_delete(owner, local, &mut unit).await?;
        } else {
            match self.remote.get(owner, id).await {
                Ok(remote) => self.merge(owner, local, &remote, &mut unit).await?,
                Err(e) if e.is_not_found() => self.push_new(owner, local, &mut unit).await?,
                Err(e) => return Err(e.into()),
            }
        }

        self.commit(unit.changes).await?;
        Ok(unit.report)
    }

    async fn sync_all_inner(&self, owner: &str) -> Result<SyncReport, SyncError> {
        let remotes = self.remote.list(owner).await?;

        let mut locals: HashMap<String, Medication> = {
            let store = self.store.lock().await;
            store.find_all_by_owner(owner)?
        }
        .into_iter()
        .map(|m| (m.id.clone(), m))
        .collect();

        let mut unit = Unit::default();
        let mut seen = HashSet::new();

        // Remote pass: every record the server knows about
        for remote in &remotes {
            if !seen.insert(remote.id.as_str()) {
                debug!("Ignoring duplicate remote medication {}", remote.id);
                continue;
            }

            match locals.remove(&remote.id) {
                Some(local) if local.is_deleted() => {
                    self.propagate_delete(owner, local, &mut unit).await?
                }
                Some(local) => self.merge(owner, local, remote, &mut unit).await?,
                None => {
                    debug!("Pulling new medication {}", remote.id);
                    unit.changes.upsert(Medication::from_remote(remote));
                    unit.report.pulled += 1;
                }
            }
        }

        // Local pass: records the server has never seen
        let mut local_only: Vec<Medication> = locals.into_values().collect();
        local_only.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        for local in local_only {
            if local.is_deleted() {
                self.propagate_delete(owner, local, &mut unit).await?;
            } else {
                self.push_new(owner, local, &mut unit).await?;
            }
        }

        self.commit(unit.changes).await?;
        Ok(unit.report)
    }

    /// Apply the last-writer-wins rule to two copies of the same record
    async fn merge(
        &self,
        owner: &str,
        mut local: Medication,
        remote: &RemoteMedication,
        unit: &mut Unit,
    ) -> Result<(), SyncError> {
        match remote.updated_at.cmp(&local.updated_at) {
            Ordering::Greater => {
                debug!("Remote copy of {} is newer, updating local", local.id);
                local.apply_remote(remote);
                unit.changes.upsert(local);
                unit.report.updated_local += 1;
            }
            Ordering::Less => {
                debug!("Local copy of {} is newer, updating remote", local.id);
                let updated = self
                    .remote
                    .update(owner, &local.id, &local.to_full_patch())
                    .await?;
                adopt(local, &updated, &mut unit.changes);
                unit.report.updated_remote += 1;
            }
            Ordering::Equal => {
                unit.report.unchanged += 1;
            }
        }
        Ok(())
    }

    /// Create a record the server has never seen
    async fn push_new(
        &self,
        owner: &str,
        local: Medication,
        unit: &mut Unit,
    ) -> Result<(), SyncError> {
        debug!("Pushing new medication {}", local.id);
        let created = self.remote.create(owner, &local.to_new_medication()).await?;
        adopt(local, &created, &mut unit.changes);
        unit.report.pushed += 1;
        Ok(())
    }

    /// Delete a tombstone remotely, then purge it locally
    async fn propagate_delete(
        &self,
        owner: &str,
        local: Medication,
        unit: &mut Unit,
    ) -> Result<(), SyncError> {
        match self.remote.delete(owner, &local.id).await {
            Ok(()) => debug!("Deleted medication {} remotely", local.id),
            Err(e) if e.is_not_found() => {
                debug!("Medication {} already absent remotely", local.id)
            }
            Err(e) => return Err(e.into()),
        }
        unit.changes.purge(local.id);
        unit.report.purged += 1;
        Ok(())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), SyncError> {
        if changes.is_empty() {
            return Ok(());
        }
        debug!("Committing {} local changes", changes.len());
        let mut store = self.store.lock().await;
        store.commit(changes)?;
        Ok(())
    }
}

/// Pending writes and counters of one sync unit
#[derive(Default)]
struct Unit {
    changes: ChangeSet,
    report: SyncReport,
}

/// Replace the local copy with the server's answer
///
/// The server's id wins; the row under the old id is purged if it differs.
fn adopt(mut local: Medication, remote: &RemoteMedication, changes: &mut ChangeSet) {
    let old_id = local.id.clone();
    local.apply_remote(remote);
    if local.id != old_id {
        debug!("Server assigned id {} to medication {}", local.id, old_id);
        changes.purge(old_id);
    }
    changes.upsert(local);
}
