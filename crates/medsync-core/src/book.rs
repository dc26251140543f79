//! Local medication edits
//!
//! `MedicationBook` is the user-facing side of the store: it creates,
//! edits and soft-deletes medications for one owner. Every edit is a
//! single-record commit; the reconciler pushes it on the next sync.
//!
//! Tombstones are invisible here: a soft-deleted medication cannot be
//! read or edited, only synced away.

use thiserror::Error;

use crate::models::{Medication, MedicationPatch, NewMedication, ReminderSettings};
use crate::storage::{ChangeSet, LocalStore, SharedStore, StorageError};

/// Errors from local medication edits
#[derive(Error, Debug)]
pub enum BookError {
    #[error("Medication not found: {id}")]
    NotFound { id: String },

    #[error("Ambiguous id prefix '{prefix}' matches {count} medications")]
    Ambiguous { prefix: String, count: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type BookResult<T> = Result<T, BookError>;

/// One owner's medications in the local store
pub struct MedicationBook<S: LocalStore> {
    store: SharedStore<S>,
    owner: String,
}

impl<S: LocalStore> MedicationBook<S> {
    pub fn new(store: SharedStore<S>, owner: impl Into<String>) -> Self {
        Self {
            store,
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Add a new medication
    pub async fn create(&self, draft: NewMedication) -> BookResult<Medication> {
        let med = Medication::new(self.owner.clone(), draft);
        self.store.lock().await.insert(&med)?;
        Ok(med)
    }

    /// Apply a patch; a patch that changes nothing leaves `updated_at` alone
    pub async fn update(&self, id: &str, patch: &MedicationPatch) -> BookResult<Medication> {
        let mut med = self.require(id).await?;
        if med.apply_patch(patch) {
            self.save(&med).await?;
        }
        Ok(med)
    }

    /// Replace the reminder settings
    ///
    /// Reminders never leave the device, so `updated_at` is not bumped.
    pub async fn set_reminder(&self, id: &str, reminder: ReminderSettings) -> BookResult<Medication> {
        let mut med = self.require(id).await?;
        if med.reminder != reminder {
            med.reminder = reminder;
            self.save(&med).await?;
        }
        Ok(med)
    }

    /// Mark a medication deleted; it is purged once the server confirms
    pub async fn soft_delete(&self, id: &str) -> BookResult<Medication> {
        let mut med = self.require(id).await?;
        med.mark_deleted();
        self.save(&med).await?;
        Ok(med)
    }

    /// An active medication by id
    pub async fn get(&self, id: &str) -> BookResult<Option<Medication>> {
        let med = self
            .store
            .lock()
            .await
            .find_by_id_and_owner(id, &self.owner)?;
        Ok(med.filter(|m| !m.is_deleted()))
    }

    /// Active medications, sorted by name
    pub async fn list(&self) -> BookResult<Vec<Medication>> {
        let mut meds: Vec<Medication> = self
            .all()
            .await?
            .into_iter()
            .filter(|m| !m.is_deleted())
            .collect();
        meds.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(meds)
    }

    /// Every medication, tombstones included
    pub async fn all(&self) -> BookResult<Vec<Medication>> {
        Ok(self.store.lock().await.find_all_by_owner(&self.owner)?)
    }

    /// Expand a unique id prefix to the full id of an active medication
    pub async fn resolve_id(&self, prefix: &str) -> BookResult<String> {
        let mut matches: Vec<String> = self
            .list()
            .await?
            .into_iter()
            .map(|m| m.id)
            .filter(|id| id.starts_with(prefix))
            .collect();

        if let Some(exact) = matches.iter().find(|id| id.as_str() == prefix) {
            return Ok(exact.clone());
        }

        if matches.len() > 1 {
            return Err(BookError::Ambiguous {
                prefix: prefix.to_string(),
                count: matches.len(),
            });
        }

        matches.pop().ok_or_else(|| BookError::NotFound {
            id: prefix.to_string(),
        })
    }

    async fn require(&self, id: &str) -> BookResult<Medication> {
        self.get(id).await?.ok_or_else(|| BookError::NotFound {
            id: id.to_string(),
        })
    }

    async fn save(&self, med: &Medication) -> BookResult<()> {
        let mut changes = ChangeSet::new();
        changes.upsert(med.clone());
        self.store.lock().await.commit(changes)?;
        Ok(())
    }
}
