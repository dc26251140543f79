//! In-memory local store

use std::collections::HashMap;
use std::io;

use super::error::{StorageError, StorageResult};
use super::{Change, ChangeSet, LocalStore};
use crate::models::Medication;

/// `HashMap`-backed store; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, Medication>,
    fail_next_commit: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit` fail without applying anything
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }

    /// Number of stored records across all owners, tombstones included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LocalStore for MemoryStore {
    fn find_by_id_and_owner(&self, id: &str, owner: &str) -> StorageResult<Option<Medication>> {
        Ok(self
            .records
            .get(id)
            .filter(|m| m.owner == owner)
            .cloned())
    }

    fn find_all_by_owner(&self, owner: &str) -> StorageResult<Vec<Medication>> {
        let mut meds: Vec<Medication> = self
            .records
            .values()
            .filter(|m| m.owner == owner)
            .cloned()
            .collect();
        meds.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(meds)
    }

    fn insert(&mut self, medication: &Medication) -> StorageResult<()> {
        if self.records.contains_key(&medication.id) {
            return Err(StorageError::DuplicateId {
                id: medication.id.clone(),
            });
        }
        self.records
            .insert(medication.id.clone(), medication.clone());
        Ok(())
    }

    fn commit(&mut self, changes: ChangeSet) -> StorageResult<()> {
        if std::mem::take(&mut self.fail_next_commit) {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                "commit rejected by test hook",
            )));
        }

        for (id, change) in changes {
            match change {
                Change::Upsert(med) => {
                    self.records.insert(id, med);
                }
                Change::Purge => {
                    self.records.remove(&id);
                }
            }
        }
        Ok(())
    }
}
