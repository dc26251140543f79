//! Storage layer
//!
//! The local store holds every medication of the device's user, including
//! tombstones for deletions the server has not confirmed yet.
//!
//! ## Architecture
//!
//! - **`LocalStore`**: synchronous trait the reconciler and the medication
//!   book are written against
//! - **`SqliteStore`**: production adapter (rusqlite)
//! - **`MemoryStore`**: in-memory adapter for tests and tooling
//!
//! Writes made by a sync unit are collected in a `ChangeSet` and applied
//! with `LocalStore::commit`, which is all-or-nothing.

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::Medication;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteStore;

/// Handle to a store shared between the sync engine and local editors
///
/// Hold the lock only for a single read or commit, never across a
/// network call.
pub type SharedStore<S> = Arc<Mutex<S>>;

/// Wrap a store for sharing
pub fn shared<S: LocalStore>(store: S) -> SharedStore<S> {
    Arc::new(Mutex::new(store))
}

/// Transactional access to locally persisted medications
pub trait LocalStore: Send {
    /// Find one medication, tombstones included
    fn find_by_id_and_owner(&self, id: &str, owner: &str) -> StorageResult<Option<Medication>>;

    /// Every medication of `owner`, tombstones included
    fn find_all_by_owner(&self, owner: &str) -> StorageResult<Vec<Medication>>;

    /// Insert a new medication; fails with `DuplicateId` if the id exists
    fn insert(&mut self, medication: &Medication) -> StorageResult<()>;

    /// Apply every change in the set, or none of them
    fn commit(&mut self, changes: ChangeSet) -> StorageResult<()>;
}

/// One pending write
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert or replace the record with this id
    Upsert(Medication),
    /// Hard-delete the record with this id
    Purge,
}

/// Writes accumulated by one sync unit, keyed by medication id
///
/// A later change for the same id replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: BTreeMap<String, Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an insert-or-replace of `medication`
    pub fn upsert(&mut self, medication: Medication) {
        self.changes
            .insert(medication.id.clone(), Change::Upsert(medication));
    }

    /// Stage a hard delete of `id`
    pub fn purge(&mut self, id: impl Into<String>) {
        self.changes.insert(id.into(), Change::Purge);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// The staged change for `id`, if any
    pub fn get(&self, id: &str) -> Option<&Change> {
        self.changes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.changes.iter().map(|(id, change)| (id.as_str(), change))
    }
}

impl IntoIterator for ChangeSet {
    type Item = (String, Change);
    type IntoIter = btree_map::IntoIter<String, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
