//! medsync Core Library
//!
//! This crate provides the core functionality for medsync, a local-first
//! medication tracker that keeps a local SQLite store consistent with a
//! remote medication API.
//!
//! # Architecture
//!
//! - **Local store**: source of truth for the device, including pending
//!   tombstones for deletions that have not reached the server yet
//! - **Remote client**: typed HTTP client for the per-user collection
//! - **Reconciler**: last-writer-wins merge keyed on `updated_at`
//! - **Sync facade**: at most one sync in flight, failures become state
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let store = shared(SqliteStore::open(&config)?);
//! let remote = Arc::new(HttpRemoteClient::from_config(&config)?);
//!
//! let book = MedicationBook::new(store.clone(), "alice");
//! book.create(NewMedication::new("Aspirin", "100 mg", Frequency::Daily)).await?;
//!
//! let facade = SyncFacade::new(Reconciler::new(store, remote));
//! facade.sync_all("alice").await;
//! ```
//!
//! # Modules
//!
//! - `models`: Medication record, frequency, status, edit payloads
//! - `storage`: `LocalStore` trait with SQLite and in-memory adapters
//! - `remote`: `RemoteClient` trait and the HTTP adapter
//! - `sync`: reconciler and sync facade
//! - `book`: user-initiated local edits
//! - `reminders`: read-only projection consumed after sync
//! - `config`: Application configuration

pub mod book;
pub mod config;
pub mod models;
pub mod reminders;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod timestamp;

pub use book::{BookError, BookResult, MedicationBook};
pub use config::Config;
pub use models::{Frequency, Medication, MedicationPatch, NewMedication, ReminderSettings, Status};
pub use reminders::{ReminderInfo, ReminderPlan, ReminderRepeat, ReminderSlot};
pub use remote::{HealthStatus, HttpRemoteClient, RemoteClient, RemoteError, RemoteMedication};
pub use storage::{shared, ChangeSet, LocalStore, MemoryStore, SharedStore, SqliteStore, StorageError};
pub use sync::{Reconciler, SyncError, SyncFacade, SyncOutcome, SyncReport, SyncStatus};
