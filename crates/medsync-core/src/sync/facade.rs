//! Single-flight entry point for sync
//!
//! At most one sync runs per facade. A call that arrives while another is
//! in flight is dropped, not queued. Failures never escape as `Err`: they
//! become the facade's last error and a `SyncStatus::Failed` update.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{Reconciler, SyncError, SyncReport};
use crate::storage::LocalStore;

/// Observable state of a facade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing,
    /// The last sync failed with this message
    Failed(String),
}

/// Result of asking the facade to sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another sync was already running; nothing was done
    Skipped,
    Failed(String),
}

#[derive(Debug, Default)]
struct FacadeState {
    last_error: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
}

/// Serializes syncs over one reconciler
pub struct SyncFacade<S: LocalStore> {
    reconciler: Reconciler<S>,
    busy: AtomicBool,
    state: Mutex<FacadeState>,
    status: watch::Sender<SyncStatus>,
}

impl<S: LocalStore> SyncFacade<S> {
    pub fn new(reconciler: Reconciler<S>) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            reconciler,
            busy: AtomicBool::new(false),
            state: Mutex::new(FacadeState::default()),
            status,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    /// Whether a sync is currently in flight
    pub fn is_syncing(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Message of the most recent failure, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    /// When the last successful sync finished
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.state().last_synced_at
    }

    /// Receive every status change
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Synchronize one medication
    pub async fn sync_one(&self, id: &str, owner: &str) -> SyncOutcome {
        self.run(self.reconciler.sync_one(id, owner)).await
    }

    /// Synchronize every medication of `owner`
    pub async fn sync_all(&self, owner: &str) -> SyncOutcome {
        self.run(self.reconciler.sync_all(owner)).await
    }

    async fn run<F>(&self, sync: F) -> SyncOutcome
    where
        F: Future<Output = Result<SyncReport, SyncError>>,
    {
        let Some(_guard) = BusyGuard::acquire(&self.busy, &self.status) else {
            debug!("Sync already in progress, skipping");
            return SyncOutcome::Skipped;
        };

        match sync.await {
            Ok(report) => {
                {
                    let mut state = self.state();
                    state.last_error = None;
                    state.last_synced_at = Some(Utc::now());
                }
                self.status.send_replace(SyncStatus::Idle);
                SyncOutcome::Completed(report)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Sync failed: {}", message);
                self.state().last_error = Some(message.clone());
                self.status.send_replace(SyncStatus::Failed(message.clone()));
                SyncOutcome::Failed(message)
            }
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FacadeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Holds the busy flag; releases it even if the sync future is dropped
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
    status: &'a watch::Sender<SyncStatus>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(busy: &'a AtomicBool, status: &'a watch::Sender<SyncStatus>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        status.send_replace(SyncStatus::Syncing);
        Some(Self { busy, status })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        // An abandoned sync never reported a result
        self.status.send_if_modified(|s| {
            if *s == SyncStatus::Syncing {
                *s = SyncStatus::Idle;
                true
            } else {
                false
            }
        });
        self.busy.store(false, Ordering::Release);
    }
}
