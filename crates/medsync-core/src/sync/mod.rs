//! Synchronization with the remote medication API
//!
//! - `Reconciler`: last-writer-wins merge of one medication or a user's
//!   whole collection, with tombstone propagation
//! - `SyncFacade`: allows one sync at a time and turns failures into
//!   observable state
//!
//! ## Conflict resolution
//!
//! The copy with the greater `updated_at` wins. Equal timestamps mean the
//! record is already in sync and nothing is sent.

pub mod facade;
pub mod reconciler;
pub mod report;

use thiserror::Error;

use crate::remote::RemoteError;
use crate::storage::StorageError;

pub use facade::{SyncFacade, SyncOutcome, SyncStatus};
pub use reconciler::Reconciler;
pub use report::SyncReport;

/// A failure that aborted a sync unit
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
