//! Remote medication API
//!
//! Typed request/response operations against the per-user medication
//! collection. The reconciler only talks to the `RemoteClient` trait;
//! `HttpRemoteClient` is the production adapter.
//!
//! ## Errors
//!
//! A missing record is reported as `RemoteError::NotFound`. The reconciler
//! treats that as a control signal ("never pushed", "already deleted");
//! every other variant aborts the current sync unit.

mod error;
mod http;
mod wire;

use async_trait::async_trait;

use crate::models::{MedicationPatch, NewMedication};

pub use error::RemoteError;
pub use http::HttpRemoteClient;
pub use wire::{HealthStatus, RemoteMedication};

/// Operations the reconciler needs from the remote collection
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch every medication belonging to `owner`
    async fn list(&self, owner: &str) -> Result<Vec<RemoteMedication>, RemoteError>;

    /// Fetch one medication
    async fn get(&self, owner: &str, id: &str) -> Result<RemoteMedication, RemoteError>;

    /// Create a medication; the server assigns timestamps
    async fn create(
        &self,
        owner: &str,
        body: &NewMedication,
    ) -> Result<RemoteMedication, RemoteError>;

    /// Update a medication; the server returns the new canonical copy
    async fn update(
        &self,
        owner: &str,
        id: &str,
        body: &MedicationPatch,
    ) -> Result<RemoteMedication, RemoteError>;

    /// Delete a medication
    async fn delete(&self, owner: &str, id: &str) -> Result<(), RemoteError>;

    /// Check that the API is reachable
    async fn health(&self) -> Result<HealthStatus, RemoteError>;
}
