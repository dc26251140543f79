//! JSON shapes exchanged with the medication API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Frequency;

/// The server's canonical copy of a medication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMedication {
    pub id: String,
    #[serde(rename = "username")]
    pub owner: String,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    #[serde(with = "crate::timestamp::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::timestamp::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

/// Response of the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// `{"data": ...}` wrapper around every successful response
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// Body of a successful delete
#[derive(Debug, Deserialize)]
pub(crate) struct DeletedPayload {
    #[allow(dead_code)]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
}
