//! Data models for medsync
//!
//! Defines the synchronized `Medication` record and the payloads used to
//! create and edit it. A deleted medication is a tombstone that stays in
//! the local store until the server confirms the deletion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::remote::RemoteMedication;

/// How often a medication is taken
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    TwiceDaily,
    Weekly,
    AsNeeded,
}

impl Frequency {
    /// Every frequency, in display order
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::TwiceDaily,
        Frequency::Weekly,
        Frequency::AsNeeded,
    ];

    /// Wire and storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::TwiceDaily => "twice_daily",
            Frequency::Weekly => "weekly",
            Frequency::AsNeeded => "as_needed",
        }
    }

    /// Human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::TwiceDaily => "Twice daily",
            Frequency::Weekly => "Weekly",
            Frequency::AsNeeded => "As needed",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a frequency string is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown frequency '{0}'. Valid values: daily, twice_daily, weekly, as_needed")]
pub struct ParseFrequencyError(pub String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Frequency::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| ParseFrequencyError(s.to_string()))
    }
}

/// Lifecycle status of a local record
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    /// Soft-deleted locally; waiting for the remote delete to be confirmed
    Deleted,
}

impl Status {
    /// Integer code used by the local store
    pub fn code(&self) -> i64 {
        match self {
            Status::Active => 0,
            Status::Deleted => 1,
        }
    }

    /// Decode the integer code used by the local store
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Status::Active),
            1 => Some(Status::Deleted),
            _ => None,
        }
    }
}

/// Local-only reminder preferences
///
/// These never leave the device: reconciliation overwrites the synchronized
/// fields of a medication but always keeps its reminder settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderSettings {
    /// Whether reminders are enabled at all
    #[serde(default)]
    pub alert: bool,
    /// First reminder time of day
    #[serde(default)]
    pub first: Option<NaiveTime>,
    /// Second reminder time of day (twice-daily medications only)
    #[serde(default)]
    pub second: Option<NaiveTime>,
    /// Day of the week for weekly medications
    #[serde(default)]
    pub weekday: Option<Weekday>,
}

/// Fields needed to create a medication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
}

impl NewMedication {
    pub fn new(name: impl Into<String>, dosage: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            name: name.into(),
            dosage: dosage.into(),
            frequency,
        }
    }
}

/// Partial update; unset fields are left alone (and omitted on the wire)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
}

impl MedicationPatch {
    /// True when the patch sets no field
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.dosage.is_none() && self.frequency.is_none()
    }
}

/// A medication record as held in the local store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    /// Globally unique identifier, generated on the client
    pub id: String,
    /// User the record belongs to
    pub owner: String,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    /// When this medication was created (never changes afterwards)
    pub created_at: DateTime<Utc>,
    /// When this medication was last changed
    pub updated_at: DateTime<Utc>,
    pub status: Status,
    #[serde(default)]
    pub reminder: ReminderSettings,
}

impl Medication {
    /// Create a new, active medication with a fresh identifier
    pub fn new(owner: impl Into<String>, draft: NewMedication) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner: owner.into(),
            name: draft.name,
            dosage: draft.dosage,
            frequency: draft.frequency,
            created_at: now,
            updated_at: now,
            status: Status::Active,
            reminder: ReminderSettings::default(),
        }
    }

    /// Materialize a local record from the server's copy
    pub fn from_remote(remote: &RemoteMedication) -> Self {
        Self {
            id: remote.id.clone(),
            owner: remote.owner.clone(),
            name: remote.name.clone(),
            dosage: remote.dosage.clone(),
            frequency: remote.frequency,
            created_at: remote.created_at,
            updated_at: remote.updated_at,
            status: Status::Active,
            reminder: ReminderSettings::default(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.status == Status::Deleted
    }

    /// Overwrite every synchronized field with the server's copy
    ///
    /// The record becomes active again; reminder settings are kept.
    pub fn apply_remote(&mut self, remote: &RemoteMedication) {
        self.id = remote.id.clone();
        self.owner = remote.owner.clone();
        self.name = remote.name.clone();
        self.dosage = remote.dosage.clone();
        self.frequency = remote.frequency;
        self.created_at = remote.created_at;
        self.updated_at = remote.updated_at;
        self.status = Status::Active;
    }

    /// Apply a user edit; returns whether anything changed
    pub fn apply_patch(&mut self, patch: &MedicationPatch) -> bool {
        let mut changed = false;
        if let Some(ref name) = patch.name {
            if *name != self.name {
                self.name = name.clone();
                changed = true;
            }
        }
        if let Some(ref dosage) = patch.dosage {
            if *dosage != self.dosage {
                self.dosage = dosage.clone();
                changed = true;
            }
        }
        if let Some(frequency) = patch.frequency {
            if frequency != self.frequency {
                self.frequency = frequency;
                changed = true;
            }
        }
        if changed {
            self.touch();
        }
        changed
    }

    /// Soft-delete: keep the record as a tombstone until sync confirms it
    pub fn mark_deleted(&mut self) {
        self.status = Status::Deleted;
        self.touch();
    }

    /// Payload to create this medication remotely
    pub fn to_new_medication(&self) -> NewMedication {
        NewMedication {
            name: self.name.clone(),
            dosage: self.dosage.clone(),
            frequency: self.frequency,
        }
    }

    /// Payload that pushes every synchronized field to the server
    pub fn to_full_patch(&self) -> MedicationPatch {
        MedicationPatch {
            name: Some(self.name.clone()),
            dosage: Some(self.dosage.clone()),
            frequency: Some(self.frequency),
        }
    }

    /// Advance `updated_at`; never moves it backwards
    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}
