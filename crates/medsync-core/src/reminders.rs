//! Reminder projection
//!
//! After a sync the caller re-reads the store and projects each medication
//! into a `ReminderInfo`. A notification scheduler turns those into
//! repeating reminders; this module only decides *what* to schedule.
//!
//! Rules:
//! - nothing for inactive medications, `as_needed` medications, or when
//!   the alert is switched off
//! - slot 1 at the first reminder time
//! - slot 2 at the second reminder time, for `twice_daily` only
//! - `weekly` reminders repeat on the configured weekday; without one,
//!   nothing is scheduled

use chrono::{NaiveTime, Weekday};
use serde::Serialize;

use crate::models::{Frequency, Medication, ReminderSettings};

/// Title shown on every reminder notification
pub const REMINDER_TITLE: &str = "Medication Reminder";

/// The slice of a medication a reminder scheduler needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderInfo {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub is_active: bool,
    pub reminder: ReminderSettings,
}

/// How a reminder repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReminderRepeat {
    Daily,
    Weekly(Weekday),
}

/// One repeating reminder to register
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderSlot {
    /// 1 or 2
    pub slot: u8,
    /// Stable identifier, used to replace or cancel the reminder
    pub request_id: String,
    pub time: NaiveTime,
    pub repeat: ReminderRepeat,
    pub title: &'static str,
    pub body: String,
}

/// Everything a scheduler does when reminders are rebuilt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderPlan {
    /// Request ids to withdraw first (every slot of every medication)
    pub cancel: Vec<String>,
    /// Reminders to register afterwards
    pub schedule: Vec<ReminderSlot>,
}

/// Project medications for the reminder scheduler
pub fn project(medications: &[Medication]) -> Vec<ReminderInfo> {
    medications.iter().map(ReminderInfo::from).collect()
}

/// Cancel-then-schedule plan for a full reminder rebuild
pub fn plan(reminders: &[ReminderInfo]) -> ReminderPlan {
    ReminderPlan {
        cancel: reminders.iter().flat_map(|r| request_ids(&r.id)).collect(),
        schedule: reminders.iter().flat_map(ReminderInfo::slots).collect(),
    }
}

/// Request ids of both slots of one medication
pub fn request_ids(medication_id: &str) -> [String; 2] {
    [request_id(medication_id, 1), request_id(medication_id, 2)]
}

fn request_id(medication_id: &str, slot: u8) -> String {
    format!("medreminder.{}.{}", medication_id, slot)
}

impl From<&Medication> for ReminderInfo {
    fn from(med: &Medication) -> Self {
        Self {
            id: med.id.clone(),
            owner: med.owner.clone(),
            name: med.name.clone(),
            dosage: med.dosage.clone(),
            frequency: med.frequency,
            is_active: !med.is_deleted(),
            reminder: med.reminder.clone(),
        }
    }
}

impl ReminderInfo {
    /// Whether this medication gets any reminders at all
    pub fn wants_reminders(&self) -> bool {
        self.is_active && self.reminder.alert && self.frequency != Frequency::AsNeeded
    }

    /// Reminders to register for this medication
    pub fn slots(&self) -> Vec<ReminderSlot> {
        if !self.wants_reminders() {
            return Vec::new();
        }

        let repeat = match (self.frequency, self.reminder.weekday) {
            (Frequency::Daily | Frequency::TwiceDaily, _) => ReminderRepeat::Daily,
            (Frequency::Weekly, Some(day)) => ReminderRepeat::Weekly(day),
            (Frequency::Weekly, None) | (Frequency::AsNeeded, _) => return Vec::new(),
        };

        let second = match self.frequency {
            Frequency::TwiceDaily => self.reminder.second,
            _ => None,
        };

        [(1, self.reminder.first), (2, second)]
            .into_iter()
            .filter_map(|(slot, time)| time.map(|t| self.slot(slot, t, repeat)))
            .collect()
    }

    fn slot(&self, slot: u8, time: NaiveTime, repeat: ReminderRepeat) -> ReminderSlot {
        ReminderSlot {
            slot,
            request_id: request_id(&self.id, slot),
            time,
            repeat,
            title: REMINDER_TITLE,
            body: format!("Time to take {} ({}).", self.name, self.dosage),
        }
    }
}
