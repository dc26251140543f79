//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::NaiveTime;
use serde::Serialize;

use medsync_core::{Medication, ReminderPlan, ReminderRepeat, SyncReport};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single medication
    pub fn print_medication(&self, med: &Medication) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", med.id);
                println!("Name:      {}", med.name);
                println!("Dosage:    {}", med.dosage);
                println!("Frequency: {}", med.frequency.title());
                println!("Reminder:  {}", describe_reminder(med));
                println!("Created:   {}", med.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:   {}", med.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(med),
            OutputFormat::Quiet => {
                println!("{}", med.id);
            }
        }
    }

    /// Print a list of medications
    pub fn print_medications(&self, meds: &[Medication]) {
        match self.format {
            OutputFormat::Human => {
                if meds.is_empty() {
                    println!("No medications found.");
                    return;
                }
                for med in meds {
                    let deleted = if med.is_deleted() { " [deleted]" } else { "" };
                    println!(
                        "{} | {}{} | {} | {}",
                        short_id(&med.id),
                        truncate(&med.name, 30),
                        deleted,
                        truncate(&med.dosage, 15),
                        med.frequency.title()
                    );
                }
                println!("\n{} medication(s)", meds.len());
            }
            OutputFormat::Json => print_json(&meds),
            OutputFormat::Quiet => {
                for med in meds {
                    println!("{}", med.id);
                }
            }
        }
    }

    /// Print the result of a sync pass
    pub fn print_report(&self, report: &SyncReport) {
        match self.format {
            OutputFormat::Human => {
                if report.is_converged() {
                    println!("✓ Sync complete - already up to date");
                } else {
                    println!("✓ Sync complete - {}", report);
                }
            }
            OutputFormat::Json => print_json(report),
            OutputFormat::Quiet => {}
        }
    }

    /// Print the reminders a scheduler would register
    pub fn print_reminders(&self, plan: &ReminderPlan) {
        match self.format {
            OutputFormat::Human => {
                if plan.schedule.is_empty() {
                    println!("No reminders scheduled.");
                    return;
                }
                for slot in &plan.schedule {
                    println!(
                        "{} | {} | {}",
                        slot.time.format("%H:%M"),
                        describe_repeat(slot.repeat),
                        slot.body
                    );
                }
                println!("\n{} reminder(s)", plan.schedule.len());
            }
            OutputFormat::Json => print_json(plan),
            OutputFormat::Quiet => {
                for slot in &plan.schedule {
                    println!("{}", slot.request_id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Pretty-print any serializable value as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode JSON output: {}", e),
    }
}

/// First 8 characters of an id
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn describe_reminder(med: &Medication) -> String {
    let reminder = &med.reminder;
    if !reminder.alert {
        return "off".to_string();
    }

    let times: Vec<String> = [reminder.first, reminder.second]
        .into_iter()
        .flatten()
        .map(format_time)
        .collect();
    let mut text = if times.is_empty() {
        "on (no time set)".to_string()
    } else {
        format!("on at {}", times.join(", "))
    };
    if let Some(day) = reminder.weekday {
        text.push_str(&format!(" every {}", day));
    }
    text
}

fn describe_repeat(repeat: ReminderRepeat) -> String {
    match repeat {
        ReminderRepeat::Daily => "daily".to_string(),
        ReminderRepeat::Weekly(day) => format!("every {}", day),
    }
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medsync_core::{Frequency, NewMedication, ReminderSettings};

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ééééééééééé", 5), "éé...");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("srv-1"), "srv-1");
    }

    #[test]
    fn test_describe_reminder() {
        let mut med = Medication::new("alice", NewMedication::new("A", "1", Frequency::Weekly));
        assert_eq!(describe_reminder(&med), "off");

        med.reminder = ReminderSettings {
            alert: true,
            first: NaiveTime::from_hms_opt(8, 0, 0),
            second: None,
            weekday: Some(chrono::Weekday::Mon),
        };
        assert_eq!(describe_reminder(&med), "on at 08:00 every Mon");
    }
}
