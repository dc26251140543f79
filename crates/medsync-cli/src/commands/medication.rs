//! Medication command handlers
//!
//! Write handlers return the id of the medication they touched so the
//! caller can push it with an auto-sync.

use std::io::{self, IsTerminal, Write};

use anyhow::{bail, Context, Result};
use chrono::{NaiveTime, Weekday};

use medsync_core::{
    BookError, Frequency, LocalStore, MedicationBook, MedicationPatch, NewMedication,
};

use crate::output::Output;

/// Reminder options given on the command line
#[derive(Debug, Default, Clone)]
pub struct ReminderArgs {
    pub off: bool,
    pub first: Option<NaiveTime>,
    pub second: Option<NaiveTime>,
    pub weekday: Option<Weekday>,
}

/// Add a new medication
pub async fn create<S: LocalStore>(
    book: &MedicationBook<S>,
    name: String,
    dosage: String,
    frequency: Frequency,
    output: &Output,
) -> Result<String> {
    let name = require_text("name", name)?;
    let dosage = require_text("dosage", dosage)?;

    let med = book
        .create(NewMedication::new(name, dosage, frequency))
        .await
        .context("Failed to create medication")?;

    output.success(&format!("Created medication: {}", med.id));
    output.print_medication(&med);

    Ok(med.id)
}

/// List medications; `all` includes ones waiting to be deleted remotely
pub async fn list<S: LocalStore>(
    book: &MedicationBook<S>,
    all: bool,
    output: &Output,
) -> Result<()> {
    let meds = if all {
        book.all().await?
    } else {
        book.list().await?
    };

    output.print_medications(&meds);
    Ok(())
}

/// Show a single medication
pub async fn show<S: LocalStore>(
    book: &MedicationBook<S>,
    id: String,
    output: &Output,
) -> Result<()> {
    let id = resolve(book, &id).await?;
    let med = book
        .get(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Medication not found: {}", id))?;

    output.print_medication(&med);
    Ok(())
}

/// Edit the synchronized fields of a medication
pub async fn edit<S: LocalStore>(
    book: &MedicationBook<S>,
    id: String,
    mut patch: MedicationPatch,
    output: &Output,
) -> Result<String> {
    if patch.is_empty() {
        bail!("Nothing to change. Pass --name, --dosage or --frequency.");
    }
    patch.name = patch.name.map(|n| require_text("name", n)).transpose()?;
    patch.dosage = patch.dosage.map(|d| require_text("dosage", d)).transpose()?;

    let id = resolve(book, &id).await?;
    let before = book.get(&id).await?;
    let med = book
        .update(&id, &patch)
        .await
        .context("Failed to update medication")?;

    if before.as_ref() == Some(&med) {
        output.message("No changes.");
    } else {
        output.success("Medication updated");
    }
    output.print_medication(&med);

    Ok(med.id)
}

/// Change the local reminder settings of a medication
pub async fn remind<S: LocalStore>(
    book: &MedicationBook<S>,
    id: String,
    args: ReminderArgs,
    output: &Output,
) -> Result<()> {
    let id = resolve(book, &id).await?;
    let current = book
        .get(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Medication not found: {}", id))?;

    let mut reminder = current.reminder.clone();
    if args.off {
        reminder.alert = false;
    } else {
        reminder.alert = true;
        if args.first.is_some() {
            reminder.first = args.first;
        }
        if args.second.is_some() {
            reminder.second = args.second;
        }
        if args.weekday.is_some() {
            reminder.weekday = args.weekday;
        }
        if reminder.first.is_none() {
            bail!("A reminder needs a time. Pass --first HH:MM.");
        }
    }

    let med = book
        .set_reminder(&id, reminder)
        .await
        .context("Failed to save reminder")?;

    if med.reminder.alert {
        output.success(&format!("Reminder enabled for {}", med.name));
    } else {
        output.success(&format!("Reminder disabled for {}", med.name));
    }

    Ok(())
}

/// Soft-delete a medication; the server copy goes on the next sync
pub async fn delete<S: LocalStore>(
    book: &MedicationBook<S>,
    id: String,
    yes: bool,
    output: &Output,
) -> Result<Option<String>> {
    let id = resolve(book, &id).await?;
    let med = book
        .get(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Medication not found: {}", id))?;

    if output.should_prompt() && !yes {
        println!("Delete medication: {} - {}", med.id, med.name);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(None);
        }
    }

    book.soft_delete(&id)
        .await
        .context("Failed to delete medication")?;

    output.success(&format!("Deleted medication: {}", id));

    Ok(Some(id))
}

/// Parse a `HH:MM` time of day
pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| format!("Invalid time '{}'. Use HH:MM (24-hour).", value))
}

/// Expand an id prefix, listing the candidates when it is ambiguous
async fn resolve<S: LocalStore>(book: &MedicationBook<S>, prefix: &str) -> Result<String> {
    match book.resolve_id(prefix).await {
        Ok(id) => Ok(id),
        Err(BookError::Ambiguous { .. }) => {
            eprintln!("Multiple medications match '{}':", prefix);
            for med in book.list().await? {
                if med.id.starts_with(prefix) {
                    eprintln!("  {} - {}", med.id, med.name);
                }
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
        Err(BookError::NotFound { .. }) => bail!("No medication found matching: {}", prefix),
        Err(e) => Err(e.into()),
    }
}

fn require_text(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("Medication {} cannot be empty", field);
    }
    Ok(trimmed.to_string())
}

/// Prompt for confirmation
///
/// Returns false without asking when stdin is not a terminal.
fn confirm(prompt: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use medsync_core::{shared, MemoryStore};

    fn book() -> MedicationBook<MemoryStore> {
        MedicationBook::new(shared(MemoryStore::new()), "alice")
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[tokio::test]
    async fn test_create_trims_and_rejects_blank() {
        let book = book();

        let id = create(
            &book,
            "  Aspirin ".to_string(),
            "100mg".to_string(),
            Frequency::Daily,
            &quiet(),
        )
        .await
        .unwrap();
        assert_eq!(book.get(&id).await.unwrap().unwrap().name, "Aspirin");

        let err = create(&book, "  ".to_string(), "1".to_string(), Frequency::Daily, &quiet())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("name cannot be empty"));
    }

    #[tokio::test]
    async fn test_edit_by_prefix() {
        let book = book();
        let id = create(&book, "A".into(), "1".into(), Frequency::Daily, &quiet())
            .await
            .unwrap();

        let patch = MedicationPatch {
            dosage: Some("2".to_string()),
            ..Default::default()
        };
        let edited = edit(&book, id[..6].to_string(), patch, &quiet()).await.unwrap();

        assert_eq!(edited, id);
        assert_eq!(book.get(&id).await.unwrap().unwrap().dosage, "2");
    }

    #[tokio::test]
    async fn test_edit_trims_like_create() {
        let book = book();
        let id = create(&book, "A".into(), "1".into(), Frequency::Daily, &quiet())
            .await
            .unwrap();

        let patch = MedicationPatch {
            name: Some("  Aspirin ".to_string()),
            dosage: Some(" 200mg".to_string()),
            ..Default::default()
        };
        edit(&book, id.clone(), patch, &quiet()).await.unwrap();

        let med = book.get(&id).await.unwrap().unwrap();
        assert_eq!(med.name, "Aspirin");
        assert_eq!(med.dosage, "200mg");

        let blank = MedicationPatch {
            dosage: Some("   ".to_string()),
            ..Default::default()
        };
        let err = edit(&book, id, blank, &quiet()).await.unwrap_err();
        assert!(err.to_string().contains("dosage cannot be empty"));
    }

    #[tokio::test]
    async fn test_edit_requires_a_field() {
        let book = book();
        let err = edit(&book, "x".into(), MedicationPatch::default(), &quiet())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Nothing to change"));
    }

    #[tokio::test]
    async fn test_remind_keeps_updated_at() {
        let book = book();
        let id = create(&book, "A".into(), "1".into(), Frequency::TwiceDaily, &quiet())
            .await
            .unwrap();
        let before = book.get(&id).await.unwrap().unwrap();

        let args = ReminderArgs {
            first: Some(parse_time("08:00").unwrap()),
            second: Some(parse_time("20:30").unwrap()),
            ..Default::default()
        };
        remind(&book, id.clone(), args, &quiet()).await.unwrap();

        let after = book.get(&id).await.unwrap().unwrap();
        assert!(after.reminder.alert);
        assert_eq!(after.reminder.second, NaiveTime::from_hms_opt(20, 30, 0));
        assert_eq!(after.updated_at, before.updated_at);

        let off = ReminderArgs {
            off: true,
            ..Default::default()
        };
        remind(&book, id.clone(), off, &quiet()).await.unwrap();
        let after = book.get(&id).await.unwrap().unwrap();
        assert!(!after.reminder.alert);
        assert_eq!(after.reminder.first, NaiveTime::from_hms_opt(8, 0, 0));
    }

    #[tokio::test]
    async fn test_remind_needs_time() {
        let book = book();
        let id = create(&book, "A".into(), "1".into(), Frequency::Daily, &quiet())
            .await
            .unwrap();

        let err = remind(&book, id, ReminderArgs::default(), &quiet())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--first"));
    }

    #[tokio::test]
    async fn test_delete_leaves_tombstone() {
        let book = book();
        let id = create(&book, "A".into(), "1".into(), Frequency::Daily, &quiet())
            .await
            .unwrap();

        let deleted = delete(&book, id.clone(), false, &quiet()).await.unwrap();

        assert_eq!(deleted, Some(id.clone()));
        assert!(book.get(&id).await.unwrap().is_none());
        assert_eq!(book.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_prefix() {
        let err = show(&book(), "nope".into(), &quiet()).await.unwrap_err();
        assert!(err.to_string().contains("No medication found matching: nope"));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("07:05"), Ok(NaiveTime::from_hms_opt(7, 5, 0).unwrap()));
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("noon").is_err());
    }
}
