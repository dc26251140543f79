//! Reminders command handler

use anyhow::Result;

use medsync_core::{reminders, LocalStore, MedicationBook, ReminderPlan};

use crate::output::Output;

/// Show the reminders a scheduler should register
pub async fn show<S: LocalStore>(book: &MedicationBook<S>, output: &Output) -> Result<()> {
    let plan = build_plan(book).await?;
    output.print_reminders(&plan);
    Ok(())
}

async fn build_plan<S: LocalStore>(book: &MedicationBook<S>) -> Result<ReminderPlan> {
    let meds = book.all().await?;
    Ok(reminders::plan(&reminders::project(&meds)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use medsync_core::{shared, Frequency, MemoryStore, NewMedication, ReminderSettings};

    #[tokio::test]
    async fn test_plan_skips_deleted_medications() {
        let book = MedicationBook::new(shared(MemoryStore::new()), "alice");
        let reminder = ReminderSettings {
            alert: true,
            first: NaiveTime::from_hms_opt(8, 0, 0),
            ..Default::default()
        };

        let kept = book
            .create(NewMedication::new("A", "1", Frequency::Daily))
            .await
            .unwrap();
        book.set_reminder(&kept.id, reminder.clone()).await.unwrap();

        let gone = book
            .create(NewMedication::new("B", "1", Frequency::Daily))
            .await
            .unwrap();
        book.set_reminder(&gone.id, reminder).await.unwrap();
        book.soft_delete(&gone.id).await.unwrap();

        let plan = build_plan(&book).await.unwrap();

        assert_eq!(plan.cancel.len(), 4);
        assert_eq!(plan.schedule.len(), 1);
        assert_eq!(plan.schedule[0].request_id, format!("medreminder.{}.1", kept.id));
    }
}
