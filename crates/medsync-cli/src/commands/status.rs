//! Status command handler

use anyhow::Result;

use medsync_core::{Config, LocalStore, SharedStore};

use crate::output::{Output, OutputFormat};

/// Local record counts for one owner
#[derive(Debug, Default, PartialEq, Eq)]
struct Counts {
    active: usize,
    pending_deletes: usize,
}

/// Show status information
pub async fn show<S: LocalStore>(
    store: &SharedStore<S>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let counts = match config.username.as_deref() {
        Some(owner) => Some(count(store, owner).await?),
        None => None,
    };
    let db_path = config.sqlite_path();
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "username": config.username,
                    "sync_enabled": config.sync_enabled,
                    "api_url": config.api_url,
                    "storage": {
                        "database": db_path,
                        "database_size": db_size
                    },
                    "counts": counts.as_ref().map(|c| serde_json::json!({
                        "medications": c.active,
                        "pending_deletes": c.pending_deletes
                    }))
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", counts.as_ref().map(|c| c.active).unwrap_or(0));
        }
        OutputFormat::Human => {
            println!("medsync Status");
            println!("==============");
            println!();
            println!("User: {}", config.username.as_deref().unwrap_or("(not set)"));
            println!();
            println!("Sync:");
            println!(
                "  Status: {}",
                if config.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            if let Some(ref url) = config.api_url {
                println!("  Server: {}", url);
            }
            println!();
            println!("Storage:");
            println!("  Database: {}", db_path.display());
            println!("  Size:     {}", human_size(db_size));
            if let Some(c) = counts {
                println!();
                println!("Contents:");
                println!("  Medications:     {}", c.active);
                println!("  Pending deletes: {}", c.pending_deletes);
            }
        }
    }

    Ok(())
}

async fn count<S: LocalStore>(store: &SharedStore<S>, owner: &str) -> Result<Counts> {
    let meds = store.lock().await.find_all_by_owner(owner)?;
    let pending_deletes = meds.iter().filter(|m| m.is_deleted()).count();
    Ok(Counts {
        active: meds.len() - pending_deletes,
        pending_deletes,
    })
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medsync_core::{shared, Frequency, Medication, MemoryStore, NewMedication};

    #[tokio::test]
    async fn test_count_splits_tombstones() {
        let store = shared(MemoryStore::new());
        {
            let mut guard = store.lock().await;
            guard
                .insert(&Medication::new("alice", NewMedication::new("A", "1", Frequency::Daily)))
                .unwrap();
            let mut gone = Medication::new("alice", NewMedication::new("B", "1", Frequency::Daily));
            gone.mark_deleted();
            guard.insert(&gone).unwrap();
            guard
                .insert(&Medication::new("bob", NewMedication::new("C", "1", Frequency::Daily)))
                .unwrap();
        }

        let counts = count(&store, "alice").await.unwrap();
        assert_eq!(
            counts,
            Counts {
                active: 1,
                pending_deletes: 1
            }
        );
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
