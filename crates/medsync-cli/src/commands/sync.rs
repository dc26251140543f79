//! Sync command handler

use std::sync::Arc;

use anyhow::{bail, Result};

use medsync_core::{
    Config, HttpRemoteClient, LocalStore, Reconciler, SharedStore, SyncFacade, SyncOutcome,
};

use crate::output::Output;

/// Sync with the remote API
///
/// With an id only that medication is synchronized; it may be a prefix,
/// and may name a medication that is waiting to be deleted remotely.
pub async fn sync<S: LocalStore>(
    store: SharedStore<S>,
    config: &Config,
    id: Option<String>,
    output: &Output,
) -> Result<()> {
    if config.api_url.is_none() {
        bail!(
            "API URL not configured. Set it with:\n  \
             medsync config set api_url https://your-server/api\n  \
             medsync config set api_key <key>"
        );
    }
    let owner = config.require_username()?.to_string();
    let facade = facade(store, config)?;

    let outcome = match id {
        Some(prefix) => {
            let id = resolve_any(&facade, &prefix, &owner).await?;
            output.message(&format!("Syncing medication {}...", id));
            facade.sync_one(&id, &owner).await
        }
        None => {
            output.message(&format!("Syncing medications for {}...", owner));
            facade.sync_all(&owner).await
        }
    };

    match outcome {
        SyncOutcome::Completed(report) => {
            output.print_report(&report);
            Ok(())
        }
        SyncOutcome::Skipped => {
            output.message("A sync is already in progress.");
            Ok(())
        }
        SyncOutcome::Failed(message) => bail!("Sync failed: {}", message),
    }
}

/// Sync quietly (for auto-sync) - no output on success
///
/// Does nothing unless sync is enabled and an API URL is configured.
pub async fn sync_quiet<S: LocalStore>(
    store: SharedStore<S>,
    config: &Config,
    id: Option<&str>,
) -> Result<()> {
    if !config.sync_enabled || config.api_url.is_none() {
        return Ok(());
    }
    let owner = config.require_username()?;
    let facade = facade(store, config)?;

    let outcome = match id {
        Some(id) => facade.sync_one(id, owner).await,
        None => facade.sync_all(owner).await,
    };

    match outcome {
        SyncOutcome::Failed(message) => bail!(message),
        SyncOutcome::Completed(_) | SyncOutcome::Skipped => Ok(()),
    }
}

fn facade<S: LocalStore>(store: SharedStore<S>, config: &Config) -> Result<SyncFacade<S>> {
    let remote = HttpRemoteClient::from_config(config)?;
    Ok(SyncFacade::new(Reconciler::new(store, Arc::new(remote))))
}

/// Expand a prefix over every local record, tombstones included
///
/// A prefix matching nothing locally is passed through unchanged.
async fn resolve_any<S: LocalStore>(
    facade: &SyncFacade<S>,
    prefix: &str,
    owner: &str,
) -> Result<String> {
    let meds = facade
        .reconciler()
        .store()
        .lock()
        .await
        .find_all_by_owner(owner)?;

    if meds.iter().any(|m| m.id == prefix) {
        return Ok(prefix.to_string());
    }

    let matches: Vec<&str> = meds
        .iter()
        .map(|m| m.id.as_str())
        .filter(|id| id.starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Ok(prefix.to_string()),
        [only] => Ok(only.to_string()),
        _ => bail!(
            "Ambiguous ID '{}' matches {} medications. Please provide more characters.",
            prefix,
            matches.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use medsync_core::{shared, Frequency, Medication, MemoryStore, NewMedication};

    fn config(api_url: Option<&str>, sync_enabled: bool) -> Config {
        Config {
            api_url: api_url.map(str::to_string),
            username: Some("alice".to_string()),
            sync_enabled,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_sync_without_url_explains_setup() {
        let err = sync(
            shared(MemoryStore::new()),
            &config(None, true),
            None,
            &Output::new(OutputFormat::Quiet),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("config set api_url"));
    }

    #[tokio::test]
    async fn test_sync_quiet_disabled_is_noop() {
        let result = sync_quiet(
            shared(MemoryStore::new()),
            &config(Some("http://127.0.0.1:9"), false),
            None,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_sync_quiet_reports_failure() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/users/alice/medications")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = sync_quiet(
            shared(MemoryStore::new()),
            &config(Some(&server.url()), true),
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_resolve_any_includes_tombstones() {
        let store = shared(MemoryStore::new());
        let mut med = Medication::new("alice", NewMedication::new("A", "1", Frequency::Daily));
        med.id = "abc123".to_string();
        med.mark_deleted();
        store.lock().await.insert(&med).unwrap();

        let facade = facade(store, &config(Some("http://127.0.0.1:9"), true)).unwrap();

        assert_eq!(resolve_any(&facade, "abc", "alice").await.unwrap(), "abc123");
        assert_eq!(resolve_any(&facade, "zzz", "alice").await.unwrap(), "zzz");
    }
}
