//! medsync CLI
//!
//! Command-line interface for medsync - medications kept on this device
//! and synchronized with a remote medication API.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveTime, Weekday};
use clap::{Parser, Subcommand};

use medsync_core::{
    shared, BookError, Config, Frequency, MedicationBook, MedicationPatch, SharedStore,
    SqliteStore, StorageError,
};

mod commands;
mod logging;
mod output;

use commands::medication::{parse_time, ReminderArgs};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "medsync")]
#[command(about = "medsync - Local-first medication list with remote sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging (overridden by MEDSYNC_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a medication
    #[command(alias = "create")]
    Add {
        /// Medication name
        name: String,
        /// Dosage, e.g. "100mg"
        dosage: String,
        /// daily, twice_daily, weekly or as_needed
        #[arg(short, long, default_value = "daily")]
        frequency: Frequency,
    },
    /// List medications
    #[command(alias = "ls")]
    List {
        /// Include medications waiting to be deleted on the server
        #[arg(short, long)]
        all: bool,
    },
    /// Show medication details
    Show {
        /// Medication ID (full or prefix)
        id: String,
    },
    /// Edit a medication
    Edit {
        /// Medication ID (full or prefix)
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        dosage: Option<String>,
        #[arg(short, long)]
        frequency: Option<Frequency>,
    },
    /// Set reminder times for a medication (kept on this device only)
    Remind {
        /// Medication ID (full or prefix)
        id: String,
        /// Turn reminders off
        #[arg(long, conflicts_with_all = ["first", "second", "weekday"])]
        off: bool,
        /// First reminder time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        first: Option<NaiveTime>,
        /// Second reminder time for twice-daily medications (HH:MM)
        #[arg(long, value_parser = parse_time)]
        second: Option<NaiveTime>,
        /// Day of the week for weekly medications (mon, tue, ...)
        #[arg(long)]
        weekday: Option<Weekday>,
    },
    /// Delete a medication
    #[command(alias = "rm")]
    Delete {
        /// Medication ID (full or prefix)
        id: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the reminders that would be scheduled
    Reminders,
    /// Sync with the remote API
    Sync {
        /// Only sync this medication (full ID or prefix)
        id: Option<String>,
    },
    /// Show status (user, sync settings, local counts)
    Status,
    /// Check that the remote API is reachable
    Health,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, api_url, api_key, username,
        /// sync_enabled, request_timeout_secs, log_file)
        key: String,
        /// Configuration value ("none" clears optional values)
        value: String,
    },
}

/// What to push after a command finishes
enum AutoSync {
    None,
    One(String),
    All,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    if let Err(e) = run(cli, &output).await {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = storage_hint(&e) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Config commands work even when the config cannot be used yet
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, output);
    }

    let config = Config::load_with_cli_override(config_path)?;
    logging::init(&config, cli.verbose);

    if let Commands::Health = cli.command {
        return commands::health::check(&config, output).await;
    }

    let store = shared(SqliteStore::open(&config)?);

    // Pull before reads so the listing reflects the server
    if matches!(
        cli.command,
        Commands::List { .. } | Commands::Show { .. } | Commands::Reminders
    ) {
        auto_sync(&store, &config, AutoSync::All, output).await;
    }

    let after = match cli.command {
        Commands::Config { .. } | Commands::Health => unreachable!(), // Handled above
        Commands::Sync { id } => {
            commands::sync::sync(store.clone(), &config, id, output).await?;
            AutoSync::None
        }
        Commands::Status => {
            commands::status::show(&store, &config, output).await?;
            AutoSync::None
        }
        command => handle_medication_command(command, &store, &config, output).await?,
    };

    auto_sync(&store, &config, after, output).await;

    Ok(())
}

async fn handle_medication_command(
    command: Commands,
    store: &SharedStore<SqliteStore>,
    config: &Config,
    output: &Output,
) -> Result<AutoSync> {
    let book = MedicationBook::new(store.clone(), config.require_username()?);

    let after = match command {
        Commands::Add {
            name,
            dosage,
            frequency,
        } => AutoSync::One(
            commands::medication::create(&book, name, dosage, frequency, output).await?,
        ),
        Commands::List { all } => {
            commands::medication::list(&book, all, output).await?;
            AutoSync::None
        }
        Commands::Show { id } => {
            commands::medication::show(&book, id, output).await?;
            AutoSync::None
        }
        Commands::Edit {
            id,
            name,
            dosage,
            frequency,
        } => {
            let patch = MedicationPatch {
                name,
                dosage,
                frequency,
            };
            AutoSync::One(commands::medication::edit(&book, id, patch, output).await?)
        }
        Commands::Remind {
            id,
            off,
            first,
            second,
            weekday,
        } => {
            let args = ReminderArgs {
                off,
                first,
                second,
                weekday,
            };
            commands::medication::remind(&book, id, args, output).await?;
            // Reminders never leave the device
            AutoSync::None
        }
        Commands::Delete { id, yes } => {
            match commands::medication::delete(&book, id, yes, output).await? {
                Some(id) => AutoSync::One(id),
                None => AutoSync::None,
            }
        }
        Commands::Reminders => {
            commands::reminders::show(&book, output).await?;
            AutoSync::None
        }
        Commands::Sync { .. } | Commands::Status | Commands::Health | Commands::Config { .. } => {
            unreachable!() // Handled in main
        }
    };

    Ok(after)
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Recovery advice for a local storage failure anywhere in the error chain
fn storage_hint(error: &anyhow::Error) -> Option<&'static str> {
    error.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<StorageError>() {
            return e.recovery_suggestion();
        }
        match cause.downcast_ref::<BookError>() {
            Some(BookError::Storage(e)) => e.recovery_suggestion(),
            _ => None,
        }
    })
}

/// Auto-sync if sync is enabled, reporting errors without failing the command
async fn auto_sync(
    store: &SharedStore<SqliteStore>,
    config: &Config,
    target: AutoSync,
    output: &Output,
) {
    let id = match target {
        AutoSync::None => return,
        AutoSync::One(ref id) => Some(id.as_str()),
        AutoSync::All => None,
    };

    if let Err(e) = commands::sync::sync_quiet(store.clone(), config, id).await {
        if !output.is_quiet() {
            eprintln!("⚠ Auto-sync failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_frequency() {
        let cli = Cli::parse_from(["medsync", "add", "Aspirin", "100mg", "-f", "twice-daily"]);
        match cli.command {
            Commands::Add {
                name,
                dosage,
                frequency,
            } => {
                assert_eq!(name, "Aspirin");
                assert_eq!(dosage, "100mg");
                assert_eq!(frequency, Frequency::TwiceDaily);
            }
            _ => panic!("Expected add"),
        }
    }

    #[test]
    fn test_parse_remind() {
        let cli = Cli::parse_from([
            "medsync", "remind", "abc", "--first", "08:00", "--weekday", "sun",
        ]);
        match cli.command {
            Commands::Remind {
                first, weekday, off, ..
            } => {
                assert!(!off);
                assert_eq!(first, NaiveTime::from_hms_opt(8, 0, 0));
                assert_eq!(weekday, Some(Weekday::Sun));
            }
            _ => panic!("Expected remind"),
        }
    }

    #[test]
    fn test_remind_off_conflicts_with_times() {
        let result = Cli::try_parse_from(["medsync", "remind", "abc", "--off", "--first", "08:00"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_frequency() {
        let result = Cli::try_parse_from(["medsync", "add", "A", "1", "-f", "hourly"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_storage_hint_found_through_context() {
        let corrupt = StorageError::InvalidRow {
            id: "abc".to_string(),
            details: "unknown status code 7".to_string(),
        };
        let err = anyhow::Error::from(BookError::Storage(corrupt)).context("Failed to list");
        assert!(storage_hint(&err).unwrap().contains("medsync sync"));

        let direct = anyhow::Error::from(StorageError::DuplicateId {
            id: "abc".to_string(),
        });
        assert!(storage_hint(&direct).is_none());
        assert!(storage_hint(&anyhow::anyhow!("network down")).is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["medsync", "ls", "--json", "--config", "/tmp/medsync.toml"]);
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/medsync.toml")));
        assert!(matches!(cli.command, Commands::List { all: false }));
    }
}
