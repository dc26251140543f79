//! Logging setup
//!
//! Logs go to stderr, or to `log_file` when one is configured. The level
//! comes from `MEDSYNC_LOG` (e.g. `debug`), then `--verbose`, else `warn`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use medsync_core::Config;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Level used when neither `MEDSYNC_LOG` nor `--verbose` is given
const DEFAULT_LEVEL: &str = "warn";

/// Initialize the global subscriber (a no-op if one is already set)
pub fn init(config: &Config, verbose: bool) {
    let level = log_level(std::env::var("MEDSYNC_LOG").ok(), verbose);
    let env_filter = filter_for(&level);

    match config.log_file {
        Some(ref path) => {
            let file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", path, e);
                    return;
                }
            };

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();

            debug!("Logging to {:?}", path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

fn log_level(env_level: Option<String>, verbose: bool) -> String {
    match env_level {
        Some(level) if !level.trim().is_empty() => level.trim().to_string(),
        _ if verbose => "debug".to_string(),
        _ => DEFAULT_LEVEL.to_string(),
    }
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::new(format!("medsync_core={},medsync_cli={}", level, level))
}
