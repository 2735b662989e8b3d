//! Config command - show and change settings.json

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use super::{get_conta_dir, print_json};
use crate::output;
use conta_core::config::{Config, SETTINGS_FILE};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration in effect, environment overrides included
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change values in settings.json
    Set {
        /// Account database file, relative to the conta directory
        #[arg(long)]
        database_file: Option<String>,
        /// Deadline for each operation, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

/// Apply the requested changes, returning whether anything changed
fn apply(
    config: &mut Config,
    database_file: Option<String>,
    timeout_ms: Option<u64>,
) -> Result<bool> {
    let mut changed = false;

    if let Some(file) = database_file {
        let file = file.trim();
        if file.is_empty() {
            bail!("Database file cannot be empty");
        }
        if config.database_file != file {
            config.database_file = file.to_string();
            changed = true;
        }
    }

    if let Some(ms) = timeout_ms {
        if ms == 0 {
            bail!("Timeout must be greater than zero");
        }
        if config.operation_timeout_ms != ms {
            config.operation_timeout_ms = ms;
            changed = true;
        }
    }

    Ok(changed)
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let conta_dir = get_conta_dir();

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&conta_dir)?;
            let database_path = config.database_path(&conta_dir);

            if json {
                return print_json(&serde_json::json!({
                    "contaDir": conta_dir.to_string_lossy(),
                    "databaseFile": config.database_file,
                    "databasePath": database_path.to_string_lossy(),
                    "operationTimeoutMs": config.operation_timeout_ms,
                    "secret": config.secret,
                }));
            }

            println!("{}", "Configuration".bold());
            println!("  Directory: {}", conta_dir.display());
            println!("  Database: {}", database_path.display());
            println!("  Timeout: {} ms", config.operation_timeout_ms);
            println!(
                "  Argon2id: t={} m={} p={} len={}",
                config.secret.time_cost,
                config.secret.memory_cost,
                config.secret.parallelism,
                config.secret.hash_len
            );
        }
        ConfigCommands::Set {
            database_file,
            timeout_ms,
        } => {
            let mut config = Config::load_file(&conta_dir)?;
            if !apply(&mut config, database_file, timeout_ms)? {
                output::warning("Nothing to change.");
                return Ok(());
            }

            std::fs::create_dir_all(&conta_dir)?;
            config.save(&conta_dir)?;
            output::success(&format!(
                "Saved {}",
                conta_dir.join(SETTINGS_FILE).display()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_changes() {
        let mut config = Config::default();

        assert!(apply(&mut config, Some(" other.duckdb ".to_string()), Some(900)).unwrap());
        assert_eq!(config.database_file, "other.duckdb");
        assert_eq!(config.operation_timeout_ms, 900);

        // Same values again change nothing
        assert!(!apply(&mut config, Some("other.duckdb".to_string()), Some(900)).unwrap());
        assert!(!apply(&mut config, None, None).unwrap());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();

        assert!(apply(&mut config, Some("  ".to_string()), None).is_err());
        assert!(apply(&mut config, None, Some(0)).is_err());
        assert_eq!(config, Config::default());
    }
}
