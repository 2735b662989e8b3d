//! Conta CLI - checking accounts in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{account, config, logs};

/// Conta - checking accounts in your terminal
#[derive(Parser)]
#[command(name = "conta", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one account
    Show {
        /// Account ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the balance of an account
    Balance {
        /// Account ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find an account by CPF (digits only, as stored)
    Find {
        /// CPF to look up
        cpf: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new account
    Create {
        /// Account holder name
        #[arg(long)]
        name: Option<String>,
        /// CPF, formatted or digits only
        #[arg(long)]
        cpf: Option<String>,
        /// Account secret (prompted when missing)
        #[arg(long, env = "CONTA_SECRET", hide_env_values = true)]
        secret: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the balance of an account
    SetBalance {
        /// Account ID
        id: i64,
        /// New balance in the smallest currency unit
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a CPF without touching the database
    CheckCpf {
        /// CPF to validate
        cpf: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    /// Name recorded in the log database
    fn name(&self) -> &'static str {
        match self {
            Commands::List { .. } => "list",
            Commands::Show { .. } => "show",
            Commands::Balance { .. } => "balance",
            Commands::Find { .. } => "find",
            Commands::Create { .. } => "create",
            Commands::SetBalance { .. } => "set-balance",
            Commands::CheckCpf { .. } => "check-cpf",
            Commands::Config { .. } => "config",
            Commands::Logs { .. } => "logs",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.name();

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::record_failure(command, &e);
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::List { json } => account::list(json).await,
        Commands::Show { id, json } => account::show(id, json).await,
        Commands::Balance { id, json } => account::balance(id, json).await,
        Commands::Find { cpf, json } => account::find(&cpf, json).await,
        Commands::Create { name, cpf, secret, json } => {
            account::create(name, cpf, secret, json).await
        }
        Commands::SetBalance { id, amount, json } => {
            account::set_balance(id, &amount, json).await
        }
        Commands::CheckCpf { cpf, json } => account::check_cpf(&cpf, json),
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
