use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "moneta", version, about = "Import bank CSV exports into one deduplicated ledger")]
struct Cli {
    /// Database file (defaults to the platform data directory).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a CSV statement into an account
    Ingest {
        /// Path to the CSV file
        csv_file: PathBuf,
        /// Account name, e.g. bofa_checking
        #[arg(long)]
        account: String,
    },
    /// Manage accounts
    Accounts {
        #[command(subcommand)]
        command: AccountsCommand,
    },
    /// List registered institution keys
    Institutions,
    /// Manage import batches
    Imports {
        #[command(subcommand)]
        command: ImportsCommand,
    },
}

#[derive(Subcommand)]
enum AccountsCommand {
    /// Register a new account
    Add {
        /// Account name, e.g. bofa_checking
        name: String,
        /// Institution key (see `moneta institutions`)
        #[arg(long)]
        institution: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List all accounts
    List,
}

#[derive(Subcommand)]
enum ImportsCommand {
    /// List import batches for an account
    List {
        #[arg(long)]
        account: String,
    },
    /// Delete an import batch and every transaction it brought in
    Delete { id: i64 },
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "moneta", "Moneta")
        .context("could not determine a data directory")?;
    Ok(dirs.data_dir().join("moneta.db"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let pool = moneta_storage::create_db(&db_path)
        .await
        .with_context(|| format!("opening database {}", db_path.display()))?;

    match cli.command {
        Command::Ingest { csv_file, account } => commands::ingest(&pool, &csv_file, &account).await,
        Command::Accounts { command } => match command {
            AccountsCommand::Add {
                name,
                institution,
                description,
            } => commands::accounts_add(&pool, &name, &institution, &description).await,
            AccountsCommand::List => commands::accounts_list(&pool).await,
        },
        Command::Institutions => {
            commands::institutions();
            Ok(())
        }
        Command::Imports { command } => match command {
            ImportsCommand::List { account } => commands::imports_list(&pool, &account).await,
            ImportsCommand::Delete { id } => commands::imports_delete(&pool, id).await,
        },
    }
}
