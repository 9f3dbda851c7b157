// Personal Space - journal store maintenance tool
// Entry point and command dispatch

use anyhow::Context;
use clap::{Parser, Subcommand};
use personal_space::app::{setup, AppState};
use personal_space::config::{AppConfig, DATA_DIR_ENV, DEFAULT_ADMIN_USERNAME, DEFAULT_DATA_DIR};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "personal-space", version, about = "Maintain a Personal Space data directory")]
struct Cli {
    /// Directory holding db.json, backups and uploads
    #[arg(long, global = true, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or repair the document and report what changed
    Init,
    /// Write a redacted export (no user accounts)
    Export {
        /// Output file; defaults to a timestamped name in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all content except users with an export file
    Import {
        /// Export file to import
        file: PathBuf,
    },
    /// Show sidebar statistics
    Stats,
    /// Show tag usage counts
    Tags,
    /// List todos in display order
    Todos,
    /// List anniversaries with days until their next occurrence
    Upcoming,
    /// List safety backups taken before imports
    Backups,
    /// Replace a user's password, whatever the stored hash looks like
    ResetPassword {
        /// Account to reset
        #[arg(long, default_value = DEFAULT_ADMIN_USERNAME)]
        username: String,
        /// New password
        #[arg(long, env = "PERSONAL_SPACE_NEW_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "personal_space=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting Personal Space {}", env!("CARGO_PKG_VERSION"));

    let state = setup(AppConfig::new(&cli.data_dir))
        .await
        .with_context(|| format!("failed to open data directory {:?}", cli.data_dir))?;

    run(&state, cli.command).await
}

async fn run(state: &AppState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => {
            // setup() already bootstrapped; report the resulting state
            let doc = state.store.snapshot().await?;
            print_json(&serde_json::json!({
                "document": state.config.document_path(),
                "users": doc.users.len(),
                "talks": doc.talks.len(),
                "todos": doc.todos.len(),
                "anniversaries": doc.anniversaries.len(),
            }))?;
        }
        Commands::Export { output } => {
            let (file_name, json) = state.backup_service.export_json().await?;
            let path = output.unwrap_or_else(|| PathBuf::from(file_name));
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("failed to write export to {:?}", path))?;
            println!("{}", path.display());
        }
        Commands::Import { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {:?}", file))?;
            let candidate: serde_json::Value = serde_json::from_slice(&bytes)
                .with_context(|| format!("{:?} is not valid JSON", file))?;
            let outcome = state.backup_service.import_snapshot(candidate).await?;
            print_json(&outcome)?;
        }
        Commands::Stats => print_json(&state.stats_service.stats().await?)?,
        Commands::Tags => print_json(&state.stats_service.tags().await?)?,
        Commands::Todos => print_json(&state.todos_service.list().await?)?,
        Commands::Upcoming => print_json(&state.anniversaries_service.upcoming().await?)?,
        Commands::Backups => print_json(&state.backup_service.list_safety_backups().await?)?,
        Commands::ResetPassword { username, password } => {
            state
                .auth_service
                .reset_password(&username, &password)
                .await
                .with_context(|| format!("failed to reset the password of '{}'", username))?;
            println!("Password updated for '{}'", username);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
