//! NoteSync CLI - share notes, tests, prototypes and ideas from the terminal
//!
//! Talks to the same backends as the other NoteSync front ends: a local JSON
//! store, a REST server or a Supabase project.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::{resolve_profile, GlobalOptions};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::download::run_download;
use crate::commands::list::run_list;
use crate::commands::subjects::run_subjects;
use crate::commands::upload::{run_upload, UploadArgs};
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("notesync=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = GlobalOptions {
        profile: cli.profile,
        backend: cli.backend.map(Into::into),
        local_path: cli.local_path,
    };

    match cli.command {
        Commands::List { filter, json } => {
            let resolved = resolve_profile(&options)?;
            run_list(&resolved, &filter, json).await?;
        }
        Commands::Upload {
            title,
            subject,
            note_type,
            description,
            author,
            file,
        } => {
            let resolved = resolve_profile(&options)?;
            let args = UploadArgs {
                title,
                subject,
                note_type: note_type.into(),
                description,
                author,
                file,
            };
            run_upload(&resolved, args).await?;
        }
        Commands::Delete { id, password } => {
            let resolved = resolve_profile(&options)?;
            run_delete(&resolved, &id, password.as_deref()).await?;
        }
        Commands::Download { id, output } => {
            let resolved = resolve_profile(&options)?;
            run_download(&resolved, &id, output.as_deref()).await?;
        }
        Commands::Watch { interval, filter } => {
            let resolved = resolve_profile(&options)?;
            run_watch(&resolved, interval, &filter).await?;
        }
        Commands::Subjects => run_subjects(),
        Commands::Auth { command } => run_auth(command, &options).await?,
        Commands::Config { command } => run_config(command, &options)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
