//! Ghost CLI - send notes and files that destroy themselves
//!
//! Uploads files, builds the share request and prints the secret link.

mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::expiry::run_expiry;
use crate::commands::qr::run_qr;
use crate::commands::send::run_send;
use crate::config_profiles::CliProfilesConfig;
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

    let directive = "ghost=info"
        .parse()
        .map_err(|error| CliError::Config(format!("Invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Send(args)) => {
            let profiles = CliProfilesConfig::load()?;
            let profile = profiles.resolve_profile_name(cli.profile.as_deref());
            let config = profiles.client_config(&profile, cli.api_base_url)?;
            tracing::debug!("Using profile '{profile}' against {}", config.api_base_url);
            run_send(args, &config).await?;
        }
        Some(Commands::Expiry { lifetime, json }) => run_expiry(lifetime, json)?,
        Some(Commands::Qr { url, size, output }) => {
            run_qr(&reqwest::Client::new(), &url, size, output.as_deref()).await?;
        }
        Some(Commands::Config { command }) => {
            run_config(command, cli.profile.as_deref(), cli.api_base_url)?;
        }
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
