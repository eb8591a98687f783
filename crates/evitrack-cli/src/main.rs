//! Evitrack CLI - Main entry point

use clap::Parser;
use evitrack_cli::config::Config;
use evitrack_cli::{Cli, Commands, ConfigCommand, IdentityCommand, LedgerCommand};
use evitrack_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    if cli.command.is_none() {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    }

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Warn };
    let base = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("evitrack")
        .build();

    // Environment variables take precedence; a bad value keeps the defaults
    let log_config = base.clone().merge_env().unwrap_or(base);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    let result = execute_command(&cli).await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        // Reported errors were already printed as a notice
        if !e.is_reported() {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> evitrack_cli::Result<()> {
    let Some(ref command) = cli.command else {
        return Ok(());
    };

    let config = Config::from_env()?.with_data_dir(cli.data_dir.clone());

    match command {
        Commands::Tree {
            variant,
            expand_all,
        } => evitrack_cli::commands::tree::run(&config, *variant, *expand_all).await,

        Commands::Ledger { command } => match command {
            LedgerCommand::List { json } => evitrack_cli::commands::ledger::list(&config, *json).await,
            LedgerCommand::Add { name } => evitrack_cli::commands::ledger::add(&config, name).await,
            LedgerCommand::Remove { id, yes } => {
                evitrack_cli::commands::ledger::remove(&config, *id, *yes).await
            },
            LedgerCommand::Download { name } => {
                evitrack_cli::commands::ledger::download(&config, name).await
            },
        },

        Commands::Identity { command } => match command {
            IdentityCommand::Show => evitrack_cli::commands::identity::show(&config).await,
            IdentityCommand::Set { name } => {
                evitrack_cli::commands::identity::set(&config, name).await
            },
        },

        Commands::Shell { variant, yes } => {
            evitrack_cli::commands::shell::run(&config, *variant, *yes).await
        },

        Commands::Config { command } => match command {
            ConfigCommand::Get { key } => evitrack_cli::commands::config::get(&config, key).await,
            ConfigCommand::Show => evitrack_cli::commands::config::show(&config).await,
        },
    }
}
