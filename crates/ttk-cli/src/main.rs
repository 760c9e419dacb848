use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ttk_cli::commands::{display, import, sheet, sheets, start, stop};
use ttk_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ttk_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ttk_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Sheet { name }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let mut stdin = io::stdin().lock();
            let mut stdout = io::stdout().lock();
            sheet::run(&mut stdin, &mut stdout, &mut db, name.as_ref())?;
        }
        Some(Commands::Sheets) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            sheets::run(&mut io::stdout().lock(), &db)?;
        }
        Some(Commands::Start { note }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            start::run(&mut io::stdout().lock(), &mut db, note.as_deref())?;
        }
        Some(Commands::Stop { note }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let mut stdin = io::stdin().lock();
            let mut stdout = io::stdout().lock();
            stop::run(&mut stdin, &mut stdout, &mut db, note.as_deref())?;
        }
        Some(Commands::Display { period }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            display::run(&mut io::stdout().lock(), &db, period)?;
        }
        Some(Commands::Import { url }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            import::run(&mut io::stdout().lock(), &mut db, url)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
