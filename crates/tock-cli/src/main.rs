use std::future::Future;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tock_core::{ScheduleMatcher, SystemClock};
use tracing_subscriber::EnvFilter;

use tock_cli::commands::{alarm, clock, stopwatch, timer};
use tock_cli::{AlarmAction, Cli, Commands, Config};

/// Open the database, ensuring the parent directory exists.
fn open_database(config: &Config) -> Result<tock_db::Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    tock_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Interactive commands share one single-threaded runtime; ticks and
/// components live on it.
fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let result = runtime.block_on(future);
    // A pending stdin read would otherwise hold shutdown until the next line.
    runtime.shutdown_background();
    result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with redrawn status lines.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout();
    match &cli.command {
        Some(Commands::Clock { once: true }) => clock::run_once(&mut stdout, &SystemClock)?,
        Some(Commands::Clock { once: false }) => block_on(clock::run(&mut stdout))?,
        Some(Commands::Timer(args)) => {
            let config = load_config(cli.config.as_deref())?;
            block_on(timer::run(&mut stdout, args, &config))?;
        }
        Some(Commands::Stopwatch) => {
            let config = load_config(cli.config.as_deref())?;
            block_on(stopwatch::run(&mut stdout, &config))?;
        }
        Some(Commands::Alarm(AlarmAction::Watch)) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            block_on(alarm::watch(&mut stdout, db, &config))?;
        }
        Some(Commands::Alarm(action)) => {
            let config = load_config(cli.config.as_deref())?;
            let mut alarms = ScheduleMatcher::load(open_database(&config)?);
            match action {
                AlarmAction::Add(args) => {
                    alarm::add(&mut stdout, &mut alarms, args, Utc::now())?;
                }
                AlarmAction::List { json } => alarm::list(&mut stdout, &alarms, *json)?,
                AlarmAction::Edit(args) => alarm::edit(&mut stdout, &mut alarms, args)?,
                AlarmAction::Toggle { id } => alarm::toggle(&mut stdout, &mut alarms, *id)?,
                AlarmAction::Remove { id } => alarm::remove(&mut stdout, &mut alarms, *id)?,
                // Dispatched above.
                AlarmAction::Watch => {}
            }
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
