//! Taxinomos Server - durable domain dispenser and measurement log.
//!
//! Hands out domains from a fixed list one at a time, remembering the
//! position across restarts, and appends submitted measurements to a
//! line-delimited log.
//!
//!   taxinomos-server fetch                # Next domain, advances the cursor
//!   taxinomos-server peek                 # Next domain, cursor unchanged
//!   taxinomos-server skip                 # Advance without handing out
//!   taxinomos-server submit '<json>'      # Append a measurement
//!   taxinomos-server status [--json]      # Cursor progress and log size
//!   taxinomos-server init-config          # Write ~/.taxinomos/config.toml

mod application;
mod cli;
mod domain;
mod infrastructure;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{format_domain_json, format_status_json, format_status_table, Dispatcher};
use cli::{read_payload, Cli, Commands};
use domain::{AppConfig, AppError};
use infrastructure::{ensure_config_exists, load_config};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        if e.is_exhausted() {
            eprintln!("{} {}", "Done:".yellow().bold(), e);
        } else {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: &Cli) -> domain::Result<()> {
    match &cli.command {
        Commands::Fetch => cmd_fetch(&open_dispatcher(cli)?)?,
        Commands::Peek => cmd_peek(&open_dispatcher(cli)?)?,
        Commands::Skip => cmd_skip(&open_dispatcher(cli)?)?,
        Commands::Submit { payload } => cmd_submit(&open_dispatcher(cli)?, payload.as_deref())?,
        Commands::Status { json } => cmd_status(&open_dispatcher(cli)?, *json)?,
        Commands::InitConfig => cmd_init_config(cli)?,
    }

    Ok(())
}

/// Load configuration and open the domain list, cursor and measurement log.
fn open_dispatcher(cli: &Cli) -> domain::Result<Dispatcher> {
    let config = cli.apply_overrides(load_config(cli.config.as_deref())?);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Taxinomos server");
    tracing::info!(
        domain_file = %config.domain_file().display(),
        cursor_file = %config.cursor_file().display(),
        measurement_file = %config.measurement_file().display(),
        "Configuration"
    );

    Dispatcher::open(&config)
}

/// Hand out the next domain.
fn cmd_fetch(dispatcher: &Dispatcher) -> domain::Result<()> {
    let domain = dispatcher.fetch()?;
    println!("{}", format_domain_json(domain)?);
    Ok(())
}

/// Show the next domain without consuming it.
fn cmd_peek(dispatcher: &Dispatcher) -> domain::Result<()> {
    let domain = dispatcher.peek()?;
    println!("{}", format_domain_json(domain)?);
    Ok(())
}

/// Advance past the next domain.
fn cmd_skip(dispatcher: &Dispatcher) -> domain::Result<()> {
    let skipped = dispatcher.peek()?.domain_name.clone();
    dispatcher.skip()?;
    println!("{} Skipped {}", "✓".green().bold(), skipped.cyan());
    Ok(())
}

/// Append a measurement from the argument or stdin.
fn cmd_submit(dispatcher: &Dispatcher, payload: Option<&str>) -> domain::Result<()> {
    let payload = match payload {
        Some(p) => p.as_bytes().to_vec(),
        None => read_payload(std::io::stdin().lock())
            .map_err(|e| AppError::io("Failed to read measurement from stdin", e))?,
    };

    dispatcher.submit(&payload)?;
    println!("{} Recorded measurement ({} bytes)", "✓".green().bold(), payload.len());
    Ok(())
}

/// Show cursor progress.
fn cmd_status(dispatcher: &Dispatcher, json: bool) -> domain::Result<()> {
    let status = dispatcher.status()?;
    if json {
        println!("{}", format_status_json(&status)?);
    } else {
        println!("{}", format_status_table(&status));
    }
    Ok(())
}

/// Write the default configuration file.
fn cmd_init_config(cli: &Cli) -> domain::Result<()> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);

    if ensure_config_exists(&path)? {
        println!("{} Created {}", "✓".green().bold(), path.display());
    } else {
        println!("Config already exists: {}", path.display());
    }
    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
