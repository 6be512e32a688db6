mod commands;
mod error;
mod notify;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{check, completions, listen, normalize, rule, Context};
use crate::error::{exit_code_for, report_error};
use smsforward_config as config;
use smsforward_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "smsforward", version, about = "Forward text messages to another number")]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Region used to read national numbers, e.g. US or FR
    #[arg(long, global = true)]
    region: Option<String>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the unified and display forms of a number
    Normalize(normalize::NormalizeArgs),
    /// Set the sender to forward from
    Source(rule::SourceArgs),
    /// Set the number to forward to
    Destination(rule::DestinationArgs),
    /// Arm forwarding
    Activate(rule::ActivateArgs),
    /// Disarm forwarding and forget the rule
    Deactivate(rule::DeactivateArgs),
    Status(rule::StatusArgs),
    /// Show what would happen to a message without sending anything
    Check(check::CheckArgs),
    /// Relay inbound messages read as JSON lines
    Listen(listen::ListenArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        region,
        json,
        verbose,
        command,
    } = cli;

    let app_config = match command {
        Command::Completions(args) => return completions::emit(args),
        _ => config::load(config_path.clone()).with_context(|| "load config")?,
    };
    if verbose {
        match config::resolve_config_path(config_path.clone()) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
    }
    let region = match region {
        Some(raw) => config::parse_region(&raw)?,
        None => app_config.region,
    };
    debug!(region = %region, "region resolved");

    if let Command::Normalize(args) = command {
        return normalize::normalize(json, &region, args);
    }

    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    if verbose {
        debug!(path = %db_path.display(), "database path resolved");
    }

    let store = Store::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let own_number = app_config.own_number_in(&region)?;
    let ctx = Context {
        store: &store,
        json,
        config: &app_config,
        region,
        own_number,
    };

    match command {
        Command::Source(args) => rule::set_source(&ctx, args),
        Command::Destination(args) => rule::set_destination(&ctx, args),
        Command::Activate(args) => rule::activate(&ctx, args),
        Command::Deactivate(args) => rule::deactivate(&ctx, args),
        Command::Status(args) => rule::status(&ctx, args),
        Command::Check(args) => check::check(&ctx, args),
        Command::Listen(args) => listen::listen(&ctx, args),
        Command::Normalize(_) => unreachable!("normalize handled before store initialization"),
        Command::Completions(_) => {
            unreachable!("completions command handled before store initialization")
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
