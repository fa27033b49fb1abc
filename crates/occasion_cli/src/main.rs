//! Command-line driver for the occasion sync engine.
//!
//! # Responsibility
//! - Run full or differential syncs against a local calendar DB.
//! - Show how raw contact dates are parsed.
//!
//! Reports go to stdout as JSON; logs go to stderr.

use clap::{Args, Parser, Subcommand};
use log::error;
use occasion_core::db::open_db;
use occasion_core::{
    default_log_level, init_stderr_logging, parse_with_format, DateOrder, InMemoryContactSource,
    SqliteCalendarStore, SyncConfig, SyncMode, SyncService,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "occasion")]
#[command(about = "Synthesize calendar events from contact dates")]
#[command(version)]
struct Cli {
    /// Log level written to stderr; `debug` in debug builds, `info` otherwise
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild or patch the synthetic calendar
    Sync(SyncArgs),
    /// Apply the configured calendar color only
    Color(StoreArgs),
    /// Show how a raw date string is read
    Parse {
        raw: String,
        /// Read `a/b` dates as day/month
        #[arg(long)]
        day_first: bool,
    },
    /// Print the built-in default config
    DefaultConfig,
}

#[derive(Args)]
struct StoreArgs {
    /// Calendar database path
    #[arg(long)]
    db: PathBuf,

    /// JSON config file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SyncArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// JSON array of contact date records
    #[arg(long)]
    records: PathBuf,

    /// Keep unchanged events instead of rebuilding
    #[arg(long)]
    differential: bool,

    /// Override the current year
    #[arg(long)]
    year: Option<i32>,
}

impl Cli {
    fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or_else(|| default_log_level())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_stderr_logging(cli.log_level()) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("event=cli module=cli status=error error={message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<String, String> {
    match command {
        Command::Sync(args) => run_sync(args),
        Command::Color(args) => run_color(args),
        Command::Parse { raw, day_first } => run_parse(&raw, day_first),
        Command::DefaultConfig => to_json(&SyncConfig::default()),
    }
}

fn run_sync(args: SyncArgs) -> Result<String, String> {
    let config = load_config(args.store.config.as_deref())?;
    let records = std::fs::read_to_string(&args.records)
        .map_err(|err| format!("failed to read `{}`: {err}", args.records.display()))?;
    let contacts = InMemoryContactSource::from_json_str(&records).map_err(|err| err.to_string())?;
    let mut conn = open_db(&args.store.db).map_err(|err| err.to_string())?;
    let mut service = SyncService::new(contacts, SqliteCalendarStore::new(&mut conn), config);

    let mode = if args.differential {
        SyncMode::Differential
    } else {
        SyncMode::Full
    };
    let report = match (args.year, mode) {
        (Some(year), mode) => service.sync_for_year(mode, year),
        (None, SyncMode::Full) => service.perform_full_sync(),
        (None, SyncMode::Differential) => service.perform_differential_sync(),
    }
    .map_err(|err| format!("{}: {err}", err.code()))?;
    to_json(&report)
}

fn run_color(args: StoreArgs) -> Result<String, String> {
    let config = load_config(args.config.as_deref())?;
    let mut conn = open_db(&args.db).map_err(|err| err.to_string())?;
    let mut service = SyncService::new(
        InMemoryContactSource::default(),
        SqliteCalendarStore::new(&mut conn),
        config,
    );
    let calendar_id = service
        .update_calendar_color_only()
        .map_err(|err| format!("{}: {err}", err.code()))?;
    to_json(&serde_json::json!({ "calendar_id": calendar_id }))
}

fn run_parse(raw: &str, day_first: bool) -> Result<String, String> {
    let order = if day_first {
        DateOrder::DayFirst
    } else {
        DateOrder::MonthFirst
    };
    let (parsed, format) =
        parse_with_format(raw, order).ok_or_else(|| format!("unrecognized date `{raw}`"))?;
    to_json(&serde_json::json!({
        "format": format,
        "year": parsed.has_explicit_year.then_some(parsed.year),
        "month": parsed.month,
        "day": parsed.day,
    }))
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig, String> {
    match path {
        Some(path) => SyncConfig::load(path).map_err(|err| err.to_string()),
        None => Ok(SyncConfig::default()),
    }
}

fn to_json(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use occasion_core::default_log_level;

    #[test]
    fn log_level_falls_back_to_build_default() {
        let cli = Cli::try_parse_from(["occasion", "default-config"]).expect("args should parse");
        assert!(matches!(cli.command, Command::DefaultConfig));
        assert_eq!(cli.log_level(), default_log_level());
    }

    #[test]
    fn explicit_log_level_wins() {
        let cli = Cli::try_parse_from(["occasion", "parse", "1990-04-05", "--log-level", "trace"])
            .expect("args should parse");
        assert_eq!(cli.log_level(), "trace");
    }
}
