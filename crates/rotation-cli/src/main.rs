//! `rotation` CLI — infer rotation layers from an iCalendar shift calendar.
//!
//! ## Usage
//!
//! ```sh
//! # Detect layers (file → stdout)
//! rotation layers -i oncall.ics
//!
//! # Pin the reference time and horizon for reproducible output
//! rotation layers -i oncall.ics --now 2026-03-01T00:00:00Z --horizon-days 90
//!
//! # Inspect the normalized event table the layers are derived from
//! rotation events -i oncall.ics --pretty
//!
//! # Read from stdin, write to a file, log at debug level
//! cat oncall.ics | rotation -vv layers -o layers.json
//! ```

mod ical;
mod logging;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rotation_engine::{
    detect_layers_with_table, parse_timezone, render_layers, PipelineOptions, RotationError,
    DEFAULT_HORIZON_DAYS,
};
use serde_json::Value;
use std::io::{self, Read};
use tracing::{info, warn};

/// Largest accepted `--horizon-days` (about a century).
const MAX_HORIZON_DAYS: i64 = 36_500;

#[derive(Parser)]
#[command(
    name = "rotation",
    version,
    about = "Infer on-call rotation layers from an iCalendar file"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Input .ics file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
    /// Reference instant (RFC 3339); defaults to the current time
    #[arg(long)]
    now: Option<String>,
    /// Days past the reference instant that recurring shifts are expanded
    #[arg(
        long,
        default_value_t = DEFAULT_HORIZON_DAYS,
        value_parser = clap::value_parser!(i64).range(0..=MAX_HORIZON_DAYS)
    )]
    horizon_days: i64,
    /// IANA timezone to use instead of the calendar's X-WR-TIMEZONE
    #[arg(long)]
    timezone: Option<String>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect rotation layers and print them as JSON records
    Layers(InputArgs),
    /// Print the normalized event table as JSON
    Events(InputArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Layers(args) => {
            let (calendar, options) = load(&args)?;
            let records = match detect_layers_with_table(&calendar, &options) {
                Ok((layers, table)) => {
                    info!(
                        layers = layers.len(),
                        events = table.len(),
                        rejected = table.rejected.len(),
                        "detected layers"
                    );
                    serde_json::to_value(render_layers(&layers, &calendar))?
                }
                Err(RotationError::EmptyCalendar) => {
                    warn!("calendar has no shifts in the horizon; no layers produced");
                    Value::Array(Vec::new())
                }
                Err(e) => return Err(e).context("Failed to detect rotation layers"),
            };
            write_json(&args, &records)?;
        }
        Commands::Events(args) => {
            let (calendar, options) = load(&args)?;
            let events = match rotation_engine::build(&calendar, &options.horizon()?) {
                Ok(table) => serde_json::to_value(&table.events)?,
                Err(RotationError::EmptyCalendar) => Value::Array(Vec::new()),
                Err(e) => return Err(e).context("Failed to build event table"),
            };
            write_json(&args, &events)?;
        }
    }

    Ok(())
}

fn load(args: &InputArgs) -> Result<(rotation_engine::Calendar, PipelineOptions)> {
    let timezone = args
        .timezone
        .as_deref()
        .map(parse_timezone)
        .transpose()
        .context("Invalid --timezone")?;

    let text = read_input(args.input.as_deref())?;
    let calendar = ical::parse_calendar(&text, timezone).context("Failed to read calendar")?;

    let now = match args.now.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --now '{}', expected RFC 3339", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    Ok((calendar, PipelineOptions::at(now).with_horizon_days(args.horizon_days)))
}

fn write_json(args: &InputArgs, value: &Value) -> Result<()> {
    let mut json = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    json.push('\n');
    write_output(args.output.as_deref(), &json)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
