// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The command name and about text come from the [`crate::Patrol`] being
//! run, so the derive only describes the flags; see
//! [`crate::Patrol::command`].

use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Command-line arguments shared by every patrol.
#[derive(Debug, Clone, Default, Parser)]
#[command(version, long_about = None)]
pub struct CliArgs {
    /// Inspect every watch point once and exit instead of watching the
    /// file system. Useful for CI/CD.
    #[arg(long)]
    pub run_once: bool,

    /// Passed through to the inspection; nothing is meant to be written.
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose logging and full error chains on failures.
    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `--debug`, `PATROL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Give up on `--run-once` if not every watch point was inspected in
    /// time (e.g. "500ms", "30s", "5m").
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, requires = "run_once")]
    pub run_once_timeout: Option<Duration>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Parse a duration like `"500ms"`, `"3s"`, `"5m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
