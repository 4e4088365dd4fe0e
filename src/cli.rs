//! CLI interface for boothstat
//!
//! This module defines the command-line interface using clap:
//! `boothstat [report|trend|users] [flags]`. When the subcommand is omitted,
//! the full report is rendered.
//!
//! # Example
//!
//! ```bash
//! # Last 7 days ending today (+05:30 calendar), quota 30/day
//! boothstat --data ./exports
//!
//! # Two weeks ending 2024-03-10 for one ward, as a printable HTML document
//! boothstat report --date 2024-03-10 --days 14 --ward "Ward 184" --format html --out ./reports
//!
//! # Per-user matrix as JSON
//! boothstat users --json
//! ```

use boothstat_core::error::{BoothstatError, Result};
use boothstat_core::types::EntryStatus;
use boothstat_terminal::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default number of days in a report window
pub const DEFAULT_DAYS: i64 = 7;
/// Longest window a report may cover
pub const MAX_DAYS: i64 = 30;
/// Default daily entry quota per user
pub const DEFAULT_TARGET: i64 = 30;
/// Largest accepted daily quota
pub const MAX_TARGET: i64 = 200;

/// Daily booth-entry performance reports
#[derive(Parser, Debug, Clone)]
#[command(name = "boothstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Entry export file or directory (repeatable)
    #[arg(long, global = true, env = "BOOTHSTAT_DATA_PATH", value_delimiter = ',')]
    pub data: Vec<PathBuf>,

    /// Last day of the report (YYYY-MM-DD); defaults to today in the report offset
    #[arg(long, global = true)]
    pub date: Option<String>,

    /// Number of days in the report, clamped to 1..=30
    #[arg(long, global = true, default_value_t = DEFAULT_DAYS, allow_negative_numbers = true)]
    pub days: i64,

    /// Daily entry target per user, clamped to 1..=200
    #[arg(long, global = true, default_value_t = DEFAULT_TARGET, allow_negative_numbers = true)]
    pub target: i64,

    /// UTC offset defining day boundaries (e.g. "+05:30", "-08:00", "UTC")
    #[arg(long, global = true, env = "BOOTHSTAT_UTC_OFFSET", allow_hyphen_values = true)]
    pub offset: Option<String>,

    /// Only include entries filed by this email
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Only include entries for this ward ("Ward 184", "w184" and "184" are equivalent)
    #[arg(long, global = true)]
    pub ward: Option<String>,

    /// Only include entries for this booth
    #[arg(long, global = true)]
    pub booth: Option<String>,

    /// Only include entries with this verification status
    #[arg(long, global = true, value_enum)]
    pub status: Option<StatusArg>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: FormatArg,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Write output to this file, or into this directory under the suggested report filename
    #[arg(long, short = 'o', global = true)]
    pub out: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Full report: summary, daily trend and user matrix (default)
    Report,
    /// Daily entry trend only
    Trend,
    /// Per-user completion matrix only
    Users,
}

/// Output format flag values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Table,
    Json,
    Html,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Html => OutputFormat::Html,
        }
    }
}

/// Verification status flag values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Verified,
    #[value(alias = "notverified", alias = "unverified")]
    NotVerified,
}

impl From<StatusArg> for EntryStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Verified => EntryStatus::Verified,
            StatusArg::NotVerified => EntryStatus::NotVerified,
        }
    }
}

impl Cli {
    /// The command to run, defaulting to the full report
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Report)
    }

    /// Effective output format; `--json` wins over `--format`
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format.into()
        }
    }

    /// Window size after clamping
    pub fn window_days(&self) -> i64 {
        clamp_days(self.days)
    }

    /// Daily quota after clamping
    pub fn quota_target(&self) -> i64 {
        clamp_target(self.target)
    }

    /// Validate the `--date` flag early so a typo fails before any file is read
    pub fn validate(&self) -> Result<()> {
        if let Some(date) = &self.date
            && date.trim().is_empty()
        {
            return Err(BoothstatError::InvalidArgument(
                "--date must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Clamp a requested window size to `1..=30` days
///
/// # Example
///
/// ```
/// use boothstat::cli::clamp_days;
///
/// assert_eq!(clamp_days(0), 1);
/// assert_eq!(clamp_days(14), 14);
/// assert_eq!(clamp_days(90), 30);
/// ```
pub fn clamp_days(days: i64) -> i64 {
    days.clamp(1, MAX_DAYS)
}

/// Clamp a requested daily quota to `1..=200`
pub fn clamp_target(target: i64) -> i64 {
    target.clamp(1, MAX_TARGET)
}
