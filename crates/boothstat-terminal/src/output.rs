//! Output formatting module for boothstat
//!
//! This module provides formatters for displaying a [`Report`] in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//! - HTML format for a printable supervisor document (see [`crate::html`])
//!
//! # Examples
//!
//! ```
//! use boothstat_core::{CalendarOffset, Record, ReportAssembler};
//! use boothstat_terminal::output::{OutputFormat, get_formatter};
//! use chrono::{TimeZone, Utc};
//!
//! let records = vec![Record::new(
//!     "a@x.com",
//!     "Asha",
//!     Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap(),
//! )];
//! let report = ReportAssembler::new(CalendarOffset::default())
//!     .build_report(&records, Some("2024-03-10"), 3, 2)
//!     .unwrap();
//!
//! let formatter = get_formatter(OutputFormat::Json, false, None);
//! assert!(formatter.format_report(&report).contains("\"rangeTotal\": 1"));
//! ```

use boothstat_core::metrics::{CompletionBand, UserRow};
use boothstat_core::types::DayKey;
use boothstat_core::Report;
use colored::*;
use prettytable::{Cell, Row, Table, format, row};
use serde_json::{Value, json};
use std::fmt;
use tracing::warn;

use crate::html::HtmlFormatter;

/// Glyph used for trend bars
const BAR_FULL: &str = "#";

/// Width of a 100% trend bar in characters
const BAR_WIDTH: u64 = 30;

/// Trait for report formatters
///
/// Each method renders a complete, self-standing output: the full report, the
/// daily trend only, or the per-user completion matrix only.
///
/// # Example Implementation
///
/// ```
/// use boothstat_core::Report;
/// use boothstat_terminal::output::OutputFormatter;
///
/// struct CountFormatter;
///
/// impl OutputFormatter for CountFormatter {
///     fn format_report(&self, report: &Report) -> String {
///         format!("{} entries", report.range_total)
///     }
///
///     fn format_trend(&self, report: &Report) -> String {
///         format!("{} days", report.window_size)
///     }
///
///     fn format_users(&self, report: &Report) -> String {
///         format!("{} users", report.active_user_count)
///     }
///
///     fn extension(&self) -> &'static str {
///         "txt"
///     }
/// }
/// ```
pub trait OutputFormatter {
    /// Format the full report: summary, trend and user matrix
    fn format_report(&self, report: &Report) -> String;

    /// Format the per-day entry trend
    fn format_trend(&self, report: &Report) -> String;

    /// Format the per-user completion matrix
    fn format_users(&self, report: &Report) -> String;

    /// File extension used when the output is written to a directory
    fn extension(&self) -> &'static str;
}

/// Available output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Html,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Table => "txt",
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Html => write!(f, "html"),
        }
    }
}

/// Table formatter for human-readable output
///
/// Produces ASCII tables suitable for terminal display. Matrix cells read
/// `count / target` and are coloured by completion band when colours are on.
pub struct TableFormatter {
    /// Whether to emit ANSI colours
    pub colored_output: bool,
}

impl TableFormatter {
    /// Create a new TableFormatter
    pub fn new(colored_output: bool) -> Self {
        Self { colored_output }
    }

    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Scale a bar height percentage into a run of glyphs
    fn format_bar(height_pct: u64) -> String {
        let width = (height_pct * BAR_WIDTH + 50) / 100;
        BAR_FULL.repeat(width as usize)
    }

    fn band_style(band: CompletionBand) -> &'static str {
        match band {
            CompletionBand::OnTarget => "Fg",
            CompletionBand::Partial => "Fb",
            CompletionBand::Below => "Fr",
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.colored_output {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn header(&self, report: &Report) -> String {
        let (first, last) = report.period_labels();
        format!(
            "{}\nPeriod: {} → {}   Target: {}/day   Day boundary: {}\n",
            self.heading("Booth Entry Daily Report"),
            first,
            last,
            report.quota_target,
            report.window.offset().display_name()
        )
    }

    fn kpi_table(&self, report: &Report) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> format!("Entries ({} days)", report.window_size),
            b -> "Avg/day",
            b -> "Active Users",
            b -> "Overall Completion",
            b -> "Report End Date"
        ]);
        table.add_row(row![
            r -> Self::format_number(report.range_total),
            r -> report.average_per_day,
            r -> report.active_user_count,
            r -> format!("{}%", report.overall_completion_pct),
            report.window.last_day().label()
        ]);
        table
    }

    fn trend_table(&self, report: &Report) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "Day", b -> "Entries", b -> "Trend"]);

        let heights = report.trend_bar_heights();
        for ((label, count), height) in report
            .day_labels()
            .into_iter()
            .zip(report.trend.counts())
            .zip(heights)
        {
            let bar = Self::format_bar(height);
            let bar = if self.colored_output {
                bar.blue().to_string()
            } else {
                bar
            };
            table.add_row(row![label, r -> Self::format_number(*count), bar]);
        }

        table.add_row(row![
            b -> "TOTAL",
            br -> Self::format_number(report.range_total),
            format!("avg {}/day", report.average_per_day)
        ]);
        table
    }

    fn user_row(&self, row: &UserRow, report: &Report) -> Row {
        let filer = format!("{}\n{}", row.tally.display_name, row.tally.identity);
        let mut cells = vec![Cell::new(&filer)];

        for day in row.cells(report.quota_target) {
            let mut cell = Cell::new(&format!("{} / {}", day.count, report.quota_target));
            if self.colored_output {
                cell = cell.style_spec(Self::band_style(day.band));
            }
            cells.push(cell);
        }

        let cumulative = format!(
            "{}%\n{} / {}",
            row.cumulative_pct,
            row.tally.total,
            report.expected_per_user()
        );
        cells.push(Cell::new(&cumulative).style_spec("r"));
        Row::new(cells)
    }

    fn users_table(&self, report: &Report) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        let mut titles = vec![Cell::new("User").style_spec("b")];
        titles.extend(report.day_labels().iter().map(|label| Cell::new(label).style_spec("b")));
        titles.push(Cell::new("Cumulative %").style_spec("br"));
        table.set_titles(Row::new(titles));

        if report.is_empty() {
            let mut cells = vec![Cell::new("No data found.")];
            cells.extend((0..report.window_size + 1).map(|_| Cell::new("")));
            table.add_row(Row::new(cells));
            return table;
        }

        for row in &report.users {
            table.add_row(self.user_row(row, report));
        }
        table
    }
}

impl OutputFormatter for TableFormatter {
    fn format_report(&self, report: &Report) -> String {
        let mut output = self.header(report);
        output.push('\n');
        output.push_str(&self.kpi_table(report).to_string());

        output.push_str(&format!("\n{}\n", self.heading("Trend (daily entries)")));
        output.push_str(&self.trend_table(report).to_string());

        output.push_str(&format!("\n{}\n", self.heading("User Performance (daily filled)")));
        output.push_str(&format!(
            "Cells show x / {} • Cumulative % = total / ({}×{})\n",
            report.quota_target, report.window_size, report.quota_target
        ));
        output.push_str(&self.users_table(report).to_string());
        output
    }

    fn format_trend(&self, report: &Report) -> String {
        let mut output = self.header(report);
        output.push_str(&self.trend_table(report).to_string());
        output
    }

    fn format_users(&self, report: &Report) -> String {
        let mut output = self.header(report);
        output.push_str(&self.users_table(report).to_string());
        output
    }

    fn extension(&self) -> &'static str {
        OutputFormat::Table.extension()
    }
}

/// JSON formatter for machine-readable output
///
/// Outputs data in JSON format with camelCase keys, suitable for
/// programmatic consumption or integration with other tools.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    generated_on: Option<DayKey>,
}

impl JsonFormatter {
    pub fn new(generated_on: Option<DayKey>) -> Self {
        Self { generated_on }
    }

    fn render(value: Value) -> String {
        serde_json::to_string_pretty(&value).unwrap_or_else(|e| {
            warn!("Failed to render JSON output: {}", e);
            String::new()
        })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &Report) -> String {
        let mut value = match serde_json::to_value(report) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize report: {}", e);
                return String::new();
            }
        };
        if let (Some(day), Value::Object(map)) = (self.generated_on, &mut value) {
            map.insert("generatedOn".to_string(), json!(day));
        }
        Self::render(value)
    }

    fn format_trend(&self, report: &Report) -> String {
        Self::render(json!({
            "dayKeys": report.window.day_keys(),
            "labels": report.day_labels(),
            "trend": report.trend,
            "rangeTotal": report.range_total,
            "averagePerDay": report.average_per_day,
        }))
    }

    fn format_users(&self, report: &Report) -> String {
        Self::render(json!({
            "quotaTarget": report.quota_target,
            "expectedPerUser": report.expected_per_user(),
            "users": report.users.iter().map(|row| json!({
                "identity": row.tally.identity,
                "displayName": row.tally.display_name,
                "total": row.tally.total,
                "lastSeenAt": row.tally.last_seen_at.to_rfc3339(),
                "cumulativePct": row.cumulative_pct,
                "cells": row.cells(report.quota_target),
            })).collect::<Vec<_>>(),
        }))
    }

    fn extension(&self) -> &'static str {
        OutputFormat::Json.extension()
    }
}

/// Get the formatter for an output format
///
/// `generated_on` stamps JSON and HTML documents; tables ignore it.
pub fn get_formatter(
    format: OutputFormat,
    colored_output: bool,
    generated_on: Option<DayKey>,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter::new(colored_output)),
        OutputFormat::Json => Box::new(JsonFormatter::new(generated_on)),
        OutputFormat::Html => Box::new(HtmlFormatter::new(generated_on)),
    }
}
