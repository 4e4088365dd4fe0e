//! Command execution for the boothstat binary
//!
//! Turns parsed CLI arguments into an entry filter, a calendar window, a
//! report and finally rendered text, and decides where that text goes.

use boothstat_core::calendar::CalendarOffset;
use boothstat_core::error::Result;
use boothstat_core::source::RecordSource;
use boothstat_core::types::DayKey;
use boothstat_core::{Report, ReportAssembler};
use boothstat_terminal::get_formatter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{Cli, Command};
use crate::filters::EntryFilter;

/// A rendered report and the file extension of its format
#[derive(Debug)]
pub struct Rendered {
    pub report: Report,
    pub text: String,
    pub extension: &'static str,
}

/// Build the entry filter described by the scoping flags
pub fn entry_filter(cli: &Cli) -> EntryFilter {
    let mut filter = EntryFilter::new();
    if let Some(email) = &cli.email {
        filter = filter.with_email(email);
    }
    if let Some(ward) = &cli.ward {
        filter = filter.with_ward(ward);
    }
    if let Some(booth) = &cli.booth {
        filter = filter.with_booth(booth);
    }
    if let Some(status) = cli.status {
        filter = filter.with_status(status.into());
    }
    filter
}

/// Fetch records from `source` and render the requested report
///
/// The window, offset and quota are validated before anything is fetched.
pub async fn render<S>(
    cli: &Cli,
    source: &S,
    generated_on: Option<DayKey>,
    colored_output: bool,
) -> Result<Rendered>
where
    S: RecordSource + ?Sized,
{
    let offset = CalendarOffset::from_cli(cli.offset.as_deref())?;
    info!("Using day boundaries at {}", offset.display_name());

    let assembler = ReportAssembler::new(offset);
    let window = assembler.window_for(cli.date.as_deref(), cli.window_days())?;
    let records = source.fetch(&window).await?;
    let report = assembler.assemble(&records, window, cli.quota_target())?;

    let formatter = get_formatter(cli.output_format(), colored_output, generated_on);
    let text = match cli.command() {
        Command::Report => formatter.format_report(&report),
        Command::Trend => formatter.format_trend(&report),
        Command::Users => formatter.format_users(&report),
    };

    Ok(Rendered {
        report,
        text,
        extension: formatter.extension(),
    })
}

/// Where `--out` should be written: a directory receives the suggested filename
pub fn resolve_output_path(out: &Path, report: &Report, extension: &str) -> PathBuf {
    if out.is_dir() {
        out.join(report.suggested_filename(extension))
    } else {
        out.to_path_buf()
    }
}

/// Write rendered output to `--out`, or stdout when no path is given
pub async fn write_output(cli: &Cli, rendered: &Rendered) -> Result<Option<PathBuf>> {
    match &cli.out {
        Some(out) => {
            let path = resolve_output_path(out, &rendered.report, rendered.extension);
            tokio::fs::write(&path, &rendered.text).await?;
            info!("Wrote report to {}", path.display());
            Ok(Some(path))
        }
        None => {
            println!("{}", rendered.text);
            Ok(None)
        }
    }
}
