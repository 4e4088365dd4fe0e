//! Report rendering for boothstat
//!
//! This crate provides the table, JSON and HTML formatters that turn a
//! [`boothstat_core::Report`] into terminal output or a document.

pub mod html;
pub mod output;

pub use html::HtmlFormatter;
pub use output::{JsonFormatter, OutputFormat, OutputFormatter, TableFormatter, get_formatter};
