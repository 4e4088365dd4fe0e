//! boothstat - Daily booth-entry performance reports
//!
//! This library provides functionality to:
//! - Discover and parse booth entry exports (JSON and JSON-lines)
//! - Scope entries by filer, ward, booth and verification status
//! - Build fixed-offset calendar reports with per-user quota completion
//! - Render reports as terminal tables, JSON or printable HTML
//!
//! # Examples
//!
//! ```no_run
//! use boothstat::{data_loader::DataLoader, filters::EntryFilter};
//! use boothstat_core::{CalendarOffset, ReportAssembler, RecordSource};
//!
//! #[tokio::main]
//! async fn main() -> boothstat_core::Result<()> {
//!     let loader = DataLoader::new(Vec::new())
//!         .await?
//!         .with_filter(EntryFilter::new().with_ward("184"));
//!
//!     let assembler = ReportAssembler::new(CalendarOffset::default());
//!     let window = assembler.window_for(Some("2024-03-10"), 7)?;
//!     let records = loader.fetch(&window).await?;
//!     let report = assembler.assemble(&records, window, 30)?;
//!
//!     println!("{} entries from {} users", report.range_total, report.active_user_count);
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cli;
pub mod data_loader;
pub mod filters;

// Re-export commonly used types
pub use boothstat_core::{BoothstatError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
