//! Report aggregation engine for boothstat
//!
//! This crate turns a collection of timestamped booth entries into a
//! supervisor report: a per-day trend and a per-user completion matrix
//! against a daily quota, bucketed by fixed-offset calendar days.
//!
//! The pipeline is [`calendar::CalendarWindow`] →
//! [`aggregation::RecordAggregator`] → [`metrics::MetricsDeriver`], composed
//! by [`report::ReportAssembler`]. Everything here is synchronous and pure;
//! fetching records is left to a [`source::RecordSource`].

pub mod aggregation;
pub mod aggregation_types;
pub mod calendar;
pub mod error;
pub mod metrics;
pub mod report;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use calendar::{CalendarOffset, CalendarWindow};
pub use error::{BoothstatError, Result};
pub use metrics::{CompletionBand, Tenths, UserRow};
pub use report::{Report, ReportAssembler};
pub use source::RecordSource;
pub use types::{DayKey, Record};
