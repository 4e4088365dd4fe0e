//! Aggregation module for folding records into daily and per-user tallies
//!
//! The aggregator is a pure fold over commutative counters: the trend series
//! and every user's per-day counts are independent of record order. The only
//! order-sensitive output is the display name when two records of the same
//! identity share an exact timestamp, in which case the earlier input wins.
//!
//! # Examples
//!
//! ```
//! use boothstat_core::aggregation::RecordAggregator;
//! use boothstat_core::calendar::{CalendarOffset, CalendarWindow};
//! use boothstat_core::types::Record;
//! use chrono::{TimeZone, Utc};
//!
//! let window = CalendarWindow::compute("2024-03-10", 3, CalendarOffset::default()).unwrap();
//! let records = vec![
//!     Record::new("a@x.com", "Asha", Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap()),
//!     Record::new("", "", Utc.with_ymd_and_hms(2024, 3, 9, 11, 0, 0).unwrap()),
//! ];
//!
//! let aggregation = RecordAggregator::new(&window).aggregate(&records);
//! assert_eq!(aggregation.trend.counts(), &[0, 2, 0]);
//! assert_eq!(aggregation.tallies.len(), 1);
//! ```

use std::collections::HashMap;
use tracing::debug;

use crate::aggregation_types::{TrendSeries, UserTally};
use crate::calendar::CalendarWindow;
use crate::types::Record;

/// Result of one aggregation pass
///
/// Owned by the caller; nothing is shared with other passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Per-day totals aligned with the window's day keys
    pub trend: TrendSeries,
    /// Tallies keyed by identity; anonymous records never appear here
    pub tallies: HashMap<String, UserTally>,
    /// Records ignored because they fell outside the window's range
    pub out_of_range: usize,
    /// In-range records counted toward the trend but not attributed to a user
    pub anonymous: usize,
}

impl Aggregation {
    /// Split into the trend series and the identity → tally mapping
    pub fn into_parts(self) -> (TrendSeries, HashMap<String, UserTally>) {
        (self.trend, self.tallies)
    }
}

/// Folds records into trend and tally counters for one calendar window
pub struct RecordAggregator<'w> {
    window: &'w CalendarWindow,
}

impl<'w> RecordAggregator<'w> {
    /// Create an aggregator bound to `window`
    pub fn new(window: &'w CalendarWindow) -> Self {
        Self { window }
    }

    /// Aggregate a collection of records
    ///
    /// Records outside `[range_start, range_end_exclusive)` are skipped, as are
    /// records whose day key does not belong to the window. Neither is an
    /// error: a bad record never prevents the rest of the report.
    pub fn aggregate<'r, I>(&self, records: I) -> Aggregation
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let mut trend = TrendSeries::zeroed(self.window.len());
        let mut tallies: HashMap<String, UserTally> = HashMap::new();
        let mut out_of_range = 0;
        let mut anonymous = 0;

        for record in records {
            if !self.window.contains(&record.occurred_at) {
                out_of_range += 1;
                continue;
            }

            let day = self.window.day_key_for(&record.occurred_at);
            let Some(slot) = self.window.position(&day) else {
                debug!("Record at {} mapped outside the window", record.occurred_at);
                out_of_range += 1;
                continue;
            };
            trend.increment(slot);

            if record.is_anonymous() {
                anonymous += 1;
                continue;
            }

            tallies
                .entry(record.identity.clone())
                .or_insert_with(|| UserTally::open(&record.identity, self.window, record.occurred_at))
                .add(day, record);
        }

        if out_of_range > 0 {
            debug!("Ignored {} records outside the report window", out_of_range);
        }
        debug!(
            "Aggregated {} records for {} users ({} anonymous)",
            trend.total(),
            tallies.len(),
            anonymous
        );

        Aggregation {
            trend,
            tallies,
            out_of_range,
            anonymous,
        }
    }
}
