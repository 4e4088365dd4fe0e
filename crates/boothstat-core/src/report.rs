//! Report assembly
//!
//! [`ReportAssembler`] validates the request, builds the calendar window,
//! aggregates the records and derives the completion metrics. Validation
//! happens before any record is looked at, and an empty record set always
//! yields a well-formed zero report.

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregation::RecordAggregator;
use crate::aggregation_types::TrendSeries;
use crate::calendar::{CalendarOffset, CalendarWindow};
use crate::error::{BoothstatError, Result};
use crate::metrics::{MetricsDeriver, Tenths, UserRow};
use crate::types::{DayKey, Record};

/// Windows longer than this render as a wide (landscape) matrix
pub const WIDE_WINDOW_DAYS: usize = 10;

/// Fully derived report for one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub window: CalendarWindow,
    pub trend: TrendSeries,
    pub users: Vec<UserRow>,
    pub range_total: u64,
    pub active_user_count: usize,
    pub average_per_day: Tenths,
    pub overall_completion_pct: Tenths,
    pub quota_target: u64,
    pub window_size: usize,
}

impl Report {
    /// `DD/MM/YY` labels for every window day
    pub fn day_labels(&self) -> Vec<String> {
        self.window.day_keys().iter().map(DayKey::label).collect()
    }

    /// First and last day label, for period headers
    pub fn period_labels(&self) -> (String, String) {
        (self.window.first_day().label(), self.window.last_day().label())
    }

    /// Busiest single-day count, floored at 1 so it can be used as a divisor
    pub fn max_day(&self) -> u64 {
        self.trend.max().max(1)
    }

    /// Height of each trend bar as a whole percentage of the busiest day
    pub fn trend_bar_heights(&self) -> Vec<u64> {
        let max = self.max_day();
        self.trend
            .counts()
            .iter()
            .map(|count| (200 * count + max) / (2 * max))
            .collect()
    }

    /// Whether the matrix needs a wide layout
    pub fn is_wide(&self) -> bool {
        self.window_size > WIDE_WINDOW_DAYS
    }

    /// Entries a single user would need to fully meet the quota, saturating at `u64::MAX`
    pub fn expected_per_user(&self) -> u64 {
        (self.window_size as u64).saturating_mul(self.quota_target)
    }

    /// Download filename such as `booth_daily_report_2024-03-10_last7d.html`
    pub fn suggested_filename(&self, extension: &str) -> String {
        format!(
            "booth_daily_report_{}_last{}d.{}",
            self.window.last_day(),
            self.window_size,
            extension.trim_start_matches('.')
        )
    }

    /// True when no user was active in the window
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Orchestrates window construction, aggregation and metrics derivation
///
/// # Examples
/// ```
/// use boothstat_core::calendar::CalendarOffset;
/// use boothstat_core::report::ReportAssembler;
/// use boothstat_core::types::Record;
/// use chrono::{TimeZone, Utc};
///
/// let records = vec![
///     Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap()),
///     Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap()),
///     Record::new("b@x.com", "B", Utc.with_ymd_and_hms(2024, 3, 8, 1, 0, 0).unwrap()),
/// ];
///
/// let report = ReportAssembler::new(CalendarOffset::default())
///     .build_report(&records, Some("2024-03-10"), 3, 2)
///     .unwrap();
///
/// assert_eq!(report.trend.counts(), &[1, 1, 1]);
/// assert_eq!(report.overall_completion_pct.to_string(), "25.0");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler {
    offset: CalendarOffset,
}

impl ReportAssembler {
    pub fn new(offset: CalendarOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> CalendarOffset {
        self.offset
    }

    /// Build the window a report request would cover, validating its inputs
    ///
    /// A missing end day means today under the configured offset.
    pub fn window_for(&self, end_day_key: Option<&str>, window_size: i64) -> Result<CalendarWindow> {
        if window_size <= 0 {
            return Err(BoothstatError::InvalidWindowSize(window_size));
        }
        match end_day_key {
            Some(key) => CalendarWindow::compute(key, window_size, self.offset),
            None => CalendarWindow::ending_at(self.offset.today(), window_size, self.offset),
        }
    }

    /// Build a report from records, an end day, a window size and a daily quota
    ///
    /// Fails with `InvalidWindowSize`, `InvalidQuotaTarget` or
    /// `InvalidDayKey` before any aggregation takes place.
    pub fn build_report<'r, I>(
        &self,
        records: I,
        end_day_key: Option<&str>,
        window_size: i64,
        quota_target: i64,
    ) -> Result<Report>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        if window_size <= 0 {
            return Err(BoothstatError::InvalidWindowSize(window_size));
        }
        let deriver = MetricsDeriver::new(quota_target)?;
        let window = self.window_for(end_day_key, window_size)?;
        Ok(Self::assemble_with(records, window, deriver))
    }

    /// Build a report for an already computed window
    pub fn assemble<'r, I>(&self, records: I, window: CalendarWindow, quota_target: i64) -> Result<Report>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let deriver = MetricsDeriver::new(quota_target)?;
        Ok(Self::assemble_with(records, window, deriver))
    }

    fn assemble_with<'r, I>(records: I, window: CalendarWindow, deriver: MetricsDeriver) -> Report
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let aggregation = RecordAggregator::new(&window).aggregate(records);
        debug!(
            "Aggregation skipped {} out-of-range and {} anonymous records",
            aggregation.out_of_range, aggregation.anonymous
        );
        let (trend, tallies) = aggregation.into_parts();
        let metrics = deriver.derive(&trend, tallies, &window);

        info!(
            "Report {}..{}: {} entries from {} users",
            window.first_day(),
            window.last_day(),
            metrics.range_total,
            metrics.active_user_count
        );

        Report {
            window_size: window.len(),
            quota_target: deriver.quota_target(),
            window,
            trend,
            users: metrics.users,
            range_total: metrics.range_total,
            active_user_count: metrics.active_user_count,
            average_per_day: metrics.average_per_day,
            overall_completion_pct: metrics.overall_completion_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn worked_example() -> Vec<Record> {
        vec![
            Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap()),
            Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap()),
            Record::new("b@x.com", "B", Utc.with_ymd_and_hms(2024, 3, 8, 1, 0, 0).unwrap()),
        ]
    }

    fn assembler() -> ReportAssembler {
        ReportAssembler::new(CalendarOffset::default())
    }

    #[test]
    fn test_worked_example_report() {
        let report = assembler()
            .build_report(&worked_example(), Some("2024-03-10"), 3, 2)
            .unwrap();

        let keys: Vec<String> = report.window.day_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["2024-03-08", "2024-03-09", "2024-03-10"]);
        assert_eq!(report.trend.counts(), &[1, 1, 1]);
        assert_eq!(report.range_total, 3);
        assert_eq!(report.active_user_count, 2);
        assert_eq!(report.average_per_day.to_string(), "1.0");
        assert_eq!(report.overall_completion_pct.to_string(), "25.0");

        let a = &report.users[0];
        assert_eq!(a.tally.identity, "a@x.com");
        assert_eq!(a.tally.per_day.values().copied().collect::<Vec<_>>(), [0, 1, 1]);
        assert_eq!(a.tally.total, 2);
        assert_eq!(a.cumulative_pct.to_string(), "33.3");

        let b = &report.users[1];
        assert_eq!(b.tally.identity, "b@x.com");
        assert_eq!(b.tally.total, 1);
        assert_eq!(b.cumulative_pct.to_string(), "16.7");
    }

    #[test]
    fn test_zero_records() {
        let records: Vec<Record> = Vec::new();
        let report = assembler().build_report(&records, Some("2024-03-10"), 7, 30).unwrap();
        assert_eq!(report.trend.counts(), &[0; 7]);
        assert!(report.is_empty());
        assert_eq!(report.range_total, 0);
        assert_eq!(report.active_user_count, 0);
        assert_eq!(report.average_per_day, Tenths::ZERO);
        assert_eq!(report.overall_completion_pct, Tenths::ZERO);
        assert_eq!(report.trend_bar_heights(), vec![0; 7]);
    }

    #[test]
    fn test_validation_errors() {
        let records = worked_example();
        let err = assembler().build_report(&records, Some("2024-03-10"), 0, 2).unwrap_err();
        assert!(matches!(err, BoothstatError::InvalidWindowSize(0)));

        let err = assembler().build_report(&records, Some("2024-03-10"), 3, 0).unwrap_err();
        assert!(matches!(err, BoothstatError::InvalidQuotaTarget(0)));

        let err = assembler().build_report(&records, Some("10/03/2024"), 3, 2).unwrap_err();
        assert!(matches!(err, BoothstatError::InvalidDayKey(_)));
    }

    #[test]
    fn test_validation_order() {
        let records: Vec<Record> = Vec::new();
        let err = assembler().build_report(&records, Some("bogus"), -1, -1).unwrap_err();
        assert_eq!(err.kind(), "invalid_window_size");

        let err = assembler().build_report(&records, Some("bogus"), 1, -1).unwrap_err();
        assert_eq!(err.kind(), "invalid_quota_target");
    }

    #[test]
    fn test_missing_end_day_uses_today() {
        let offset = CalendarOffset::default();
        let records: Vec<Record> = Vec::new();
        let report = ReportAssembler::new(offset).build_report(&records, None, 2, 1).unwrap();
        let today = offset.today();
        // A midnight rollover between the two calls would shift by one day
        assert!(report.window.last_day() == today || report.window.last_day().next() == Some(today));
    }

    #[test]
    fn test_presentation_helpers() {
        let report = assembler()
            .build_report(&worked_example(), Some("2024-03-10"), 3, 2)
            .unwrap();
        assert_eq!(report.day_labels(), ["08/03/24", "09/03/24", "10/03/24"]);
        assert_eq!(report.period_labels(), ("08/03/24".to_string(), "10/03/24".to_string()));
        assert_eq!(report.max_day(), 1);
        assert_eq!(report.trend_bar_heights(), [100, 100, 100]);
        assert!(!report.is_wide());
        assert_eq!(report.expected_per_user(), 6);
        assert_eq!(
            report.suggested_filename("pdf"),
            "booth_daily_report_2024-03-10_last3d.pdf"
        );
        assert_eq!(
            report.suggested_filename(".html"),
            "booth_daily_report_2024-03-10_last3d.html"
        );
    }

    #[test]
    fn test_max_quota_builds_report() {
        let report = assembler()
            .build_report(&worked_example(), Some("2024-03-10"), 3, i64::MAX)
            .unwrap();
        assert_eq!(report.quota_target, i64::MAX as u64);
        assert_eq!(report.range_total, 3);
        assert_eq!(report.overall_completion_pct, Tenths::ZERO);
        assert!(report.users.iter().all(|row| row.cumulative_pct == Tenths::ZERO));
        assert_eq!(report.expected_per_user(), u64::MAX);
    }

    #[test]
    fn test_bar_heights_round_half_up() {
        let t = |h| Utc.with_ymd_and_hms(2024, 3, 9, h, 0, 0).unwrap();
        // 3 on 03-09, 1 on 03-08 → 33.33% rounds to 33
        let mut records: Vec<Record> = (0..3).map(|h| Record::new("a@x.com", "A", t(h))).collect();
        records.push(Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 8, 1, 0, 0).unwrap()));

        let report = assembler().build_report(&records, Some("2024-03-10"), 3, 2).unwrap();
        assert_eq!(report.trend.counts(), &[1, 3, 0]);
        assert_eq!(report.trend_bar_heights(), [33, 100, 0]);
    }

    #[test]
    fn test_wide_window() {
        let records: Vec<Record> = Vec::new();
        let report = assembler().build_report(&records, Some("2024-03-10"), 14, 30).unwrap();
        assert!(report.is_wide());
        assert_eq!(report.window_size, 14);
        let report = assembler().build_report(&records, Some("2024-03-10"), 10, 30).unwrap();
        assert!(!report.is_wide());
    }

    #[test]
    fn test_assemble_with_precomputed_window() {
        let window = CalendarWindow::compute("2024-03-10", 3, CalendarOffset::default()).unwrap();
        let report = assembler().assemble(&worked_example(), window, 2).unwrap();
        assert_eq!(report.range_total, 3);
        assert_eq!(report.quota_target, 2);

        let window = CalendarWindow::compute("2024-03-10", 3, CalendarOffset::default()).unwrap();
        assert!(assembler().assemble(&worked_example(), window, 0).is_err());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = assembler()
            .build_report(&worked_example(), Some("2024-03-10"), 3, 2)
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rangeTotal"], 3);
        assert_eq!(json["activeUserCount"], 2);
        assert_eq!(json["overallCompletionPct"], 25.0);
        assert_eq!(json["users"][0]["identity"], "a@x.com");
        assert_eq!(json["users"][0]["cumulativePct"], 33.3);
        assert_eq!(json["users"][0]["perDay"]["2024-03-09"], 1);
        assert_eq!(json["trend"], serde_json::json!([1, 1, 1]));
    }
}
