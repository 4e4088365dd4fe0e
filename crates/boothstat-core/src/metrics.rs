//! Completion metrics derived from aggregated tallies
//!
//! All percentages and averages are rounded half-up to one decimal place
//! using exact integer arithmetic on the underlying ratio, so a value such as
//! `2/6 × 100` always renders as `33.3` regardless of how the quotient would
//! be represented in binary floating point.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::aggregation_types::{TrendSeries, UserTally};
use crate::calendar::CalendarWindow;
use crate::error::{BoothstatError, Result};
use crate::types::DayKey;

/// Non-negative value with one decimal place, stored as integer tenths
///
/// # Examples
/// ```
/// use boothstat_core::metrics::Tenths;
///
/// assert_eq!(Tenths::percent(2, 6).to_string(), "33.3");
/// assert_eq!(Tenths::percent(1, 8).to_string(), "12.5");
/// assert_eq!(Tenths::ratio(3, 3).to_string(), "1.0");
/// assert_eq!(Tenths::percent(5, 0), Tenths::ZERO);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tenths(u64);

impl Tenths {
    pub const ZERO: Tenths = Tenths(0);

    /// `numerator / denominator`, rounded half-up to one decimal (0 when the denominator is 0)
    pub fn ratio(numerator: u64, denominator: u64) -> Self {
        Self(round_half_up(u128::from(numerator) * 10, u128::from(denominator)))
    }

    /// `numerator / denominator × 100`, rounded half-up to one decimal (0 when the denominator is 0)
    pub fn percent(numerator: u64, denominator: u64) -> Self {
        Self::percent_of(numerator, u128::from(denominator))
    }

    /// [`Tenths::percent`] against a denominator that may exceed `u64`
    pub fn percent_of(numerator: u64, denominator: u128) -> Self {
        Self(round_half_up(u128::from(numerator) * 1000, denominator))
    }

    /// Raw count of tenths
    pub fn tenths(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 10.0
    }
}

/// `n / d` rounded half-up to an integer; 0 when `d` is 0
fn round_half_up(n: u128, d: u128) -> u64 {
    if d == 0 {
        return 0;
    }
    // Rounds up when 2r >= d
    let (quotient, remainder) = (n / d, n % d);
    let rounded = if remainder >= d - remainder {
        quotient + 1
    } else {
        quotient
    };
    u64::try_from(rounded).unwrap_or(u64::MAX)
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Tenths {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// Classification of a single day's count against the daily quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionBand {
    /// Count met the quota
    OnTarget,
    /// Count reached at least 60% of the quota (rounded up)
    Partial,
    /// Anything less
    Below,
}

impl CompletionBand {
    /// Band a daily `count` against `target`
    ///
    /// # Examples
    /// ```
    /// use boothstat_core::metrics::CompletionBand;
    ///
    /// assert_eq!(CompletionBand::classify(30, 30), CompletionBand::OnTarget);
    /// assert_eq!(CompletionBand::classify(18, 30), CompletionBand::Partial);
    /// assert_eq!(CompletionBand::classify(17, 30), CompletionBand::Below);
    /// // ceil(7 × 0.6) = 5
    /// assert_eq!(CompletionBand::classify(4, 7), CompletionBand::Below);
    /// assert_eq!(CompletionBand::classify(5, 7), CompletionBand::Partial);
    /// ```
    pub fn classify(count: u64, target: u64) -> Self {
        if count >= target {
            Self::OnTarget
        } else if count >= partial_threshold(target) {
            Self::Partial
        } else {
            Self::Below
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTarget => "on-target",
            Self::Partial => "partial",
            Self::Below => "below",
        }
    }
}

impl fmt::Display for CompletionBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ceil(target × 0.6)` computed without floating point
pub fn partial_threshold(target: u64) -> u64 {
    let threshold = (u128::from(target) * 3).div_ceil(5);
    u64::try_from(threshold).unwrap_or(target)
}

/// One day of a user's row: count and band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub day: DayKey,
    pub count: u64,
    pub band: CompletionBand,
}

/// A user's tally together with its cumulative completion percentage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    #[serde(flatten)]
    pub tally: UserTally,
    /// `total / (window days × quota) × 100`
    pub cumulative_pct: Tenths,
}

impl UserRow {
    /// Per-day cells in window order, banded against `quota_target`
    pub fn cells(&self, quota_target: u64) -> Vec<DayCell> {
        self.tally
            .per_day
            .iter()
            .map(|(day, count)| DayCell {
                day: *day,
                count: *count,
                band: CompletionBand::classify(*count, quota_target),
            })
            .collect()
    }
}

/// Summary figures derived from one aggregation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetrics {
    pub users: Vec<UserRow>,
    pub range_total: u64,
    pub active_user_count: usize,
    pub average_per_day: Tenths,
    pub overall_completion_pct: Tenths,
}

/// Derives totals, averages and completion percentages against a daily quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsDeriver {
    quota_target: u64,
}

impl MetricsDeriver {
    /// Create a deriver for a positive daily quota
    pub fn new(quota_target: i64) -> Result<Self> {
        if quota_target <= 0 {
            return Err(BoothstatError::InvalidQuotaTarget(quota_target));
        }
        Ok(Self {
            quota_target: quota_target as u64,
        })
    }

    pub fn quota_target(&self) -> u64 {
        self.quota_target
    }

    /// Derive report metrics from a trend series and the identity → tally mapping
    pub fn derive(
        &self,
        trend: &TrendSeries,
        tallies: HashMap<String, UserTally>,
        window: &CalendarWindow,
    ) -> ReportMetrics {
        let days = window.len() as u64;
        let range_total = trend.total();
        let active_user_count = tallies.len();

        let per_user_expected = u128::from(days) * u128::from(self.quota_target);
        let overall_expected = (active_user_count as u128).saturating_mul(per_user_expected);

        let mut users: Vec<UserRow> = tallies
            .into_values()
            .map(|tally| UserRow {
                cumulative_pct: Tenths::percent_of(tally.total, per_user_expected),
                tally,
            })
            .collect();
        sort_rows(&mut users);

        ReportMetrics {
            users,
            range_total,
            active_user_count,
            average_per_day: Tenths::ratio(range_total, days),
            overall_completion_pct: Tenths::percent_of(range_total, overall_expected),
        }
    }
}

/// Order rows by total desc, then most recently active, then identity asc
pub fn sort_rows(rows: &mut [UserRow]) {
    rows.sort_by(|a, b| {
        b.tally
            .total
            .cmp(&a.tally.total)
            .then_with(|| b.tally.last_seen_at.cmp(&a.tally.last_seen_at))
            .then_with(|| a.tally.identity.cmp(&b.tally.identity))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::RecordAggregator;
    use crate::calendar::CalendarOffset;
    use crate::types::Record;
    use chrono::{TimeZone, Utc};

    fn window(days: i64) -> CalendarWindow {
        CalendarWindow::compute("2024-03-10", days, CalendarOffset::default()).unwrap()
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(Tenths::ratio(1, 20).to_string(), "0.1");
        assert_eq!(Tenths::ratio(1, 40).to_string(), "0.0");
        assert_eq!(Tenths::ratio(3, 40).to_string(), "0.1");
        assert_eq!(Tenths::percent(1, 3).to_string(), "33.3");
        assert_eq!(Tenths::percent(2, 3).to_string(), "66.7");
        assert_eq!(Tenths::percent(1, 1600).to_string(), "0.1");
        assert_eq!(Tenths::percent(7, 7).to_string(), "100.0");
        assert_eq!(Tenths::percent(9, 4).to_string(), "225.0");
    }

    #[test]
    fn test_half_values_round_up_exactly() {
        // 1.15 and 1.005 style ties are exact here, unlike f64 rounding
        assert_eq!(Tenths::ratio(23, 20).to_string(), "1.2");
        assert_eq!(Tenths::percent(201, 2000).to_string(), "10.1");
        assert_eq!(Tenths::percent(1, 16).to_string(), "6.3");
    }

    #[test]
    fn test_tenths_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Tenths::percent(1, 3)).unwrap(), "33.3");
        assert_eq!(serde_json::to_string(&Tenths::ZERO).unwrap(), "0.0");
    }

    #[test]
    fn test_partial_threshold() {
        assert_eq!(partial_threshold(1), 1);
        assert_eq!(partial_threshold(2), 2);
        assert_eq!(partial_threshold(5), 3);
        assert_eq!(partial_threshold(7), 5);
        assert_eq!(partial_threshold(30), 18);
        assert_eq!(partial_threshold(200), 120);
    }

    #[test]
    fn test_extreme_targets_do_not_overflow() {
        let huge = u64::MAX / 2;
        assert_eq!(partial_threshold(huge), (u128::from(huge) * 3).div_ceil(5) as u64);
        assert_eq!(partial_threshold(u64::MAX), (u128::from(u64::MAX) * 3).div_ceil(5) as u64);
        assert_eq!(CompletionBand::classify(0, huge), CompletionBand::Below);
        assert_eq!(CompletionBand::classify(huge, huge), CompletionBand::OnTarget);
        assert_eq!(CompletionBand::classify(u64::MAX - 1, u64::MAX), CompletionBand::Partial);

        assert_eq!(Tenths::percent_of(1, u128::MAX), Tenths::ZERO);
        assert_eq!(Tenths::percent_of(u64::MAX, u128::MAX).to_string(), "0.0");
        assert_eq!(Tenths::percent(u64::MAX, u64::MAX).to_string(), "100.0");
    }

    #[test]
    fn test_max_quota_derives_zero_completion() {
        let window = window(3);
        let records = vec![Record::new(
            "a@x.com",
            "A",
            Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap(),
        )];
        let (trend, tallies) = RecordAggregator::new(&window).aggregate(&records).into_parts();

        let metrics = MetricsDeriver::new(i64::MAX).unwrap().derive(&trend, tallies, &window);
        assert_eq!(metrics.range_total, 1);
        assert_eq!(metrics.active_user_count, 1);
        assert_eq!(metrics.overall_completion_pct, Tenths::ZERO);
        assert_eq!(metrics.users[0].cumulative_pct, Tenths::ZERO);
        assert_eq!(metrics.users[0].cells(i64::MAX as u64)[1].band, CompletionBand::Below);
    }

    #[test]
    fn test_band_classification() {
        assert_eq!(CompletionBand::classify(0, 1), CompletionBand::Below);
        assert_eq!(CompletionBand::classify(1, 1), CompletionBand::OnTarget);
        assert_eq!(CompletionBand::classify(45, 30), CompletionBand::OnTarget);
        assert_eq!(CompletionBand::classify(1, 2), CompletionBand::Below);
        assert_eq!(CompletionBand::OnTarget.to_string(), "on-target");
    }

    #[test]
    fn test_deriver_rejects_non_positive_quota() {
        assert!(matches!(
            MetricsDeriver::new(0),
            Err(BoothstatError::InvalidQuotaTarget(0))
        ));
        assert!(MetricsDeriver::new(-3).is_err());
        assert_eq!(MetricsDeriver::new(30).unwrap().quota_target(), 30);
    }

    #[test]
    fn test_worked_example_metrics() {
        let window = window(3);
        let records = vec![
            Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap()),
            Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap()),
            Record::new("b@x.com", "B", Utc.with_ymd_and_hms(2024, 3, 8, 1, 0, 0).unwrap()),
        ];
        let (trend, tallies) = RecordAggregator::new(&window).aggregate(&records).into_parts();

        let metrics = MetricsDeriver::new(2).unwrap().derive(&trend, tallies, &window);
        assert_eq!(metrics.range_total, 3);
        assert_eq!(metrics.active_user_count, 2);
        assert_eq!(metrics.average_per_day.to_string(), "1.0");
        assert_eq!(metrics.overall_completion_pct.to_string(), "25.0");

        assert_eq!(metrics.users[0].tally.identity, "a@x.com");
        assert_eq!(metrics.users[0].cumulative_pct.to_string(), "33.3");
        assert_eq!(metrics.users[1].tally.identity, "b@x.com");
        assert_eq!(metrics.users[1].cumulative_pct.to_string(), "16.7");
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let window = window(7);
        let metrics = MetricsDeriver::new(30)
            .unwrap()
            .derive(&TrendSeries::zeroed(7), HashMap::new(), &window);
        assert!(metrics.users.is_empty());
        assert_eq!(metrics.range_total, 0);
        assert_eq!(metrics.active_user_count, 0);
        assert_eq!(metrics.average_per_day, Tenths::ZERO);
        assert_eq!(metrics.overall_completion_pct, Tenths::ZERO);
    }

    #[test]
    fn test_row_ordering_tiebreaks() {
        let window = window(3);
        let t = |h| Utc.with_ymd_and_hms(2024, 3, 9, h, 0, 0).unwrap();
        let records = vec![
            // two entries each, c is most recent
            Record::new("a@x.com", "A", t(1)),
            Record::new("a@x.com", "A", t(2)),
            Record::new("c@x.com", "C", t(1)),
            Record::new("c@x.com", "C", t(5)),
            // one entry each at the same instant: identity decides
            Record::new("z@x.com", "Z", t(3)),
            Record::new("m@x.com", "M", t(3)),
            // three entries, highest total
            Record::new("q@x.com", "Q", t(0)),
            Record::new("q@x.com", "Q", t(0)),
            Record::new("q@x.com", "Q", t(0)),
        ];
        let (trend, tallies) = RecordAggregator::new(&window).aggregate(&records).into_parts();
        let metrics = MetricsDeriver::new(1).unwrap().derive(&trend, tallies, &window);

        let order: Vec<&str> = metrics
            .users
            .iter()
            .map(|row| row.tally.identity.as_str())
            .collect();
        assert_eq!(order, ["q@x.com", "c@x.com", "a@x.com", "m@x.com", "z@x.com"]);
    }

    #[test]
    fn test_cells_follow_window_order() {
        let window = window(3);
        let records = vec![
            Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap()),
            Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 9, 11, 0, 0).unwrap()),
            Record::new("a@x.com", "A", Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap()),
        ];
        let (trend, tallies) = RecordAggregator::new(&window).aggregate(&records).into_parts();
        let metrics = MetricsDeriver::new(2).unwrap().derive(&trend, tallies, &window);

        let cells = metrics.users[0].cells(2);
        let summary: Vec<(String, u64, CompletionBand)> = cells
            .iter()
            .map(|c| (c.day.to_string(), c.count, c.band))
            .collect();
        assert_eq!(
            summary,
            [
                ("2024-03-08".to_string(), 0, CompletionBand::Below),
                ("2024-03-09".to_string(), 2, CompletionBand::OnTarget),
                ("2024-03-10".to_string(), 1, CompletionBand::Below),
            ]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_percent_within_half_a_tenth(n in 0u64..1_000_000, d in 1u64..1_000_000) {
                let exact = n as f64 * 1000.0 / d as f64;
                let got = Tenths::percent(n, d).tenths() as f64;
                prop_assert!(got - exact <= 0.5 + 1e-9);
                prop_assert!(exact - got < 0.5 + 1e-9);
            }

            #[test]
            fn prop_bands_are_monotonic(count in 0u64..500, target in 1u64..200) {
                let band = CompletionBand::classify(count, target);
                let next = CompletionBand::classify(count + 1, target);
                let rank = |b: CompletionBand| match b {
                    CompletionBand::Below => 0,
                    CompletionBand::Partial => 1,
                    CompletionBand::OnTarget => 2,
                };
                prop_assert!(rank(next) >= rank(band));
                prop_assert_eq!(band == CompletionBand::OnTarget, count >= target);
            }
        }
    }
}
