//! Fixed-offset calendar arithmetic
//!
//! Day boundaries are computed from a fixed UTC offset rather than a timezone
//! database: the records come from a single business timezone, and a report
//! must bucket an instant into the same day no matter where it is generated.
//! `CalendarOffset::day_start` and `CalendarOffset::day_key` are the single
//! pair of conversions between day keys and absolute instants; both the window
//! boundaries and per-record bucketing go through them.

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeDelta, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{BoothstatError, Result};
use crate::types::DayKey;

/// Default offset of the business day: +05:30
pub const DEFAULT_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

const DEFAULT_OFFSET: FixedOffset = match FixedOffset::east_opt(DEFAULT_OFFSET_SECONDS) {
    Some(offset) => offset,
    None => panic!("default offset out of range"),
};

/// Fixed UTC offset defining where calendar days begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarOffset {
    offset: FixedOffset,
}

impl Default for CalendarOffset {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
        }
    }
}

impl CalendarOffset {
    /// UTC itself
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Create from seconds east of UTC
    pub fn from_seconds(seconds: i32) -> Result<Self> {
        FixedOffset::east_opt(seconds)
            .map(|offset| Self { offset })
            .ok_or_else(|| BoothstatError::InvalidOffset(format!("{seconds} seconds is out of range")))
    }

    /// Parse an offset such as `+05:30`, `-0800`, `+05`, `Z` or `UTC`
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || {
            BoothstatError::InvalidOffset(format!(
                "'{s}'. Use format like '+05:30', '-08:00' or 'UTC'"
            ))
        };

        if trimmed.eq_ignore_ascii_case("z")
            || trimmed.eq_ignore_ascii_case("utc")
            || trimmed.eq_ignore_ascii_case("gmt")
        {
            return Ok(Self::utc());
        }

        let (sign, rest) = match trimmed.chars().next() {
            Some('+') => (1, &trimmed[1..]),
            Some('-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };

        if !rest.is_ascii() {
            return Err(invalid());
        }

        let (hours, minutes) = match rest.split_once(':') {
            Some((h, m)) => (h, m),
            None if rest.len() == 4 => rest.split_at(2),
            None => (rest, "0"),
        };

        if hours.is_empty()
            || hours.len() > 2
            || minutes.len() > 2
            || !hours.chars().all(|c| c.is_ascii_digit())
            || !minutes.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }

        Self::from_seconds(sign * (hours * 3600 + minutes * 60))
    }

    /// Resolve the offset from CLI/env input, falling back to the default
    pub fn from_cli(offset_str: Option<&str>) -> Result<Self> {
        match offset_str {
            Some(s) => Self::parse(s),
            None => Ok(Self::default()),
        }
    }

    /// Seconds east of UTC
    pub fn seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    /// Label for report footers, e.g. `UTC+05:30`
    pub fn display_name(&self) -> String {
        if self.seconds() == 0 {
            "UTC".to_string()
        } else {
            format!("UTC{self}")
        }
    }

    /// Inclusive start instant of a calendar day
    pub fn day_start(&self, key: DayKey) -> Result<DateTime<Utc>> {
        key.inner()
            .and_time(NaiveTime::MIN)
            .checked_sub_signed(TimeDelta::seconds(i64::from(self.seconds())))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| BoothstatError::InvalidDayKey(key.to_string()))
    }

    /// Calendar day an instant falls on
    pub fn day_key(&self, instant: &DateTime<Utc>) -> DayKey {
        DayKey::new(instant.with_timezone(&self.offset).date_naive())
    }

    /// Today's calendar day under this offset
    pub fn today(&self) -> DayKey {
        self.day_key(&Utc::now())
    }
}

impl fmt::Display for CalendarOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.seconds();
        let sign = if seconds < 0 { '-' } else { '+' };
        let abs = seconds.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
    }
}

impl FromStr for CalendarOffset {
    type Err = BoothstatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CalendarOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Contiguous run of calendar days plus its absolute instant range
///
/// # Examples
/// ```
/// use boothstat_core::calendar::{CalendarOffset, CalendarWindow};
///
/// let window = CalendarWindow::compute("2024-03-10", 3, CalendarOffset::default()).unwrap();
/// let keys: Vec<String> = window.day_keys().iter().map(|k| k.to_string()).collect();
/// assert_eq!(keys, ["2024-03-08", "2024-03-09", "2024-03-10"]);
/// assert_eq!(window.range_start().to_rfc3339(), "2024-03-07T18:30:00+00:00");
/// assert_eq!(window.range_end_exclusive().to_rfc3339(), "2024-03-10T18:30:00+00:00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWindow {
    day_keys: Vec<DayKey>,
    range_start: DateTime<Utc>,
    range_end_exclusive: DateTime<Utc>,
    offset: CalendarOffset,
}

impl CalendarWindow {
    /// Compute the window of `window_size` days ending at `end_day_key`
    pub fn compute(end_day_key: &str, window_size: i64, offset: CalendarOffset) -> Result<Self> {
        if window_size <= 0 {
            return Err(BoothstatError::InvalidWindowSize(window_size));
        }
        let end = DayKey::parse(end_day_key)?;
        Self::ending_at(end, window_size, offset)
    }

    /// Compute the window of `window_size` days ending at an already-parsed day
    pub fn ending_at(end: DayKey, window_size: i64, offset: CalendarOffset) -> Result<Self> {
        if window_size <= 0 {
            return Err(BoothstatError::InvalidWindowSize(window_size));
        }
        let out_of_range = || BoothstatError::InvalidDayKey(end.to_string());

        let span = (window_size - 1) as u64;
        let first = end.days_before(span).ok_or_else(out_of_range)?;
        let day_keys: Vec<DayKey> = (0..window_size as u64)
            .map(|i| end.days_before(span - i).ok_or_else(out_of_range))
            .collect::<Result<_>>()?;

        let range_start = offset.day_start(first)?;
        let range_end_exclusive = offset.day_start(end.next().ok_or_else(out_of_range)?)?;

        debug!(
            "Window {} .. {} ({} days, {}) spans [{}, {})",
            first,
            end,
            day_keys.len(),
            offset.display_name(),
            range_start,
            range_end_exclusive
        );

        Ok(Self {
            day_keys,
            range_start,
            range_end_exclusive,
            offset,
        })
    }

    /// Ordered day keys, oldest first
    pub fn day_keys(&self) -> &[DayKey] {
        &self.day_keys
    }

    /// Number of days in the window
    pub fn len(&self) -> usize {
        self.day_keys.len()
    }

    /// Always false for a constructed window; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.day_keys.is_empty()
    }

    pub fn first_day(&self) -> DayKey {
        self.day_keys[0]
    }

    pub fn last_day(&self) -> DayKey {
        self.day_keys[self.day_keys.len() - 1]
    }

    /// Inclusive start instant
    pub fn range_start(&self) -> DateTime<Utc> {
        self.range_start
    }

    /// Exclusive end instant
    pub fn range_end_exclusive(&self) -> DateTime<Utc> {
        self.range_end_exclusive
    }

    pub fn offset(&self) -> CalendarOffset {
        self.offset
    }

    /// Whether an instant falls inside `[range_start, range_end_exclusive)`
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.range_start && *instant < self.range_end_exclusive
    }

    /// Day key of an instant under the window's offset
    pub fn day_key_for(&self, instant: &DateTime<Utc>) -> DayKey {
        self.offset.day_key(instant)
    }

    /// Slot index of a day key, if it belongs to the window
    pub fn position(&self, key: &DayKey) -> Option<usize> {
        let days = key
            .inner()
            .signed_duration_since(*self.first_day().inner())
            .num_days();
        usize::try_from(days).ok().filter(|&i| i < self.day_keys.len())
    }
}
