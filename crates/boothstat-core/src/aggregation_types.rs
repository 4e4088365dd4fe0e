//! Aggregation data types for boothstat
//!
//! Pure data structures produced by folding records over a calendar window.
//! These types have no dependencies on metrics derivation or rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar::CalendarWindow;
use crate::types::{DayKey, Record, UNKNOWN_NAME};

/// Per-day entry totals aligned 1:1 with a window's day keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrendSeries {
    counts: Vec<u64>,
}

impl TrendSeries {
    /// A zeroed series with one slot per window day
    pub fn zeroed(days: usize) -> Self {
        Self {
            counts: vec![0; days],
        }
    }

    pub(crate) fn increment(&mut self, slot: usize) {
        if let Some(count) = self.counts.get_mut(slot) {
            *count += 1;
        }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all slots
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest single-day count (0 for an empty series)
    pub fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Accumulated per-day and total counts for one identity within a window
///
/// A tally is opened on the first in-window record for its identity, with
/// every window day present at zero, and is only ever added to afterwards.
/// `per_day` always sums to `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTally {
    /// Normalized email
    pub identity: String,
    /// Name from the latest record that carried a non-blank name
    pub display_name: String,
    /// Count per window day, every window day present
    pub per_day: BTreeMap<DayKey, u64>,
    /// Sum of `per_day`
    pub total: u64,
    /// Latest `occurred_at` seen for this identity
    pub last_seen_at: DateTime<Utc>,
    #[serde(skip)]
    name_seen_at: Option<DateTime<Utc>>,
}

impl UserTally {
    /// Open an empty tally for `identity` covering every day of `window`
    pub fn open(identity: impl Into<String>, window: &CalendarWindow, first_seen: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            display_name: UNKNOWN_NAME.to_string(),
            per_day: window.day_keys().iter().map(|key| (*key, 0)).collect(),
            total: 0,
            last_seen_at: first_seen,
            name_seen_at: None,
        }
    }

    /// Count one record on `day`
    ///
    /// Returns `false` (and counts nothing) when `day` is not a window day.
    pub fn add(&mut self, day: DayKey, record: &Record) -> bool {
        let Some(count) = self.per_day.get_mut(&day) else {
            return false;
        };
        *count += 1;
        self.total += 1;

        if record.occurred_at > self.last_seen_at {
            self.last_seen_at = record.occurred_at;
        }

        // Strictly later wins, so equal timestamps keep the earlier input's name
        if !record.display_name.is_empty()
            && self.name_seen_at.is_none_or(|seen| record.occurred_at > seen)
        {
            self.display_name = record.display_name.clone();
            self.name_seen_at = Some(record.occurred_at);
        }
        true
    }

    /// Count on a single day (0 for days outside the window)
    pub fn count_on(&self, day: &DayKey) -> u64 {
        self.per_day.get(day).copied().unwrap_or(0)
    }

    /// Whether no non-blank name has been seen for this identity
    pub fn is_unnamed(&self) -> bool {
        self.name_seen_at.is_none()
    }
}
