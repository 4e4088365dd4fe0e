//! Core domain types for boothstat
//!
//! This module contains the fundamental types used throughout the boothstat
//! workspace: calendar day keys, the normalized `Record` consumed by the report
//! engine, and the raw stored entry shape it is converted from.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BoothstatError, Result};

/// Display name used when an identity never reported a non-blank name
pub const UNKNOWN_NAME: &str = "—";

/// Calendar day under a fixed UTC offset
///
/// The atomic unit of time bucketing. Day keys are totally ordered and
/// serialize as `YYYY-MM-DD`.
///
/// # Examples
/// ```
/// use boothstat_core::types::DayKey;
///
/// let key = DayKey::parse("2024-03-10").unwrap();
/// assert_eq!(key.to_string(), "2024-03-10");
/// assert_eq!(key.label(), "10/03/24");
/// assert!(DayKey::parse("2024-02-30").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Create a new DayKey
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Create from year, month and day, if that day exists
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a `YYYY-MM-DD` key
    pub fn parse(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| BoothstatError::InvalidDayKey(s.to_string()))
    }

    /// Get the inner NaiveDate
    pub fn inner(&self) -> &NaiveDate {
        &self.0
    }

    /// The following calendar day
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add_days(Days::new(1)).map(Self)
    }

    /// The day `n` days before this one
    pub fn days_before(&self, n: u64) -> Option<Self> {
        self.0.checked_sub_days(Days::new(n)).map(Self)
    }

    /// Short `DD/MM/YY` label used in rendered column headers
    pub fn label(&self) -> String {
        self.0.format("%d/%m/%y").to_string()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = BoothstatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Normalize an identity the way the entry store does: trimmed, lowercased
pub fn normalize_identity(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A single timestamped field entry, as consumed by the report engine
///
/// `identity` is the normalized email of the user who filed the entry. An
/// empty identity marks an anonymous entry: it counts toward daily volume but
/// is never attributed to a user.
///
/// # Examples
/// ```
/// use boothstat_core::types::Record;
/// use chrono::{TimeZone, Utc};
///
/// let record = Record::new(
///     "  Asha@Example.COM ",
///     "Asha",
///     Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap(),
/// );
/// assert_eq!(record.identity, "asha@example.com");
/// assert!(!record.is_anonymous());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Lowercased, trimmed email of the submitting user (may be empty)
    pub identity: String,
    /// Display name as submitted with the entry
    pub display_name: String,
    /// Instant the entry was created
    pub occurred_at: DateTime<Utc>,
}

impl Record {
    /// Create a record, normalizing the identity
    pub fn new(
        identity: impl AsRef<str>,
        display_name: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity: normalize_identity(identity.as_ref()),
            display_name: display_name.into().trim().to_string(),
            occurred_at,
        }
    }

    /// Create from a raw stored entry
    ///
    /// Returns `None` when the entry carries no usable creation timestamp.
    pub fn from_raw(raw: &RawBoothEntry) -> Option<Self> {
        let occurred_at = match raw.created_at.as_ref().and_then(StoredTimestamp::to_utc) {
            Some(ts) => ts,
            None => {
                tracing::debug!(
                    "Skipping entry {:?} without a parseable createdAt",
                    raw.dedup_key()
                );
                return None;
            }
        };

        Some(Self::new(
            raw.email.as_deref().unwrap_or_default(),
            raw.name.as_deref().unwrap_or_default(),
            occurred_at,
        ))
    }

    /// Whether this entry has no attributable identity
    pub fn is_anonymous(&self) -> bool {
        self.identity.trim().is_empty()
    }
}

/// Verification status of a stored entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Entry checked by a supervisor
    Verified,
    /// Entry not yet checked (the store's default)
    #[default]
    #[serde(rename = "Not Verified")]
    NotVerified,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => write!(f, "Verified"),
            Self::NotVerified => write!(f, "Not Verified"),
        }
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "verified" => Ok(Self::Verified),
            "notverified" | "unverified" => Ok(Self::NotVerified),
            _ => Err(format!("Invalid entry status: {s}")),
        }
    }
}

/// Entry identifier as exported by the store: a plain string or `{"$oid": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Plain(String),
    Object {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl EntryId {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(id) => id,
            Self::Object { oid } => oid,
        }
    }
}

/// Date payload inside an extended-JSON `{"$date": ...}` wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Text(String),
    Millis(i64),
    NumberLong {
        #[serde(rename = "$numberLong")]
        value: String,
    },
}

/// Stored timestamp: RFC 3339 text, epoch millis, or extended-JSON `$date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTimestamp {
    Text(String),
    Millis(i64),
    Extended {
        #[serde(rename = "$date")]
        date: DateValue,
    },
}

impl StoredTimestamp {
    /// Resolve to an absolute instant, if well formed
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Text(text) => parse_rfc3339(text),
            Self::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Extended { date } => match date {
                DateValue::Text(text) => parse_rfc3339(text),
                DateValue::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
                DateValue::NumberLong { value } => value
                    .parse::<i64>()
                    .ok()
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            },
        }
    }
}

fn parse_rfc3339(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Booth entry as exported from the entry store
///
/// Every field is optional at parse time so that a partially filled export
/// still yields the entries that can be reported on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBoothEntry {
    /// Store identifier, used for deduplication across export files
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assembly_constituency: Option<String>,
    /// Parliamentary constituency
    #[serde(default)]
    pub pc: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub booth: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub g_map_location: Option<String>,
    /// Verification status text ("Verified" / "Not Verified")
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<StoredTimestamp>,
    #[serde(default)]
    pub updated_at: Option<StoredTimestamp>,
}

impl RawBoothEntry {
    /// Deduplication key derived from the store identifier
    pub fn dedup_key(&self) -> Option<String> {
        self.id.as_ref().map(|id| id.as_str().to_string())
    }

    /// Verification status, defaulting to "Not Verified" when absent
    ///
    /// Returns `None` for an unrecognised status text.
    pub fn entry_status(&self) -> Option<EntryStatus> {
        match self.status.as_deref() {
            None => Some(EntryStatus::NotVerified),
            Some(s) if s.trim().is_empty() => Some(EntryStatus::NotVerified),
            Some(s) => s.parse().ok(),
        }
    }
}
