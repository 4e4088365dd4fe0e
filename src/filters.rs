//! Filtering module for booth entries
//!
//! This module scopes raw entries by filer email, ward, booth and
//! verification status before they are converted into report records.
//!
//! # Examples
//!
//! ```
//! use boothstat::filters::EntryFilter;
//! use boothstat_core::types::EntryStatus;
//!
//! let filter = EntryFilter::new()
//!     .with_ward("Ward 184")
//!     .with_status(EntryStatus::Verified);
//! assert!(!filter.is_empty());
//! ```

use boothstat_core::error::Result;
use boothstat_core::types::{EntryStatus, RawBoothEntry, normalize_identity};

/// Normalize a ward designation so `"Ward 184"`, `"w184"` and `"184"` compare equal
///
/// # Example
///
/// ```
/// use boothstat::filters::normalize_ward;
///
/// assert_eq!(normalize_ward("Ward 184"), "184");
/// assert_eq!(normalize_ward(" W184 "), "184");
/// assert_eq!(normalize_ward("184"), "184");
/// ```
pub fn normalize_ward(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let rest = lowered.strip_prefix("ward").unwrap_or(&lowered).trim_start();
    let rest = rest.strip_prefix('w').unwrap_or(rest);
    rest.trim().to_string()
}

/// Filter configuration for booth entries
///
/// All filters are optional and can be combined; an entry must satisfy every
/// configured filter. A filter on a field the entry lacks never matches.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    /// Filer email, normalized
    pub email: Option<String>,
    /// Ward, normalized with [`normalize_ward`]
    pub ward: Option<String>,
    /// Booth identifier, trimmed
    pub booth: Option<String>,
    /// Verification status
    pub status: Option<EntryStatus>,
}

impl EntryFilter {
    /// Create a new filter with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the email filter
    pub fn with_email(mut self, email: impl AsRef<str>) -> Self {
        self.email = Some(normalize_identity(email.as_ref()));
        self
    }

    /// Set the ward filter
    pub fn with_ward(mut self, ward: impl AsRef<str>) -> Self {
        self.ward = Some(normalize_ward(ward.as_ref()));
        self
    }

    /// Set the booth filter
    pub fn with_booth(mut self, booth: impl AsRef<str>) -> Self {
        self.booth = Some(booth.as_ref().trim().to_string());
        self
    }

    /// Set the status filter
    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether no restriction is configured
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.ward.is_none() && self.booth.is_none() && self.status.is_none()
    }

    /// Check if an entry passes the filter
    pub fn matches(&self, entry: &RawBoothEntry) -> bool {
        if let Some(email) = &self.email {
            match &entry.email {
                Some(entry_email) if normalize_identity(entry_email) == *email => {}
                _ => return false,
            }
        }

        if let Some(ward) = &self.ward {
            match &entry.ward {
                Some(entry_ward) if normalize_ward(entry_ward) == *ward => {}
                _ => return false,
            }
        }

        if let Some(booth) = &self.booth {
            match &entry.booth {
                Some(entry_booth) if entry_booth.trim() == booth => {}
                _ => return false,
            }
        }

        if let Some(status) = self.status
            && entry.entry_status() != Some(status)
        {
            return false;
        }

        true
    }

    /// Filter a stream of entries
    ///
    /// Applies the configured filters to a stream of raw entries, returning
    /// only those that match all criteria. Errors pass through untouched.
    pub fn filter_stream<S>(self, stream: S) -> impl futures::Stream<Item = Result<RawBoothEntry>>
    where
        S: futures::Stream<Item = Result<RawBoothEntry>>,
    {
        use futures::StreamExt;

        stream.filter_map(move |result| {
            let keep = match &result {
                Ok(entry) => self.matches(entry),
                Err(_) => true,
            };
            async move { keep.then_some(result) }
        })
    }
}
