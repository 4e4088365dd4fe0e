//! Error types for boothstat
//!
//! This module defines the error types used throughout the boothstat workspace.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use boothstat_core::error::{BoothstatError, Result};
//!
//! fn checked_days(days: i64) -> Result<u32> {
//!     if days <= 0 {
//!         return Err(BoothstatError::InvalidWindowSize(days));
//!     }
//!     Ok(days as u32)
//! }
//!
//! assert!(checked_days(0).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for boothstat operations
///
/// The three `Invalid*` input variants are the failures the report engine
/// itself can produce; they are all raised before any aggregation starts.
/// The remaining variants belong to the record-source and CLI layers.
#[derive(Error, Debug)]
pub enum BoothstatError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Window size was zero or negative
    #[error("Invalid window size: {0} (must be a positive number of days)")]
    InvalidWindowSize(i64),

    /// Quota target was zero or negative
    #[error("Invalid quota target: {0} (must be a positive daily count)")]
    InvalidQuotaTarget(i64),

    /// Day key could not be parsed as a calendar day
    #[error("Invalid day key: '{0}'. Use format YYYY-MM-DD")]
    InvalidDayKey(String),

    /// UTC offset could not be parsed or is out of range
    #[error("Invalid UTC offset: {0}")]
    InvalidOffset(String),

    /// No entry files were found under the configured paths
    #[error("No booth entry files found under {0}")]
    NoDataFiles(String),

    /// Parse error with file context
    #[error("Parse error in {file}: {error}")]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Duplicate entry found
    #[error("Duplicate entry")]
    DuplicateEntry,
}

impl BoothstatError {
    /// Stable machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::InvalidWindowSize(_) => "invalid_window_size",
            Self::InvalidQuotaTarget(_) => "invalid_quota_target",
            Self::InvalidDayKey(_) => "invalid_day_key",
            Self::InvalidOffset(_) => "invalid_offset",
            Self::NoDataFiles(_) => "no_data_files",
            Self::Parse { .. } => "parse",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::DuplicateEntry => "duplicate_entry",
        }
    }

    /// Whether this is one of the engine's input-validation failures
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidWindowSize(_) | Self::InvalidQuotaTarget(_) | Self::InvalidDayKey(_)
        )
    }
}

/// Convenience type alias for Results in boothstat
pub type Result<T> = std::result::Result<T, BoothstatError>;
