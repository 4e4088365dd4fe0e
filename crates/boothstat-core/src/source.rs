//! Record source trait
//!
//! The report engine never reads storage itself. A `RecordSource` is the
//! collaborator that fetches the records relevant to a window; the engine then
//! works on the materialized collection synchronously.

use crate::calendar::CalendarWindow;
use crate::error::Result;
use crate::types::Record;
use async_trait::async_trait;

/// Trait for anything that can supply records for a report window.
///
/// Implementations should scope their results to
/// `[window.range_start(), window.range_end_exclusive())`. Records outside
/// that range are tolerated by the aggregator but are wasted work.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every record that may fall inside `window`.
    async fn fetch(&self, window: &CalendarWindow) -> Result<Vec<Record>>;
}

/// In-memory source over a fixed set of records
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<Record>,
}

impl StaticSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch(&self, window: &CalendarWindow) -> Result<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .filter(|record| window.contains(&record.occurred_at))
            .cloned()
            .collect())
    }
}
