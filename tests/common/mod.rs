//! Common test utilities and helpers for boothstat tests
//!
//! This module provides reusable builders for records and raw export lines,
//! plus helpers that lay out export files in a temporary directory.

#![allow(dead_code)]

use boothstat::data_loader::DataLoader;
use boothstat_core::types::Record;
use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use tempfile::TempDir;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Common test filers
pub const TEST_USERS: &[(&str, &str)] = &[
    ("asha@example.com", "Asha"),
    ("bala@example.com", "Bala"),
    ("chitra@example.com", "Chitra"),
    ("dev@example.com", "Dev"),
];

/// Builder for test entries, as records or as raw export lines
pub struct EntryBuilder {
    id: Option<String>,
    email: String,
    name: String,
    ward: Option<String>,
    booth: Option<String>,
    status: Option<String>,
    created_at: Option<DateTime<Utc>>,
    extended_json: bool,
}

impl EntryBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            id: None,
            email: TEST_USERS[0].0.to_string(),
            name: TEST_USERS[0].1.to_string(),
            ward: None,
            booth: None,
            status: None,
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap()),
            extended_json: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_user(mut self, email: &str, name: &str) -> Self {
        self.email = email.to_string();
        self.name = name.to_string();
        self
    }

    /// Timestamp given in UTC
    pub fn at(mut self, year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        self.created_at = Some(Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap());
        self
    }

    pub fn at_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.created_at = Some(instant);
        self
    }

    pub fn without_timestamp(mut self) -> Self {
        self.created_at = None;
        self
    }

    pub fn with_ward(mut self, ward: &str) -> Self {
        self.ward = Some(ward.to_string());
        self
    }

    pub fn with_booth(mut self, booth: &str) -> Self {
        self.booth = Some(booth.to_string());
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    /// Emit `{"$oid": ...}` / `{"$date": ...}` wrappers like a store export
    pub fn extended_json(mut self) -> Self {
        self.extended_json = true;
        self
    }

    /// Build the Record
    pub fn build(self) -> Record {
        let created_at = self
            .created_at
            .unwrap_or_else(|| Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap());
        Record::new(&self.email, self.name, created_at)
    }

    /// Build as a JSONL line
    #[allow(clippy::wrong_self_convention)]
    pub fn to_jsonl(self) -> String {
        let mut object = serde_json::Map::new();
        if let Some(id) = self.id {
            let value = if self.extended_json {
                serde_json::json!({ "$oid": id })
            } else {
                serde_json::json!(id)
            };
            object.insert("_id".to_string(), value);
        }
        object.insert("email".to_string(), self.email.into());
        object.insert("name".to_string(), self.name.into());
        if let Some(ward) = self.ward {
            object.insert("ward".to_string(), ward.into());
        }
        if let Some(booth) = self.booth {
            object.insert("booth".to_string(), booth.into());
        }
        if let Some(status) = self.status {
            object.insert("status".to_string(), status.into());
        }
        if let Some(created_at) = self.created_at {
            let value = if self.extended_json {
                serde_json::json!({ "$date": created_at.timestamp_millis() })
            } else {
                serde_json::json!(created_at.to_rfc3339())
            };
            object.insert("createdAt".to_string(), value);
        }
        serde_json::Value::Object(object).to_string()
    }
}

/// Helper to create a test data directory with one JSONL file
pub async fn create_test_data_dir(entries: Vec<String>) -> (TempDir, DataLoader) {
    let temp_dir = TempDir::new().unwrap();
    write_jsonl(&temp_dir, "entries.jsonl", &entries).await;
    let loader = DataLoader::with_paths(vec![temp_dir.path().to_path_buf()]);
    (temp_dir, loader)
}

/// Write JSONL lines into `name` under `dir`
pub async fn write_jsonl(dir: &TempDir, name: &str, entries: &[String]) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.unwrap();
    }
    let mut file = fs::File::create(&path).await.unwrap();
    for entry in entries {
        file.write_all(entry.as_bytes()).await.unwrap();
        file.write_all(b"\n").await.unwrap();
    }
    file.flush().await.unwrap();
}

/// Generate entries for every day in a range, `per_user_per_day` for each test user
///
/// Timestamps fall at 04:30 UTC plus one minute per entry, i.e. 10:00 at +05:30.
pub fn generate_date_range_data(
    start_date: NaiveDate,
    end_date: NaiveDate,
    per_user_per_day: usize,
) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current_date = start_date;
    let mut serial = 0;

    while current_date <= end_date {
        let base = Utc.from_utc_datetime(&current_date.and_hms_opt(4, 30, 0).unwrap());
        for (email, name) in TEST_USERS {
            for n in 0..per_user_per_day {
                serial += 1;
                entries.push(
                    EntryBuilder::new()
                        .with_id(&format!("entry-{serial}"))
                        .with_user(email, name)
                        .at_instant(base + TimeDelta::minutes(n as i64))
                        .to_jsonl(),
                );
            }
        }

        match current_date.succ_opt() {
            Some(next) => current_date = next,
            None => break,
        }
    }

    entries
}
