//! Data loader module for discovering and parsing booth entry exports
//!
//! This module finds entry export files, streams the raw entries out of them,
//! removes duplicates across files and turns the surviving entries into report
//! records scoped to a calendar window.
//!
//! # File formats
//!
//! - `.jsonl`: one entry per line. Blank and malformed lines are skipped.
//! - `.json`: a JSON array of entries, or a single entry object.
//!
//! Entries may use the store's extended JSON (`{"$oid": ...}` identifiers and
//! `{"$date": ...}` timestamps) or plain strings.
//!
//! # Data location
//!
//! Paths come from the caller, else the `BOOTHSTAT_DATA_PATH` environment
//! variable (comma-separated), else `<data dir>/boothstat`. Each path may be a
//! file or a directory, which is searched recursively.
//!
//! # Examples
//!
//! ```no_run
//! use boothstat::data_loader::DataLoader;
//! use boothstat_core::{CalendarOffset, CalendarWindow};
//!
//! # async fn example() -> boothstat_core::Result<()> {
//! let loader = DataLoader::new(Vec::new()).await?;
//! let window = CalendarWindow::compute("2024-03-10", 7, CalendarOffset::default())?;
//!
//! let records = loader.load_records(&window).await?;
//! println!("{} records in window", records.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use boothstat_core::calendar::CalendarWindow;
use boothstat_core::error::{BoothstatError, Result};
use boothstat_core::source::RecordSource;
use boothstat_core::types::{RawBoothEntry, Record};
use futures::StreamExt;
use futures::stream::Stream;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, trace, warn};

use crate::filters::EntryFilter;

/// Environment variable listing entry export paths
pub const DATA_PATH_ENV: &str = "BOOTHSTAT_DATA_PATH";

/// Directory under the platform data dir searched by default
pub const DEFAULT_DATA_DIR: &str = "boothstat";

/// A `.json` export: either an array of entries or one entry
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonExport {
    Many(Vec<RawBoothEntry>),
    One(Box<RawBoothEntry>),
}

/// Data loader for discovering and streaming entry export files
///
/// The DataLoader finds export files under its configured paths and provides
/// streaming access to the entries they contain.
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Files or directories to search
    data_paths: Vec<PathBuf>,
    /// Scoping applied to raw entries before conversion
    filter: EntryFilter,
    /// Whether to show a progress bar
    show_progress: bool,
}

impl DataLoader {
    /// Create a new DataLoader from explicit paths, falling back to discovery
    ///
    /// # Errors
    ///
    /// Returns `NoDataFiles` if none of the resolved paths exists
    pub async fn new(explicit: Vec<PathBuf>) -> Result<Self> {
        let candidates = Self::resolve_paths(
            explicit,
            std::env::var(DATA_PATH_ENV).ok(),
            dirs::data_dir(),
        );

        let mut paths = Vec::new();
        for path in &candidates {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                paths.push(path.clone());
            } else {
                warn!("Data path {} does not exist", path.display());
            }
        }

        if paths.is_empty() {
            return Err(BoothstatError::NoDataFiles(Self::describe(&candidates)));
        }

        debug!("Using {} data paths", paths.len());
        Ok(Self::with_paths(paths))
    }

    /// Create a DataLoader over exactly these paths, without discovery
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            data_paths: paths,
            filter: EntryFilter::default(),
            show_progress: false,
        }
    }

    /// Resolve the paths to search
    ///
    /// Explicit paths win, then the comma-separated environment value, then
    /// `<data_dir>/boothstat`.
    pub fn resolve_paths(
        explicit: Vec<PathBuf>,
        env_value: Option<String>,
        data_dir: Option<PathBuf>,
    ) -> Vec<PathBuf> {
        if !explicit.is_empty() {
            return explicit;
        }

        if let Some(value) = env_value {
            let from_env: Vec<PathBuf> = value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(PathBuf::from)
                .collect();
            if !from_env.is_empty() {
                return from_env;
            }
        }

        data_dir
            .map(|dir| vec![dir.join(DEFAULT_DATA_DIR)])
            .unwrap_or_default()
    }

    fn describe(paths: &[PathBuf]) -> String {
        if paths.is_empty() {
            return "(no data directory)".to_string();
        }
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Scope loaded entries with a filter
    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn is_entry_file(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("json") | Some("jsonl")
        )
    }

    /// Find all entry files under the configured paths
    ///
    /// Directories are searched recursively. The result is sorted so that
    /// deduplication keeps the same copy of an entry on every run.
    ///
    /// # Errors
    ///
    /// Returns `NoDataFiles` when no `.json` or `.jsonl` file is found
    pub async fn find_entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut entry_files = Vec::new();

        for base_path in &self.data_paths {
            let path_clone = base_path.clone();
            let files = tokio::task::spawn_blocking(move || {
                use walkdir::WalkDir;
                let mut files = Vec::new();

                for entry in WalkDir::new(path_clone).into_iter().filter_map(|e| e.ok()) {
                    let path = entry.path();
                    if entry.file_type().is_file() && Self::is_entry_file(path) {
                        files.push(path.to_path_buf());
                    }
                }
                files
            })
            .await
            .map_err(|e| BoothstatError::Io(std::io::Error::other(e.to_string())))?;

            entry_files.extend(files);
        }

        entry_files.sort();
        entry_files.dedup();

        if entry_files.is_empty() {
            return Err(BoothstatError::NoDataFiles(Self::describe(&self.data_paths)));
        }

        info!("Found {} entry files to process", entry_files.len());
        Ok(entry_files)
    }

    fn progress_bar(&self, files: usize) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(files as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} files")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Loading entries");
        Some(pb)
    }

    /// Load raw entries from every file as an async stream
    ///
    /// Entries sharing an `_id` with an earlier entry are dropped. Unreadable
    /// files and unparseable `.json` files are yielded as errors.
    pub fn load_raw_entries(&self) -> impl Stream<Item = Result<RawBoothEntry>> + '_ {
        async_stream::stream! {
            let files = match self.find_entry_files().await {
                Ok(files) => files,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let progress = self.progress_bar(files.len());
            let mut seen_entries = HashSet::new();
            let mut total_duplicates = 0usize;

            for (idx, file_path) in files.into_iter().enumerate() {
                if let Some(ref pb) = progress {
                    pb.set_position(idx as u64);
                }

                let entries = Self::parse_file(file_path, &mut seen_entries);
                tokio::pin!(entries);
                while let Some(result) = entries.next().await {
                    match result {
                        Err(BoothstatError::DuplicateEntry) => total_duplicates += 1,
                        other => {
                            yield other;
                        }
                    }
                }
            }

            if total_duplicates > 0 {
                info!("Skipped {} duplicate entries", total_duplicates);
            }

            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
        }
    }

    /// Admit an entry unless its identifier was already seen
    fn admit(raw: RawBoothEntry, seen_entries: &mut HashSet<String>) -> Result<RawBoothEntry> {
        if let Some(dedup_key) = raw.dedup_key()
            && !seen_entries.insert(dedup_key.clone())
        {
            trace!("Skipping duplicate entry with key: {}", dedup_key);
            return Err(BoothstatError::DuplicateEntry);
        }
        Ok(raw)
    }

    /// Parse one file as a stream, choosing the format by extension
    fn parse_file(
        path: PathBuf,
        seen_entries: &mut HashSet<String>,
    ) -> impl Stream<Item = Result<RawBoothEntry>> + '_ {
        async_stream::stream! {
            if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                let entries = Self::parse_jsonl_stream(path);
                tokio::pin!(entries);
                while let Some(raw) = entries.next().await {
                    yield Self::admit(raw, seen_entries);
                }
            } else {
                match Self::parse_json_file(&path).await {
                    Ok(entries) => {
                        for raw in entries {
                            yield Self::admit(raw, seen_entries);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                    }
                }
            }
        }
    }

    /// Parse a single JSONL file as a stream
    fn parse_jsonl_stream(path: PathBuf) -> impl Stream<Item = RawBoothEntry> {
        async_stream::stream! {
            let file = match tokio::fs::File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    warn!("Failed to open {}: {}", path.display(), e);
                    return;
                }
            };

            let reader = BufReader::new(file);
            let mut lines = reader.lines();
            let mut line_number = 0;
            let mut malformed = 0;

            while let Ok(Some(line)) = lines.next_line().await {
                line_number += 1;

                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<RawBoothEntry>(&line) {
                    Ok(raw) => yield raw,
                    Err(e) => {
                        malformed += 1;
                        trace!(
                            "Skipping malformed entry at line {} in {}: {}",
                            line_number,
                            path.display(),
                            e
                        );
                    }
                }
            }

            if malformed > 0 {
                debug!("Skipped {} malformed lines in {}", malformed, path.display());
            }
        }
    }

    /// Parse a whole `.json` export
    async fn parse_json_file(path: &Path) -> Result<Vec<RawBoothEntry>> {
        let content = tokio::fs::read_to_string(path).await?;
        match serde_json::from_str::<JsonExport>(&content) {
            Ok(JsonExport::Many(entries)) => Ok(entries),
            Ok(JsonExport::One(entry)) => Ok(vec![*entry]),
            Err(e) => Err(BoothstatError::Parse {
                file: path.to_path_buf(),
                error: e.to_string(),
            }),
        }
    }

    /// Load the records that fall inside `window`
    ///
    /// Entries are deduplicated, filtered, converted and range-scoped. Entries
    /// without a usable `createdAt` are dropped.
    pub async fn load_records(&self, window: &CalendarWindow) -> Result<Vec<Record>> {
        let entries = self.filter.clone().filter_stream(self.load_raw_entries());
        tokio::pin!(entries);

        let mut records = Vec::new();
        let mut undated = 0usize;
        let mut out_of_window = 0usize;

        while let Some(result) = entries.next().await {
            let raw = result?;
            match Record::from_raw(&raw) {
                Some(record) if window.contains(&record.occurred_at) => records.push(record),
                Some(_) => out_of_window += 1,
                None => undated += 1,
            }
        }

        if undated > 0 {
            debug!("Dropped {} entries without a usable createdAt", undated);
        }
        debug!("Dropped {} entries outside the report window", out_of_window);
        info!("Loaded {} records for {}..{}", records.len(), window.first_day(), window.last_day());
        Ok(records)
    }

    /// Get the configured data paths
    pub fn paths(&self) -> &[PathBuf] {
        &self.data_paths
    }
}

#[async_trait]
impl RecordSource for DataLoader {
    async fn fetch(&self, window: &CalendarWindow) -> Result<Vec<Record>> {
        self.load_records(window).await
    }
}
