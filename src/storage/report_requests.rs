use chrono::{DateTime, Duration, Utc};
use redb::{ReadableTable, ReadableTableMetadata, WriteTransaction};

use super::db::{next_id, Database, DatabaseError};
use super::models::{CachedReport, ReportRequest};
use super::tables::*;
use crate::config::{PreviewConfig, MAX_RETENTION_SECONDS};

/// Age and size limits applied by [`Database::sweep_report_requests`].
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
    /// Rows older than this are always deleted.
    pub retention: Duration,
    /// Rows older than this are deleted once the cached pdf total exceeds `max_cache_size`.
    pub pressure_retention: Duration,
    pub max_cache_size: u64,
}

impl From<&PreviewConfig> for SweepPolicy {
    fn from(config: &PreviewConfig) -> Self {
        Self {
            retention: retention_window(config.retention_seconds),
            pressure_retention: retention_window(config.pressure_retention_seconds),
            max_cache_size: config.max_cache_size,
        }
    }
}

fn retention_window(seconds: u64) -> Duration {
    // Bounded so the conversion can't wrap negative.
    Duration::seconds(seconds.min(MAX_RETENTION_SECONDS) as i64)
}

/// Rows removed by a sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Removed for exceeding the retention window
    pub expired: u64,
    /// Removed because the cache was over its size ceiling
    pub evicted: u64,
}

/// A preview cache row that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewReportRequest<'a> {
    pub key: &'a str,
    pub report_definition: String,
    pub data: String,
    pub is_test_data: bool,
    pub pdf_file: Option<&'a [u8]>,
    pub created_on: DateTime<Utc>,
}

impl Database {
    // ========================================================================
    // Preview cache operations
    // ========================================================================

    /// Store a preview cache row and its rendered pdf
    pub fn insert_report_request(
        &self,
        new: NewReportRequest<'_>,
    ) -> Result<ReportRequest, DatabaseError> {
        debug_assert!(!new.key.is_empty(), "report request key must not be empty");

        let write_txn = self.begin_write()?;
        let request = {
            let request = ReportRequest {
                id: next_id(&write_txn, "report_requests")?,
                key: new.key.to_string(),
                report_definition: new.report_definition,
                data: new.data,
                is_test_data: new.is_test_data,
                pdf_file_size: new.pdf_file.map(|f| f.len() as u64).unwrap_or(0),
                created_on: new.created_on,
            };

            let mut table = write_txn.open_table(REPORT_REQUESTS)?;
            let data = rmp_serde::to_vec_named(&request)?;
            table.insert(new.key, data.as_slice())?;

            if let Some(pdf_file) = new.pdf_file {
                let mut files = write_txn.open_table(REPORT_REQUEST_FILES)?;
                files.insert(new.key, pdf_file)?;
            }
            request
        };
        write_txn.commit()?;
        Ok(request)
    }

    /// Get a preview cache row by key, with its cached pdf if one was stored
    pub fn get_report_request(&self, key: &str) -> Result<Option<CachedReport>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(REPORT_REQUESTS)?;

        let request: ReportRequest = match table.get(key)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(None),
        };

        let files = read_txn.open_table(REPORT_REQUEST_FILES)?;
        let pdf_file = files.get(key)?.map(|data| data.value().to_vec());

        Ok(Some(CachedReport { request, pdf_file }))
    }

    /// Summed size of all cached pdf files in bytes
    pub fn report_cache_size(&self) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(REPORT_REQUESTS)?;

        let mut total = 0u64;
        for result in table.iter()? {
            let (_, value) = result?;
            let request: ReportRequest = rmp_serde::from_slice(value.value())?;
            total += request.pdf_file_size;
        }
        Ok(total)
    }

    /// Number of rows currently in the preview cache
    pub fn count_report_requests(&self) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(REPORT_REQUESTS)?;
        Ok(table.len()?)
    }

    /// Delete rows older than the retention window. If the remaining pdf files
    /// still exceed the size ceiling, also delete rows older than the pressure window.
    ///
    /// Runs in a single write transaction. Concurrent inserts committed after
    /// this sweep are not accounted for, so the ceiling can be overshot briefly.
    pub fn sweep_report_requests(
        &self,
        now: DateTime<Utc>,
        policy: &SweepPolicy,
    ) -> Result<SweepStats, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut stats = SweepStats::default();

        let rows: Vec<(String, DateTime<Utc>, u64)> = {
            let table = write_txn.open_table(REPORT_REQUESTS)?;
            let mut rows = Vec::new();
            for result in table.iter()? {
                let (key, value) = result?;
                let request: ReportRequest = rmp_serde::from_slice(value.value())?;
                rows.push((
                    key.value().to_string(),
                    request.created_on,
                    request.pdf_file_size,
                ));
            }
            rows
        };

        let expire_before = now
            .checked_sub_signed(policy.retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let (expired, remaining): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .partition(|(_, created_on, _)| *created_on < expire_before);

        for (key, _, _) in &expired {
            remove_request(&write_txn, key)?;
            stats.expired += 1;
        }

        let total_size: u64 = remaining.iter().map(|(_, _, size)| size).sum();
        if total_size > policy.max_cache_size {
            let evict_before = now
                .checked_sub_signed(policy.pressure_retention)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            for (key, created_on, _) in &remaining {
                if *created_on < evict_before {
                    remove_request(&write_txn, key)?;
                    stats.evicted += 1;
                }
            }
        }

        write_txn.commit()?;
        Ok(stats)
    }
}

fn remove_request(write_txn: &WriteTransaction, key: &str) -> Result<(), DatabaseError> {
    let mut table = write_txn.open_table(REPORT_REQUESTS)?;
    table.remove(key)?;
    let mut files = write_txn.open_table(REPORT_REQUEST_FILES)?;
    files.remove(key)?;
    Ok(())
}
