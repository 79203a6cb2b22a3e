use indicatif::ProgressBar;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::importers::Record;
use crate::store::{Filter, Row, StoreError, TableStore};

/// Columns every uploaded row must carry, in table order
pub const EXPECTED_COLUMNS: [&str; 6] = ["year", "month", "class", "region", "value", "small_trade"];

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Error types for upload operations
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// `row` is 1-based, matching the row ranges in `Batch`
    #[error("Row {row} is missing expected columns: {missing:?}")]
    SchemaMismatch { row: usize, missing: Vec<String> },

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Batch {batch_index} (rows {first_row}-{last_row}) failed: {source}")]
    Batch {
        batch_index: usize,
        first_row: usize,
        last_row: usize,
        #[source]
        source: StoreError,
    },
}

/// How rows are sent to the store. The two modes never combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Every row, one insert call per contiguous chunk
    Batched { batch_size: usize },
    /// Only the first `n` rows, in a single insert call
    TestRows(usize),
}

impl Default for UploadMode {
    fn default() -> Self {
        UploadMode::Batched {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub rows_uploaded: usize,
    pub batches: usize,
}

/// Convert a record into a store row; a missing value becomes an explicit null
pub fn record_to_row(record: &Record) -> Row {
    let value = record
        .value
        .filter(|v| v.is_finite())
        .map_or(Value::Null, Value::from);

    let mut row = Map::new();
    row.insert("year".to_string(), Value::from(record.year));
    row.insert("month".to_string(), Value::from(record.month));
    row.insert("class".to_string(), Value::from(record.class.as_str()));
    row.insert("region".to_string(), Value::from(record.region.as_str()));
    row.insert("value".to_string(), value);
    row.insert("small_trade".to_string(), Value::from(record.small_trade));
    row
}

/// Check every row carries the expected columns and drop any others.
/// Fails on the first row with missing columns.
pub fn prepare_rows(rows: Vec<Row>) -> Result<Vec<Row>, UploadError> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, mut row)| {
            let missing: Vec<String> = EXPECTED_COLUMNS
                .iter()
                .filter(|col| !row.contains_key(**col))
                .map(|col| col.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(UploadError::SchemaMismatch {
                    row: idx + 1,
                    missing,
                });
            }

            let mut prepared = Map::new();
            for col in EXPECTED_COLUMNS {
                let value = row.remove(col).unwrap_or(Value::Null);
                prepared.insert(col.to_string(), value);
            }
            Ok(prepared)
        })
        .collect()
}

/// Loads extracted records into a remote table
pub struct UploadService<S> {
    store: S,
    progress: ProgressBar,
}

impl<S: TableStore> UploadService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report batch progress on `progress` (its length is set per upload)
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn upload_records(
        &self,
        table: &str,
        records: &[Record],
        mode: UploadMode,
    ) -> Result<UploadSummary, UploadError> {
        let rows = records.iter().map(record_to_row).collect();
        self.upload_rows(table, rows, mode).await
    }

    /// Upload rows in order.
    ///
    /// The schema is checked before any network call. In batched mode the first
    /// failing insert aborts the upload; batches already sent stay in the table.
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    pub async fn upload_rows(
        &self,
        table: &str,
        rows: Vec<Row>,
        mode: UploadMode,
    ) -> Result<UploadSummary, UploadError> {
        let rows = prepare_rows(rows)?;

        match mode {
            UploadMode::TestRows(n) => {
                let count = n.min(rows.len());
                info!("Uploading {} test rows to table '{}'", count, table);
                self.progress.set_length(count as u64);
                self.progress.set_position(0);
                if let Err(e) = self.send_batch(table, &rows[..count], 1, 0).await {
                    self.progress.abandon_with_message("test upload aborted");
                    return Err(e);
                }
                self.progress.inc(count as u64);
                self.progress
                    .finish_with_message(format!("✓ Uploaded {count} test rows"));
                info!("Test upload complete");
                Ok(UploadSummary {
                    rows_uploaded: count,
                    batches: 1,
                })
            }
            UploadMode::Batched { batch_size } => {
                if batch_size == 0 {
                    return Err(UploadError::InvalidBatchSize);
                }
                self.upload_batched(table, &rows, batch_size).await
            }
        }
    }

    async fn upload_batched(
        &self,
        table: &str,
        rows: &[Row],
        batch_size: usize,
    ) -> Result<UploadSummary, UploadError> {
        let start_time = Instant::now();
        let total = rows.len();
        info!(
            "Uploading all {} rows to '{}' in batches of {}",
            total, table, batch_size
        );
        self.progress.set_length(total as u64);
        self.progress.set_position(0);

        let mut batches = 0;
        for (idx, batch) in rows.chunks(batch_size).enumerate() {
            let offset = idx * batch_size;
            if let Err(e) = self.send_batch(table, batch, idx + 1, offset).await {
                self.progress.abandon_with_message("upload aborted");
                return Err(e);
            }
            batches += 1;
            self.progress.inc(batch.len() as u64);
            info!("Uploaded rows {} to {}", offset + 1, offset + batch.len());
        }

        self.progress
            .finish_with_message(format!("✓ Uploaded {total} rows"));
        info!(
            "All {} rows uploaded in {} batches ({:.2}s)",
            total,
            batches,
            start_time.elapsed().as_secs_f64()
        );
        Ok(UploadSummary {
            rows_uploaded: total,
            batches,
        })
    }

    async fn send_batch(
        &self,
        table: &str,
        batch: &[Row],
        batch_index: usize,
        offset: usize,
    ) -> Result<(), UploadError> {
        self.store.insert(table, batch).await.map_err(|source| {
            let first_row = offset + 1;
            let last_row = offset + batch.len();
            error!(
                "Batch {} (rows {}-{}) failed: {}",
                batch_index, first_row, last_row, source
            );
            UploadError::Batch {
                batch_index,
                first_row,
                last_row,
                source,
            }
        })
    }

    /// Delete every row of `table` (all rows have a positive year)
    #[instrument(skip(self))]
    pub async fn clear_table(&self, table: &str) -> Result<usize, StoreError> {
        warn!("Deleting all rows from table '{}'", table);
        let deleted = self.store.delete(table, &Filter::gt("year", 0)).await?;
        info!("{} rows deleted from '{}'", deleted, table);
        Ok(deleted)
    }
}
