use calamine::{open_workbook, Reader, Xls};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, trace};

use super::grid::{Cell, CellGrid};
use super::layout::{PropertyClass, Region, SeriesLabel, SheetLayout};

/// Placeholder the statistics tables use for "definitionally zero"
const ZERO_PLACEHOLDER: &str = "-";

#[derive(Error, Debug)]
pub enum XlsImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Workbook contains no worksheets")]
    NoWorksheet,

    #[error("Failed to read worksheet: {0}")]
    WorksheetRead(String),
}

/// One monthly figure for one (class, region) series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub year: i32,
    pub month: i32,
    pub class: PropertyClass,
    pub region: Region,
    /// `None` when the value cell was empty; uploaded as null
    pub value: Option<f64>,
    pub small_trade: bool,
}

/// Replace blank cells in `col` with the last non-blank value above them.
///
/// Period labels in the sheet are merged cells, so only the first row of each
/// year/month carries a value. Blanks above the first value stay blank.
pub fn forward_fill(grid: &mut CellGrid, col: usize) {
    let mut last: Option<Cell> = None;
    for row in 0..grid.height() {
        let cell = grid.get(row, col);
        if cell.is_blank() {
            if let Some(filled) = &last {
                grid.set(row, col, filled.clone());
            }
        } else {
            last = Some(cell.clone());
        }
    }
}

/// Extract every series record from a worksheet grid.
///
/// Malformed input never fails the extraction: a row whose year/month cannot be
/// resolved is skipped whole, and a series whose value cell is not numeric is
/// skipped for that row only.
#[instrument(skip_all, fields(rows = grid.height(), cols = grid.width()))]
pub fn extract(mut grid: CellGrid, layout: &SheetLayout) -> Vec<Record> {
    forward_fill(&mut grid, layout.year_col);
    forward_fill(&mut grid, layout.month_col);

    let mut records = Vec::new();
    let mut skipped_rows = 0;
    let mut skipped_cells = 0;

    for row_idx in layout.data_start_row..grid.height() {
        let Some((year, month)) = parse_period(&grid, row_idx, layout) else {
            debug!("No resolvable period at row {}, skipping", row_idx);
            skipped_rows += 1;
            continue;
        };

        for label in layout.labels {
            match parse_series_cell(&grid, row_idx, label) {
                Some((value, small_trade)) => records.push(Record {
                    year,
                    month,
                    class: label.class,
                    region: label.region,
                    value,
                    small_trade,
                }),
                None => {
                    trace!(
                        "Unparseable value at row {}, col {} ({} {})",
                        row_idx,
                        label.value_col,
                        label.class,
                        label.region
                    );
                    skipped_cells += 1;
                }
            }
        }
    }

    info!(
        "Extracted {} records ({} rows without a period, {} unparseable cells)",
        records.len(),
        skipped_rows,
        skipped_cells
    );
    records
}

fn parse_period(grid: &CellGrid, row: usize, layout: &SheetLayout) -> Option<(i32, i32)> {
    let year = grid.get(row, layout.year_col).as_i32()?;
    let month = grid.get(row, layout.month_col).as_i32()?;
    Some((year, month))
}

/// Returns (value, small_trade), or `None` when the value cell is not numeric
fn parse_series_cell(
    grid: &CellGrid,
    row: usize,
    label: &SeriesLabel,
) -> Option<(Option<f64>, bool)> {
    let value_cell = grid.get(row, label.value_col);
    if value_cell.trimmed_text() == ZERO_PLACEHOLDER {
        return Some((Some(0.0), false));
    }

    let value = match value_cell {
        Cell::Empty => None,
        other => Some(other.as_f64()?),
    };

    let left = grid.get(row, label.left_marker_col).trimmed_text();
    let right = grid.get(row, label.right_marker_col).trimmed_text();
    Some((value, left == "(" && right == ")"))
}

/// Reader for the legacy BIFF (.xls) price/rent workbook
pub struct XlsImporter {
    workbook_path: PathBuf,
}

impl XlsImporter {
    pub fn new(workbook_path: impl Into<PathBuf>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.workbook_path
    }

    /// Load the first worksheet into a grid.
    ///
    /// Synchronous; async callers should wrap this in `spawn_blocking`.
    pub fn read_grid(&self) -> Result<CellGrid, XlsImportError> {
        let mut workbook: Xls<BufReader<File>> = match open_workbook(&self.workbook_path) {
            Ok(wb) => wb,
            Err(e) => return Err(XlsImportError::WorkbookOpen(e.to_string())),
        };

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(XlsImportError::NoWorksheet)?
            .map_err(|e| XlsImportError::WorksheetRead(e.to_string()))?;

        let grid = CellGrid::from_range(&range);
        debug!(
            "Loaded {} rows x {} columns from {:?}",
            grid.height(),
            grid.width(),
            self.workbook_path
        );
        Ok(grid)
    }

    /// Read the workbook and extract all records using `layout`
    pub fn parse(&self, layout: &SheetLayout) -> Result<Vec<Record>, XlsImportError> {
        info!("Parsing workbook: {:?}", self.workbook_path);
        let grid = self.read_grid()?;
        Ok(extract(grid, layout))
    }
}
