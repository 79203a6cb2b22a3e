// ! Historical price/rent workbook importers

pub mod grid;
pub mod layout;
pub mod xls_importer;

// Re-export commonly used items
pub use grid::{Cell, CellGrid};
pub use layout::{PropertyClass, Region, SeriesLabel, SheetLayout, SERIES_LABELS};
pub use xls_importer::{extract, forward_fill, Record, XlsImportError, XlsImporter};
