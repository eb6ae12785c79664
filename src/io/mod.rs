//! CSV boundary parser producing [`RawTable`] values.
//!
//! This is the only way untyped upload data enters the core: the reader
//! validates the rectangular shape up front, and everything downstream works
//! with typed tables.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::table::RawTable;

/// Read a CSV file into a `RawTable`, keeping every cell as text.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let file = std::fs::File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {}", path.as_ref().display()))?;
    read_csv_from_reader(file)
}

/// Read CSV data from any reader (e.g. an in-memory upload buffer).
pub fn read_csv_from_reader<R: Read>(reader: R) -> Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let mut table = RawTable::new(columns);
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse CSV record {}", row_idx))?;
        let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        table
            .push_row(cells)
            .with_context(|| format!("CSV record {} has the wrong field count", row_idx))?;
    }

    Ok(table)
}
