use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use tracing::{debug, instrument, warn};

use super::MonthlyTable;
use crate::error::{PipelineError, Result};

/// Previous contents of a monthly CSV; a missing file is an empty table.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_existing(path: impl AsRef<Path>) -> Result<MonthlyTable> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("no monthly CSV yet");
        return Ok(MonthlyTable::default());
    }
    let parse_err = |e| PipelineError::ParseError {
        path: path.to_path_buf(),
        source: e,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(parse_err)?;
    let mut columns: Vec<String> = rdr
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let header_width = columns.len();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(parse_err)?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() > header_width {
            // data rows are numbered from 1, below the header line
            warn!(
                row = rows.len() + 1,
                cells = row.len(),
                header = header_width,
                "row wider than header; keeping extra cells under blank headers"
            );
        }
        rows.push(row);
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(header_width);
    columns.resize(width, String::new());
    for row in &mut rows {
        row.resize(width, String::new());
    }

    debug!(columns = width, rows = rows.len(), "loaded monthly CSV");
    Ok(MonthlyTable::new(columns, rows))
}

/// Overwrite `path` with `table`, header first.
#[instrument(level = "debug", skip(path, table), fields(path = %path.as_ref().display()))]
pub fn write(path: impl AsRef<Path>, table: &MonthlyTable) -> Result<()> {
    let path = path.as_ref();
    let write_err = |e| PipelineError::CsvWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let mut w = WriterBuilder::new()
        .flexible(false)
        .from_path(path)
        .map_err(write_err)?;
    w.write_record(&table.columns).map_err(write_err)?;
    for row in &table.rows {
        w.write_record(row).map_err(write_err)?;
    }
    w.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}
