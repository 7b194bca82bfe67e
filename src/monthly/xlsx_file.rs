use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, FormatBorder, Workbook, XlsxError};
use std::path::Path;
use tracing::{debug, instrument};

use super::MonthlyTable;
use crate::error::{PipelineError, Result};
use crate::process::utils::looks_numeric;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First worksheet of an existing monthly workbook; missing file is an empty table.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_existing(path: impl AsRef<Path>) -> Result<MonthlyTable> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("no monthly spreadsheet yet");
        return Ok(MonthlyTable::default());
    }
    let read_err = |e| PipelineError::SpreadsheetRead {
        path: path.to_path_buf(),
        source: e,
    };

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(read_err)?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(MonthlyTable::default());
    };
    let range = range.map_err(read_err)?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_text).collect(),
        None => return Ok(MonthlyTable::default()),
    };
    let rows: Vec<Vec<String>> = rows
        .map(|r| r.iter().map(cell_text).collect())
        .collect();

    debug!(columns = columns.len(), rows = rows.len(), "loaded monthly spreadsheet");
    Ok(MonthlyTable::new(columns, rows))
}

fn write_workbook(path: &Path, table: &MonthlyTable) -> std::result::Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let sheet = workbook.add_worksheet();

    for (c, name) in table.columns.iter().enumerate() {
        let c = u16::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)?;
        sheet.write_string_with_format(0, c, name, &header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let r = u32::try_from(r + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let c = u16::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)?;
            match looks_numeric(value) {
                Some(n) => sheet.write_number(r, c, n)?,
                None => sheet.write_string(r, c, value)?,
            };
        }
    }

    workbook.save(path)
}

/// Overwrite `path` with `table` as a single-sheet workbook.
#[instrument(level = "debug", skip(path, table), fields(path = %path.as_ref().display()))]
pub fn write(path: impl AsRef<Path>, table: &MonthlyTable) -> Result<()> {
    let path = path.as_ref();
    write_workbook(path, table).map_err(|e| PipelineError::Spreadsheet {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monthly::RUN_SEPARATOR;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn write_then_load_round_trips_cells() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("0425.xlsx");
        let table = MonthlyTable::new(
            vec!["DATE".into(), "Symbol".into(), "CLOSE_PRICE".into()],
            vec![
                vec![String::new(); 3],
                vec![RUN_SEPARATOR.to_string(); 3],
                vec![String::new(); 3],
                vec!["25/04/25".into(), "RELIANCE".into(), "1310.55".into()],
                vec!["25/04/25".into(), "NIFTY".into(), "24039".into()],
            ],
        );
        write(&path, &table)?;

        let loaded = load_existing(&path)?;
        assert_eq!(loaded, table);
        Ok(())
    }

    #[test]
    fn missing_workbook_is_empty_table() -> Result<()> {
        let tmp = tempdir()?;
        assert!(load_existing(tmp.path().join("0125.xlsx"))?.is_empty());
        Ok(())
    }

    #[test]
    fn garbage_workbook_is_an_error() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("0125.xlsx");
        fs::write(&path, "not a workbook")?;
        assert!(matches!(
            load_existing(&path),
            Err(PipelineError::SpreadsheetRead { .. })
        ));
        Ok(())
    }
}
