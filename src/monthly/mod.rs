// src/monthly/mod.rs

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

use crate::date_code::DateCode;
use crate::error::{PipelineError, Result};
use crate::join::Batch;

pub mod csv_file;
pub mod xlsx_file;

/// Middle row of the block that separates one run's rows from the previous ones.
pub const RUN_SEPARATOR: &str = "✨🌟🔅";

/// A month's accumulated rows as one flat table of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl MonthlyTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Append `other` below `self`. Columns are unioned (ours first, then new
    /// ones from `other`); cells a row lacks are left empty.
    pub fn concat(mut self, other: &MonthlyTable) -> MonthlyTable {
        for c in &other.columns {
            if !self.columns.contains(c) {
                self.columns.push(c.clone());
            }
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }

        let positions: HashMap<&str, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let targets: Vec<usize> = other.columns.iter().map(|c| positions[c.as_str()]).collect();

        for src in &other.rows {
            let mut row = vec![String::new(); width];
            let mut filled = vec![false; width];
            for (cell, &to) in src.iter().zip(&targets) {
                // a repeated source column keeps its first value
                if !filled[to] {
                    row[to] = cell.clone();
                    filled[to] = true;
                }
            }
            self.rows.push(row);
        }
        self
    }
}

impl From<&Batch> for MonthlyTable {
    fn from(batch: &Batch) -> Self {
        MonthlyTable::new(batch.columns.clone(), batch.to_cells())
    }
}

/// Empty row, sentinel row, empty row over `columns`.
pub fn separator_block(columns: &[String]) -> MonthlyTable {
    let n = columns.len();
    MonthlyTable::new(
        columns.to_vec(),
        vec![
            vec![String::new(); n],
            vec![RUN_SEPARATOR.to_string(); n],
            vec![String::new(); n],
        ],
    )
}

/// Existing rows, then the separator block, then the new batch.
pub fn merge(existing: MonthlyTable, batch: &Batch) -> MonthlyTable {
    existing
        .concat(&separator_block(&batch.columns))
        .concat(&MonthlyTable::from(batch))
}

/// `output/{year}/csv/{MMYY}.csv` and `output/{year}/excel/{MMYY}.xlsx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyPaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

impl MonthlyPaths {
    pub fn new(output_dir: impl AsRef<Path>, code: &DateCode) -> Self {
        let year_dir = output_dir.as_ref().join(code.year_full().to_string());
        let stem = code.month_code();
        Self {
            csv: year_dir.join("csv").join(format!("{stem}.csv")),
            xlsx: year_dir.join("excel").join(format!("{stem}.xlsx")),
        }
    }

    pub fn create_dirs(&self) -> Result<()> {
        for p in [&self.csv, &self.xlsx] {
            if let Some(dir) = p.parent() {
                fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
            }
        }
        Ok(())
    }
}

/// Merge `batch` into both monthly files. Each file is extended from its own
/// previous contents and rewritten in full.
#[instrument(level = "info", skip_all, fields(csv = %paths.csv.display()))]
pub fn update_monthly(paths: &MonthlyPaths, batch: &Batch) -> Result<()> {
    paths.create_dirs()?;

    let existing_csv = csv_file::load_existing(&paths.csv).unwrap_or_else(|e| {
        warn!(path = %paths.csv.display(), error = %e, "starting month CSV from empty");
        MonthlyTable::default()
    });
    let merged_csv = merge(existing_csv, batch);
    csv_file::write(&paths.csv, &merged_csv)?;

    let existing_xlsx = xlsx_file::load_existing(&paths.xlsx).unwrap_or_else(|e| {
        warn!(path = %paths.xlsx.display(), error = %e, "starting month spreadsheet from empty");
        MonthlyTable::default()
    });
    let merged_xlsx = merge(existing_xlsx, batch);
    xlsx_file::write(&paths.xlsx, &merged_xlsx)?;

    info!(
        csv_rows = merged_csv.rows.len(),
        xlsx_rows = merged_xlsx.rows.len(),
        "updated monthly files"
    );
    Ok(())
}
