// src/columns.rs

use std::{
    collections::HashSet,
    fs,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::{info, instrument};

use crate::error::{PipelineError, Result};
use crate::process::BhavTable;

/// The operator's chosen columns: trimmed, non-blank, file order, repeats kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet(Vec<String>);

impl ColumnSet {
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names in order with later repeats removed.
    pub fn distinct(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .map(String::as_str)
            .filter(|n| seen.insert(*n))
            .collect()
    }
}

/// Every column the daily table offers.
pub fn list_columns(table: &BhavTable) -> Vec<String> {
    table.headers.clone()
}

pub fn select_columns<I, S>(names: I) -> ColumnSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ColumnSet(
        names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect(),
    )
}

/// Write one column name per line for the operator to review.
#[instrument(level = "info", skip(path, names), fields(path = %path.as_ref().display()))]
pub fn write_available_columns(path: impl AsRef<Path>, names: &[String]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let file = fs::File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut w = BufWriter::new(file);
    for name in names {
        writeln!(w, "{name}").map_err(|e| PipelineError::io(path, e))?;
    }
    w.flush().map_err(|e| PipelineError::io(path, e))?;
    info!(count = names.len(), "wrote available columns");
    Ok(())
}

/// Read back the operator-authored column list.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_selected_columns(path: impl AsRef<Path>) -> Result<ColumnSet> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| PipelineError::ColumnsFileUnreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    let set = select_columns(text.lines());
    info!(count = set.len(), "read selected columns");
    Ok(set)
}
