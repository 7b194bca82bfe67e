// src/mapping.rs

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::error::{PipelineError, Result};

/// The `Symbol` that opens the index section of the mapping table.
pub const INDEX_START_SYMBOL: &str = "NIFTY";

/// One line of the externally maintained symbol → security mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MappingRow {
    #[serde(rename = "Symbol", default)]
    pub symbol: String,
    #[serde(rename = "Stock Name", default)]
    pub stock_name: String,
    #[serde(rename = "Matched SECURITY", default)]
    pub matched_security: String,
}

impl MappingRow {
    pub fn new(symbol: &str, stock_name: &str, matched_security: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            stock_name: stock_name.to_string(),
            matched_security: matched_security.to_string(),
        }
    }
}

/// Stocks followed by indexes, split at the first `NIFTY` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments<'a> {
    pub stocks: &'a [MappingRow],
    pub indexes: &'a [MappingRow],
}

pub fn split_segments(rows: &[MappingRow]) -> Segments<'_> {
    let at = rows
        .iter()
        .position(|r| r.symbol.to_uppercase() == INDEX_START_SYMBOL)
        .unwrap_or(rows.len());
    let (stocks, indexes) = rows.split_at(at);
    Segments { stocks, indexes }
}

#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_mapping(path: impl AsRef<Path>) -> Result<Vec<MappingRow>> {
    let path = path.as_ref();
    let unreadable = |e| PipelineError::MappingFileUnreadable {
        path: path.to_path_buf(),
        source: e,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)
        .map_err(unreadable)?;

    let headers = rdr.headers().map_err(unreadable)?.clone();
    for required in ["Symbol", "Stock Name", "Matched SECURITY"] {
        if !headers.iter().any(|h| h == required) {
            return Err(PipelineError::MissingColumn {
                column: required.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let rows = rdr
        .deserialize::<MappingRow>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(unreadable)?;

    info!(rows = rows.len(), "loaded security mapping");
    Ok(rows)
}
