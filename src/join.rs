// src/join.rs

use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::columns::ColumnSet;
use crate::mapping::{split_segments, MappingRow};
use crate::process::{utils::normalize_security, BhavTable};

pub const DATE_COLUMN: &str = "DATE";
pub const SYMBOL_COLUMN: &str = "Symbol";
pub const STOCK_NAME_COLUMN: &str = "Stock Name";
/// Column of the bhav copy that mapping rows are matched against.
pub const SECURITY_COLUMN: &str = "SECURITY";

/// Fills every cell of the row between the stock and index sections.
pub const SEGMENT_SEPARATOR: &str = "🔽🔽🔽";

/// A selected column's value for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Present(String),
    /// Unmatched security, or the bhav copy has no such column.
    Empty,
}

impl CellValue {
    pub fn as_str(&self) -> &str {
        match self {
            CellValue::Present(s) => s,
            CellValue::Empty => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub date: String,
    pub symbol: String,
    pub stock_name: String,
    pub matched: bool,
    /// `(column, value)` in selection order.
    pub fields: Vec<(String, CellValue)>,
}

impl OutputRecord {
    pub fn field(&self, name: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn to_cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(3 + self.fields.len());
        cells.push(self.date.clone());
        cells.push(self.symbol.clone());
        cells.push(self.stock_name.clone());
        cells.extend(self.fields.iter().map(|(_, v)| v.as_str().to_string()));
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchRow {
    Record(OutputRecord),
    Separator,
}

/// The new rows produced by one run: stocks, an optional separator, indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub columns: Vec<String>,
    pub rows: Vec<BatchRow>,
}

impl Batch {
    pub fn records(&self) -> impl Iterator<Item = &OutputRecord> {
        self.rows.iter().filter_map(|r| match r {
            BatchRow::Record(rec) => Some(rec),
            BatchRow::Separator => None,
        })
    }

    /// Rows flattened to cells, aligned with `columns`.
    pub fn to_cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| match r {
                BatchRow::Record(rec) => rec.to_cells(),
                BatchRow::Separator => vec![SEGMENT_SEPARATOR.to_string(); self.columns.len()],
            })
            .collect()
    }
}

/// Selected columns that become record fields: first occurrence wins and the
/// fixed columns cannot be overridden.
fn field_columns(selected: &ColumnSet) -> Vec<String> {
    let fixed = [DATE_COLUMN, SYMBOL_COLUMN, STOCK_NAME_COLUMN];
    let mut out = Vec::new();
    for name in selected.distinct() {
        if fixed.contains(&name) {
            warn!(column = name, "selected column shadows a fixed column; ignored");
            continue;
        }
        out.push(name.to_string());
    }
    out
}

/// First row (in file order) per normalized `SECURITY` value.
fn index_by_security(bhav: &BhavTable) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    let Some(col) = bhav.column_index(SECURITY_COLUMN) else {
        warn!("bhav copy has no {SECURITY_COLUMN} column; nothing will match");
        return index;
    };
    for (i, row) in bhav.rows.iter().enumerate() {
        let key = normalize_security(&row[col]);
        if key.is_empty() {
            continue;
        }
        if index.contains_key(&key) {
            debug!(security = %key, row = i, "duplicate security, keeping first");
            continue;
        }
        index.insert(key, i);
    }
    index
}

fn build_record(
    mapping: &MappingRow,
    date_label: &str,
    columns: &[String],
    bhav: &BhavTable,
    index: &HashMap<String, usize>,
) -> OutputRecord {
    let key = normalize_security(&mapping.matched_security);
    let row = if key.is_empty() {
        None
    } else {
        index.get(&key).map(|&i| bhav.rows[i].as_slice())
    };
    if row.is_none() {
        debug!(symbol = %mapping.symbol, security = %mapping.matched_security, "no bhav row");
    }

    let fields = columns
        .iter()
        .map(|c| {
            let v = row
                .and_then(|r| bhav.value(r, c))
                .map(|s| CellValue::Present(s.to_string()))
                .unwrap_or(CellValue::Empty);
            (c.clone(), v)
        })
        .collect();

    OutputRecord {
        date: date_label.to_string(),
        symbol: mapping.symbol.clone(),
        stock_name: mapping.stock_name.clone(),
        matched: row.is_some(),
        fields,
    }
}

/// Join the mapping against the day's bhav copy.
#[instrument(level = "info", skip_all, fields(date = date_label, mapping = mapping.len()))]
pub fn build_batch(
    mapping: &[MappingRow],
    bhav: &BhavTable,
    selected: &ColumnSet,
    date_label: &str,
) -> Batch {
    let field_cols = field_columns(selected);
    let index = index_by_security(bhav);
    let segments = split_segments(mapping);

    let mut rows = Vec::with_capacity(mapping.len() + 1);
    for m in segments.stocks {
        rows.push(BatchRow::Record(build_record(
            m, date_label, &field_cols, bhav, &index,
        )));
    }
    if !segments.indexes.is_empty() {
        rows.push(BatchRow::Separator);
        for m in segments.indexes {
            rows.push(BatchRow::Record(build_record(
                m, date_label, &field_cols, bhav, &index,
            )));
        }
    }

    let mut columns = vec![
        DATE_COLUMN.to_string(),
        SYMBOL_COLUMN.to_string(),
        STOCK_NAME_COLUMN.to_string(),
    ];
    columns.extend(field_cols);

    let batch = Batch { columns, rows };
    let matched = batch.records().filter(|r| r.matched).count();
    info!(
        stocks = segments.stocks.len(),
        indexes = segments.indexes.len(),
        matched,
        "built batch"
    );
    batch
}
