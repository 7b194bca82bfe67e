use std::collections::HashMap;

/// One day's bhav copy as loaded from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BhavTable {
    /// Column names from the header line, in file order.
    pub headers: Vec<String>,
    /// Each well-formed data row; always `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl BhavTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            // a repeated header resolves to its first occurrence
            index.entry(h.clone()).or_insert(i);
        }
        Self {
            headers,
            rows,
            index,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell of `row` under column `name`, if the column exists.
    pub fn value<'a>(&'a self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.column_index(name)
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
