// src/process/mod.rs
use csv::ReaderBuilder;
use std::{fs::File, path::Path};
use tracing::{debug, info, instrument};

use crate::error::{PipelineError, Result};

mod raw_table;
pub mod utils;

pub use raw_table::BhavTable;

/// Load the extracted daily CSV.
///
/// - blank lines are skipped
/// - leading whitespace of every field (headers included) is stripped
/// - rows whose field count differs from the header are dropped
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_bhav_csv<P: AsRef<Path>>(path: P) -> Result<BhavTable> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let parse_err = |e| PipelineError::ParseError {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(|e| parse_err(csv::Error::from(e)))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for (idx, result) in rdr.byte_records().enumerate() {
        let record = result.map_err(parse_err)?;
        let fields: Vec<String> = record.iter().map(utils::clean_field).collect();

        let Some(expected) = headers.as_ref().map(Vec::len) else {
            let mut fields = fields;
            if let Some(first) = fields.first_mut() {
                *first = first.trim_start_matches('\u{feff}').to_string();
            }
            headers = Some(fields);
            continue;
        };

        if fields.len() == expected {
            rows.push(fields);
        } else {
            debug!(
                record = idx,
                expected,
                found = fields.len(),
                "dropping malformed row"
            );
            dropped += 1;
        }
    }

    let headers = headers.ok_or_else(|| {
        parse_err(csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "file has no header line",
        )))
    })?;

    info!(
        columns = headers.len(),
        rows = rows.len(),
        dropped,
        "loaded bhav copy"
    );
    Ok(BhavTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,bhavcopy::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn loads_lenient_csv() -> Result<()> {
        init_test_logging();
        let tmp = tempdir()?;
        let path = tmp.path().join("PR250425.csv");
        let content = "MKT, SERIES, SYMBOL, SECURITY, PREV_CL_PR, CLOSE_PRICE\n\
                       N, EQ, RELIANCE, RELIANCE INDUSTRIES LTD, 1300.10, 1310.55\n\
                       \n\
                       N, EQ, BROKEN ROW\n\
                       Y, , Nifty 50, Nifty 50, 24246.70, 24039.35\n\
                       N, EQ, A, B, 1, 2, 3, 4\n";
        fs::write(&path, content)?;

        let table = load_bhav_csv(&path)?;
        assert_eq!(
            table.headers,
            vec!["MKT", "SERIES", "SYMBOL", "SECURITY", "PREV_CL_PR", "CLOSE_PRICE"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(&table.rows[0], "SECURITY"), Some("RELIANCE INDUSTRIES LTD"));
        assert_eq!(table.value(&table.rows[1], "SERIES"), Some(""));
        assert_eq!(table.value(&table.rows[1], "CLOSE_PRICE"), Some("24039.35"));
        assert_eq!(table.value(&table.rows[1], "NOPE"), None);
        Ok(())
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let tmp = tempdir().unwrap();
        let err = load_bhav_csv(tmp.path().join("PR010125.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound { .. }));
    }

    #[test]
    fn empty_file_is_parse_error() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("empty.csv");
        fs::write(&path, "\n\n")?;
        let err = load_bhav_csv(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ParseError { .. }));
        Ok(())
    }

    #[test]
    fn strips_byte_order_mark_from_first_header() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("bom.csv");
        fs::write(&path, "\u{feff}SECURITY,CLOSE_PRICE\nABC,1\n")?;
        let table = load_bhav_csv(&path)?;
        assert!(table.has_column("SECURITY"));
        Ok(())
    }
}
