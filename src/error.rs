// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Every condition that stops a run. None of them are retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid date code `{input}`: {reason} (expected e.g. PR250425)")]
    InvalidFormat { input: String, reason: String },

    #[error("archive not available for {url} (HTTP {status})")]
    ArchiveUnavailable { url: String, status: u16 },

    #[error("error downloading {url}: {source}")]
    DownloadError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not extract archive into {dir}: {source}")]
    ExtractionFailed {
        dir: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("could not find extracted CSV at {path}")]
    FileNotFound { path: PathBuf },

    #[error("error reading CSV {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("column `{column}` not present in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("process terminated by user at {stage}")]
    UserAbort { stage: &'static str },

    #[error("could not read {path}: {source}")]
    ColumnsFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read {path}: {source}")]
    MappingFileUnreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not read operator input: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write CSV {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not read spreadsheet {path}: {source}")]
    SpreadsheetRead {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("could not write spreadsheet {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
