//! Daily NSE bhav-copy ingestion: download the day's archive, pick columns,
//! join against the F&O security mapping and append to the monthly CSV and
//! spreadsheet.

pub mod cleanup;
pub mod columns;
pub mod config;
pub mod date_code;
pub mod error;
pub mod fetch;
pub mod join;
pub mod mapping;
pub mod monthly;
pub mod pipeline;
pub mod process;
pub mod prompt;

pub use config::Config;
pub use date_code::DateCode;
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunSummary, Stage, StageError};
