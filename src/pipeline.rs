// src/pipeline.rs

use std::{fmt, fs};
use thiserror::Error;
use tracing::{info, info_span};

use crate::cleanup::{remove_workdir, CleanupOutcome};
use crate::columns::{list_columns, read_selected_columns, write_available_columns};
use crate::config::Config;
use crate::date_code::DateCode;
use crate::error::PipelineError;
use crate::fetch::{archive_url, zips::extract_archive, ArchiveSource};
use crate::join::{build_batch, SECURITY_COLUMN};
use crate::mapping::load_mapping;
use crate::monthly::{update_monthly, MonthlyPaths};
use crate::process::load_bhav_csv;
use crate::prompt::ConfirmationProvider;

const FRIDAY_BANNER: &str = "\n────────────────────────────────────────\n\
🌟 A New Week is Coming! 🌟\n\
Recharge, Refocus, and get ready to achieve more!\n\
────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParseDate,
    Fetch,
    Extract,
    Load,
    SelectColumns,
    Join,
    Merge,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::ParseDate => "parse-date",
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Load => "load",
            Stage::SelectColumns => "select-columns",
            Stage::Join => "join",
            Stage::Merge => "merge",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(s)
    }
}

/// A fatal error and the stage the run stopped at.
#[derive(Debug, Error)]
#[error("{stage}: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

fn at(stage: Stage) -> impl FnOnce(PipelineError) -> StageError {
    move |source| StageError { stage, source }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub code: DateCode,
    pub paths: MonthlyPaths,
    pub records: usize,
    pub matched: usize,
    pub cleanup: CleanupOutcome,
}

/// One ingestion run: fetch, load, select, join, merge, clean up.
pub struct Pipeline<S, P> {
    config: Config,
    source: S,
    prompt: P,
}

impl<S: ArchiveSource, P: ConfirmationProvider> Pipeline<S, P> {
    pub fn new(config: Config, source: S, prompt: P) -> Self {
        Self {
            config,
            source,
            prompt,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn run(&mut self) -> Result<RunSummary, StageError> {
        let cfg = &self.config;

        // ─── parse date ──────────────────────────────────────────────────
        let code = {
            let _span = info_span!("stage", stage = %Stage::ParseDate).entered();
            let raw = self
                .prompt
                .ask("Enter date code in format PRDDMMYY (e.g., PR250425): ")
                .map_err(at(Stage::ParseDate))?;
            let code = DateCode::parse(&raw).map_err(at(Stage::ParseDate))?;
            info!(code = %code, date = %code.date(), friday = code.is_friday(), "date code");
            if code.is_friday() {
                self.prompt.notify(FRIDAY_BANNER);
            }
            code
        };

        // ─── fetch & extract ─────────────────────────────────────────────
        let bytes = {
            let _span = info_span!("stage", stage = %Stage::Fetch).entered();
            let url = archive_url(&cfg.archive_base_url, &code).map_err(at(Stage::Fetch))?;
            self.prompt
                .notify(&format!("📥 Downloading ZIP from {url} ..."));
            self.source.fetch(&url).map_err(at(Stage::Fetch))?
        };
        {
            let _span = info_span!("stage", stage = %Stage::Extract).entered();
            let dir = cfg.unzipped_dir();
            extract_archive(&bytes, &dir).map_err(at(Stage::Extract))?;
            self.prompt.notify(&format!(
                "✅ File downloaded and extracted to '{}'",
                dir.display()
            ));
        }

        // ─── load ────────────────────────────────────────────────────────
        let bhav = {
            let _span = info_span!("stage", stage = %Stage::Load).entered();
            load_bhav_csv(cfg.extracted_csv(&code)).map_err(at(Stage::Load))?
        };

        // ─── select columns ──────────────────────────────────────────────
        let selected = {
            let _span = info_span!("stage", stage = %Stage::SelectColumns).entered();
            let review = cfg.available_columns_file();
            write_available_columns(&review, &list_columns(&bhav))
                .map_err(at(Stage::SelectColumns))?;
            fs::create_dir_all(&cfg.input_dir)
                .map_err(|e| PipelineError::io(&cfg.input_dir, e))
                .map_err(at(Stage::SelectColumns))?;

            let columns_file = cfg.selected_columns_file();
            let mapping_file = cfg.mapping_file();
            self.prompt.notify(&format!(
                "✅ All column names written to '{}'",
                review.display()
            ));
            self.prompt.notify(&format!(
                "👉 Please write the desired columns into '{}' (one per line).",
                columns_file.display()
            ));
            let ready = self
                .prompt
                .confirm(&format!(
                    "Have you updated '{}' and placed '{}'?",
                    columns_file.display(),
                    mapping_file.display()
                ))
                .map_err(at(Stage::SelectColumns))?;
            if !ready {
                self.prompt.notify("❌ Process terminated by user.");
                return Err(at(Stage::SelectColumns)(PipelineError::UserAbort {
                    stage: "column selection",
                }));
            }
            read_selected_columns(&columns_file).map_err(at(Stage::SelectColumns))?
        };

        // ─── join ────────────────────────────────────────────────────────
        let batch = {
            let _span = info_span!("stage", stage = %Stage::Join).entered();
            let mapping = load_mapping(cfg.mapping_file()).map_err(at(Stage::Join))?;
            if !bhav.has_column(SECURITY_COLUMN) {
                return Err(at(Stage::Join)(PipelineError::MissingColumn {
                    column: SECURITY_COLUMN.to_string(),
                    path: cfg.extracted_csv(&code),
                }));
            }
            build_batch(&mapping, &bhav, &selected, &code.date_label())
        };

        // ─── merge ───────────────────────────────────────────────────────
        let paths = {
            let _span = info_span!("stage", stage = %Stage::Merge).entered();
            let paths = MonthlyPaths::new(&cfg.output_dir, &code);
            update_monthly(&paths, &batch).map_err(at(Stage::Merge))?;
            self.prompt.notify(&format!(
                "\n✅ Successfully updated monthly files:\n - {}\n - {}",
                paths.csv.display(),
                paths.xlsx.display()
            ));
            paths
        };

        // ─── cleanup ─────────────────────────────────────────────────────
        let cleanup = {
            let _span = info_span!("stage", stage = %Stage::Cleanup).entered();
            let tmp = cfg.tmp_dir.display().to_string();
            let delete = self
                .prompt
                .confirm(&format!("🧹 Do you want to delete '{tmp}' folder?"))
                .map_err(at(Stage::Cleanup))?;
            let outcome = if delete {
                remove_workdir(&cfg.tmp_dir)
            } else {
                CleanupOutcome::Retained
            };
            self.prompt.notify(&outcome.notice(&tmp));
            outcome
        };

        let records = batch.records().count();
        let matched = batch.records().filter(|r| r.matched).count();
        info!(code = %code, records, matched, "run complete");
        Ok(RunSummary {
            code,
            paths,
            records,
            matched,
            cleanup,
        })
    }
}
