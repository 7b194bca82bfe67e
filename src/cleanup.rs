use std::{fs, io, path::Path};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    Retained,
    /// Deletion was requested but failed; the run still succeeds.
    Failed { reason: String },
}

impl CleanupOutcome {
    /// Operator-facing line for `dir`.
    pub fn notice(&self, dir: &str) -> String {
        match self {
            CleanupOutcome::Deleted => format!("✅ '{dir}' folder deleted."),
            CleanupOutcome::Retained => format!("ℹ️ '{dir}' folder retained."),
            CleanupOutcome::Failed { reason } => format!("⚠️ Could not delete '{dir}': {reason}"),
        }
    }
}

/// Recursively delete the working directory. Failure is only logged.
pub fn remove_workdir(dir: &Path) -> CleanupOutcome {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            info!(dir = %dir.display(), "deleted working directory");
            CleanupOutcome::Deleted
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(dir = %dir.display(), "working directory already gone");
            CleanupOutcome::Deleted
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not delete working directory");
            CleanupOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
