// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

use crate::date_code::DateCode;

/// Environment variable naming an explicit YAML config file.
pub const CONFIG_ENV: &str = "BHAVCOPY_CONFIG";
/// Picked up from the working directory when `BHAVCOPY_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "bhavcopy.yaml";

const DEFAULT_ARCHIVE_BASE_URL: &str = "https://nsearchives.nseindia.com/archives/equities/bhavcopy/pr/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub archive_base_url: String,
    /// Sent as `User-Agent`; the archive host rejects library defaults.
    pub user_agent: String,
    /// Unset means the download may block indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub input_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_base_url: DEFAULT_ARCHIVE_BASE_URL.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout_secs: None,
            input_dir: PathBuf::from("input"),
            tmp_dir: PathBuf::from("tmp_data"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Config {
    /// `$BHAVCOPY_CONFIG`, else `./bhavcopy.yaml` if present, else defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(local);
        }
        debug!("no config file, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Every relative directory re-rooted under `root`.
    pub fn rooted_at(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.input_dir = root.join(&self.input_dir);
        self.tmp_dir = root.join(&self.tmp_dir);
        self.output_dir = root.join(&self.output_dir);
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn unzipped_dir(&self) -> PathBuf {
        self.tmp_dir.join("unzipped")
    }

    pub fn extracted_csv(&self, code: &DateCode) -> PathBuf {
        self.unzipped_dir().join(code.csv_file_name())
    }

    pub fn available_columns_file(&self) -> PathBuf {
        self.tmp_dir.join("available_columns.txt")
    }

    pub fn selected_columns_file(&self) -> PathBuf {
        self.input_dir.join("my_columns.txt")
    }

    pub fn mapping_file(&self) -> PathBuf {
        self.input_dir.join("fno_security_mapping.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_operator_layout() {
        let cfg = Config::default();
        let code = DateCode::parse("PR250425").unwrap();
        assert_eq!(
            cfg.extracted_csv(&code),
            PathBuf::from("tmp_data/unzipped/PR250425.csv")
        );
        assert_eq!(
            cfg.available_columns_file(),
            PathBuf::from("tmp_data/available_columns.txt")
        );
        assert_eq!(cfg.selected_columns_file(), PathBuf::from("input/my_columns.txt"));
        assert_eq!(
            cfg.mapping_file(),
            PathBuf::from("input/fno_security_mapping.csv")
        );
        assert_eq!(cfg.request_timeout(), None);
    }

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bhavcopy.yaml");
        fs::write(&path, "output_dir: /srv/bhav\nrequest_timeout_secs: 45\n")?;

        let cfg = Config::from_file(&path)?;
        assert_eq!(cfg.output_dir, PathBuf::from("/srv/bhav"));
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(45)));
        assert_eq!(cfg.user_agent, "Mozilla/5.0");
        assert_eq!(cfg.input_dir, PathBuf::from("input"));
        Ok(())
    }

    #[test]
    fn rooted_at_prefixes_dirs() {
        let cfg = Config::default().rooted_at("/work");
        assert_eq!(cfg.tmp_dir, PathBuf::from("/work/tmp_data"));
        assert_eq!(cfg.output_dir, PathBuf::from("/work/output"));
    }
}
