// src/date_code.rs

use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{fmt, str::FromStr};

use crate::error::{PipelineError, Result};

static DATE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PR(\d{2})(\d{2})(\d{2})$").expect("date code regex should be valid"));

/// A trading date as the exchange names its bhav-copy archives: `PR` + `DDMMYY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateCode {
    code: String,
    date: NaiveDate,
}

impl DateCode {
    /// Trim, upper-case and validate an operator-entered code.
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_ascii_uppercase();
        let invalid = |reason: &str| PipelineError::InvalidFormat {
            input: raw.to_string(),
            reason: reason.to_string(),
        };

        if !code.starts_with("PR") {
            return Err(invalid("must start with PR"));
        }
        if code.len() != 8 {
            return Err(invalid("must be 8 characters long"));
        }
        let caps = DATE_CODE_RE
            .captures(&code)
            .ok_or_else(|| invalid("last 6 characters must be digits"))?;

        let day: u32 = caps[1].parse().map_err(|_| invalid("bad day"))?;
        let month: u32 = caps[2].parse().map_err(|_| invalid("bad month"))?;
        let yy: i32 = caps[3].parse().map_err(|_| invalid("bad year"))?;

        let date = NaiveDate::from_ymd_opt(2000 + yy, month, day)
            .ok_or_else(|| invalid("not a calendar date"))?;

        Ok(Self { code, date })
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn year_full(&self) -> i32 {
        self.date.year()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_friday(&self) -> bool {
        self.date.weekday() == Weekday::Fri
    }

    /// `DD/MM/YY`, the value written into every record's `DATE` column.
    pub fn date_label(&self) -> String {
        format!("{}/{}/{}", &self.code[2..4], &self.code[4..6], &self.code[6..8])
    }

    /// `MMYY`, the stem of the monthly output files.
    pub fn month_code(&self) -> String {
        format!("{}{}", &self.code[4..6], &self.code[6..8])
    }

    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.code)
    }

    pub fn csv_file_name(&self) -> String {
        format!("{}.csv", self.code)
    }
}

impl FromStr for DateCode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_friday_code() {
        let code: DateCode = "PR250425".parse().unwrap();
        assert_eq!(code.day(), 25);
        assert_eq!(code.month(), 4);
        assert_eq!(code.year_full(), 2025);
        assert!(code.is_friday());
        assert_eq!(code.date_label(), "25/04/25");
        assert_eq!(code.month_code(), "0425");
        assert_eq!(code.csv_file_name(), "PR250425.csv");
        assert_eq!(code.archive_file_name(), "PR250425.zip");
    }

    #[test]
    fn non_friday_has_no_banner() {
        // 24 Apr 2025 is a Thursday
        let code = DateCode::parse("PR240425").unwrap();
        assert!(!code.is_friday());
        assert_eq!(code.date(), NaiveDate::from_ymd_opt(2025, 4, 24).unwrap());
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        let code = DateCode::parse("  pr020125 ").unwrap();
        assert_eq!(code.as_str(), "PR020125");
        assert_eq!(code.to_string(), "PR020125");
        assert_eq!(code.year_full(), 2025);
    }

    #[test]
    fn rejects_malformed_codes() {
        for raw in ["PR25April", "XX250425", "PR25042", "PR2504255", "", "PR25o425"] {
            let err = DateCode::parse(raw).unwrap_err();
            assert!(
                matches!(err, PipelineError::InvalidFormat { .. }),
                "{raw} should be InvalidFormat, got {err:?}"
            );
        }
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(matches!(
            DateCode::parse("PR310225"),
            Err(PipelineError::InvalidFormat { .. })
        ));
        assert!(matches!(
            DateCode::parse("PR011325"),
            Err(PipelineError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn every_valid_code_expands_year_from_2000() {
        for yy in 0..=99 {
            let raw = format!("PR0101{yy:02}");
            let code = DateCode::parse(&raw).unwrap();
            assert_eq!(code.year_full(), 2000 + yy);
            assert_eq!(code.day(), 1);
            assert_eq!(code.month(), 1);
        }
    }
}
