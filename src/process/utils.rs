/// Decode a raw CSV field and drop whitespace that follows the delimiter.
pub fn clean_field(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim_start().to_string()
}

/// Matching key for security names: trimmed and upper-cased.
pub fn normalize_security(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// True when a cell should be stored as a number in the spreadsheet.
pub fn looks_numeric(s: &str) -> Option<f64> {
    let s = s.trim();
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
