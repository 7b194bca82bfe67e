use std::{fs, io::Cursor, path::Path};
use tracing::{info, instrument};
use zip::ZipArchive;

use crate::error::{PipelineError, Result};

/// Unpack every entry of an in-memory ZIP into `dest_dir`, creating it if needed.
/// Returns the number of entries extracted.
#[instrument(level = "info", skip(bytes, dest_dir), fields(dest = %dest_dir.as_ref().display(), bytes = bytes.len()))]
pub fn extract_archive(bytes: &[u8], dest_dir: impl AsRef<Path>) -> Result<usize> {
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir).map_err(|e| PipelineError::io(dest_dir, e))?;

    let extraction_failed = |e| PipelineError::ExtractionFailed {
        dir: dest_dir.to_path_buf(),
        source: e,
    };
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(extraction_failed)?;
    let entries = archive.len();
    archive.extract(dest_dir).map_err(extraction_failed)?;

    info!(entries, "extracted archive");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;

    fn build_zip(entries: &[(&str, &str)]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, body) in entries {
                zip.start_file(*name, options)?;
                zip.write_all(body.as_bytes())?;
            }
            zip.finish()?;
        }
        Ok(buf)
    }

    #[test]
    fn extracts_all_entries() -> Result<()> {
        let tmp = tempdir()?;
        let bytes = build_zip(&[
            ("PR250425.csv", "SECURITY,CLOSE_PRICE\nABC LTD,10\n"),
            ("Pd250425.csv", "x\n"),
        ])?;

        let n = extract_archive(&bytes, tmp.path().join("unzipped"))?;
        assert_eq!(n, 2);
        let text = fs::read_to_string(tmp.path().join("unzipped/PR250425.csv"))?;
        assert!(text.starts_with("SECURITY,CLOSE_PRICE"));
        assert!(tmp.path().join("unzipped/Pd250425.csv").is_file());
        Ok(())
    }

    #[test]
    fn corrupt_archive_is_extraction_failure() -> Result<()> {
        let tmp = tempdir()?;
        let err = extract_archive(b"<html>not a zip</html>", tmp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed { .. }));
        Ok(())
    }
}
