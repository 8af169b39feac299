// sentinel-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::Path;

/// Writes `content` to `path` through a temporary file in the same directory,
/// then renames it into place. Readers see the old file or the new one, never
/// a half-written report.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    // Same directory, so the rename never crosses filesystems.
    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;

    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;

    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_report() -> Result<()> {
        let dir = tempdir()?;
        let report_path = dir.path().join("audit_report.json");

        atomic_write(&report_path, r#"{"overall_status":"PASS"}"#)?;

        assert_eq!(
            fs::read_to_string(&report_path)?,
            r#"{"overall_status":"PASS"}"#
        );
        Ok(())
    }

    #[test]
    fn test_atomic_write_replaces_previous_report() -> Result<()> {
        let dir = tempdir()?;
        let report_path = dir.path().join("audit_summary.txt");

        atomic_write(&report_path, "Overall: FAIL")?;
        atomic_write(&report_path, "Overall: PASS")?;

        assert_eq!(fs::read_to_string(&report_path)?, "Overall: PASS");
        // no temporary file left behind
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_atomic_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let report_path = dir.path().join("missing").join("log.txt");
        assert!(matches!(
            atomic_write(&report_path, "x"),
            Err(InfrastructureError::Io(_))
        ));
    }
}
