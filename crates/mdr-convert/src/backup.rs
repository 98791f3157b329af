//! Timestamped backups of Markdown files before they are overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Timestamp format appended to backup file names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Path of the backup for `path` taken at `time`: `{name}.bak-{YYYYmmdd-HHMMSS}`.
#[must_use]
pub fn backup_path(path: &Path, time: DateTime<Local>) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".bak-{}", time.format(TIMESTAMP_FORMAT)));
    path.with_file_name(name)
}

/// Copy `path` next to itself under a timestamped backup name.
///
/// Returns the backup path.
pub fn create_backup(path: &Path) -> std::io::Result<PathBuf> {
    let backup = backup_path(path, Local::now());
    fs::copy(path, &backup)?;
    tracing::info!(path = %path.display(), backup = %backup.display(), "Created backup");
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_format() {
        let time = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            backup_path(Path::new("docs/guide.md"), time),
            PathBuf::from("docs/guide.md.bak-20240309-070501")
        );
    }

    #[test]
    fn test_create_backup_copies_content() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("a.md");
        fs::write(&doc, "original\n").unwrap();

        let backup = create_backup(&doc).unwrap();

        assert_eq!(backup.parent(), Some(tmp.path()));
        assert!(
            backup
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("a.md.bak-")
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), "original\n");
        assert_eq!(fs::read_to_string(&doc).unwrap(), "original\n");
    }

    #[test]
    fn test_create_backup_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(create_backup(&tmp.path().join("missing.md")).is_err());
    }
}
