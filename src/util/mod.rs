//! Utility functions for common operations.
//!
//! - Atomic file writes for the store, config and downloads
//! - Display helpers shared by the CLI and the TUI

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, TrackerError};

/// Atomically write content to a file.
///
/// Writes to a temporary file in the same directory, syncs it, then renames
/// it over the target. If any step fails the original file is untouched.
/// Missing parent directories are created.
///
/// # Example
///
/// ```rust,no_run
/// use cainiao_tracker::util::atomic_write;
///
/// atomic_write("store.json", b"{}").unwrap();
/// ```
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    atomic_write_with(path, |writer| writer.write_all(content))
}

/// Atomically write a file through a writer callback.
///
/// Used when the content is produced incrementally, e.g. a streamed download.
pub fn atomic_write_with<F>(path: impl AsRef<Path>, write_fn: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let path = path.as_ref();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(TrackerError::IoError {
                context: format!("Cannot determine parent directory for: {}", path.display()),
                source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
            })
        }
    };

    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TrackerError::io(format!("Failed to create directory: {}", parent.display()), e)
        })?;
    }

    // Same directory keeps the rename on one filesystem.
    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| {
        TrackerError::io(
            format!("Failed to create temporary file in: {}", parent.display()),
            e,
        )
    })?;

    write_fn(&mut temp_file).map_err(|e| {
        TrackerError::io(format!("Failed to write content for: {}", path.display()), e)
    })?;

    temp_file.flush().map_err(|e| {
        TrackerError::io(format!("Failed to flush temporary file for: {}", path.display()), e)
    })?;

    temp_file.as_file().sync_all().map_err(|e| {
        TrackerError::io(format!("Failed to sync temporary file for: {}", path.display()), e)
    })?;

    temp_file.persist(path).map_err(|e| {
        TrackerError::io(
            format!("Failed to atomically write file: {}", path.display()),
            e.error,
        )
    })?;

    Ok(())
}

/// Truncate a string to `max` characters, appending an ellipsis when cut.
#[must_use]
pub fn truncate_display(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Human-readable byte count (`1.5 MB`).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        atomic_write(&path, b"{\"a\":1}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old").unwrap();

        atomic_write(&path, b"new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_atomic_write_with_failure_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "original").unwrap();

        let result = atomic_write_with(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_truncate_display() {
        assert_eq!(truncate_display("short", 10), "short");
        assert_eq!(truncate_display("encomenda", 5), "enco…");
        assert_eq!(truncate_display("abc", 0), "");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
