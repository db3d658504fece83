//! Console and file logging for the binary.
//!
//! Library crates log through `log`; the subscriber installed here picks
//! those records up alongside native `tracing` events.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log files larger than this are rotated at start-up.
const MAX_LOG_BYTES: u64 = 1024 * 1024;

/// Rotated files kept as `<file>.1` .. `<file>.N`.
const LOG_BACKUPS: usize = 2;

/// Keeps the log file alive for the process lifetime.
///
/// Dropping it writes the closing banner and flushes the file to disk.
#[derive(Debug)]
pub struct LogGuard {
    file: Option<Arc<File>>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        tracing::info!("END");
        if let Some(file) = &self.file {
            if let Err(e) = file.sync_all() {
                eprintln!("Failed to sync log file: {e}");
            }
        }
    }
}

/// Install the global subscriber.
///
/// The console honours `RUST_LOG`, falling back to `level`. When `log_file`
/// is given every event at debug and above is also appended there.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<LogGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console = fmt::layer().with_filter(console_filter);

    let file = log_file.map(open_log_file).transpose()?.map(Arc::new);
    let file_layer = file.as_ref().map(|f| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Arc::clone(f))
            .with_filter(EnvFilter::new("debug"))
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")?;

    Ok(LogGuard { file })
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    rotate(path).with_context(|| format!("Failed to rotate {}", path.display()))?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Shift `<file>` to `<file>.1`, `<file>.1` to `<file>.2`, and so on, once
/// `<file>` has grown past [`MAX_LOG_BYTES`]. The oldest backup is dropped.
fn rotate(path: &Path) -> io::Result<()> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if size <= MAX_LOG_BYTES {
        return Ok(());
    }

    for n in (1..LOG_BACKUPS).rev() {
        let older = backup_path(path, n);
        if older.exists() {
            fs::rename(&older, backup_path(path, n + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_small_log_is_not_rotated() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("vidshelf.log");
        fs::write(&log, "short").unwrap();

        rotate(&log).unwrap();

        assert!(log.exists());
        assert!(!backup_path(&log, 1).exists());
    }

    #[test]
    fn test_missing_log_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        rotate(&temp_dir.path().join("absent.log")).unwrap();
    }

    #[test]
    fn test_large_log_rotates_and_keeps_two_backups() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("vidshelf.log");
        let big = vec![b'x'; MAX_LOG_BYTES as usize + 1];

        fs::write(&log, &big).unwrap();
        fs::write(backup_path(&log, 1), "first backup").unwrap();
        fs::write(backup_path(&log, 2), "oldest backup").unwrap();

        rotate(&log).unwrap();

        assert!(!log.exists());
        assert_eq!(fs::read(backup_path(&log, 1)).unwrap().len(), big.len());
        assert_eq!(
            fs::read_to_string(backup_path(&log, 2)).unwrap(),
            "first backup"
        );
        assert!(!backup_path(&log, 3).exists());
    }

    #[test]
    fn test_open_log_file_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("logs/nested/vidshelf.log");

        open_log_file(&log).unwrap();

        assert!(log.exists());
    }
}
