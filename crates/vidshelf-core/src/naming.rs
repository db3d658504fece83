//! Canonical library filenames.
//!
//! A numbered record maps to
//! `<library> - S<season>E<episode:03> - <sanitized title>.<id>`, followed by
//! either `.metadata` (the sidecar) or the source file's own extension.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::VideoRecord;

/// Characters replaced with `_` in titles.
const UNSAFE_CHARS: &[char] = &['$', '!', '%', '&', '*', ':', '@', '\'', '\\', '/'];

const SIDECAR_EXTENSION: &str = "metadata";

/// Make a title safe for use in a filename.
///
/// Non-ASCII and control characters are dropped, unsafe characters become
/// `_`, and a run of unsafe characters (including any dropped characters
/// between them) yields a single `_`. Every other ASCII character is kept.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let mut clean = String::with_capacity(title.len());
    let mut in_run = false;

    for c in title.chars() {
        if !c.is_ascii() || c.is_ascii_control() {
            continue;
        }
        if UNSAFE_CHARS.contains(&c) {
            if !in_run {
                clean.push('_');
                in_run = true;
            }
        } else {
            clean.push(c);
            in_run = false;
        }
    }

    clean
}

/// The extension-less library name for a numbered record.
pub fn base_name(library: &str, record: &VideoRecord) -> Result<String> {
    let episode = record.episode.ok_or_else(|| {
        Error::InvalidData(format!("video {} has no episode number", record.id))
    })?;
    Ok(format!(
        "{library} - S{}E{episode:03} - {}.{}",
        record.season,
        sanitize_title(&record.title),
        record.id
    ))
}

/// Where a record's sidecar and video land in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub sidecar: PathBuf,
    pub video: PathBuf,
}

impl OutputPaths {
    /// Resolve both output paths. The video keeps the extension of its
    /// current `download_file`.
    pub fn resolve(output_dir: &Path, library: &str, record: &VideoRecord) -> Result<Self> {
        let base = base_name(library, record)?;

        let sidecar = output_dir.join(format!("{base}.{SIDECAR_EXTENSION}"));
        let video = match record.download_file.extension() {
            Some(ext) => output_dir.join(format!("{base}.{}", ext.to_string_lossy())),
            None => output_dir.join(base),
        };

        Ok(Self { sidecar, video })
    }
}
