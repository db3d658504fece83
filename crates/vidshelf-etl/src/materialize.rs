//! Writing numbered videos into the output library.
//!
//! For each numbered staged record: write the `.metadata` sidecar, copy or
//! move the video next to it, and only then commit the record to the
//! catalog. A record is never catalogued without both files in place.

use filetime::FileTime;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use vidshelf_core::naming::OutputPaths;
use vidshelf_core::{sidecar, Season, VideoRecord, VideoStore};

use crate::error::{OrganizeError, OrganizeResult};

/// How a video reaches the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Leave the source and its descriptor in place.
    Copy,
    /// Move the video and delete the descriptor.
    Move,
}

/// Counts from one materialize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// New videos written and committed to the catalog.
    pub committed: usize,
    /// Catalogued videos written again under their existing name.
    pub refreshed: usize,
    /// Videos whose source vanished before they could be written.
    pub missing_source: usize,
    /// New videos held back because an earlier episode of their season
    /// could not be written.
    pub deferred: usize,
}

/// Writes sidecars and relocates videos into the output directory.
#[derive(Debug)]
pub struct MaterializeStage {
    output_dir: PathBuf,
    library_name: String,
    transfer: Transfer,
}

impl MaterializeStage {
    #[must_use]
    pub fn new(output_dir: PathBuf, library_name: impl Into<String>, transfer: Transfer) -> Self {
        Self {
            output_dir,
            library_name: library_name.into(),
            transfer,
        }
    }

    /// Materialize every numbered record in `staging`.
    ///
    /// Records are handled season by season in episode order. If a new
    /// record's source has disappeared, later new records of the same season
    /// are deferred so the catalog never gets a gap in its numbering; they
    /// are renumbered on the next run.
    pub fn run(
        &self,
        catalog: &mut impl VideoStore,
        staging: &impl VideoStore,
    ) -> OrganizeResult<MaterializeReport> {
        let mut worklist: Vec<VideoRecord> = staging
            .all_records()
            .map_err(|e| OrganizeError::store("reading staged records", e))?
            .into_iter()
            .filter(VideoRecord::is_numbered)
            .collect();
        worklist.sort_by_key(|r| (r.season, r.episode));

        let mut report = MaterializeReport::default();
        if worklist.is_empty() {
            log::info!("Nothing to materialize");
            return Ok(report);
        }

        self.ensure_output_dir()?;

        let mut blocked: BTreeSet<Season> = BTreeSet::new();

        for record in worklist {
            let catalogued = catalog
                .lookup(&record.id)
                .map_err(|e| OrganizeError::store(format!("catalog lookup of {}", record.id), e))?
                .is_some();

            if !catalogued && blocked.contains(&record.season) {
                log::warn!("Deferring {record} to keep season {} contiguous", record.season);
                report.deferred += 1;
                continue;
            }

            if !record.download_file.is_file() {
                let missing = OrganizeError::MissingSourceFile {
                    id: record.id.clone(),
                    path: record.download_file.clone(),
                };
                log::warn!("Skipping {record}: {missing}");
                report.missing_source += 1;
                if !catalogued {
                    blocked.insert(record.season);
                }
                continue;
            }

            self.write_outputs(&record)?;

            if catalogued {
                log::info!("Refreshed {record} (already catalogued)");
                report.refreshed += 1;
            } else {
                catalog
                    .insert(&record)
                    .map_err(|e| OrganizeError::store(format!("catalog commit of {}", record.id), e))?;
                log::info!("Catalogued {record}");
                report.committed += 1;
            }
        }

        log::info!(
            "Materialized {} new and {} catalogued videos; {} missing, {} deferred",
            report.committed,
            report.refreshed,
            report.missing_source,
            report.deferred
        );

        Ok(report)
    }

    fn ensure_output_dir(&self) -> OrganizeResult<()> {
        if self.output_dir.is_dir() {
            return Ok(());
        }
        log::warn!("Creating {}", self.output_dir.display());
        fs::create_dir_all(&self.output_dir).map_err(|source| OrganizeError::OutputWrite {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Sidecar first, then the video, then descriptor cleanup.
    fn write_outputs(&self, record: &VideoRecord) -> OrganizeResult<()> {
        let paths = OutputPaths::resolve(&self.output_dir, &self.library_name, record)
            .map_err(|e| OrganizeError::store(format!("naming {}", record.id), e))?;

        sidecar::write(&paths.sidecar, record).map_err(|source| OrganizeError::OutputWrite {
            path: paths.sidecar.clone(),
            source,
        })?;
        log::info!("Created {}", paths.sidecar.display());

        let from = &record.download_file;
        let relocated = match self.transfer {
            Transfer::Copy => copy_preserving_mtime(from, &paths.video),
            Transfer::Move => move_file(from, &paths.video),
        };
        relocated.map_err(|source| OrganizeError::Relocation {
            from: from.clone(),
            to: paths.video.clone(),
            source,
        })?;

        match self.transfer {
            Transfer::Copy => log::info!("Copied to {}", paths.video.display()),
            Transfer::Move => {
                log::info!("Moved to {}", paths.video.display());
                if let Some(descriptor) = &record.descriptor_file {
                    remove_descriptor(descriptor);
                }
            }
        }

        Ok(())
    }
}

/// Whether two paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn copy_preserving_mtime(from: &Path, to: &Path) -> io::Result<()> {
    if same_file(from, to) {
        return Ok(());
    }
    fs::copy(from, to)?;
    let modified = fs::metadata(from)?.modified()?;
    filetime::set_file_mtime(to, FileTime::from_system_time(modified))
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if same_file(from, to) {
        return Ok(());
    }
    if let Err(e) = fs::rename(from, to) {
        log::debug!(
            "Rename of {} failed ({e}); copying instead",
            from.display()
        );
        copy_preserving_mtime(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

fn remove_descriptor(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed descriptor {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove descriptor {}: {e}", path.display()),
    }
}
