//! Staging: descriptors in, un-numbered (or already catalogued) records out.

use std::path::{Path, PathBuf};

use vidshelf_core::{Error, VideoRecord, VideoStore};

use crate::descriptor;
use crate::error::{OrganizeError, OrganizeResult};
use crate::scan;

/// Counts from one ingest pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Descriptor files found.
    pub descriptors: usize,
    /// Staged videos not yet in the catalog.
    pub new_videos: usize,
    /// Staged videos the catalog already knows.
    pub known_videos: usize,
    pub malformed: usize,
    pub missing_source: usize,
    /// Descriptors repeating an id staged earlier in this run.
    pub duplicates: usize,
}

impl IngestReport {
    /// Total records placed in staging.
    pub fn staged(&self) -> usize {
        self.new_videos + self.known_videos
    }
}

/// Loads every descriptor under an input directory into a staging store.
#[derive(Debug)]
pub struct IngestStage {
    input_dir: PathBuf,
}

impl IngestStage {
    #[must_use]
    pub fn new(input_dir: PathBuf) -> Self {
        Self { input_dir }
    }

    /// Scan the input directory and stage what is found.
    pub fn run(
        &self,
        catalog: &impl VideoStore,
        staging: &mut impl VideoStore,
    ) -> OrganizeResult<IngestReport> {
        log::info!("Scanning {} for descriptors", self.input_dir.display());
        let descriptors = scan::find_descriptors(&self.input_dir);
        log::info!("Descriptor files found: {}", descriptors.len());
        stage_descriptors(&descriptors, catalog, staging)
    }
}

/// Stage the given descriptor files.
///
/// A descriptor for a catalogued id is replaced by the catalog's record
/// (keeping the fresh file locations). Malformed descriptors, missing source
/// videos and repeated ids are logged and skipped; store failures stop the
/// run.
pub fn stage_descriptors(
    descriptors: &[PathBuf],
    catalog: &impl VideoStore,
    staging: &mut impl VideoStore,
) -> OrganizeResult<IngestReport> {
    let mut report = IngestReport {
        descriptors: descriptors.len(),
        ..IngestReport::default()
    };

    for (n, path) in descriptors.iter().enumerate() {
        log::info!(
            "Loading descriptor {} of {}: {}",
            n + 1,
            descriptors.len(),
            path.display()
        );

        let fresh = match load_with_source(path) {
            Ok(record) => record,
            Err(e @ OrganizeError::MalformedDescriptor { .. }) => {
                log::warn!("Skipping: {e}");
                report.malformed += 1;
                continue;
            }
            Err(e @ OrganizeError::MissingSourceFile { .. }) => {
                log::warn!("Skipping: {e}");
                report.missing_source += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let known = catalog
            .lookup(&fresh.id)
            .map_err(|e| OrganizeError::store(format!("catalog lookup of {}", fresh.id), e))?;

        let record = match &known {
            Some(catalogued) => {
                log::info!(
                    "{} is already catalogued; descriptor metadata ignored",
                    catalogued
                );
                VideoRecord::merge(catalogued, &fresh)
            }
            None => {
                log::debug!("{fresh} is new");
                fresh
            }
        };

        match staging.insert(&record) {
            Ok(()) => {}
            Err(Error::DuplicateKey { id }) => {
                log::warn!(
                    "Skipping {}: video {id} was already staged from another descriptor",
                    path.display()
                );
                report.duplicates += 1;
                continue;
            }
            Err(e) => {
                return Err(OrganizeError::store(
                    format!("staging insert of {}", record.id),
                    e,
                ))
            }
        }

        if known.is_some() {
            report.known_videos += 1;
        } else {
            report.new_videos += 1;
        }
    }

    log::info!(
        "Staged {} videos ({} new, {} already catalogued); skipped {} malformed, {} missing, {} duplicate",
        report.staged(),
        report.new_videos,
        report.known_videos,
        report.malformed,
        report.missing_source,
        report.duplicates
    );

    Ok(report)
}

/// Load a descriptor and check that its video is on disk.
///
/// Videos without a file are never staged, so they are never numbered and
/// cannot leave a gap in their season.
fn load_with_source(path: &Path) -> OrganizeResult<VideoRecord> {
    let record = descriptor::load(path)?;
    if !record.download_file.is_file() {
        return Err(OrganizeError::MissingSourceFile {
            id: record.id,
            path: record.download_file,
        });
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use vidshelf_core::MemoryStore;

    fn add_video(dir: &Path, id: &str, date: &str, with_file: bool) -> PathBuf {
        let video = dir.join(format!("{id}.mp4"));
        if with_file {
            fs::write(&video, b"video").unwrap();
        }
        let descriptor = dir.join(format!("{id}.info.json"));
        let value = json!({
            "id": id,
            "webpage_url": format!("https://example.com/watch?v={id}"),
            "channel_url": "https://example.com/channel/abc",
            "upload_date": date,
            "title": format!("Fresh {id}"),
            "_filename": video,
        });
        fs::write(&descriptor, value.to_string()).unwrap();
        descriptor
    }

    #[test]
    fn test_stages_new_videos() {
        let dir = TempDir::new().unwrap();
        let a = add_video(dir.path(), "a", "20210301", true);
        let b = add_video(dir.path(), "b", "20200115", true);

        let catalog = MemoryStore::new();
        let mut staging = MemoryStore::new();
        let report = stage_descriptors(&[a, b], &catalog, &mut staging).unwrap();

        assert_eq!(report.new_videos, 2);
        assert_eq!(report.staged(), 2);
        assert_eq!(staging.seasons_needing_numbering().unwrap(), vec![2020, 2021]);
    }

    #[test]
    fn test_skips_malformed_and_missing() {
        let dir = TempDir::new().unwrap();
        let good = add_video(dir.path(), "good", "20210301", true);
        let missing = add_video(dir.path(), "missing", "20210302", false);
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "[]").unwrap();

        let catalog = MemoryStore::new();
        let mut staging = MemoryStore::new();
        let report =
            stage_descriptors(&[broken, good, missing], &catalog, &mut staging).unwrap();

        assert_eq!(report.descriptors, 3);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.missing_source, 1);
        assert_eq!(report.new_videos, 1);
        assert!(staging.lookup("missing").unwrap().is_none());
    }

    #[test]
    fn test_catalogued_video_uses_catalog_record() {
        let dir = TempDir::new().unwrap();
        let descriptor = add_video(dir.path(), "known", "20210301", true);

        let mut catalog = MemoryStore::new();
        let mut catalogued = VideoRecord::new(
            "known",
            "Catalog Title",
            "https://example.com/watch?v=known",
            "https://example.com/channel/abc",
            NaiveDate::from_ymd_opt(2020, 5, 5).unwrap(),
            PathBuf::from("/long/gone.mp4"),
        );
        catalogued.assign_episode(5).unwrap();
        catalog.insert(&catalogued).unwrap();

        let mut staging = MemoryStore::new();
        let report = stage_descriptors(&[descriptor.clone()], &catalog, &mut staging).unwrap();
        assert_eq!(report.known_videos, 1);
        assert_eq!(report.new_videos, 0);

        let staged = staging.lookup("known").unwrap().unwrap();
        assert_eq!(staged.title, "Catalog Title");
        assert_eq!(staged.season, 2020);
        assert_eq!(staged.episode, Some(5));
        assert_eq!(staged.download_file, dir.path().join("known.mp4"));
        assert_eq!(staged.descriptor_file, Some(descriptor));
        assert!(staging.seasons_needing_numbering().unwrap().is_empty());
    }

    #[test]
    fn test_repeated_id_is_skipped() {
        let dir = TempDir::new().unwrap();
        let first = add_video(dir.path(), "dup", "20210301", true);
        let copy = dir.path().join("copy.info.json");
        fs::copy(&first, &copy).unwrap();

        let catalog = MemoryStore::new();
        let mut staging = MemoryStore::new();
        let report = stage_descriptors(&[first, copy], &catalog, &mut staging).unwrap();

        assert_eq!(report.new_videos, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(staging.count().unwrap(), 1);
    }

    #[test]
    fn test_ingest_stage_scans_input_dir() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("channel");
        fs::create_dir_all(&sub).unwrap();
        add_video(&sub, "a", "20210301", true);

        let catalog = MemoryStore::new();
        let mut staging = MemoryStore::new();
        let report = IngestStage::new(dir.path().to_path_buf())
            .run(&catalog, &mut staging)
            .unwrap();
        assert_eq!(report.descriptors, 1);
        assert_eq!(report.new_videos, 1);
    }
}
