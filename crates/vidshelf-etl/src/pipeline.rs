//! One organize run: ingest, number, materialize.

use std::fs;
use std::path::{Path, PathBuf};

use vidshelf_core::{SqliteStore, VideoStore};

use crate::error::{OrganizeError, OrganizeResult};
use crate::ingest::{IngestReport, IngestStage};
use crate::materialize::{MaterializeReport, MaterializeStage, Transfer};
use crate::number::{assign_episodes, SeasonAssignment};

/// Used when the input directory has no usable final component.
const FALLBACK_LIBRARY_NAME: &str = "Library";

/// File name of the on-disk staging store, placed next to the catalog.
pub const DISK_STAGING_FILE: &str = "staging.tmp.db";

/// What to organize and how.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Overrides the library name derived from `input_dir`.
    pub library_name: Option<String>,
    pub transfer: Transfer,
}

impl RunOptions {
    #[must_use]
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            library_name: None,
            transfer: Transfer::Move,
        }
    }

    #[must_use]
    pub fn with_library_name(mut self, name: Option<String>) -> Self {
        self.library_name = name;
        self
    }

    #[must_use]
    pub fn with_transfer(mut self, transfer: Transfer) -> Self {
        self.transfer = transfer;
        self
    }

    /// The name prefixed to every output file: the explicit override, or
    /// else the input directory's own name.
    pub fn library_name(&self) -> String {
        if let Some(name) = &self.library_name {
            return name.clone();
        }
        let dir = fs::canonicalize(&self.input_dir).unwrap_or_else(|_| self.input_dir.clone());
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_LIBRARY_NAME.to_string())
    }
}

/// Everything a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ingest: IngestReport,
    pub numbering: Vec<SeasonAssignment>,
    pub materialize: MaterializeReport,
}

/// Run the whole organize flow against the given stores.
///
/// `staging` should be empty; it is filled from the input directory and
/// may be discarded afterwards. `catalog` only ever gains records.
pub fn organize(
    options: &RunOptions,
    catalog: &mut impl VideoStore,
    staging: &mut impl VideoStore,
) -> OrganizeResult<RunSummary> {
    let library_name = options.library_name();
    log::info!("In directory : {}", options.input_dir.display());
    log::info!("Out directory: {}", options.output_dir.display());
    log::info!("Library name : {library_name}");
    log::info!("Transfer     : {:?}", options.transfer);

    let ingest = IngestStage::new(options.input_dir.clone()).run(catalog, staging)?;
    let numbering = assign_episodes(catalog, staging)?;
    let materialize = MaterializeStage::new(
        options.output_dir.clone(),
        library_name,
        options.transfer,
    )
    .run(catalog, staging)?;

    Ok(RunSummary {
        ingest,
        numbering,
        materialize,
    })
}

/// Open the catalog, creating its schema on first use.
pub fn open_catalog(path: &Path) -> OrganizeResult<SqliteStore> {
    let context = || format!("catalog {}", path.display());

    let mut catalog = SqliteStore::open(path).map_err(|e| OrganizeError::store(context(), e))?;
    let ready = catalog
        .is_initialized()
        .map_err(|e| OrganizeError::store(context(), e))?;
    if !ready {
        log::warn!("Initializing catalog {}", path.display());
        catalog
            .initialize()
            .map_err(|e| OrganizeError::store(context(), e))?;
    }

    log::info!("Connected to catalog {}", catalog.location());
    Ok(catalog)
}

/// Where the on-disk staging store goes for a given catalog.
pub fn disk_staging_path(catalog_path: &Path) -> PathBuf {
    catalog_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(DISK_STAGING_FILE)
}

/// Open a fresh on-disk staging store, discarding any left by an earlier run.
pub fn open_disk_staging(path: &Path) -> OrganizeResult<SqliteStore> {
    let context = || format!("staging {}", path.display());

    if path.exists() {
        log::debug!("Removing {}", path.display());
        fs::remove_file(path).map_err(|e| OrganizeError::store(context(), e.into()))?;
    }

    let mut staging = SqliteStore::open(path).map_err(|e| OrganizeError::store(context(), e))?;
    staging
        .initialize()
        .map_err(|e| OrganizeError::store(context(), e))?;
    log::info!("Staging on disk: {}", staging.location());
    Ok(staging)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vidshelf_core::MemoryStore;

    #[test]
    fn test_library_name_from_input_dir() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("SomeChannel");
        fs::create_dir_all(&input).unwrap();

        let options = RunOptions::new(input, temp_dir.path().join("out"));
        assert_eq!(options.library_name(), "SomeChannel");

        let options = options.with_library_name(Some("Override".to_string()));
        assert_eq!(options.library_name(), "Override");
    }

    #[test]
    fn test_open_catalog_initializes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.db");

        let catalog = open_catalog(&path).unwrap();
        assert!(catalog.is_initialized().unwrap());
        drop(catalog);

        let catalog = open_catalog(&path).unwrap();
        assert_eq!(catalog.count().unwrap(), 0);
    }

    #[test]
    fn test_open_catalog_in_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no/such/dir/catalog.db");

        let err = open_catalog(&path).unwrap_err();
        assert!(matches!(err, OrganizeError::StoreUnavailable { .. }));
    }

    #[test]
    fn test_disk_staging_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = disk_staging_path(&temp_dir.path().join("catalog.db"));
        assert_eq!(path, temp_dir.path().join(DISK_STAGING_FILE));

        fs::write(&path, b"left over from a crashed run").unwrap();
        let staging = open_disk_staging(&path).unwrap();
        assert_eq!(staging.count().unwrap(), 0);
    }

    #[test]
    fn test_organize_empty_input() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in");
        fs::create_dir_all(&input).unwrap();
        let options = RunOptions::new(input, temp_dir.path().join("out"));

        let mut catalog = MemoryStore::new();
        let mut staging = MemoryStore::new();
        let summary = organize(&options, &mut catalog, &mut staging).unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(!temp_dir.path().join("out").exists());
    }
}
