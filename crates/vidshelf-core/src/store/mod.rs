//! The keyed video collection shared by the staging store and the catalog.
//!
//! Both tiers speak [`VideoStore`]; they differ only in backing storage.
//! [`MemoryStore`] keeps everything in process memory, while
//! [`SqliteStore`](crate::schema::SqliteStore) persists to SQLite (a file
//! for the catalog, a file or `:memory:` for staging).

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{Episode, Season, VideoRecord};

mod memory;

pub use memory::MemoryStore;

/// Per-season totals, as reported by `vidshelf status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonSummary {
    pub season: Season,
    pub videos: usize,
    /// Highest assigned episode, `0` when none is numbered yet.
    pub highest_episode: Episode,
}

/// A keyed collection of [`VideoRecord`]s with season/episode queries.
///
/// Ordering guarantees are part of the contract: seasons come back
/// ascending, pending records by `(upload_date, id)`, and `all_records` in
/// insertion order.
pub trait VideoStore {
    /// Exact match by video id.
    fn lookup(&self, id: &str) -> Result<Option<VideoRecord>>;

    /// Store a new record. Fails with `Error::DuplicateKey` if the id is
    /// already present and `Error::EpisodeConflict` if its season/episode
    /// slot is taken.
    fn insert(&mut self, record: &VideoRecord) -> Result<()>;

    /// Overwrite the stored record with the same id.
    fn update(&mut self, record: &VideoRecord) -> Result<()>;

    /// Highest episode stored for `season`, or `0` when there is none.
    fn highest_episode(&self, season: Season) -> Result<Episode>;

    /// Distinct seasons having at least one un-numbered record, ascending.
    fn seasons_needing_numbering(&self) -> Result<Vec<Season>>;

    /// Un-numbered records of `season`, earliest upload first; equal dates
    /// are ordered by id.
    fn records_needing_numbering(&self, season: Season) -> Result<Vec<VideoRecord>>;

    /// Every stored record, in insertion order.
    fn all_records(&self) -> Result<Vec<VideoRecord>>;

    fn count(&self) -> Result<usize>;

    /// Per-season counts, ascending by season.
    fn season_summaries(&self) -> Result<Vec<SeasonSummary>> {
        let mut seasons: BTreeMap<Season, SeasonSummary> = BTreeMap::new();
        for record in self.all_records()? {
            let entry = seasons.entry(record.season).or_insert(SeasonSummary {
                season: record.season,
                videos: 0,
                highest_episode: 0,
            });
            entry.videos += 1;
            entry.highest_episode = entry.highest_episode.max(record.episode.unwrap_or(0));
        }
        Ok(seasons.into_values().collect())
    }
}
