use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::model::{Episode, Season, VideoRecord};
use crate::store::VideoStore;

/// A [`VideoStore`] held entirely in process memory.
///
/// This is the default staging store: it lives for one run and is dropped
/// with it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<VideoRecord>,
    index: HashMap<String, usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_taken(&self, record: &VideoRecord) -> Option<Episode> {
        let episode = record.episode?;
        self.records
            .iter()
            .any(|other| {
                other.id != record.id
                    && other.season == record.season
                    && other.episode == Some(episode)
            })
            .then_some(episode)
    }
}

impl VideoStore for MemoryStore {
    fn lookup(&self, id: &str) -> Result<Option<VideoRecord>> {
        Ok(self.index.get(id).map(|&pos| self.records[pos].clone()))
    }

    fn insert(&mut self, record: &VideoRecord) -> Result<()> {
        if self.index.contains_key(&record.id) {
            return Err(Error::DuplicateKey {
                id: record.id.clone(),
            });
        }
        if let Some(episode) = self.slot_taken(record) {
            return Err(Error::EpisodeConflict {
                season: record.season,
                episode,
            });
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record.clone());
        Ok(())
    }

    fn update(&mut self, record: &VideoRecord) -> Result<()> {
        let Some(&pos) = self.index.get(&record.id) else {
            return Err(Error::NotFound {
                entity: "video",
                id: record.id.clone(),
            });
        };
        if let Some(episode) = self.slot_taken(record) {
            return Err(Error::EpisodeConflict {
                season: record.season,
                episode,
            });
        }
        self.records[pos] = record.clone();
        Ok(())
    }

    fn highest_episode(&self, season: Season) -> Result<Episode> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.season == season)
            .filter_map(|r| r.episode)
            .max()
            .unwrap_or(0))
    }

    fn seasons_needing_numbering(&self) -> Result<Vec<Season>> {
        let seasons: BTreeSet<Season> = self
            .records
            .iter()
            .filter(|r| !r.is_numbered())
            .map(|r| r.season)
            .collect();
        Ok(seasons.into_iter().collect())
    }

    fn records_needing_numbering(&self, season: Season) -> Result<Vec<VideoRecord>> {
        let mut pending: Vec<VideoRecord> = self
            .records
            .iter()
            .filter(|r| r.season == season && !r.is_numbered())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.upload_date.cmp(&b.upload_date).then_with(|| a.id.cmp(&b.id)));
        Ok(pending)
    }

    fn all_records(&self) -> Result<Vec<VideoRecord>> {
        Ok(self.records.clone())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}
