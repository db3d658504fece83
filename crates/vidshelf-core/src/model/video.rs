use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// The four-digit upload year used as the grouping key for numbering.
pub type Season = i32;

/// A per-season sequential number, starting at 1.
pub type Episode = u32;

/// A single video moving through a run.
///
/// Created from a descriptor file or reconstructed from a catalog row. The
/// only mutation a record ever sees is having its `episode` filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    /// Stable identifier assigned by the upstream source.
    pub id: String,

    /// Human-readable title; may contain characters unsafe for filenames.
    pub title: String,

    pub source_url: String,

    pub channel_url: String,

    pub upload_date: NaiveDate,

    /// Derived from `upload_date` when the record is created.
    pub season: Season,

    /// `None` until assigned by the numbering step.
    pub episode: Option<Episode>,

    /// Free text from the upload source. Stored, never written to sidecars.
    pub description: Option<String>,

    /// Location of the video file when the descriptor was loaded.
    pub download_file: PathBuf,

    /// The descriptor this record was loaded from, if any.
    pub descriptor_file: Option<PathBuf>,
}

impl VideoRecord {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source_url: impl Into<String>,
        channel_url: impl Into<String>,
        upload_date: NaiveDate,
        download_file: PathBuf,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source_url: source_url.into(),
            channel_url: channel_url.into(),
            upload_date,
            season: upload_date.year(),
            episode: None,
            description: None,
            download_file,
            descriptor_file: None,
        }
    }

    #[must_use]
    pub fn with_descriptor_file(mut self, path: PathBuf) -> Self {
        self.descriptor_file = Some(path);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether an episode number has been assigned.
    #[must_use]
    pub const fn is_numbered(&self) -> bool {
        self.episode.is_some()
    }

    /// Assign the episode number. A number, once given, is never replaced.
    pub fn assign_episode(&mut self, episode: Episode) -> Result<()> {
        if episode == 0 {
            return Err(Error::InvalidData(format!(
                "episode numbers start at 1 (video {})",
                self.id
            )));
        }
        if let Some(existing) = self.episode {
            return Err(Error::InvalidData(format!(
                "video {} already numbered as episode {existing}",
                self.id
            )));
        }
        self.episode = Some(episode);
        Ok(())
    }

    /// Upload date as `YYYY-MM-DD`.
    #[must_use]
    pub fn release_date(&self) -> String {
        self.upload_date.format("%Y-%m-%d").to_string()
    }

    /// Combine a catalogued record with a freshly loaded one for the same id.
    ///
    /// Metadata, season and episode come from `catalog`; the current file
    /// locations (`download_file`, `descriptor_file`) come from `fresh`.
    #[must_use]
    pub fn merge(catalog: &Self, fresh: &Self) -> Self {
        Self {
            download_file: fresh.download_file.clone(),
            descriptor_file: fresh.descriptor_file.clone(),
            ..catalog.clone()
        }
    }
}

impl fmt::Display for VideoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.episode {
            Some(episode) => write!(
                f,
                "({}) {} [S{}E{episode:03}]",
                self.id, self.title, self.season
            ),
            None => write!(f, "({}) {} [S{}]", self.id, self.title, self.season),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, date: (i32, u32, u32)) -> VideoRecord {
        VideoRecord::new(
            id,
            "A Title",
            format!("https://example.com/watch?v={id}"),
            "https://example.com/channel/abc",
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            PathBuf::from(format!("/in/{id}.mp4")),
        )
    }

    #[test]
    fn test_season_derived_from_upload_date() {
        let record = sample("abc", (2021, 3, 1));
        assert_eq!(record.season, 2021);
        assert_eq!(record.release_date(), "2021-03-01");
        assert!(!record.is_numbered());
    }

    #[test]
    fn test_assign_episode_only_once() {
        let mut record = sample("abc", (2021, 3, 1));
        record.assign_episode(4).unwrap();
        assert_eq!(record.episode, Some(4));

        let err = record.assign_episode(5).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(record.episode, Some(4));
    }

    #[test]
    fn test_assign_episode_rejects_zero() {
        let mut record = sample("abc", (2021, 3, 1));
        assert!(record.assign_episode(0).is_err());
        assert!(!record.is_numbered());
    }

    #[test]
    fn test_merge_keeps_catalog_fields_and_fresh_locations() {
        let mut catalogued = sample("abc", (2020, 6, 1));
        catalogued.title = "Catalog Title".to_string();
        catalogued.assign_episode(7).unwrap();
        catalogued.descriptor_file = Some(PathBuf::from("/old/abc.json"));

        let mut fresh = sample("abc", (2021, 1, 1));
        fresh.title = "Renamed Upstream".to_string();
        fresh.download_file = PathBuf::from("/new/abc.mkv");
        fresh.descriptor_file = Some(PathBuf::from("/new/abc.json"));

        let merged = VideoRecord::merge(&catalogued, &fresh);
        assert_eq!(merged.title, "Catalog Title");
        assert_eq!(merged.season, 2020);
        assert_eq!(merged.episode, Some(7));
        assert_eq!(merged.download_file, PathBuf::from("/new/abc.mkv"));
        assert_eq!(merged.descriptor_file, Some(PathBuf::from("/new/abc.json")));

        // inputs are untouched
        assert_eq!(catalogued.download_file, PathBuf::from("/in/abc.mp4"));
        assert_eq!(fresh.episode, None);
    }

    #[test]
    fn test_display() {
        let mut record = sample("abc", (2021, 3, 1));
        assert_eq!(record.to_string(), "(abc) A Title [S2021]");
        record.assign_episode(12).unwrap();
        assert_eq!(record.to_string(), "(abc) A Title [S2021E012]");
    }
}
