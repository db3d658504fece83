use thiserror::Error;

use crate::model::{Episode, Season};

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A record with this id is already stored.
    #[error("duplicate key: video {id} is already stored")]
    DuplicateKey { id: String },

    /// Another record already holds this season/episode slot.
    #[error("episode conflict: S{season}E{episode:03} is already taken")]
    EpisodeConflict { season: Season, episode: Episode },

    #[error("schema error: {0}")]
    Schema(String),
}

impl Error {
    /// Returns `true` for integrity violations (duplicate id or episode slot).
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. } | Self::EpisodeConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
