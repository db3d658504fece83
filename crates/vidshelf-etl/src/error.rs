//! Error taxonomy for a run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while organizing a library.
///
/// The first two are per-video problems: they are logged and the run moves
/// on. Everything else stops the run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// A descriptor could not be read, parsed, or lacks a required field.
    #[error("malformed descriptor {}: {reason}", .path.display())]
    MalformedDescriptor { path: PathBuf, reason: String },

    /// The video a record points at is not on disk.
    #[error("source video for {id} missing: {}", .path.display())]
    MissingSourceFile { id: String, path: PathBuf },

    /// The catalog already holds this id.
    #[error("duplicate key: video {id} is already catalogued")]
    DuplicateKey { id: String },

    /// A store could not be opened, initialized, read or written.
    #[error("store unavailable ({context}): {source}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: vidshelf_core::Error,
    },

    /// Copying or moving a video into the library failed.
    #[error("failed to relocate {} to {}: {source}", .from.display(), .to.display())]
    Relocation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Creating the output directory or writing a sidecar failed.
    #[error("failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OrganizeError {
    /// Wrap a store error, keeping duplicate ids distinguishable.
    pub fn store(context: impl Into<String>, source: vidshelf_core::Error) -> Self {
        match source {
            vidshelf_core::Error::DuplicateKey { id } => Self::DuplicateKey { id },
            source => Self::StoreUnavailable {
                context: context.into(),
                source,
            },
        }
    }

    /// Returns `true` when the run can skip the affected video and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedDescriptor { .. } | Self::MissingSourceFile { .. }
        )
    }
}

/// Convenience alias for run results.
pub type OrganizeResult<T> = std::result::Result<T, OrganizeError>;
