//! Run stages for vidshelf.
//!
//! A run scans an input tree for descriptors, stages them against the
//! catalog, numbers new videos per season, and materializes them into the
//! output library.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod ingest;
pub mod materialize;
pub mod number;
pub mod pipeline;
pub mod scan;

pub use config::Config;
pub use error::{OrganizeError, OrganizeResult};
pub use ingest::{IngestReport, IngestStage};
pub use materialize::{MaterializeReport, MaterializeStage, Transfer};
pub use number::{assign_episodes, SeasonAssignment};
pub use pipeline::{open_catalog, open_disk_staging, organize, RunOptions, RunSummary};
