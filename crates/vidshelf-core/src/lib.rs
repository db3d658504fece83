//! Core domain model for vidshelf.
//!
//! This crate defines the [`VideoRecord`](model::VideoRecord) unit of work,
//! the [`VideoStore`](store::VideoStore) interface shared by the run-scoped
//! staging store and the durable catalog, the SQLite schema, and the
//! filename/sidecar conventions of the organized library.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod naming;
pub mod schema;
pub mod sidecar;
pub mod store;

pub use error::{Error, Result};
pub use model::{Episode, Season, VideoRecord};
pub use schema::SqliteStore;
pub use store::{MemoryStore, SeasonSummary, VideoStore};
