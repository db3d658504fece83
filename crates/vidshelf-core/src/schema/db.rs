use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{Episode, Season, VideoRecord};
use crate::store::{SeasonSummary, VideoStore};

use super::migrations::MIGRATIONS;

const COLUMNS: &str = "id, title, source_url, channel_url, upload_date, season, episode, \
                       description, download_file, descriptor_file";

/// A [`VideoStore`] persisted in SQLite.
///
/// Opening a store does not touch the schema; callers check
/// [`is_initialized`](Self::is_initialized) and call
/// [`initialize`](Self::initialize) on first use.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    location: String,
}

impl SqliteStore {
    /// Open (or create) a database file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        log::debug!("Opened SQLite store at {}", path.display());
        Ok(Self {
            conn,
            location: path.display().to_string(),
        })
    }

    /// Open an initialized in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self {
            conn,
            location: String::from(":memory:"),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Where this store lives, for log messages.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Whether every bundled migration has been applied.
    pub fn is_initialized(&self) -> Result<bool> {
        let tracked: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if tracked.is_none() {
            return Ok(false);
        }

        let applied = self.applied_versions()?;
        Ok(MIGRATIONS.iter().all(|m| applied.contains(&m.version)))
    }

    /// Apply pending migrations.
    ///
    /// Each migration runs in its own transaction, so a failure leaves the
    /// schema at the last complete version rather than half-built.
    pub fn initialize(&mut self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let applied = self.applied_versions()?;

        for migration in MIGRATIONS {
            if applied.contains(&migration.version) {
                continue;
            }
            log::info!(
                "Applying migration {} ({}) to {}",
                migration.version,
                migration.name,
                self.location
            );
            let tx = self.conn.transaction()?;
            tx.execute_batch(migration.sql)
                .and_then(|()| {
                    tx.execute(
                        "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                        rusqlite::params![migration.version, migration.name],
                    )
                })
                .map_err(|e| {
                    Error::Schema(format!(
                        "migration {} ({}) failed: {e}",
                        migration.version, migration.name
                    ))
                })?;
            tx.commit()?;
        }

        Ok(())
    }

    fn applied_versions(&self) -> Result<Vec<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<u32>>>()?;
        Ok(applied)
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<VideoRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map(params, row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

impl VideoStore for SqliteStore {
    fn lookup(&self, id: &str) -> Result<Option<VideoRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM videos WHERE id = ?1"),
                [id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn insert(&mut self, record: &VideoRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO videos (
                    id, title, source_url, channel_url, upload_date, season, episode,
                    description, download_file, descriptor_file
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    record.id,
                    record.title,
                    record.source_url,
                    record.channel_url,
                    record.release_date(),
                    record.season,
                    record.episode,
                    record.description,
                    record.download_file.to_string_lossy().as_ref(),
                    record
                        .descriptor_file
                        .as_ref()
                        .map(|p| p.to_string_lossy().into_owned()),
                ],
            )
            .map_err(|e| constraint_error(e, record))?;
        Ok(())
    }

    fn update(&mut self, record: &VideoRecord) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE videos SET
                    title = ?2, source_url = ?3, channel_url = ?4, upload_date = ?5,
                    season = ?6, episode = ?7, description = ?8, download_file = ?9,
                    descriptor_file = ?10
                 WHERE id = ?1",
                rusqlite::params![
                    record.id,
                    record.title,
                    record.source_url,
                    record.channel_url,
                    record.release_date(),
                    record.season,
                    record.episode,
                    record.description,
                    record.download_file.to_string_lossy().as_ref(),
                    record
                        .descriptor_file
                        .as_ref()
                        .map(|p| p.to_string_lossy().into_owned()),
                ],
            )
            .map_err(|e| constraint_error(e, record))?;

        if changed == 0 {
            return Err(Error::NotFound {
                entity: "video",
                id: record.id.clone(),
            });
        }
        Ok(())
    }

    fn highest_episode(&self, season: Season) -> Result<Episode> {
        let highest: Option<Episode> = self.conn.query_row(
            "SELECT MAX(episode) FROM videos WHERE season = ?1",
            [season],
            |row| row.get(0),
        )?;
        Ok(highest.unwrap_or(0))
    }

    fn seasons_needing_numbering(&self) -> Result<Vec<Season>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT season FROM videos WHERE episode IS NULL ORDER BY season",
        )?;
        let seasons = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<Season>>>()?;
        Ok(seasons)
    }

    fn records_needing_numbering(&self, season: Season) -> Result<Vec<VideoRecord>> {
        self.query_records(
            &format!(
                "SELECT {COLUMNS} FROM videos
                 WHERE episode IS NULL AND season = ?1
                 ORDER BY upload_date, id"
            ),
            [season],
        )
    }

    fn all_records(&self) -> Result<Vec<VideoRecord>> {
        self.query_records(
            &format!("SELECT {COLUMNS} FROM videos ORDER BY rowid"),
            rusqlite::params![],
        )
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|e| Error::InvalidData(format!("row count {count}: {e}")))
    }

    fn season_summaries(&self) -> Result<Vec<SeasonSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT season, COUNT(*), COALESCE(MAX(episode), 0)
             FROM videos
             GROUP BY season
             ORDER BY season",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Season>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Episode>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(season, videos, highest_episode)| {
                let videos = usize::try_from(videos)
                    .map_err(|e| Error::InvalidData(format!("row count {videos}: {e}")))?;
                Ok(SeasonSummary {
                    season,
                    videos,
                    highest_episode,
                })
            })
            .collect()
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<VideoRecord> {
    let upload_date: String = row.get(4)?;
    let upload_date = NaiveDate::parse_from_str(&upload_date, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let download_file: String = row.get(8)?;
    let descriptor_file: Option<String> = row.get(9)?;

    Ok(VideoRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        source_url: row.get(2)?,
        channel_url: row.get(3)?,
        upload_date,
        season: row.get(5)?,
        episode: row.get(6)?,
        description: row.get(7)?,
        download_file: PathBuf::from(download_file),
        descriptor_file: descriptor_file.map(PathBuf::from),
    })
}

/// Translate SQLite constraint failures into the store's integrity errors.
fn constraint_error(err: rusqlite::Error, record: &VideoRecord) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY {
            return Error::DuplicateKey {
                id: record.id.clone(),
            };
        }
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            if let Some(episode) = record.episode {
                return Error::EpisodeConflict {
                    season: record.season,
                    episode,
                };
            }
        }
    }
    Error::Database(err)
}
