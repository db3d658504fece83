/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per video; the same table backs the catalog and on-disk staging
CREATE TABLE IF NOT EXISTS videos (
    id TEXT PRIMARY KEY,
    source_url TEXT NOT NULL,
    channel_url TEXT NOT NULL,
    upload_date TEXT NOT NULL,
    season INTEGER NOT NULL,
    episode INTEGER CHECK (episode IS NULL OR episode > 0),
    title TEXT NOT NULL,
    description TEXT,
    download_file TEXT NOT NULL,
    descriptor_file TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- NULL episodes (not yet numbered) are exempt from uniqueness
CREATE UNIQUE INDEX IF NOT EXISTS idx_videos_season_episode ON videos(season, episode);
CREATE INDEX IF NOT EXISTS idx_videos_pending ON videos(season, upload_date) WHERE episode IS NULL;
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
