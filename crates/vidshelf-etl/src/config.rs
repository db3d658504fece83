use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Configuration for vidshelf.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (VIDSHELF_* prefix)
/// 3. Config file (~/.config/vidshelf/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the catalog database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/catalog.db
    /// - ENV: VIDSHELF_DATABASE_PATH
    /// - Config: database_path = "/path/to/catalog.db"
    /// - Default: ~/.local/share/vidshelf/catalog.db
    pub database_path: PathBuf,

    /// Name prefixed to every organized file. Defaults to the input
    /// directory's name.
    pub library_name: Option<String>,

    /// Log file written at debug level alongside console output.
    pub log_file: Option<PathBuf>,

    /// Console log level when RUST_LOG is not set.
    pub log_level: String,

    /// Copy videos into the library instead of moving them.
    #[serde(deserialize_with = "flag")]
    pub copy_only: bool,

    /// Keep the staging store in a temporary database next to the catalog.
    #[serde(deserialize_with = "flag")]
    pub staging_on_disk: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            library_name: None,
            log_file: None,
            log_level: "info".to_string(),
            copy_only: false,
            staging_on_disk: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("vidshelf");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration, then apply the --db CLI flag.
    pub fn load_with_db_path(db_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load()?;
        if let Some(path) = db_path {
            config.database_path = path;
        }
        Ok(config)
    }

    /// Key/value pairs for `config show`.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let unset = || "(unset)".to_string();
        vec![
            ("database_path", self.database_path.display().to_string()),
            (
                "library_name",
                self.library_name.clone().unwrap_or_else(unset),
            ),
            (
                "log_file",
                self.log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(unset),
            ),
            ("log_level", self.log_level.clone()),
            ("copy_only", self.copy_only.to_string()),
            ("staging_on_disk", self.staging_on_disk.to_string()),
        ]
    }
}

/// A boolean setting, given either as a TOML bool (config file) or as a
/// string (environment variables arrive as strings).
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!(
                "expected a boolean, found {other:?}"
            ))),
        },
    }
}

/// Get the default catalog path.
///
/// Returns: ~/.local/share/vidshelf/catalog.db (or platform equivalent)
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidshelf")
        .join("catalog.db")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/vidshelf/config.toml
/// - macOS: ~/Library/Application Support/vidshelf/config.toml
/// - Windows: %APPDATA%\vidshelf\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidshelf")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Vidshelf Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (VIDSHELF_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the catalog database
#
# The catalog remembers every video ever organized and the episode number
# it was given. Keep it across runs.
#
# Can also be set via:
# - CLI: vidshelf --db /custom/catalog.db organize ...
# - Environment: VIDSHELF_DATABASE_PATH=/custom/catalog.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/catalog.db"

# Name prefixed to every organized file
#
# Default: the name of the input directory
#library_name = "My Channel"

# Debug-level log file, rotated when it grows past 1 MiB
#log_file = "/path/to/vidshelf.log"

# Console log level (overridden by RUST_LOG)
log_level = "info"

# Copy videos instead of moving them; descriptors are left in place
copy_only = false

# Stage the run in a temporary database next to the catalog
staging_on_disk = false
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
