use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vidshelf_etl::Config;

mod commands;
mod logging;

#[derive(Debug, Parser)]
#[command(name = "vidshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the catalog (default: ~/.local/share/vidshelf/catalog.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Also log to this file, at debug level
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Organize downloaded videos into the library
    ///
    /// Recursively walks the input directory for download-tool JSON
    /// descriptors. For each video not yet in the catalog:
    ///
    /// - Assigns the next episode number in its season (the upload year),
    ///   in upload-date order
    /// - Writes `<library> - S<season>E<episode> - <title>.<id>.metadata`
    ///   into the output directory
    /// - Moves (or with --copy, copies) the video next to it under the same
    ///   name
    /// - Records it in the catalog so it keeps that number forever
    ///
    /// Videos already in the catalog are written again under their existing
    /// name and are never renumbered. Malformed descriptors and missing
    /// video files are reported and skipped.
    Organize {
        /// Directory containing downloaded videos and their descriptors
        #[arg(short, long)]
        input: PathBuf,

        /// Library directory to write into
        #[arg(short, long)]
        output: PathBuf,

        /// Copy videos instead of moving them, and keep the descriptors
        #[arg(short, long)]
        copy: bool,

        /// Stage the run in a temporary database next to the catalog
        #[arg(long)]
        staging_on_disk: bool,

        /// Name prefixed to every file (default: the input directory's name)
        #[arg(long)]
        library_name: Option<String>,
    },
    /// Show catalog status by season
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print a single configuration value
    Get {
        /// Configuration key, e.g. database_path
        key: String,
    },
    /// Print the config file path
    Path,
    /// Create the config file with defaults
    Init,
    /// Print an example config file
    Example,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_db_path(cli.db)?;
    let log_file = cli.log_file.or_else(|| config.log_file.clone());
    let _guard = logging::init(&config.log_level, log_file.as_deref())?;

    tracing::info!("vidshelf {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Catalog: {}", config.database_path.display());
    if let Some(path) = &log_file {
        tracing::info!("Log file: {}", path.display());
    }

    let result = match cli.command {
        Commands::Organize {
            input,
            output,
            copy,
            staging_on_disk,
            library_name,
        } => commands::run_organize(
            &config,
            commands::OrganizeArgs {
                input,
                output,
                copy,
                staging_on_disk,
                library_name,
            },
        ),
        Commands::Status => commands::show_status(&config),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config),
            ConfigAction::Get { key } => commands::config::get_config(&config, &key),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Init => commands::config::init_config(),
            ConfigAction::Example => commands::config::show_example(),
        },
    };

    if let Err(e) = &result {
        tracing::error!("{e:#}");
    }
    result
}
