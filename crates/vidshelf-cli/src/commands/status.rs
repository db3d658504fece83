use anyhow::Result;
use vidshelf_core::VideoStore;
use vidshelf_etl::{open_catalog, Config};

pub fn show_status(config: &Config) -> Result<()> {
    let db_path = &config.database_path;
    if !db_path.exists() {
        println!("\nNo catalog at {}", db_path.display());
        println!("\n  Run `vidshelf organize` to create it");
        return Ok(());
    }

    let catalog = open_catalog(db_path)?;
    let seasons = catalog.season_summaries()?;

    println!("\n📼 Vidshelf Status\n");
    println!("  Catalog: {}", db_path.display());
    println!("  Videos: {}", catalog.count()?);

    if !seasons.is_empty() {
        println!();
        for season in seasons {
            println!(
                "  Season {}: {} videos, last episode {}",
                season.season, season.videos, season.highest_episode
            );
        }
    }

    Ok(())
}
