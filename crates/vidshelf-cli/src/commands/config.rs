use anyhow::{Context, Result};
use vidshelf_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    for (key, value) in config.describe() {
        println!("  {key}: {value}");
    }

    println!("\nPriority: CLI args > ENV vars (VIDSHELF_*) > Config file > Defaults");

    Ok(())
}

/// Print one effective configuration value.
pub fn get_config(config: &Config, key: &str) -> Result<()> {
    let settings = config.describe();
    let value = settings
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
        .with_context(|| {
            let valid: Vec<&str> = settings.iter().map(|(name, _)| *name).collect();
            format!("Unknown config key: {key}\n\nValid keys: {}", valid.join(", "))
        })?;
    println!("{value}");
    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure vidshelf.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
