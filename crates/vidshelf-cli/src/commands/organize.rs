use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use vidshelf_core::MemoryStore;
use vidshelf_etl::pipeline::disk_staging_path;
use vidshelf_etl::{
    open_catalog, open_disk_staging, organize, Config, RunOptions, RunSummary, Transfer,
};

/// Flags given to `vidshelf organize`.
#[derive(Debug)]
pub struct OrganizeArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub copy: bool,
    pub staging_on_disk: bool,
    pub library_name: Option<String>,
}

pub fn run_organize(config: &Config, args: OrganizeArgs) -> Result<()> {
    if !args.input.is_dir() {
        bail!("Input directory {} does not exist", args.input.display());
    }

    let transfer = if args.copy || config.copy_only {
        Transfer::Copy
    } else {
        Transfer::Move
    };
    let options = RunOptions::new(args.input, args.output)
        .with_library_name(args.library_name.or_else(|| config.library_name.clone()))
        .with_transfer(transfer);

    super::ensure_catalog_dir(&config.database_path)?;
    let mut catalog = open_catalog(&config.database_path)?;

    let summary = if args.staging_on_disk || config.staging_on_disk {
        let mut staging = open_disk_staging(&disk_staging_path(&config.database_path))?;
        organize(&options, &mut catalog, &mut staging)
    } else {
        let mut staging = MemoryStore::new();
        organize(&options, &mut catalog, &mut staging)
    }
    .context("Organize run stopped")?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let ingest = &summary.ingest;
    let written = &summary.materialize;

    println!("\n✓ Organize complete\n");
    println!("  Descriptors found: {}", ingest.descriptors);
    println!("  New videos: {}", ingest.new_videos);
    println!("  Already catalogued: {}", ingest.known_videos);
    if ingest.malformed > 0 {
        println!("  ⚠ Malformed descriptors skipped: {}", ingest.malformed);
    }
    if ingest.missing_source + written.missing_source > 0 {
        println!(
            "  ⚠ Missing video files skipped: {}",
            ingest.missing_source + written.missing_source
        );
    }
    if ingest.duplicates > 0 {
        println!("  ⚠ Repeated ids skipped: {}", ingest.duplicates);
    }

    for assignment in &summary.numbering {
        println!(
            "  Season {}: episodes {}-{} ({} new)",
            assignment.season,
            assignment.first,
            assignment.last,
            assignment.count()
        );
    }

    println!("  Catalogued: {}", written.committed);
    println!("  Refreshed: {}", written.refreshed);
    if written.deferred > 0 {
        println!("  Deferred to next run: {}", written.deferred);
    }
}
