pub mod config;
pub mod organize;
pub mod status;

pub use organize::{run_organize, OrganizeArgs};
pub use status::show_status;

use anyhow::{Context, Result};
use std::path::Path;

/// Make sure the directory holding the catalog exists.
fn ensure_catalog_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}
