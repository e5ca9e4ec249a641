//! Cache directory housekeeping.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Suffix curl writes to until a download completes
const PART_SUFFIX: &str = ".part";

/// Remove every `*.part` file directly under `dir`. Returns how many were removed.
pub fn remove_partial_downloads(dir: &Path) -> Result<usize> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read cache directory {}", dir.display()))?;

    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        let is_part = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(PART_SUFFIX));
        if is_part && path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            println!("  removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
