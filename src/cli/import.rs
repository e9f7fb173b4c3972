use crate::config::Config;
use crate::parser::parse_preset_rows;
use crate::state::{JsonRosterStore, ModRegistry};
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use std::path::Path;

/// Import a launcher preset document into the roster.
///
/// Add-only: items already tracked (by workshop id) are skipped, and items
/// missing from the document are never removed. A malformed row aborts the
/// import but keeps everything added before it.
pub async fn run(config: &Config, file: &Path) -> Result<()> {
    println!(
        "{}",
        format!("Importing preset '{}'...", file.display()).cyan()
    );

    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read preset '{}'", file.display()))?;

    let store = JsonRosterStore::load(config.roster_path())?;
    let mut registry = ModRegistry::load(Box::new(store))?;

    let mut added = 0usize;
    let mut skipped = 0usize;

    for row in parse_preset_rows(&html) {
        let entry = row.context("Preset import failed")?;

        if registry.add(&entry.folder, &entry.mod_id)? {
            println!("  + {} ({})", entry.folder, entry.mod_id);
            added += 1;
        } else {
            skipped += 1;
        }
    }

    println!(
        "{}",
        format!("Imported {} new mod(s), {} already tracked.", added, skipped).green()
    );

    Ok(())
}
