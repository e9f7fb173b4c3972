use crate::config::Config;
use crate::state::{JsonRosterStore, ModRegistry};
use crate::Result;
use colored::Colorize;

/// Print the persisted roster
pub fn run(config: &Config) -> Result<()> {
    let store = JsonRosterStore::load(config.roster_path())?;
    let registry = ModRegistry::load(Box::new(store))?;

    if registry.is_empty() {
        println!("{}", "No mods tracked.".yellow());
        return Ok(());
    }

    println!("{}", format!("{} tracked mod(s)", registry.len()).bold());
    println!("{}", registry.render_listing());

    Ok(())
}
