use crate::config::Config;
use crate::state::{JsonRosterStore, ModRegistry};
use crate::Result;
use colored::Colorize;

/// Print the server launch mod-line for the tracked roster
pub fn run(config: &Config, prefix: &str) -> Result<()> {
    let store = JsonRosterStore::load(config.roster_path())?;
    let registry = ModRegistry::load(Box::new(store))?;

    if registry.is_empty() {
        println!("{}", "No mods tracked.".yellow());
        return Ok(());
    }

    println!("{}", registry.render_modline(prefix));
    Ok(())
}
