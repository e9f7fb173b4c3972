use crate::config::Config;
use crate::state::{JsonRosterStore, ModRegistry};
use crate::Result;
use colored::Colorize;
use dialoguer::Confirm;

/// Drop every tracked mod from the roster store
pub fn run(config: &Config, yes: bool) -> Result<()> {
    let store = JsonRosterStore::load(config.roster_path())?;
    let mut registry = ModRegistry::load(Box::new(store))?;

    if registry.is_empty() {
        println!("{}", "Roster is already empty.".yellow());
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove all {} tracked mod(s) from the roster?",
                registry.len()
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    registry.clear()?;
    println!("{}", "Roster cleared.".green());

    Ok(())
}
