use crate::config::Config;
use crate::state::{JsonRosterStore, ModRegistry};
use crate::sync::{ConsoleProgress, ModUpdater};
use crate::Result;
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Run the full synchronization pipeline
pub async fn run(config: &Config, account: Option<String>, secret: Option<String>) -> Result<()> {
    let account = account.unwrap_or_else(|| config.account.clone());
    let secret = secret.unwrap_or_else(|| config.secret.clone());

    if account.is_empty() {
        anyhow::bail!("No steam account configured. Set 'account' in the config or pass --account.");
    }

    let store = JsonRosterStore::load(config.roster_path())?;
    let registry = ModRegistry::load(Box::new(store))?;

    if registry.is_empty() {
        println!(
            "{}",
            "Roster is empty. Import a launcher preset first: modsync import <file>".yellow()
        );
        return Ok(());
    }

    let registry = Arc::new(Mutex::new(registry));
    let progress = Arc::new(ConsoleProgress::new());

    let updater = ModUpdater::new(
        config.clone(),
        Arc::clone(&registry),
        Arc::clone(&progress) as Arc<dyn crate::sync::ProgressSink>,
    );
    let outcome = updater.run(&account, &secret).await;
    progress.finish();
    outcome?;

    println!();
    println!("{}", "Mod update status".bold());
    let listing = registry.lock().await.render_listing();
    if !listing.is_empty() {
        println!("{}", listing);
    }

    Ok(())
}
