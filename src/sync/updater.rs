//! The update pipeline: probe, script generation, two fetch phases,
//! post-processing, scratch cleanup.

use crate::config::Config;
use crate::models::{ModRecord, ModStatus};
use crate::state::ModRegistry;
use crate::sync::driver::FetchDriver;
use crate::sync::postprocess::PostProcessor;
use crate::sync::probe::StalenessProber;
use crate::sync::progress::{ProgressReporter, ProgressSink};
use crate::sync::runscript::{RunScripts, RunscriptBuilder};
use crate::sync::sink::{EventSink, UpdateSink, ValidateSink};
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Ephemeral aggregate for one invocation: the stale-id set and the two
/// scratch script paths. Owned exclusively by that invocation.
struct RunContext {
    stale_ids: Vec<String>,
    scripts: RunScripts,
}

/// Exclusive-run guard. Two overlapping invocations would race on the
/// scratch scripts and the workshop directory; the second fails fast.
struct RunLock {
    path: PathBuf,
}

impl RunLock {
    fn acquire(config: &Config) -> Result<Self> {
        let path = config.lock_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                anyhow::bail!(
                    "Another update run is in progress (lock '{}' exists)",
                    path.display()
                )
            }
            Err(e) => Err(e).with_context(|| format!("Failed to create lock '{}'", path.display())),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Drives one full synchronization run over the shared registry
pub struct ModUpdater {
    config: Config,
    registry: Arc<Mutex<ModRegistry>>,
    progress: Arc<dyn ProgressSink>,
}

impl ModUpdater {
    pub fn new(
        config: Config,
        registry: Arc<Mutex<ModRegistry>>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            registry,
            progress,
        }
    }

    /// Run the pipeline. Scratch scripts are removed unconditionally,
    /// whether the run succeeded or failed.
    pub async fn run(&self, account: &str, secret: &str) -> Result<()> {
        let _lock = RunLock::acquire(&self.config)?;

        let result = self.run_inner(account, secret).await;
        self.clean_scripts();
        result
    }

    async fn run_inner(&self, account: &str, secret: &str) -> Result<()> {
        println!("{}", "Updating mods...".cyan());

        let context = self.prepare(account, secret).await?;
        println!(
            "{}",
            format!("{} mod(s) queued for update", context.stale_ids.len()).cyan()
        );

        self.phase(&context.scripts.update_path, UpdateSink, "Updating mods")
            .await?;
        self.phase(
            &context.scripts.validate_path,
            ValidateSink,
            "Validating mods",
        )
        .await?;

        println!("{}", "Post-processing validated mods...".cyan());
        let snapshot = self.snapshot().await;
        PostProcessor::new(&self.config).run(&snapshot)?;

        Ok(())
    }

    /// Probe the roster, transition every item to its phase-entry status,
    /// and write both runscripts.
    async fn prepare(&self, account: &str, secret: &str) -> Result<RunContext> {
        let records = self.snapshot().await;

        let prober = Arc::new(StalenessProber::new(self.config.probe_concurrency));
        let probes = prober.probe_all(&self.config, &records).await?;

        let mut stale_ids = Vec::new();
        {
            let mut registry = self.registry.lock().await;
            for probe in &probes {
                if probe.stale {
                    // Unmount the stale copy before its replacement fetch
                    if let Some(record) = registry.find(&probe.mod_id) {
                        if record.content_dir(&self.config).is_dir() {
                            remove_mirror_link(&self.config, record)?;
                        }
                    }
                    registry.set_status(&probe.mod_id, ModStatus::InQueue)?;
                    stale_ids.push(probe.mod_id.clone());
                } else {
                    registry.set_status(&probe.mod_id, ModStatus::WaitValidation)?;
                }
            }
        }

        let records = self.snapshot().await;
        let scripts =
            RunscriptBuilder::new(&self.config).write(account, secret, &records, &stale_ids)?;

        Ok(RunContext { stale_ids, scripts })
    }

    /// Run one fetch phase with the progress reporter attached
    async fn phase(
        &self,
        script: &std::path::Path,
        mut sink: impl EventSink + 'static,
        label: &str,
    ) -> Result<()> {
        let (done_tx, done_rx) = watch::channel(false);

        let reporter = tokio::spawn(ProgressReporter::attach(
            Arc::clone(&self.progress),
            Arc::clone(&self.registry),
            done_rx,
            label.to_string(),
        ));

        let driver = FetchDriver::new();
        let outcome = driver
            .run(&self.config, script, &self.registry, &mut sink)
            .await;

        let _ = done_tx.send(true);
        reporter.await.context("Progress reporter panicked")??;

        outcome
    }

    async fn snapshot(&self) -> Vec<ModRecord> {
        self.registry.lock().await.records().to_vec()
    }

    fn clean_scripts(&self) {
        for path in [
            self.config.update_script_path(),
            self.config.validate_script_path(),
        ] {
            if path.exists() {
                let _ = std::fs::remove_file(&path);
            }
        }
    }
}

/// Remove an item's mirror symlink if present
fn remove_mirror_link(config: &Config, record: &ModRecord) -> Result<()> {
    let link = record.mirror_link(config);
    if link
        .symlink_metadata()
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
    {
        std::fs::remove_file(&link)
            .with_context(|| format!("Failed to unlink '{}'", link.display()))?;
    }
    Ok(())
}
