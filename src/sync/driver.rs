//! Subprocess driver for steamcmd runscripts

use crate::config::Config;
use crate::parser::{FetchEvent, LineDecoder};
use crate::state::ModRegistry;
use crate::sync::sink::EventSink;
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;

/// Launches steamcmd on a runscript and feeds its output through the
/// decoder into the phase's event sink.
pub struct FetchDriver {
    decoder: LineDecoder,
}

impl FetchDriver {
    pub fn new() -> Self {
        Self {
            decoder: LineDecoder::new(),
        }
    }

    /// Run one phase.
    ///
    /// A missing script is a successful no-op. Outcome is decided solely
    /// by the per-item log lines; the subprocess exit status is awaited
    /// for cleanup ordering but never interpreted.
    pub async fn run(
        &self,
        config: &Config,
        script: &Path,
        registry: &Arc<Mutex<ModRegistry>>,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        if !script.exists() {
            return Ok(());
        }

        let mut child = Command::new(&config.steamcmd_bin)
            .arg("+runscript")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "steamcmd '{}' not found or not executable",
                    config.steamcmd_bin.display()
                )
            })?;

        let stdout = child.stdout.take().context("Failed to capture stdout")?;
        let stderr = child.stderr.take().context("Failed to capture stderr")?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let mut stdout_done = false;
        let mut stderr_done = false;

        // Drain both streams concurrently to avoid backpressure deadlock
        while !stdout_done || !stderr_done {
            tokio::select! {
                line = stdout_reader.next_line(), if !stdout_done => {
                    match line {
                        Ok(Some(line)) => self.consume(&line, registry, sink).await?,
                        Ok(None) => stdout_done = true,
                        Err(e) => return Err(anyhow::anyhow!("Failed to read stdout: {}", e)),
                    }
                }
                line = stderr_reader.next_line(), if !stderr_done => {
                    match line {
                        Ok(Some(line)) => self.consume(&line, registry, sink).await?,
                        Ok(None) => stderr_done = true,
                        Err(e) => return Err(anyhow::anyhow!("Failed to read stderr: {}", e)),
                    }
                }
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            // Informational only; per-item outcomes came from the stream
            eprintln!(
                "{}",
                format!("steamcmd exited with {:?}", status.code()).yellow()
            );
        }

        Ok(())
    }

    async fn consume(
        &self,
        line: &str,
        registry: &Arc<Mutex<ModRegistry>>,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let event = self.decoder.decode(line);
        if event == FetchEvent::Unrecognized {
            return Ok(());
        }

        let mut registry = registry.lock().await;
        sink.apply(&mut registry, &event)
    }
}

impl Default for FetchDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::JsonRosterStore;
    use crate::sync::sink::UpdateSink;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_script_is_noop() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            server_dir: temp.path().to_path_buf(),
            ..Config::default()
        };

        let store = JsonRosterStore::load(temp.path().join("roster.json")).unwrap();
        let registry = Arc::new(Mutex::new(ModRegistry::load(Box::new(store)).unwrap()));

        let driver = FetchDriver::new();
        let mut sink = UpdateSink;
        driver
            .run(&config, &temp.path().join("absent.steamcmd"), &registry, &mut sink)
            .await
            .unwrap();
    }
}
