//! Staleness probing against the workshop changelog

use crate::config::Config;
use crate::models::ModRecord;
use crate::parser::extract_update_timestamp;
use crate::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Probe outcome for one item
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub mod_id: String,
    pub stale: bool,
}

/// Determines, per item, whether a re-fetch is required by comparing the
/// scraped changelog timestamp to the content directory's creation time.
pub struct StalenessProber {
    client: reqwest::Client,
    concurrency: usize,
}

impl StalenessProber {
    pub fn new(concurrency: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            concurrency: concurrency.max(1),
        }
    }

    /// Probe a single item.
    ///
    /// Stale when no content directory exists, or when the scraped
    /// timestamp is at or after the directory's creation time. A missing
    /// announcement marker resolves to not-stale; so does a failed fetch
    /// (a transient outage must not trigger a roster-wide re-download).
    pub async fn is_stale(&self, config: &Config, record: &ModRecord) -> bool {
        let path = record.content_dir(config);

        if !path.is_dir() {
            return true;
        }

        let url = config.changelog_url(&record.mod_id);
        let html = match self.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                eprintln!(
                    "{}",
                    format!(
                        "Changelog probe failed for '{}' ({}): {}",
                        record.folder, record.mod_id, e
                    )
                    .yellow()
                );
                return false;
            }
        };

        let Some(updated_at) = extract_update_timestamp(&html) else {
            return false;
        };

        match created_at(&path) {
            Some(created) => stale_by_timestamps(updated_at, created),
            None => false,
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Probe every record concurrently, bounded by the configured ceiling,
    /// and join all probes before returning. Results come back in roster
    /// order.
    pub async fn probe_all(
        self: &Arc<Self>,
        config: &Config,
        records: &[ModRecord],
    ) -> Result<Vec<ProbeResult>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, record) in records.iter().cloned().enumerate() {
            let prober = Arc::clone(self);
            let config = config.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let stale = prober.is_stale(&config, &record).await;
                (
                    index,
                    ProbeResult {
                        mod_id: record.mod_id,
                        stale,
                    },
                )
            });
        }

        let mut results: Vec<Option<ProbeResult>> = vec![None; records.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined?;
            results[index] = Some(result);
        }

        Ok(results.into_iter().flatten().collect())
    }
}

/// An upstream change posted at or after the local copy was created means
/// the local copy is stale.
fn stale_by_timestamps(updated_at: i64, created_at: i64) -> bool {
    updated_at >= created_at
}

/// Creation time of a directory as UNIX seconds, falling back to mtime on
/// filesystems that don't expose a birth time.
fn created_at(path: &Path) -> Option<i64> {
    let metadata = std::fs::metadata(path).ok()?;
    let time = metadata.created().or_else(|_| metadata.modified()).ok()?;
    let since_epoch = time.duration_since(std::time::UNIX_EPOCH).ok()?;
    Some(since_epoch.as_secs() as i64)
}
