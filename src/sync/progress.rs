//! Live roster progress rendering

use crate::state::ModRegistry;
use crate::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// How often a running phase re-renders the roster
pub const RENDER_INTERVAL: Duration = Duration::from_secs(2);

/// Handle to a message previously sent through a sink
pub type ProgressHandle = u64;

/// Invocation-context collaborator the reporter renders into.
///
/// `send` posts a new message and returns a handle; `edit` replaces the
/// text of a previously sent message.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<ProgressHandle>;
    async fn edit(&self, handle: ProgressHandle, text: &str) -> Result<()>;
}

/// Terminal sink backed by an indicatif spinner per message
pub struct ConsoleProgress {
    bars: StdMutex<HashMap<ProgressHandle, ProgressBar>>,
    next: StdMutex<ProgressHandle>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            bars: StdMutex::new(HashMap::new()),
            next: StdMutex::new(0),
        }
    }

    /// Stop ticking and clear all spinners
    pub fn finish(&self) {
        let bars = self.bars.lock().expect("progress lock poisoned");
        for bar in bars.values() {
            bar.finish_and_clear();
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressSink for ConsoleProgress {
    async fn send(&self, text: &str) -> Result<ProgressHandle> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("static template"),
        );
        bar.set_message(text.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        let mut next = self.next.lock().expect("progress lock poisoned");
        let handle = *next;
        *next += 1;

        self.bars
            .lock()
            .expect("progress lock poisoned")
            .insert(handle, bar);
        Ok(handle)
    }

    async fn edit(&self, handle: ProgressHandle, text: &str) -> Result<()> {
        let bars = self.bars.lock().expect("progress lock poisoned");
        if let Some(bar) = bars.get(&handle) {
            bar.set_message(text.to_string());
        }
        Ok(())
    }
}

/// Buffering sink for tests: records every send/edit
pub struct BufferProgress {
    pub messages: StdMutex<Vec<String>>,
}

impl BufferProgress {
    pub fn new() -> Self {
        Self {
            messages: StdMutex::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }
}

impl Default for BufferProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressSink for BufferProgress {
    async fn send(&self, text: &str) -> Result<ProgressHandle> {
        let mut messages = self.messages.lock().unwrap();
        messages.push(text.to_string());
        Ok((messages.len() - 1) as ProgressHandle)
    }

    async fn edit(&self, _handle: ProgressHandle, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Periodically pushes the rendered roster into the sink until the phase
/// signals completion, then renders one final snapshot.
pub struct ProgressReporter;

impl ProgressReporter {
    pub async fn attach(
        sink: Arc<dyn ProgressSink>,
        registry: Arc<Mutex<ModRegistry>>,
        mut done: watch::Receiver<bool>,
        label: String,
    ) -> Result<()> {
        let render = |header: &str, body: String| {
            if body.is_empty() {
                header.to_string()
            } else {
                format!("{}\n{}", header, body)
            }
        };

        let initial = {
            let registry = registry.lock().await;
            render(&label, registry.render_listing())
        };
        let handle = sink.send(&initial).await?;

        let mut interval = tokio::time::interval(RENDER_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval.tick().await; // first tick completes immediately

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = {
                        let registry = registry.lock().await;
                        render(&label, registry.render_listing())
                    };
                    sink.edit(handle, &snapshot).await?;
                }
                changed = done.changed() => {
                    if changed.is_err() || *done.borrow() {
                        break;
                    }
                }
            }
        }

        let final_snapshot = {
            let registry = registry.lock().await;
            render(&label, registry.render_listing())
        };
        sink.edit(handle, &final_snapshot).await?;

        Ok(())
    }
}
