//! Persisted roster storage

use crate::models::{ModRecord, ModStatus};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage collaborator for the tracked roster.
///
/// The registry writes through on every status transition; the store is
/// otherwise only read at startup to seed the in-memory roster.
pub trait RosterStore: Send + Sync {
    /// All persisted records, in insertion order
    fn list_all(&self) -> Result<Vec<ModRecord>>;

    /// Add a record unless one with the same workshop id already exists.
    /// Returns true when a record was added.
    fn add_if_absent(&mut self, folder: &str, mod_id: &str) -> Result<bool>;

    /// Persist a status transition for one item
    fn update_status(&mut self, mod_id: &str, status: ModStatus) -> Result<()>;

    /// Drop every record
    fn delete_all(&mut self) -> Result<()>;
}

/// On-disk roster document
#[derive(Debug, Default, Serialize, Deserialize)]
struct RosterDocument {
    mods: Vec<ModRecord>,
}

/// File-backed store persisting the roster as JSON
pub struct JsonRosterStore {
    path: PathBuf,
    document: RosterDocument,
}

impl JsonRosterStore {
    /// Load an existing roster file, or start empty when none exists
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let document = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read roster '{}'", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse roster '{}'", path.display()))?
        } else {
            RosterDocument::default()
        };

        Ok(Self { path, document })
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&self.document)
            .context("Failed to serialize roster")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write roster '{}'", self.path.display()))?;

        Ok(())
    }
}

impl RosterStore for JsonRosterStore {
    fn list_all(&self) -> Result<Vec<ModRecord>> {
        Ok(self.document.mods.clone())
    }

    fn add_if_absent(&mut self, folder: &str, mod_id: &str) -> Result<bool> {
        if self.document.mods.iter().any(|m| m.mod_id == mod_id) {
            return Ok(false);
        }

        self.document.mods.push(ModRecord::new(folder, mod_id));
        self.save()?;
        Ok(true)
    }

    fn update_status(&mut self, mod_id: &str, status: ModStatus) -> Result<()> {
        let Some(record) = self.document.mods.iter_mut().find(|m| m.mod_id == mod_id) else {
            anyhow::bail!("Unknown mod id '{}' in status update", mod_id);
        };

        record.status = status;
        self.save()
    }

    fn delete_all(&mut self) -> Result<()> {
        self.document.mods.clear();
        self.save()
    }
}
