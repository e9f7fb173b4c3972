//! In-memory roster with write-through persistence

use crate::models::{ModRecord, ModStatus};
use crate::state::RosterStore;
use crate::Result;

/// Run-scoped roster of tracked mods.
///
/// The registry is the single writable copy during a run. Status
/// transitions write through to the store synchronously; start/end
/// timestamps are run-scoped and stay in memory.
pub struct ModRegistry {
    mods: Vec<ModRecord>,
    store: Box<dyn RosterStore>,
}

impl ModRegistry {
    /// Seed the registry from the persisted store
    pub fn load(store: Box<dyn RosterStore>) -> Result<Self> {
        let mods = store.list_all()?;
        Ok(Self { mods, store })
    }

    pub fn records(&self) -> &[ModRecord] {
        &self.mods
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn find(&self, mod_id: &str) -> Option<&ModRecord> {
        self.mods.iter().find(|m| m.mod_id == mod_id)
    }

    /// Add a record unless the workshop id is already tracked.
    /// Returns true when a record was added.
    pub fn add(&mut self, folder: &str, mod_id: &str) -> Result<bool> {
        if !self.store.add_if_absent(folder, mod_id)? {
            return Ok(false);
        }

        self.mods.push(ModRecord::new(folder, mod_id));
        Ok(true)
    }

    /// Transition an item's status, writing through to the store
    pub fn set_status(&mut self, mod_id: &str, status: ModStatus) -> Result<()> {
        let Some(record) = self.mods.iter_mut().find(|m| m.mod_id == mod_id) else {
            anyhow::bail!("Unknown mod id '{}'", mod_id);
        };

        record.status = status;
        self.store.update_status(mod_id, status)
    }

    /// Record when the current run started fetching an item
    pub fn mark_started(&mut self, mod_id: &str, at: i64) {
        if let Some(record) = self.mods.iter_mut().find(|m| m.mod_id == mod_id) {
            record.started_at = at;
        }
    }

    /// Record when the current run finished an item
    pub fn mark_finished(&mut self, mod_id: &str, at: i64) {
        if let Some(record) = self.mods.iter_mut().find(|m| m.mod_id == mod_id) {
            record.finished_at = at;
        }
    }

    /// Drop every record, here and in the store
    pub fn clear(&mut self) -> Result<()> {
        self.store.delete_all()?;
        self.mods.clear();
        Ok(())
    }

    /// Status listing: one line per item, registry order.
    /// An empty roster renders as an empty string.
    pub fn render_listing(&self) -> String {
        self.mods
            .iter()
            .map(|m| m.render())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Server launch mod-line: `prefix/folder;prefix/folder;...`
    pub fn render_modline(&self, prefix: &str) -> String {
        self.mods
            .iter()
            .map(|m| format!("{}/{}", prefix, m.folder))
            .collect::<Vec<_>>()
            .join(";")
    }
}
