use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle status of a tracked mod
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModStatus {
    /// Never processed by a run
    Unknown,
    /// Classified stale, waiting for its download to start
    InQueue,
    /// Download in progress
    InProgress,
    /// Download finished, validation pending
    Updated,
    /// Classified current, waiting for the validate pass
    WaitValidation,
    /// Validation in progress
    Validating,
    /// Validated current content on disk
    UpToDate,
    /// Download or validation failed
    Failed,
}

impl ModStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ModStatus::Unknown => "UNKNOWN",
            ModStatus::InQueue => "IN-QUEUE",
            ModStatus::InProgress => "IN-PROGRESS",
            ModStatus::Updated => "UPDATED",
            ModStatus::WaitValidation => "WAIT-VALIDATION",
            ModStatus::Validating => "VALIDATING",
            ModStatus::UpToDate => "UP-TO-DATE",
            ModStatus::Failed => "FAILED",
        }
    }

    /// Run-end statuses; everything else means the run was interrupted
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModStatus::UpToDate | ModStatus::Failed)
    }
}

impl Default for ModStatus {
    fn default() -> Self {
        ModStatus::Unknown
    }
}

/// One tracked workshop item. The workshop id is the only stable identity;
/// the folder handle may be renamed between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModRecord {
    /// Local mount handle, unique within the roster (e.g. "@cba_a3")
    pub folder: String,

    /// Workshop item id (e.g. "450814997")
    pub mod_id: String,

    /// Current lifecycle status
    #[serde(default)]
    pub status: ModStatus,

    /// UNIX seconds when the current run started fetching this item; 0 = unset
    #[serde(default, skip_serializing_if = "is_zero")]
    pub started_at: i64,

    /// UNIX seconds when the current run finished this item; 0 = unset
    #[serde(default, skip_serializing_if = "is_zero")]
    pub finished_at: i64,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl ModRecord {
    pub fn new(folder: impl Into<String>, mod_id: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            mod_id: mod_id.into(),
            status: ModStatus::Unknown,
            started_at: 0,
            finished_at: 0,
        }
    }

    /// Where steamcmd places this item's content
    pub fn content_dir(&self, config: &Config) -> PathBuf {
        config.workshop_dir().join(&self.mod_id)
    }

    /// Where the server expects this item to be mounted
    pub fn mirror_link(&self, config: &Config) -> PathBuf {
        config.mods_dir().join(&self.folder)
    }

    /// One line of the status listing
    pub fn render(&self) -> String {
        format!("[{}] {} ({})", self.status.name(), self.folder, self.mod_id)
    }
}
