//! Runtime configuration - paths, app ids, credentials

use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Steam Workshop changelog page, parameterized by item id
pub const WORKSHOP_CHANGELOG_URL: &str =
    "https://steamcommunity.com/sharedfiles/filedetails/changelog";

fn default_steamcmd_bin() -> PathBuf {
    PathBuf::from("/home/arma3server/.steam/steamcmd/steamcmd.sh")
}

fn default_server_dir() -> PathBuf {
    PathBuf::from("/home/arma3server/serverfiles")
}

fn default_app_id() -> String {
    // Arma 3 dedicated server
    "233780".to_string()
}

fn default_workshop_id() -> String {
    // Arma 3 workshop app
    "107410".to_string()
}

fn default_probe_concurrency() -> usize {
    8
}

/// Configuration for the synchronizer, loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the steamcmd launcher script
    #[serde(default = "default_steamcmd_bin")]
    pub steamcmd_bin: PathBuf,

    /// Server installation root; all derived paths live under it
    #[serde(default = "default_server_dir")]
    pub server_dir: PathBuf,

    /// App id passed to force_install_dir's target installation
    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// Workshop app id used in fetch directives and content paths
    #[serde(default = "default_workshop_id")]
    pub workshop_id: String,

    /// Steam account for the login directive
    #[serde(default)]
    pub account: String,

    /// Steam password for the login directive
    #[serde(default)]
    pub secret: String,

    /// Ceiling on concurrent changelog probes
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,

    /// Persisted roster location; defaults to <server_dir>/mods_roster.json
    #[serde(default)]
    pub roster_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steamcmd_bin: default_steamcmd_bin(),
            server_dir: default_server_dir(),
            app_id: default_app_id(),
            workshop_id: default_workshop_id(),
            account: String::new(),
            secret: String::new(),
            probe_concurrency: default_probe_concurrency(),
            roster_path: None,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or from the default
    /// location, falling back to built-in defaults when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))?;

        Ok(config)
    }

    /// Default config location: <config_dir>/modsync/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("modsync/config.toml"))
    }

    /// Workshop content root for fetched items
    pub fn workshop_dir(&self) -> PathBuf {
        self.server_dir
            .join("steamapps/workshop/content")
            .join(&self.workshop_id)
    }

    /// Directory the server loads mods from (mirror symlinks)
    pub fn mods_dir(&self) -> PathBuf {
        self.server_dir.join("mods")
    }

    /// Shared license-key directory
    pub fn keys_dir(&self) -> PathBuf {
        self.server_dir.join("keys")
    }

    /// Scratch path of the update-phase runscript
    pub fn update_script_path(&self) -> PathBuf {
        self.server_dir.join("update_runscript.steamcmd")
    }

    /// Scratch path of the validate-phase runscript
    pub fn validate_script_path(&self) -> PathBuf {
        self.server_dir.join("validate_runscript.steamcmd")
    }

    /// Lock file guarding against overlapping update runs
    pub fn lock_path(&self) -> PathBuf {
        self.server_dir.join(".modsync.lock")
    }

    /// Persisted roster location
    pub fn roster_path(&self) -> PathBuf {
        self.roster_path
            .clone()
            .unwrap_or_else(|| self.server_dir.join("mods_roster.json"))
    }

    /// Changelog page for a workshop item
    pub fn changelog_url(&self, mod_id: &str) -> String {
        format!("{}/{}", WORKSHOP_CHANGELOG_URL, mod_id)
    }
}
