//! Post-fetch filesystem passes
//!
//! Runs after both phases, only over items that validated UP-TO-DATE.
//! All passes are sequential and idempotent: lowercase normalization,
//! mirror symlink provisioning, license-key propagation.

use crate::config::Config;
use crate::models::{ModRecord, ModStatus};
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use regex::Regex;
use std::path::Path;
use walkdir::WalkDir;

pub struct PostProcessor<'a> {
    config: &'a Config,
}

impl<'a> PostProcessor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Run all passes over the validated items
    pub fn run(&self, records: &[ModRecord]) -> Result<()> {
        let current: Vec<&ModRecord> = records
            .iter()
            .filter(|m| m.status == ModStatus::UpToDate)
            .collect();

        for record in &current {
            let dir = record.content_dir(self.config);
            if dir.is_dir() {
                lowercase_tree(&dir)?;
            }
        }

        for record in &current {
            self.ensure_mirror_link(record)?;
        }

        prune_dangling_links(&self.config.keys_dir())?;
        for record in &current {
            self.propagate_keys(record)?;
        }

        Ok(())
    }

    /// Create the mirror symlink if it does not already exist
    fn ensure_mirror_link(&self, record: &ModRecord) -> Result<()> {
        let real_path = record.content_dir(self.config);
        let link_path = record.mirror_link(self.config);

        if !real_path.is_dir() {
            println!(
                "{}",
                format!(
                    "Mod '{}' does not exist! ({})",
                    record.folder,
                    real_path.display()
                )
                .yellow()
            );
            return Ok(());
        }

        if link_path.symlink_metadata().is_err() {
            std::fs::create_dir_all(self.config.mods_dir())
                .context("Failed to create mods directory")?;
            std::os::unix::fs::symlink(&real_path, &link_path)
                .with_context(|| format!("Failed to link '{}'", link_path.display()))?;
            println!("Creating symlink '{}'...", link_path.display());
        }

        Ok(())
    }

    /// Symlink the item's license key(s) into the shared keys directory.
    ///
    /// The key entry is found case-insensitively by name; a key file is
    /// linked directly, a key folder has each file inside linked.
    fn propagate_keys(&self, record: &ModRecord) -> Result<()> {
        let real_path = record.content_dir(self.config);
        let keys_dir = self.config.keys_dir();

        if !real_path.is_dir() {
            println!(
                "{}",
                format!(
                    "Couldn't copy key for mod '{}', directory doesn't exist.",
                    record.folder
                )
                .yellow()
            );
            return Ok(());
        }

        std::fs::create_dir_all(&keys_dir).context("Failed to create keys directory")?;

        let key_pattern = Regex::new(r"(?i)key").unwrap();
        let key_entry = std::fs::read_dir(&real_path)?
            .filter_map(|e| e.ok())
            .find(|e| key_pattern.is_match(&e.file_name().to_string_lossy()));

        let Some(entry) = key_entry else {
            println!(
                "{}",
                format!("!! Couldn't find key folder for mod {} !!", record.folder).yellow()
            );
            return Ok(());
        };

        if entry.path().is_file() {
            link_key(&entry.path(), &keys_dir, &record.folder)?;
        } else {
            for key in std::fs::read_dir(entry.path())?.filter_map(|e| e.ok()) {
                if key.path().is_file() {
                    link_key(&key.path(), &keys_dir, &record.folder)?;
                }
            }
        }

        Ok(())
    }
}

/// Symlink one key file into the shared directory unless already present
fn link_key(key_path: &Path, keys_dir: &Path, folder: &str) -> Result<()> {
    let name = key_path
        .file_name()
        .context("Key path has no file name")?;
    let target = keys_dir.join(name);

    if target.symlink_metadata().is_err() {
        println!(
            "Creating symlink to key for mod '{}' ({})",
            folder,
            name.to_string_lossy()
        );
        std::os::unix::fs::symlink(key_path, &target)
            .with_context(|| format!("Failed to link key '{}'", target.display()))?;
    }

    Ok(())
}

/// Remove symlinks whose target no longer resolves (keys of removed mods)
pub fn prune_dangling_links(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in std::fs::read_dir(dir)?.filter_map(|e| e.ok()) {
        let path = entry.path();
        let is_link = path
            .symlink_metadata()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        if is_link && !path.exists() {
            println!(
                "Removing outdated server key '{}'",
                entry.file_name().to_string_lossy()
            );
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove '{}'", path.display()))?;
        }
    }

    Ok(())
}

/// Depth-first rename of every entry beneath `root` to its lowercase name.
///
/// Structure is preserved; an entry whose lowercase name already exists is
/// left alone. The server's case-sensitive filesystem needs content paths
/// in a single canonical case.
pub fn lowercase_tree(root: &Path) -> Result<()> {
    for entry in WalkDir::new(root)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.depth() == 0 {
            continue;
        }

        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let lowered = name.to_lowercase();
        if lowered == name {
            continue;
        }

        let target = path.with_file_name(&lowered);
        if target.symlink_metadata().is_ok() {
            println!(
                "{}",
                format!("Skipping rename of '{}': target exists", path.display()).yellow()
            );
            continue;
        }

        std::fs::rename(path, &target)
            .with_context(|| format!("Failed to rename '{}'", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp: &TempDir) -> Config {
        Config {
            server_dir: temp.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn record(config: &Config, folder: &str, mod_id: &str) -> ModRecord {
        let mut record = ModRecord::new(folder, mod_id);
        record.status = ModStatus::UpToDate;
        std::fs::create_dir_all(record.content_dir(config)).unwrap();
        record
    }

    #[test]
    fn test_lowercase_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("mod");
        std::fs::create_dir_all(root.join("Addons/SubDir")).unwrap();
        std::fs::write(root.join("Addons/Weapons.PBO"), b"pbo").unwrap();
        std::fs::write(root.join("Addons/SubDir/Data.Bin"), b"bin").unwrap();

        lowercase_tree(&root).unwrap();

        assert!(root.join("addons/weapons.pbo").is_file());
        assert!(root.join("addons/subdir/data.bin").is_file());
        assert!(!root.join("Addons").exists());
    }

    #[test]
    fn test_lowercase_tree_idempotent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("mod");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("Readme.TXT"), b"hi").unwrap();

        lowercase_tree(&root).unwrap();
        lowercase_tree(&root).unwrap();

        assert!(root.join("readme.txt").is_file());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 1);
    }

    #[test]
    fn test_mirror_link_created_once() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let record = record(&config, "@cba_a3", "123");

        let processor = PostProcessor::new(&config);
        processor.run(std::slice::from_ref(&record)).unwrap();
        processor.run(std::slice::from_ref(&record)).unwrap();

        let link = record.mirror_link(&config);
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_link(&link).unwrap(), record.content_dir(&config));
    }

    #[test]
    fn test_key_file_propagation_idempotent() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let record = record(&config, "@cba_a3", "123");

        // Key in a folder
        let key_dir = record.content_dir(&config).join("Keys");
        std::fs::create_dir_all(&key_dir).unwrap();
        std::fs::write(key_dir.join("cba_3.18.bikey"), b"key").unwrap();

        let processor = PostProcessor::new(&config);
        processor.run(std::slice::from_ref(&record)).unwrap();

        let names = || {
            let mut v: Vec<String> = std::fs::read_dir(config.keys_dir())
                .unwrap()
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            v.sort();
            v
        };

        let first = names();
        // Lowercase pass renamed Keys/ before key propagation ran
        assert_eq!(first, vec!["cba_3.18.bikey".to_string()]);

        processor.run(std::slice::from_ref(&record)).unwrap();
        assert_eq!(names(), first);
    }

    #[test]
    fn test_dangling_key_links_pruned() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let keys_dir = config.keys_dir();
        std::fs::create_dir_all(&keys_dir).unwrap();

        // Link to a target that no longer exists
        std::os::unix::fs::symlink(temp.path().join("gone.bikey"), keys_dir.join("gone.bikey"))
            .unwrap();
        // Healthy link stays
        std::fs::write(temp.path().join("live.bikey"), b"key").unwrap();
        std::os::unix::fs::symlink(temp.path().join("live.bikey"), keys_dir.join("live.bikey"))
            .unwrap();

        prune_dangling_links(&keys_dir).unwrap();

        assert!(!keys_dir.join("gone.bikey").symlink_metadata().is_ok());
        assert!(keys_dir.join("live.bikey").symlink_metadata().is_ok());
    }

    #[test]
    fn test_skips_items_not_up_to_date() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let mut failed = ModRecord::new("@broken", "999");
        failed.status = ModStatus::Failed;
        std::fs::create_dir_all(failed.content_dir(&config)).unwrap();

        PostProcessor::new(&config).run(std::slice::from_ref(&failed)).unwrap();

        assert!(failed.mirror_link(&config).symlink_metadata().is_err());
    }
}
