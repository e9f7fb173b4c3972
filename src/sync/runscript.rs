//! Declarative runscript generation for steamcmd

use crate::config::Config;
use crate::models::ModRecord;
use crate::Result;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// The two scratch scripts driving one invocation
#[derive(Debug, Clone)]
pub struct RunScripts {
    pub update_path: PathBuf,
    pub validate_path: PathBuf,
}

/// Builds the update and validate runscripts.
///
/// Both share the install-directory and login prefix and end with `quit`.
/// The update script fetches only stale items; the validate script covers
/// the whole roster with the validate flag set. Building always succeeds,
/// even with nothing stale - validation proceeds unconditionally.
pub struct RunscriptBuilder<'a> {
    config: &'a Config,
}

impl<'a> RunscriptBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    fn prefix(&self, account: &str, secret: &str) -> Vec<String> {
        vec![
            format!("force_install_dir {}", self.config.server_dir.display()),
            format!("login {} {}", account, secret),
        ]
    }

    /// Update-script lines: one plain fetch directive per stale item
    pub fn update_lines(
        &self,
        account: &str,
        secret: &str,
        records: &[ModRecord],
        stale_ids: &[String],
    ) -> Vec<String> {
        let mut lines = self.prefix(account, secret);

        for record in records {
            if stale_ids.iter().any(|id| *id == record.mod_id) {
                lines.push(format!(
                    "workshop_download_item {} {}",
                    self.config.workshop_id, record.mod_id
                ));
            }
        }

        lines.push("quit".to_string());
        lines
    }

    /// Validate-script lines: one validate-flagged directive per tracked item
    pub fn validate_lines(
        &self,
        account: &str,
        secret: &str,
        records: &[ModRecord],
    ) -> Vec<String> {
        let mut lines = self.prefix(account, secret);

        for record in records {
            lines.push(format!(
                "workshop_download_item {} {} validate",
                self.config.workshop_id, record.mod_id
            ));
        }

        lines.push("quit".to_string());
        lines
    }

    /// Write both scripts to their fixed scratch paths
    pub fn write(
        &self,
        account: &str,
        secret: &str,
        records: &[ModRecord],
        stale_ids: &[String],
    ) -> Result<RunScripts> {
        let scripts = RunScripts {
            update_path: self.config.update_script_path(),
            validate_path: self.config.validate_script_path(),
        };

        write_lines(
            &scripts.update_path,
            &self.update_lines(account, secret, records, stale_ids),
        )?;
        write_lines(
            &scripts.validate_path,
            &self.validate_lines(account, secret, records),
        )?;

        Ok(scripts)
    }
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write runscript '{}'", path.display()))
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

    fn roster() -> Vec<ModRecord> {
        vec![ModRecord::new("@cba_a3", "123"), ModRecord::new("@ace", "456")]
    }

    #[test]
    fn test_update_script_limited_to_stale() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let builder = RunscriptBuilder::new(&config);

        let lines = builder.update_lines("user", "pass", &roster(), &["456".to_string()]);
        assert_eq!(lines[0], format!("force_install_dir {}", temp.path().display()));
        assert_eq!(lines[1], "login user pass");
        assert_eq!(lines[2], "workshop_download_item 107410 456");
        assert_eq!(lines[3], "quit");
    }

    #[test]
    fn test_validate_script_covers_full_roster() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let builder = RunscriptBuilder::new(&config);

        let lines = builder.validate_lines("user", "pass", &roster());
        assert_eq!(lines[2], "workshop_download_item 107410 123 validate");
        assert_eq!(lines[3], "workshop_download_item 107410 456 validate");
        assert_eq!(lines.last().unwrap(), "quit");
    }

    #[test]
    fn test_builds_with_nothing_stale() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let builder = RunscriptBuilder::new(&config);

        let scripts = builder.write("user", "pass", &roster(), &[]).unwrap();
        let update = std::fs::read_to_string(&scripts.update_path).unwrap();
        let validate = std::fs::read_to_string(&scripts.validate_path).unwrap();

        // Update script holds only the prefix and quit
        assert_eq!(update.lines().count(), 3);
        // Validation still proceeds unconditionally
        assert_eq!(validate.lines().count(), 5);
    }
}
