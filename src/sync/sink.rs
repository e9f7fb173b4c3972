//! Per-phase event sinks driving the mod state machine

use crate::models::ModStatus;
use crate::parser::FetchEvent;
use crate::state::ModRegistry;
use crate::Result;
use colored::Colorize;

/// Applies a decoded output event to the registry.
///
/// Parsing is decoupled from mutation: the driver decodes lines and hands
/// each event to the sink bound for the current phase.
pub trait EventSink: Send {
    fn apply(&mut self, registry: &mut ModRegistry, event: &FetchEvent) -> Result<()>;
}

/// Update-phase sink: transitions status and records start/end times
pub struct UpdateSink;

impl EventSink for UpdateSink {
    fn apply(&mut self, registry: &mut ModRegistry, event: &FetchEvent) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        match event {
            FetchEvent::Start(id) if registry.find(id).is_some() => {
                registry.set_status(id, ModStatus::InProgress)?;
                registry.mark_started(id, now);
            }
            FetchEvent::Success(id) if registry.find(id).is_some() => {
                registry.set_status(id, ModStatus::Updated)?;
                registry.mark_finished(id, now);
            }
            FetchEvent::Timeout(id) if registry.find(id).is_some() => {
                registry.set_status(id, ModStatus::Failed)?;
                registry.mark_finished(id, now);
            }
            FetchEvent::Error { mod_id, reason } if registry.find(mod_id).is_some() => {
                eprintln!(
                    "{}",
                    format!("Download of item {} failed: {}", mod_id, reason).red()
                );
                registry.set_status(mod_id, ModStatus::Failed)?;
                registry.mark_finished(mod_id, now);
            }
            _ => {}
        }

        Ok(())
    }
}

/// Validate-phase sink: transitions status only
pub struct ValidateSink;

impl EventSink for ValidateSink {
    fn apply(&mut self, registry: &mut ModRegistry, event: &FetchEvent) -> Result<()> {
        match event {
            FetchEvent::Start(id) if registry.find(id).is_some() => {
                registry.set_status(id, ModStatus::Validating)?;
            }
            FetchEvent::Success(id) if registry.find(id).is_some() => {
                registry.set_status(id, ModStatus::UpToDate)?;
            }
            FetchEvent::Timeout(id) if registry.find(id).is_some() => {
                registry.set_status(id, ModStatus::Failed)?;
            }
            FetchEvent::Error { mod_id, reason } if registry.find(mod_id).is_some() => {
                eprintln!(
                    "{}",
                    format!("Validation of item {} failed: {}", mod_id, reason).red()
                );
                registry.set_status(mod_id, ModStatus::Failed)?;
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::JsonRosterStore;
    use tempfile::TempDir;

    fn registry(temp: &TempDir) -> ModRegistry {
        let store = JsonRosterStore::load(temp.path().join("roster.json")).unwrap();
        let mut registry = ModRegistry::load(Box::new(store)).unwrap();
        registry.add("@cba_a3", "123456").unwrap();
        registry
    }

    #[test]
    fn test_update_success_sets_times() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let mut sink = UpdateSink;

        sink.apply(&mut registry, &FetchEvent::Start("123456".to_string()))
            .unwrap();
        assert_eq!(registry.find("123456").unwrap().status, ModStatus::InProgress);

        sink.apply(&mut registry, &FetchEvent::Success("123456".to_string()))
            .unwrap();

        let record = registry.find("123456").unwrap();
        assert_eq!(record.status, ModStatus::Updated);
        assert!(record.started_at > 0);
        assert!(record.finished_at >= record.started_at);
    }

    #[test]
    fn test_update_timeout_fails_item() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let mut sink = UpdateSink;

        sink.apply(&mut registry, &FetchEvent::Timeout("123456".to_string()))
            .unwrap();
        assert_eq!(registry.find("123456").unwrap().status, ModStatus::Failed);
    }

    #[test]
    fn test_validate_phase_touches_status_only() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let mut sink = ValidateSink;

        sink.apply(&mut registry, &FetchEvent::Start("123456".to_string()))
            .unwrap();
        assert_eq!(registry.find("123456").unwrap().status, ModStatus::Validating);

        sink.apply(&mut registry, &FetchEvent::Success("123456".to_string()))
            .unwrap();

        let record = registry.find("123456").unwrap();
        assert_eq!(record.status, ModStatus::UpToDate);
        assert_eq!(record.started_at, 0);
        assert_eq!(record.finished_at, 0);
    }

    #[test]
    fn test_validate_error_fails_item() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let mut sink = ValidateSink;

        sink.apply(
            &mut registry,
            &FetchEvent::Error {
                mod_id: "123456".to_string(),
                reason: "Failure".to_string(),
            },
        )
        .unwrap();
        assert_eq!(registry.find("123456").unwrap().status, ModStatus::Failed);
    }

    #[test]
    fn test_events_for_unknown_ids_are_ignored() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry(&temp);
        let mut sink = UpdateSink;

        sink.apply(&mut registry, &FetchEvent::Success("999999".to_string()))
            .unwrap();
        assert_eq!(registry.find("123456").unwrap().status, ModStatus::Unknown);
    }
}
