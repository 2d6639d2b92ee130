// Settings editor - loads, edits locally and persists backend configuration
use crate::application::measurement_repository::{MeasurementRepository, RawSetting};
use crate::domain::settings::{ConfigEntry, ConfigKey, EditorStatus, SaveReport};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("settings are being saved")]
    Busy,
    #[error("unknown setting {0}")]
    UnknownKey(String),
}

/// What the config view shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSnapshot {
    pub entries: Vec<ConfigEntry>,
    pub status: EditorStatus,
    pub message: String,
    pub busy: bool,
}

struct EditorState {
    entries: Vec<ConfigEntry>,
    /// Keys whose value came from the backend or from the user
    known: HashSet<ConfigKey>,
    status: EditorStatus,
    busy: bool,
}

pub struct SettingsEditor {
    repository: Arc<dyn MeasurementRepository>,
    state: Mutex<EditorState>,
}

impl SettingsEditor {
    pub fn new(repository: Arc<dyn MeasurementRepository>) -> Self {
        Self {
            repository,
            state: Mutex::new(EditorState {
                entries: empty_entries(),
                known: HashSet::new(),
                status: EditorStatus::NotLoaded,
                busy: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let state = self.state();
        EditorSnapshot {
            entries: state.entries.clone(),
            status: state.status.clone(),
            message: state.status.to_string(),
            busy: state.busy,
        }
    }

    /// Replace local entries with what the backend holds for every known key
    pub async fn load(&self) -> Result<(), EditorError> {
        if self.state().busy {
            return Err(EditorError::Busy);
        }

        let loaded = self.repository.list_settings().await;

        let mut state = self.state();
        if state.busy {
            // A save started while we were loading; its values win
            return Err(EditorError::Busy);
        }
        match loaded {
            Ok(settings) => {
                state.entries = entries_from(&settings);
                state.known = ConfigKey::ALL
                    .into_iter()
                    .filter(|key| settings.iter().any(|s| s.key == key.as_str()))
                    .collect();
                state.status = EditorStatus::Loaded;
                tracing::info!("Loaded {} settings", settings.len());
            }
            Err(e) => {
                tracing::warn!("Error loading settings: {}", e);
                state.entries = empty_entries();
                state.known.clear();
                state.status = EditorStatus::LoadFailed;
            }
        }
        Ok(())
    }

    /// Change a value locally. Nothing is sent until [`save`](Self::save).
    pub fn edit(&self, key: ConfigKey, value: impl Into<String>) -> Result<(), EditorError> {
        let mut state = self.state();
        if state.busy {
            return Err(EditorError::Busy);
        }
        if let Some(entry) = state.entries.iter_mut().find(|e| e.key == key) {
            entry.value = value.into();
        }
        state.known.insert(key);
        Ok(())
    }

    pub fn edit_raw(&self, key: &str, value: impl Into<String>) -> Result<(), EditorError> {
        let key = ConfigKey::parse(key).ok_or_else(|| EditorError::UnknownKey(key.to_string()))?;
        self.edit(key, value)
    }

    /// Persist every known entry one key at a time, in key order.
    /// A failing key does not stop the remaining ones from being saved.
    pub async fn save(&self) -> Result<SaveReport, EditorError> {
        let (entries, skipped): (Vec<ConfigEntry>, Vec<ConfigEntry>) = {
            let mut state = self.state();
            if state.busy {
                return Err(EditorError::Busy);
            }
            state.busy = true;
            state.status = EditorStatus::Saving;
            let known = &state.known;
            state.entries.iter().cloned().partition(|e| known.contains(&e.key))
        };

        let mut guard = SaveGuard {
            editor: self,
            planned: entries.iter().map(|e| e.key).collect(),
            report: SaveReport {
                skipped: skipped.into_iter().map(|e| e.key).collect(),
                ..SaveReport::default()
            },
        };
        if !guard.report.skipped.is_empty() {
            tracing::debug!("Skipping settings never loaded or edited: {:?}", guard.report.skipped);
        }

        for entry in entries {
            match self.repository.put_setting(entry.key.as_str(), &entry.value).await {
                Ok(()) => guard.report.saved.push(entry.key),
                Err(e) => {
                    tracing::warn!("Error saving setting {}: {}", entry.key, e);
                    guard.report.failed.push(entry.key);
                }
            }
        }

        let report = guard.report.clone();
        drop(guard);

        if report.is_success() {
            tracing::info!("Saved {} settings", report.saved.len());
        }
        Ok(report)
    }
}

/// Clears the busy flag and publishes the outcome, also when a save is
/// abandoned halfway (planned keys never attempted count as failed).
struct SaveGuard<'a> {
    editor: &'a SettingsEditor,
    planned: Vec<ConfigKey>,
    report: SaveReport,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        let failed: Vec<ConfigKey> = self
            .planned
            .iter()
            .copied()
            .filter(|key| !self.report.saved.contains(key))
            .collect();

        let mut state = self.editor.state();
        state.busy = false;
        state.status = if self.planned.is_empty() {
            EditorStatus::NothingToSave
        } else if failed.is_empty() {
            EditorStatus::Saved
        } else {
            EditorStatus::SaveFailed { failed }
        };
    }
}

fn empty_entries() -> Vec<ConfigEntry> {
    ConfigKey::ALL.into_iter().map(ConfigEntry::empty).collect()
}

fn entries_from(settings: &[RawSetting]) -> Vec<ConfigEntry> {
    ConfigKey::ALL
        .into_iter()
        .map(|key| {
            let value = settings
                .iter()
                .find(|s| s.key == key.as_str())
                .map(|s| value_text(&s.value))
                .unwrap_or_default();
            ConfigEntry::new(key, value)
        })
        .collect()
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
