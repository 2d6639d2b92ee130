// Backend configuration entries edited from the config view
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration keys the editor knows about. Order matters: it is the
/// display order and the order in which keys are saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigKey {
    #[serde(rename = "compression-delay-hours")]
    CompressionDelayHours,
    #[serde(rename = "retention-days")]
    RetentionDays,
    #[serde(rename = "routine-interval-hours")]
    RoutineIntervalHours,
    #[serde(rename = "api-refresh-seconds")]
    ApiRefreshSeconds,
    #[serde(rename = "field-bus-refresh-seconds")]
    FieldBusRefreshSeconds,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::CompressionDelayHours,
        ConfigKey::RetentionDays,
        ConfigKey::RoutineIntervalHours,
        ConfigKey::ApiRefreshSeconds,
        ConfigKey::FieldBusRefreshSeconds,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::CompressionDelayHours => "compression-delay-hours",
            ConfigKey::RetentionDays => "retention-days",
            ConfigKey::RoutineIntervalHours => "routine-interval-hours",
            ConfigKey::ApiRefreshSeconds => "api-refresh-seconds",
            ConfigKey::FieldBusRefreshSeconds => "field-bus-refresh-seconds",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub key: ConfigKey,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: ConfigKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    pub fn empty(key: ConfigKey) -> Self {
        Self::new(key, String::new())
    }
}

/// Outcome of persisting the entries. Keys whose value was neither loaded
/// nor edited are skipped, so a blank never overwrites backend config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub saved: Vec<ConfigKey>,
    pub failed: Vec<ConfigKey>,
    pub skipped: Vec<ConfigKey>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// User-visible state of the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditorStatus {
    NotLoaded,
    Loaded,
    LoadFailed,
    Saving,
    Saved,
    NothingToSave,
    SaveFailed { failed: Vec<ConfigKey> },
}

impl fmt::Display for EditorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorStatus::NotLoaded => f.write_str(""),
            EditorStatus::Loaded => f.write_str("Settings loaded"),
            EditorStatus::LoadFailed => f.write_str("Could not load settings"),
            EditorStatus::Saving => f.write_str("Saving..."),
            EditorStatus::Saved => f.write_str("Settings saved"),
            EditorStatus::NothingToSave => f.write_str("Nothing to save"),
            EditorStatus::SaveFailed { failed } => {
                let keys: Vec<&str> = failed.iter().map(|k| k.as_str()).collect();
                write!(f, "Could not save: {}", keys.join(", "))
            }
        }
    }
}
