use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

pub const STRICT_POSITIONS_ENV: &str = "READFOLIO_STRICT_POSITIONS";

/// What to do with navigation input that falls outside the item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PositionPolicy {
    /// Propagate the position error to the caller.
    Strict,
    /// Clamp into range and log the correction.
    Clamp,
}

impl Default for PositionPolicy {
    fn default() -> Self {
        let forced = std::env::var(STRICT_POSITIONS_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if forced || cfg!(debug_assertions) {
            PositionPolicy::Strict
        } else {
            PositionPolicy::Clamp
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReaderSettings {
    pub debounce_ms: u64,
    pub position_policy: PositionPolicy,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            position_policy: PositionPolicy::default(),
        }
    }
}

impl ReaderSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSettings {
    #[serde(default)]
    reader: ReaderSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn reader(&self) -> ReaderSettings {
        match self.data.read() {
            Ok(guard) => guard.reader.clone(),
            Err(poisoned) => poisoned.into_inner().reader.clone(),
        }
    }

    pub fn update_reader(&self, settings: ReaderSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.reader = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
