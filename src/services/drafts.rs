// SPDX-License-Identifier: MIT

//! Local draft-station persistence and on-device settings.
//!
//! Drafts are stations that exist only locally and have not been submitted
//! to the backend. They are keyed by the client-generated station id and
//! survive restarts via a JSON file. The store is single-writer: one app
//! instance owns the file, so no cross-process locking is done.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Station;

/// On-device store of not-yet-submitted stations.
pub struct DraftStore {
    path: PathBuf,
    drafts: Mutex<HashMap<String, Station>>,
}

impl DraftStore {
    /// Open the draft store, loading any previously persisted drafts.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, AppError> {
        let path = path.into();
        let drafts = if path.exists() {
            let data = fs::read_to_string(&path)
                .map_err(|e| AppError::LocalStore(format!("Failed to read drafts: {}", e)))?;
            serde_json::from_str(&data)
                .map_err(|e| AppError::LocalStore(format!("Failed to parse drafts: {}", e)))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            drafts: Mutex::new(drafts),
        })
    }

    /// Upsert a draft by id. The stored copy is always flagged as a draft.
    pub fn save(&self, station: &Station) -> Result<(), AppError> {
        let mut drafts = self.drafts.lock().unwrap();
        let mut draft = station.clone();
        draft.is_draft = true;
        drafts.insert(draft.id.clone(), draft);
        persist(&self.path, &drafts)
    }

    /// All locally stored drafts, unspecified order. Callers sort by
    /// `date_added` descending for display.
    pub fn load_all(&self) -> Vec<Station> {
        self.drafts.lock().unwrap().values().cloned().collect()
    }

    /// Remove a draft. Deleting an unknown id is a no-op.
    pub fn delete(&self, id: &str) -> Result<(), AppError> {
        let mut drafts = self.drafts.lock().unwrap();
        if drafts.remove(id).is_none() {
            return Ok(());
        }
        persist(&self.path, &drafts)
    }
}

fn persist(path: &Path, drafts: &HashMap<String, Station>) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::LocalStore(format!("Failed to create data dir: {}", e)))?;
    }
    let data = serde_json::to_string_pretty(drafts)
        .map_err(|e| AppError::LocalStore(format!("Failed to serialize drafts: {}", e)))?;
    // Write-then-rename so a crash mid-write cannot truncate the store
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)
        .map_err(|e| AppError::LocalStore(format!("Failed to write drafts: {}", e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| AppError::LocalStore(format!("Failed to replace drafts: {}", e)))?;
    Ok(())
}

/// User-level settings persisted as scalar key-value entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub search_radius_miles: f64,
    pub dark_mode: bool,
    pub notifications_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_radius_miles: 5.0,
            dark_mode: false,
            notifications_enabled: true,
        }
    }
}

/// On-device settings store backed by a JSON file.
pub struct SettingsStore {
    path: PathBuf,
    settings: Mutex<Settings>,
}

impl SettingsStore {
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, AppError> {
        let path = path.into();
        let settings = if path.exists() {
            let data = fs::read_to_string(&path)
                .map_err(|e| AppError::LocalStore(format!("Failed to read settings: {}", e)))?;
            serde_json::from_str(&data)
                .map_err(|e| AppError::LocalStore(format!("Failed to parse settings: {}", e)))?
        } else {
            Settings::default()
        };
        Ok(Self {
            path,
            settings: Mutex::new(settings),
        })
    }

    pub fn get(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    pub fn set(&self, settings: Settings) -> Result<(), AppError> {
        let mut current = self.settings.lock().unwrap();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::LocalStore(format!("Failed to create data dir: {}", e)))?;
        }
        let data = serde_json::to_string_pretty(&settings)
            .map_err(|e| AppError::LocalStore(format!("Failed to serialize settings: {}", e)))?;
        fs::write(&self.path, data)
            .map_err(|e| AppError::LocalStore(format!("Failed to write settings: {}", e)))?;
        *current = settings;
        Ok(())
    }
}
