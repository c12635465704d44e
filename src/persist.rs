//! Save/load of progression and loadout.
//!
//! Every snapshot field is optional: whatever a save file omits keeps the
//! value of a fresh encounter when restored.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersistError;
use crate::upgrades::PlayerUpgrades;
use crate::weapons::{SavedWeapon, WeaponKind};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub score: Option<u32>,
    pub level: Option<u32>,
    pub upgrades_taken: Option<u32>,
    pub next_threshold: Option<u32>,
    pub upgrades: Option<PlayerUpgrades>,
    pub weapons: Option<BTreeMap<WeaponKind, SavedWeapon>>,
    pub current_weapon: Option<WeaponKind>,
    pub player: Option<PlayerSnapshot>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSnapshot {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub vx: Option<f32>,
    pub vy: Option<f32>,
    pub health: Option<u32>,
    pub max_health: Option<u32>,
    pub max_speed: Option<f32>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Storage collaborator for snapshots.
pub trait Persistence {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistError>;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<Snapshot>, PersistError>;
}

/// One JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFileStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistError> {
        fs::write(&self.path, snapshot.to_json()?)?;
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    fn load(&mut self) -> Result<Option<Snapshot>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Snapshot::from_json(&text).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store holding the serialized JSON, for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<String>,
}

impl MemoryStore {
    pub fn with_json(text: impl Into<String>) -> Self {
        Self { saved: Some(text.into()) }
    }

    pub fn raw(&self) -> Option<&str> {
        self.saved.as_deref()
    }
}

impl Persistence for MemoryStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistError> {
        self.saved = Some(snapshot.to_json()?);
        Ok(())
    }

    fn load(&mut self) -> Result<Option<Snapshot>, PersistError> {
        self.saved.as_deref().map(Snapshot::from_json).transpose()
    }
}
