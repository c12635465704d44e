//! Simulation configuration.
//!
//! Every section is `#[serde(default)]`, so a JSON file only has to name the
//! values it wants to change. Durations are in simulation ticks (60 per
//! second).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enemy::EnemyVariant;
use crate::entities::Field;
use crate::error::ConfigError;
use crate::upgrades::UpgradeConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub field: Field,
    /// Seed for the front end's RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub spawn: SpawnConfig,
    pub boss: BossTrigger,
    pub progression: ProgressionConfig,
    pub player: PlayerConfig,
    pub upgrades: UpgradeConfig,
}

/// One row of the level-gated spawn table.
///
/// Rows are evaluated in order against a single uniform draw `r`; the first
/// row with `level >= min_level && r < band` wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnTier {
    pub variant: EnemyVariant,
    pub min_level: u32,
    pub band: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub base_chance: f32,
    pub level_factor: f32,
    pub max_chance: f32,
    pub tiers: Vec<SpawnTier>,
    /// Variant used when no tier matches the draw.
    pub fallback: EnemyVariant,
    /// Per-tick chance of a free-floating pickup.
    pub pickup_chance: f32,
    /// Chance that a killed enemy drops a pickup.
    pub drop_chance: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            base_chance: 0.015,
            level_factor: 0.003,
            max_chance: 0.2,
            tiers: vec![
                SpawnTier { variant: EnemyVariant::Splitter, min_level: 6, band: 0.05 },
                SpawnTier { variant: EnemyVariant::Sniper, min_level: 4, band: 0.12 },
                SpawnTier { variant: EnemyVariant::Heavy, min_level: 3, band: 0.25 },
                SpawnTier { variant: EnemyVariant::Fast, min_level: 2, band: 0.55 },
            ],
            fallback: EnemyVariant::Basic,
            pickup_chance: 0.003,
            drop_chance: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTrigger {
    pub level: u32,
    pub ticks: u64,
}

impl Default for BossTrigger {
    fn default() -> Self {
        // Level 8, or three minutes of simulated play.
        Self { level: 8, ticks: 3 * 60 * 60 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub first_threshold: u32,
    /// Each level-up adds `floor(threshold * growth)` to the threshold.
    pub threshold_growth: f32,
    pub max_upgrades: u32,
    pub pace_per_level: f32,
    pub max_pace: f32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            first_threshold: 50,
            threshold_growth: 1.5,
            max_upgrades: 20,
            pace_per_level: 0.15,
            max_pace: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: u32,
    pub max_speed: f32,
    pub speed_cap: f32,
    pub hit_invulnerability: u32,
    pub ghost_invulnerability: u32,
    pub revive_invulnerability: u32,
    pub revive_grace: u32,
    /// Delays (after the revive) of the automatic screen clears.
    pub revive_clears: Vec<u32>,
    pub min_cooldown: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            max_speed: 6.0,
            speed_cap: 10.0,
            hit_invulnerability: 90,
            ghost_invulnerability: 180,
            revive_invulnerability: 240,
            revive_grace: 90,
            revive_clears: vec![12, 36],
            min_cooldown: 2,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.field.width > 0.0 && self.field.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "field must have a positive size, got {}x{}",
                self.field.width, self.field.height
            )));
        }

        let chances = [
            ("spawn.base_chance", self.spawn.base_chance),
            ("spawn.max_chance", self.spawn.max_chance),
            ("spawn.pickup_chance", self.spawn.pickup_chance),
            ("spawn.drop_chance", self.spawn.drop_chance),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {value}")));
            }
        }

        let mut previous = 0.0;
        for tier in &self.spawn.tiers {
            if tier.band <= previous || tier.band > 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "spawn tier {:?} band {} must be ascending and within (0, 1]",
                    tier.variant, tier.band
                )));
            }
            previous = tier.band;
        }

        if self.progression.threshold_growth <= 0.0 || self.progression.first_threshold == 0 {
            return Err(ConfigError::Invalid(
                "progression thresholds must be positive".to_string(),
            ));
        }

        if self.player.max_health == 0 {
            return Err(ConfigError::Invalid("player.max_health must be positive".to_string()));
        }

        Ok(())
    }
}
