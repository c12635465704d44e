//! Error types for the simulation core.
//!
//! None of these ever reach the player as a message. Logic faults are
//! rejected loudly so that progression bugs show up in logs and tests instead
//! of silently doing nothing.

use std::path::PathBuf;

use crate::upgrades::UpgradeKind;

/// Faults raised by simulation operations driven from outside the tick loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// The upgrade kind has no entry in the configured effect table.
    #[error("upgrade {0:?} has no entry in the effect table")]
    UnknownUpgrade(UpgradeKind),

    /// The upgrade kind is already at its configured maximum level.
    #[error("upgrade {kind:?} is already at max level {max}")]
    UpgradeAtCap { kind: UpgradeKind, max: u32 },

    /// The selected kind was not part of the current offer.
    #[error("upgrade {0:?} was not offered")]
    UpgradeNotOffered(UpgradeKind),

    /// A choice arrived while the simulation was not waiting for one.
    #[error("no upgrade choice is pending")]
    NotUpgrading,

    /// A skip arrived although the offer contains at least one choice.
    #[error("an upgrade must be picked from {0} offered choice(s)")]
    ChoiceRequired(usize),
}

/// Failures while loading or validating a [`crate::config::SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures of the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
