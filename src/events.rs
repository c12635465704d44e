//! Fire-and-forget notifications for audio, effects and UI.
//!
//! Events accumulate during a tick and are handed out by
//! [`crate::compute::GameState::drain_events`]. Nothing in the simulation
//! reads them back.

use crate::boss::BossState;
use crate::enemy::EnemyVariant;
use crate::entities::{EntityId, PickupKind};
use crate::upgrades::UpgradeKind;
use crate::weapons::WeaponKind;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Hit { target: EntityId, damage: u32 },
    Kill { variant: EnemyVariant, points: u32, at: (f32, f32) },
    DamageTaken { amount: u32 },
    ShieldAbsorbed { amount: u32 },
    ShieldBreak,
    Heal { amount: u32 },
    Pickup { kind: PickupKind },
    PhaseTransition { from: BossState, to: BossState },
    BossIncoming,
    BossCharging,
    BossDefeated,
    Victory,
    Defeat,
    PlayerRevived { remaining: u32 },
    BombUsed { remaining: u32, cleared: usize },
    WeaponSwitched { weapon: WeaponKind, auto: bool },
    LevelUp { level: u32, offered: Vec<UpgradeKind> },
}
