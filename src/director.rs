//! Wave director: decides each simulated tick what enters the field.

use rand::Rng;
use tracing::info;

use crate::config::{SimConfig, SpawnConfig};
use crate::enemy::{Enemy, EnemyVariant};
use crate::entities::{Field, IdAllocator, Pickup, PickupKind, Spawns};
use crate::events::GameEvent;
use crate::rng::EventRng;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaveDirector {
    /// Simulated ticks seen so far.
    pub elapsed: u64,
    pub boss_spawned: bool,
}

impl WaveDirector {
    /// Probability of a regular spawn on one tick at `level`.
    pub fn spawn_chance(spawn: &SpawnConfig, level: u32) -> f32 {
        (spawn.base_chance + level as f32 * spawn.level_factor).min(spawn.max_chance)
    }

    /// First tier whose gate and band admit the draw `r`; the fallback
    /// variant when none does.
    pub fn pick_variant(spawn: &SpawnConfig, level: u32, r: f32) -> EnemyVariant {
        spawn
            .tiers
            .iter()
            .find(|tier| level >= tier.min_level && r < tier.band)
            .map_or(spawn.fallback, |tier| tier.variant)
    }

    pub fn should_spawn_boss(&self, config: &SimConfig, level: u32) -> bool {
        !self.boss_spawned && (self.elapsed >= config.boss.ticks || level >= config.boss.level)
    }

    /// Runs one tick of spawn decisions. New entities land in `spawns`.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        config: &SimConfig,
        level: u32,
        rng: &mut R,
        ids: &mut IdAllocator,
        spawns: &mut Spawns,
        events: &mut Vec<GameEvent>,
    ) {
        self.elapsed += 1;
        let field = config.field;

        if self.should_spawn_boss(config, level) {
            self.boss_spawned = true;
            info!(elapsed = self.elapsed, level, "final boss incoming");
            spawns.enemies.push(Enemy::final_boss(ids.next_id(), &field));
            events.push(GameEvent::BossIncoming);
            return;
        }

        if rng.chance(Self::spawn_chance(&config.spawn, level)) {
            let variant = Self::pick_variant(&config.spawn, level, rng.unit());
            spawns.enemies.push(Enemy::spawn(ids.next_id(), variant, &field, rng));
        }

        if rng.chance(config.spawn.pickup_chance) {
            spawns.pickups.push(drifting_pickup(ids, &field, rng));
        }
    }
}

fn drifting_pickup<R: Rng + ?Sized>(ids: &mut IdAllocator, field: &Field, rng: &mut R) -> Pickup {
    let kind = PickupKind::random(rng);
    let x = rng.unit() * (field.width - Pickup::SIZE);
    Pickup::new(ids.next_id(), kind, x, -Pickup::SIZE)
}
