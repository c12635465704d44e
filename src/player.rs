//! The player's ship: steering, defensive layers and damage intake.

use crate::config::PlayerConfig;
use crate::entities::{Actor, Body, EntityId, EntityKind, Field, Health, TickCtx};
use crate::input::InputSnapshot;
use crate::upgrades::UpgradeTuning;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shield {
    pub value: u32,
    pub active: bool,
    /// Ticks since the player last took a hit (absorbed or not).
    pub since_damage: u32,
}

impl Default for Shield {
    fn default() -> Self {
        // A freshly unlocked shield comes up on the next tick.
        Self { value: 0, active: false, since_damage: u32::MAX }
    }
}

/// How a single incoming hit was resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HitOutcome {
    /// The player was invulnerable; nothing changed.
    pub ignored: bool,
    pub absorbed: u32,
    pub shield_broken: bool,
    pub taken: u32,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: EntityId,
    pub body: Body,
    pub health: Health,
    pub max_speed: f32,
    pub invulnerable: u32,
    pub shield: Shield,
    /// Ticks until the current weapon may fire again.
    pub reload: u32,
}

impl Player {
    pub const SIZE: f32 = 50.0;
    const LERP: f32 = 0.3;

    pub fn new(id: EntityId, field: &Field, config: &PlayerConfig) -> Self {
        Self {
            id,
            body: Body::new(field.width / 2.0, field.height - 100.0, Self::SIZE, Self::SIZE),
            health: Health::full(config.max_health),
            max_speed: config.max_speed,
            invulnerable: 0,
            shield: Shield::default(),
            reload: 0,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        self.body.center()
    }

    /// Top-center of the ship, where player shots leave.
    pub fn muzzle(&self) -> (f32, f32) {
        (self.body.x + self.body.width / 2.0, self.body.y)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0
    }

    /// Eases velocity toward the direction held in `input`.
    pub fn steer(&mut self, input: &InputSnapshot) {
        let step = self.max_speed * 0.7;
        let mut target_x = 0.0;
        let mut target_y = 0.0;
        if input.left {
            target_x = -step;
        }
        if input.right {
            target_x = step;
        }
        if input.up {
            target_y = -step;
        }
        if input.down {
            target_y = step * 1.2;
        }
        if target_x != 0.0 && target_y != 0.0 {
            target_x *= 0.65;
            target_y *= 0.65;
        }
        self.body.vx += (target_x - self.body.vx) * Self::LERP;
        self.body.vy += (target_y - self.body.vy) * Self::LERP;
    }

    /// Restores the shield once enough hit-free ticks have passed.
    pub fn regenerate_shield(&mut self, level: u32, tuning: &UpgradeTuning) {
        self.shield.since_damage = self.shield.since_damage.saturating_add(1);
        if level == 0 || self.shield.active {
            return;
        }
        if self.shield.since_damage > tuning.shield_cooldown(level) {
            self.shield.active = true;
            self.shield.value = tuning.shield_capacity(level);
        }
    }

    /// Shield first, then health. An invulnerable player ignores the hit.
    ///
    /// A hit fully soaked by the shield grants no invulnerability window.
    pub fn receive_hit(&mut self, damage: u32, ghost: bool, config: &PlayerConfig) -> HitOutcome {
        if self.is_invulnerable() {
            return HitOutcome { ignored: true, ..HitOutcome::default() };
        }
        self.shield.since_damage = 0;

        let mut outcome = HitOutcome::default();
        let mut remaining = damage;
        if self.shield.active && self.shield.value > 0 {
            if self.shield.value >= remaining {
                self.shield.value -= remaining;
                outcome.absorbed = remaining;
                if self.shield.value == 0 {
                    self.shield.active = false;
                    outcome.shield_broken = true;
                }
                return outcome;
            }
            outcome.absorbed = self.shield.value;
            outcome.shield_broken = true;
            remaining -= self.shield.value;
            self.shield.value = 0;
            self.shield.active = false;
        }

        outcome.taken = self.health.take_damage(remaining);
        self.invulnerable = if ghost {
            config.hit_invulnerability.max(config.ghost_invulnerability)
        } else {
            config.hit_invulnerability
        };
        outcome
    }
}

impl Actor for Player {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn advance(&mut self, ctx: &mut TickCtx<'_>) {
        let field = ctx.field;
        self.body.integrate();
        self.body.clamp_x(&field);
        self.body.y = self.body.y.clamp(0.0, (field.height - self.body.height).max(0.0));
        self.invulnerable = self.invulnerable.saturating_sub(1);
        self.reload = self.reload.saturating_sub(1);
    }

    fn is_expired(&self, _field: &Field) -> bool {
        self.health.is_depleted()
    }
}
