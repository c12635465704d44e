//! Hostile ships: the regular variants, splitter shards and the final boss.
//!
//! Behavior is a tagged variant ([`EnemyBrain`]) dispatched from a single
//! [`Enemy`] type, so every hostile lives in one ordered collection.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::boss::FinalBoss;
use crate::entities::{
    Actor, Body, EntityId, EntityKind, Field, Health, IdAllocator, TickCtx,
};
use crate::projectile::{Projectile, ProjectileKind, Side};
use crate::rng::EventRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyVariant {
    Basic,
    Fast,
    Heavy,
    Sniper,
    Splitter,
    Shard,
    LegacyBoss,
    FinalBoss,
}

/// Fixed per-variant numbers. Durations are ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VariantStats {
    pub width: f32,
    pub height: f32,
    pub base_speed: f32,
    /// Uniform extra speed drawn once per instance.
    pub speed_jitter: f32,
    pub health: u32,
    pub points: u32,
    pub shoot_cooldown: Option<u32>,
    pub accuracy: f32,
    pub contact_damage: u32,
    pub shot_damage: u32,
}

impl EnemyVariant {
    pub fn stats(self) -> VariantStats {
        let stats = |width, height, base_speed, speed_jitter, health, points, cd, accuracy, contact, shot| {
            VariantStats {
                width,
                height,
                base_speed,
                speed_jitter,
                health,
                points,
                shoot_cooldown: cd,
                accuracy,
                contact_damage: contact,
                shot_damage: shot,
            }
        };
        match self {
            EnemyVariant::Basic => stats(40.0, 40.0, 2.0, 2.0, 25, 10, Some(90), 0.3, 15, 10),
            EnemyVariant::Fast => stats(35.0, 35.0, 4.0, 2.0, 20, 15, Some(60), 0.5, 18, 12),
            EnemyVariant::Heavy => stats(60.0, 60.0, 1.0, 1.0, 60, 30, Some(120), 0.4, 30, 18),
            EnemyVariant::Sniper => stats(45.0, 45.0, 0.8, 0.0, 35, 25, Some(150), 0.85, 15, 30),
            EnemyVariant::Splitter => stats(120.0, 80.0, 0.6, 0.0, 200, 50, Some(180), 0.2, 15, 10),
            EnemyVariant::Shard => stats(20.0, 20.0, 0.0, 0.0, 10, 5, None, 0.0, 15, 0),
            EnemyVariant::LegacyBoss => stats(120.0, 80.0, 1.5, 0.0, 250, 100, Some(36), 0.6, 40, 25),
            EnemyVariant::FinalBoss => stats(200.0, 120.0, 1.0, 0.0, 5000, 500, None, 0.0, 40, 0),
        }
    }
}

pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

// ── Entry & movement ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryPath {
    Top,
    DiagonalLeft,
    DiagonalRight,
    Spiral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementPattern {
    Straight,
    Zigzag,
    Sine,
    Spiral,
}

impl MovementPattern {
    pub const ALL: [MovementPattern; 4] = [
        MovementPattern::Straight,
        MovementPattern::Zigzag,
        MovementPattern::Sine,
        MovementPattern::Spiral,
    ];
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub path: EntryPath,
    pub start: (f32, f32),
    pub target: (f32, f32),
    pub progress: f32,
    spiral_angle: f32,
}

impl Entry {
    const STEP: f32 = 0.02;

    fn roll(field: &Field, rng: &mut (impl EventRng + ?Sized)) -> Self {
        let path = if rng.chance(0.7) {
            EntryPath::Top
        } else {
            [EntryPath::DiagonalLeft, EntryPath::DiagonalRight, EntryPath::Spiral][rng.index(3)]
        };
        let w = field.width;
        let (start, target) = match path {
            EntryPath::Top => {
                let x = rng.unit() * (w - 60.0);
                ((x, -60.0), (x, 100.0))
            }
            EntryPath::DiagonalLeft => {
                let start_y = rng.unit() * 200.0 - 100.0;
                let target = (rng.unit() * w * 0.3, rng.unit() * 150.0 + 50.0);
                ((-60.0, start_y), target)
            }
            EntryPath::DiagonalRight => {
                let start_y = rng.unit() * 200.0 - 100.0;
                let target = (w - rng.unit() * w * 0.3, rng.unit() * 150.0 + 50.0);
                ((w + 60.0, start_y), target)
            }
            EntryPath::Spiral => ((w / 2.0, -60.0), (w / 2.0, 120.0)),
        };
        Self { path, start, target, progress: 0.0, spiral_angle: 0.0 }
    }

    /// Moves `body` one step along the path. Returns `true` once arrived.
    fn step(&mut self, body: &mut Body) -> bool {
        self.progress += Self::STEP;
        if self.progress >= 1.0 {
            body.x = self.target.0;
            body.y = self.target.1;
            return true;
        }
        let t = ease_in_out(self.progress);
        body.y = self.start.1 + (self.target.1 - self.start.1) * t;
        body.x = match self.path {
            EntryPath::Spiral => {
                self.spiral_angle += 0.15;
                self.target.0 + self.spiral_angle.cos() * 50.0 * (1.0 - t)
            }
            _ => self.start.0 + (self.target.0 - self.start.0) * t,
        };
        false
    }
}

// ── Brains ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct RegularBrain {
    /// `None` once the entry path has completed.
    pub entry: Option<Entry>,
    pub movement: MovementPattern,
    phase: f32,
    reload: u32,
    /// Ticks spent charging a sniper shot.
    pub sniper_charge: Option<u32>,
}

#[derive(Clone, Debug)]
pub enum EnemyBrain {
    Regular(RegularBrain),
    Shard { life: u32 },
    FinalBoss(Box<FinalBoss>),
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: EntityId,
    pub variant: EnemyVariant,
    pub body: Body,
    pub health: Health,
    pub speed: f32,
    pub points: u32,
    pub contact_damage: u32,
    /// Ticks since spawn.
    pub age: u32,
    pub brain: EnemyBrain,
    pub dead: bool,
}

impl Enemy {
    pub const SPLIT_COUNT: usize = 6;
    pub const SHARD_LIFETIME: u32 = 300;
    const SNIPER_CHARGE: u32 = 60;

    /// Spawns `variant` with a rolled entry path and movement pattern.
    pub fn spawn(
        id: EntityId,
        variant: EnemyVariant,
        field: &Field,
        rng: &mut (impl EventRng + ?Sized),
    ) -> Self {
        match variant {
            EnemyVariant::FinalBoss => return Self::final_boss(id, field),
            EnemyVariant::Shard => {
                let x = rng.unit() * (field.width - 20.0);
                return Self::shard(id, (x, 0.0), (0.0, 0.0));
            }
            _ => {}
        }

        let entry = Entry::roll(field, rng);
        let movement = MovementPattern::ALL[rng.index(MovementPattern::ALL.len())];
        let stats = variant.stats();
        let speed = if stats.speed_jitter > 0.0 {
            stats.base_speed + rng.unit() * stats.speed_jitter
        } else {
            stats.base_speed
        };

        Self {
            id,
            variant,
            body: Body::new(entry.start.0, entry.start.1, stats.width, stats.height),
            health: Health::full(stats.health),
            speed,
            points: stats.points,
            contact_damage: stats.contact_damage,
            age: 0,
            brain: EnemyBrain::Regular(RegularBrain {
                entry: Some(entry),
                movement,
                phase: 0.0,
                reload: 0,
                sniper_charge: None,
            }),
            dead: false,
        }
    }

    /// Splitter offspring: ballistic, short-lived, never shoots.
    pub fn shard(id: EntityId, at: (f32, f32), velocity: (f32, f32)) -> Self {
        let stats = EnemyVariant::Shard.stats();
        Self {
            id,
            variant: EnemyVariant::Shard,
            body: Body::new(at.0, at.1, stats.width, stats.height)
                .with_velocity(velocity.0, velocity.1),
            health: Health::full(stats.health),
            speed: 0.0,
            points: stats.points,
            contact_damage: stats.contact_damage,
            age: 0,
            brain: EnemyBrain::Shard { life: Self::SHARD_LIFETIME },
            dead: false,
        }
    }

    pub fn final_boss(id: EntityId, field: &Field) -> Self {
        let stats = EnemyVariant::FinalBoss.stats();
        let boss = FinalBoss::new(field, stats.width);
        Self {
            id,
            variant: EnemyVariant::FinalBoss,
            body: Body::new(boss.anchor.0, FinalBoss::START_Y, stats.width, stats.height),
            health: Health::full(stats.health),
            speed: stats.base_speed,
            points: stats.points,
            contact_damage: stats.contact_damage,
            age: 0,
            brain: EnemyBrain::FinalBoss(Box::new(boss)),
            dead: false,
        }
    }

    /// Applies `amount` damage, saturating at zero. Returns the damage taken.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health.take_damage(amount)
    }

    pub fn is_boss(&self) -> bool {
        matches!(self.brain, EnemyBrain::FinalBoss(_))
    }

    pub fn boss(&self) -> Option<&FinalBoss> {
        match &self.brain {
            EnemyBrain::FinalBoss(boss) => Some(boss),
            _ => None,
        }
    }

    pub fn boss_mut(&mut self) -> Option<&mut FinalBoss> {
        match &mut self.brain {
            EnemyBrain::FinalBoss(boss) => Some(boss),
            _ => None,
        }
    }

    /// Whether player fire can still hurt this enemy.
    pub fn is_targetable(&self) -> bool {
        if self.dead || self.health.is_depleted() {
            return false;
        }
        self.boss().map_or(true, |boss| !boss.is_defeated())
    }

    /// Offspring released when this enemy dies; empty unless it is a splitter.
    pub fn offspring(&self, ids: &mut IdAllocator) -> Vec<Enemy> {
        if self.variant != EnemyVariant::Splitter {
            return Vec::new();
        }
        (0..Self::SPLIT_COUNT)
            .map(|i| {
                let angle = i as f32 / Self::SPLIT_COUNT as f32 * TAU;
                let (sin, cos) = angle.sin_cos();
                Self::shard(
                    ids.next_id(),
                    (self.body.x + cos * 30.0, self.body.y + sin * 30.0),
                    (cos * 3.0, sin * 3.0),
                )
            })
            .collect()
    }
}

impl Actor for Enemy {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Enemy
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn advance(&mut self, ctx: &mut TickCtx<'_>) {
        self.age += 1;
        match &mut self.brain {
            EnemyBrain::Regular(brain) => {
                brain.advance(self.variant, &mut self.body, self.speed, self.age, ctx)
            }
            EnemyBrain::Shard { life } => {
                let body = &mut self.body;
                body.integrate();
                *life = life.saturating_sub(1);
                if body.x <= 0.0 || body.x >= ctx.field.width - body.width {
                    body.vx *= -0.8;
                }
                if body.y <= 0.0 {
                    body.vy *= -0.8;
                }
                body.vy += 0.1;
            }
            EnemyBrain::FinalBoss(boss) => boss.advance(&mut self.body, &self.health, ctx),
        }
    }

    fn is_expired(&self, field: &Field) -> bool {
        if self.dead {
            return true;
        }
        match &self.brain {
            EnemyBrain::Regular(_) => self.body.below_field(field),
            EnemyBrain::Shard { life } => *life == 0 || self.body.below_field(field),
            EnemyBrain::FinalBoss(_) => false,
        }
    }
}

impl RegularBrain {
    fn advance(
        &mut self,
        variant: EnemyVariant,
        body: &mut Body,
        speed: f32,
        age: u32,
        ctx: &mut TickCtx<'_>,
    ) {
        if let Some(entry) = self.entry.as_mut() {
            if entry.step(body) {
                self.entry = None;
            }
            return;
        }

        self.steer(variant, body, speed, age, ctx);

        let stats = variant.stats();
        if let Some(cooldown) = stats.shoot_cooldown {
            if self.reload == 0 {
                self.shoot(variant, body, ctx);
                self.reload = cooldown;
            }
            self.reload -= 1;
        }

        if let Some(charge) = self.sniper_charge.as_mut() {
            *charge += 1;
            if *charge >= Enemy::SNIPER_CHARGE {
                self.sniper_charge = None;
                fire_aimed(body, ctx, ProjectileKind::SniperShot, 8.0, stats.shot_damage);
            }
        }
    }

    fn steer(
        &mut self,
        variant: EnemyVariant,
        body: &mut Body,
        speed: f32,
        age: u32,
        ctx: &mut TickCtx<'_>,
    ) {
        if variant == EnemyVariant::LegacyBoss {
            body.x += (age as f32 * 0.05).sin() * 3.0;
            body.y = (body.y + speed).min(120.0);
        } else {
            body.y += speed * ctx.pace;
            self.phase += 0.05;
            body.x += match self.movement {
                MovementPattern::Straight => 0.0,
                MovementPattern::Zigzag => (self.phase * 2.0).sin() * 1.5,
                MovementPattern::Sine => self.phase.sin() * 2.0,
                MovementPattern::Spiral => (self.phase * 1.5).cos() * 1.8,
            };
            if variant == EnemyVariant::Fast {
                body.x += (body.y * 0.03).sin() * 1.5;
            }
        }
        body.clamp_x(&ctx.field);
    }

    fn shoot(&mut self, variant: EnemyVariant, body: &Body, ctx: &mut TickCtx<'_>) {
        let stats = variant.stats();
        let muzzle = body.muzzle();
        match variant {
            EnemyVariant::Basic | EnemyVariant::Splitter => {
                let offset = ctx.rng.jitter(100.0) * (1.0 - stats.accuracy);
                push_shot(ctx, (muzzle.0 + offset, muzzle.1), (0.0, 4.0), stats.shot_damage);
            }
            EnemyVariant::Fast => {
                let (cx, cy) = body.center();
                let dx = ctx.player_center.0 - cx;
                let dy = ctx.player_center.1 - cy;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance > 0.0 {
                    let accuracy = stats.accuracy + ctx.rng.jitter(0.3);
                    let velocity = (dx / distance * 5.0 * accuracy, dy / distance * 5.0 * accuracy);
                    push_shot(ctx, muzzle, velocity, stats.shot_damage);
                }
            }
            EnemyVariant::Heavy => {
                for i in -1..=1 {
                    let offset = ctx.rng.jitter(50.0) * (1.0 - stats.accuracy);
                    let vx = i as f32 * 2.0 + offset * 0.1;
                    push_shot(ctx, muzzle, (vx, 4.0), stats.shot_damage);
                }
            }
            EnemyVariant::Sniper => {
                if self.sniper_charge.is_none() {
                    self.sniper_charge = Some(0);
                }
            }
            EnemyVariant::LegacyBoss => {
                for i in -2..=2 {
                    push_shot(ctx, muzzle, (i as f32 * 3.0, 5.0), stats.shot_damage);
                }
            }
            EnemyVariant::Shard | EnemyVariant::FinalBoss => {}
        }
    }
}

fn push_shot(ctx: &mut TickCtx<'_>, muzzle: (f32, f32), velocity: (f32, f32), damage: u32) {
    let shot = Projectile::new(
        ctx.ids.next_id(),
        ProjectileKind::EnemyShot,
        Side::Hostile,
        muzzle,
        velocity,
        damage,
    );
    ctx.spawns.projectiles.push(shot);
}

/// Fires straight at the current player center.
fn fire_aimed(body: &Body, ctx: &mut TickCtx<'_>, kind: ProjectileKind, speed: f32, damage: u32) {
    let (cx, cy) = body.center();
    let dx = ctx.player_center.0 - cx;
    let dy = ctx.player_center.1 - cy;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance <= 0.0 {
        return;
    }
    let shot = Projectile::new(
        ctx.ids.next_id(),
        kind,
        Side::Hostile,
        body.muzzle(),
        (dx / distance * speed, dy / distance * speed),
        damage,
    );
    ctx.spawns.projectiles.push(shot);
}
