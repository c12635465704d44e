//! Projectiles fired by the player, regular enemies and the final boss.

use std::collections::HashSet;

use crate::entities::{Actor, Body, EntityId, EntityKind, Field, TickCtx};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Player,
    Hostile,
}

/// What the projectile looks like and which rules it carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileKind {
    Bullet,
    Rocket,
    Laser,
    Pellet,
    EnemyShot,
    SniperShot,
    Boss(BossShot),
    BossBeam { center: bool },
}

/// Final-boss bullet families. Each carries its own damage and box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BossShot {
    Spiral,
    Spread,
    Directional,
    Burst,
    Cross,
    Wave,
    Chaos,
    Hell,
    Sweep,
    Homing,
}

impl BossShot {
    pub fn damage(self) -> u32 {
        match self {
            BossShot::Spiral | BossShot::Cross => 20,
            BossShot::Spread | BossShot::Wave => 18,
            BossShot::Directional => 22,
            BossShot::Burst => 16,
            BossShot::Chaos => 25,
            BossShot::Hell => 30,
            BossShot::Sweep => 35,
            BossShot::Homing => 40,
        }
    }

    pub fn size(self) -> (f32, f32) {
        match self {
            BossShot::Sweep => (6.0, 20.0),
            BossShot::Homing => (10.0, 15.0),
            _ => (8.0, 12.0),
        }
    }

    pub fn lifetime(self) -> u32 {
        match self {
            BossShot::Homing => 600,
            _ => 360,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Linear,
    /// Horizontal drift driven by the remaining lifetime.
    Wave,
    /// Eases velocity toward the player center each tick.
    Homing { speed: f32, turn_rate: f32 },
}

/// Splash parameters: full damage inside `inner`, 60% (floored) inside `outer`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blast {
    pub inner: f32,
    pub outer: f32,
}

impl Blast {
    pub const ROCKET: Blast = Blast { inner: 50.0, outer: 100.0 };

    pub fn falloff(&self, damage: u32, distance: f32) -> Option<u32> {
        if distance <= self.inner {
            Some(damage)
        } else if distance <= self.outer {
            Some(damage * 3 / 5)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub id: EntityId,
    pub kind: ProjectileKind,
    pub side: Side,
    pub body: Body,
    pub damage: u32,
    /// Remaining ticks; `None` lives until it leaves the field.
    pub life: Option<u32>,
    pub motion: Motion,
    pub blast: Option<Blast>,
    pub piercing: bool,
    /// Targets already struck by a piercing projectile.
    pub hits: HashSet<EntityId>,
    pub consumed: bool,
}

impl Projectile {
    /// A projectile whose box is horizontally centered on `muzzle`.
    pub fn new(
        id: EntityId,
        kind: ProjectileKind,
        side: Side,
        muzzle: (f32, f32),
        velocity: (f32, f32),
        damage: u32,
    ) -> Self {
        let (width, height) = kind_size(kind);
        Self {
            id,
            kind,
            side,
            body: Body::centered(muzzle.0, muzzle.1, width, height)
                .with_velocity(velocity.0, velocity.1),
            damage,
            life: None,
            motion: Motion::Linear,
            blast: None,
            piercing: false,
            hits: HashSet::new(),
            consumed: false,
        }
    }

    pub fn boss(id: EntityId, shot: BossShot, muzzle: (f32, f32), velocity: (f32, f32)) -> Self {
        let motion = match shot {
            BossShot::Wave => Motion::Wave,
            BossShot::Homing => Motion::Homing { speed: 3.0, turn_rate: 0.1 },
            _ => Motion::Linear,
        };
        Self::new(id, ProjectileKind::Boss(shot), Side::Hostile, muzzle, velocity, shot.damage())
            .with_life(shot.lifetime())
            .with_motion(motion)
    }

    pub fn with_life(mut self, life: u32) -> Self {
        self.life = Some(life);
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_blast(mut self, blast: Blast) -> Self {
        self.blast = Some(blast);
        self
    }

    pub fn piercing(mut self) -> Self {
        self.piercing = true;
        self
    }

    pub fn is_hostile(&self) -> bool {
        self.side == Side::Hostile
    }

    /// Registers a hit on `target`. Returns `false` when the hit must be
    /// ignored: the projectile is already spent, or it pierces and has already
    /// struck this target.
    pub fn strike(&mut self, target: EntityId) -> bool {
        if self.consumed {
            return false;
        }
        if self.piercing {
            return self.hits.insert(target);
        }
        self.consumed = true;
        true
    }
}

fn kind_size(kind: ProjectileKind) -> (f32, f32) {
    match kind {
        ProjectileKind::Bullet | ProjectileKind::Pellet => (4.0, 12.0),
        ProjectileKind::Rocket => (8.0, 16.0),
        ProjectileKind::Laser => (6.0, 25.0),
        ProjectileKind::EnemyShot => (6.0, 10.0),
        ProjectileKind::SniperShot => (8.0, 15.0),
        ProjectileKind::Boss(shot) => shot.size(),
        ProjectileKind::BossBeam { center: true } => (12.0, 30.0),
        ProjectileKind::BossBeam { center: false } => (8.0, 30.0),
    }
}

impl Actor for Projectile {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Projectile
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn advance(&mut self, ctx: &mut TickCtx<'_>) {
        if let Motion::Homing { speed, turn_rate } = self.motion {
            let dx = ctx.player_center.0 - self.body.x;
            let dy = ctx.player_center.1 - self.body.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance > 0.0 {
                self.body.vx += (dx / distance * speed - self.body.vx) * turn_rate;
                self.body.vy += (dy / distance * speed - self.body.vy) * turn_rate;
            }
        }

        self.body.integrate();
        if let Some(life) = self.life.as_mut() {
            *life = life.saturating_sub(1);
        }

        if self.motion == Motion::Wave {
            let life = self.life.unwrap_or(0) as f32;
            self.body.vx += (life * 0.1).sin() * 0.2;
        }
    }

    fn is_expired(&self, field: &Field) -> bool {
        self.consumed || self.life == Some(0) || self.body.outside_field(field)
    }
}
