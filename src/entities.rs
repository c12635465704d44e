//! Entity model shared by every simulated actor.
//!
//! Positions are the top-left corner of an axis-aligned box, in field units
//! (pixels of the original play-field). Health is unsigned, so damage
//! saturates at zero instead of going negative.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::enemy::Enemy;
use crate::events::GameEvent;
use crate::projectile::Projectile;
use crate::rng::EventRng;
use crate::schedule::{Schedule, VolleyShot};

// ── Identity ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Hands out unique ids for the lifetime of one encounter.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> EntityId {
        self.next += 1;
        EntityId(self.next)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Enemy,
    Projectile,
    Pickup,
    Marker,
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Default for Field {
    fn default() -> Self {
        Self { width: 800.0, height: 600.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, vx: 0.0, vy: 0.0, width, height }
    }

    /// A box whose horizontal center sits at `cx`.
    pub fn centered(cx: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, y, width, height)
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Middle of the bottom edge; where shots leave a ship.
    pub fn muzzle(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height)
    }

    /// Strict AABB overlap; touching edges do not collide.
    pub fn overlaps(&self, other: &Body) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn integrate(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
    }

    pub fn clamp_x(&mut self, field: &Field) {
        self.x = self.x.clamp(0.0, (field.width - self.width).max(0.0));
    }

    pub fn below_field(&self, field: &Field) -> bool {
        self.y > field.height + self.height
    }

    /// Fully past any edge by at least the box's own size.
    pub fn outside_field(&self, field: &Field) -> bool {
        self.below_field(field)
            || self.y < -self.height
            || self.x < -self.width
            || self.x > field.width + self.width
    }

    /// Random point inside the box.
    pub fn random_point(&self, rng: &mut (impl EventRng + ?Sized)) -> (f32, f32) {
        (self.x + rng.unit() * self.width, self.y + rng.unit() * self.height)
    }
}

pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

// ── Health ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Subtracts `amount`, clamping at zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.current);
        self.current -= taken;
        taken
    }

    /// Adds up to `amount` without exceeding `max`. Returns the amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max - self.current.min(self.max));
        self.current += healed;
        healed
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// `current <= max * percent / 100`, evaluated without floating point.
    pub fn at_or_below_percent(&self, percent: u32) -> bool {
        u64::from(self.current) * 100 <= u64::from(self.max) * u64::from(percent)
    }
}

// ── Capability set ────────────────────────────────────────────────────────────

/// Everything an entity may touch while advancing one tick.
///
/// New entities go into `spawns` and are merged only after combat resolution,
/// so nothing created this tick is seen by this tick's collision scan.
pub struct TickCtx<'a> {
    pub sim_tick: u64,
    pub field: Field,
    pub player_center: (f32, f32),
    /// Regular-enemy descent multiplier from progression.
    pub pace: f32,
    pub rng: &'a mut dyn RngCore,
    pub ids: &'a mut IdAllocator,
    pub spawns: &'a mut Spawns,
    pub volleys: &'a mut Schedule<VolleyShot>,
    pub events: &'a mut Vec<GameEvent>,
}

/// Per-tick behavior shared by all actors, dispatched on the concrete type.
pub trait Actor {
    fn id(&self) -> EntityId;
    fn kind(&self) -> EntityKind;
    fn body(&self) -> &Body;
    fn advance(&mut self, ctx: &mut TickCtx<'_>);
    fn is_expired(&self, field: &Field) -> bool;
}

/// Advances every actor, then drops the expired ones in a single stable pass.
pub fn advance_all<A: Actor>(actors: &mut Vec<A>, ctx: &mut TickCtx<'_>) {
    for actor in actors.iter_mut() {
        actor.advance(ctx);
    }
    let field = ctx.field;
    actors.retain(|actor| !actor.is_expired(&field));
}

// ── Spawn buffer ──────────────────────────────────────────────────────────────

/// Entities created during a tick, merged into the live collections between
/// ticks.
#[derive(Debug, Default)]
pub struct Spawns {
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub markers: Vec<Marker>,
}

impl Spawns {
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
            && self.projectiles.is_empty()
            && self.pickups.is_empty()
            && self.markers.is_empty()
    }

    pub fn marker(&mut self, ids: &mut IdAllocator, kind: MarkerKind, at: (f32, f32), size: f32) {
        self.markers.push(Marker::new(ids.next_id(), kind, at, size));
    }
}

// ── Pickups ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickupKind {
    /// Restores 50 health.
    Health,
    /// Half a magazine for a random special weapon.
    Weapon,
    /// Flat score bonus.
    Score,
}

impl PickupKind {
    pub const ALL: [PickupKind; 3] = [PickupKind::Health, PickupKind::Weapon, PickupKind::Score];

    pub fn random(rng: &mut (impl EventRng + ?Sized)) -> Self {
        Self::ALL[rng.index(Self::ALL.len())]
    }
}

#[derive(Clone, Debug)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: PickupKind,
    pub body: Body,
    pub life: u32,
}

impl Pickup {
    pub const SIZE: f32 = 25.0;
    pub const FALL_SPEED: f32 = 2.0;
    pub const LIFETIME: u32 = 400;
    pub const HEAL: u32 = 50;
    pub const SCORE_BONUS: u32 = 100;

    pub fn new(id: EntityId, kind: PickupKind, x: f32, y: f32) -> Self {
        Self {
            id,
            kind,
            body: Body::new(x, y, Self::SIZE, Self::SIZE).with_velocity(0.0, Self::FALL_SPEED),
            life: Self::LIFETIME,
        }
    }
}

impl Actor for Pickup {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Pickup
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn advance(&mut self, _ctx: &mut TickCtx<'_>) {
        self.body.integrate();
        self.life = self.life.saturating_sub(1);
    }

    fn is_expired(&self, field: &Field) -> bool {
        self.life == 0 || self.body.below_field(field)
    }
}

// ── Visual markers ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    Explosion,
    RocketBlast,
    BombWave,
    Revive,
    ChargeWarning,
}

impl MarkerKind {
    pub fn lifetime(self) -> u32 {
        match self {
            MarkerKind::Explosion | MarkerKind::RocketBlast => 30,
            MarkerKind::BombWave | MarkerKind::Revive => 60,
            MarkerKind::ChargeWarning => 80,
        }
    }
}

/// Cosmetic-only entity. Its timer keeps running while the simulation is
/// suspended.
#[derive(Clone, Debug)]
pub struct Marker {
    pub id: EntityId,
    pub kind: MarkerKind,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub frames: u32,
}

impl Marker {
    pub fn new(id: EntityId, kind: MarkerKind, at: (f32, f32), size: f32) -> Self {
        Self { id, kind, x: at.0, y: at.1, size, frames: kind.lifetime() }
    }

    pub fn tick(&mut self) {
        self.frames = self.frames.saturating_sub(1);
    }

    pub fn is_done(&self) -> bool {
        self.frames == 0
    }

    /// 1.0 when fresh, approaching 0.0 as the marker fades.
    pub fn remaining(&self) -> f32 {
        self.frames as f32 / self.kind.lifetime() as f32
    }
}
