//! Final-boss attack patterns.
//!
//! Each pattern is a generator: it emits its first burst into the spawn
//! buffer and queues staggered sub-bursts on the volley schedule.

use std::f32::consts::{FRAC_PI_3, FRAC_PI_6, FRAC_PI_8, TAU};

use tracing::debug;

use crate::boss::BossState;
use crate::entities::{Body, IdAllocator, TickCtx};
use crate::projectile::{BossShot, Projectile};
use crate::rng::EventRng;
use crate::schedule::VolleyShot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackPattern {
    Spiral,
    Spread,
    Directional,
    SpiralBurst,
    Cross,
    Wave,
    ChaosSpiral,
    BulletHell,
    LaserSweep,
    HomingMissiles,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attack {
    Pattern(AttackPattern),
    Charge,
}

/// Attack slots for one combat phase. The last slot is replaced by a charge
/// with probability `charge_chance`.
struct PhaseTable {
    slots: &'static [AttackPattern],
    charge_chance: f32,
}

const PHASE1: PhaseTable = PhaseTable {
    slots: &[AttackPattern::Spiral, AttackPattern::Spread, AttackPattern::Directional],
    charge_chance: 0.3,
};

const PHASE2: PhaseTable = PhaseTable {
    slots: &[
        AttackPattern::SpiralBurst,
        AttackPattern::Cross,
        AttackPattern::Wave,
        AttackPattern::Spread,
    ],
    charge_chance: 0.5,
};

const PHASE3: PhaseTable = PhaseTable {
    slots: &[
        AttackPattern::ChaosSpiral,
        AttackPattern::BulletHell,
        AttackPattern::LaserSweep,
        AttackPattern::HomingMissiles,
        AttackPattern::Cross,
    ],
    charge_chance: 0.7,
};

/// Picks the next attack for `state`; `None` outside the combat phases.
pub fn choose(state: BossState, rng: &mut (impl EventRng + ?Sized)) -> Option<Attack> {
    let table = match state {
        BossState::Phase1 => &PHASE1,
        BossState::Phase2 => &PHASE2,
        BossState::Phase3 => &PHASE3,
        _ => return None,
    };
    let slot = rng.index(table.slots.len());
    if slot == table.slots.len() - 1 && rng.chance(table.charge_chance) {
        return Some(Attack::Charge);
    }
    Some(Attack::Pattern(table.slots[slot]))
}

/// Turns a due volley shot into a projectile leaving `body`'s muzzle.
pub fn resolve(shot: VolleyShot, body: &Body, ids: &mut IdAllocator) -> Projectile {
    let (x, y) = body.muzzle();
    Projectile::boss(ids.next_id(), shot.shot, (x + shot.offset_x, y), (shot.vx, shot.vy))
}

/// Fires now when `delay` is zero, otherwise queues the shot.
fn fire(ctx: &mut TickCtx<'_>, body: &Body, delay: u64, shot: VolleyShot) {
    if delay == 0 {
        let projectile = resolve(shot, body, ctx.ids);
        ctx.spawns.projectiles.push(projectile);
    } else {
        ctx.volleys.push(ctx.sim_tick + delay, shot);
    }
}

fn polar(angle: f32, speed: f32, lift: f32) -> (f32, f32) {
    (angle.cos() * speed, angle.sin() * speed + lift)
}

fn shot(shot: BossShot, (vx, vy): (f32, f32)) -> VolleyShot {
    VolleyShot { offset_x: 0.0, vx, vy, shot }
}

/// Runs `pattern` from `body`. `spiral` is the boss's rotating base angle.
pub fn emit(pattern: AttackPattern, body: &Body, spiral: &mut f32, ctx: &mut TickCtx<'_>) {
    debug!(?pattern, tick = ctx.sim_tick, "boss attack");
    match pattern {
        AttackPattern::Spiral => {
            for i in 0..12 {
                let angle = *spiral + i as f32 * FRAC_PI_6;
                fire(ctx, body, 0, shot(BossShot::Spiral, polar(angle, 4.0, 2.0)));
            }
            *spiral += 0.3;
        }
        AttackPattern::Spread => {
            for i in -6..=6 {
                let angle = i as f32 * 0.25;
                let velocity = (angle.sin() * 5.0, angle.cos() * 5.0 + 2.0);
                fire(ctx, body, 0, shot(BossShot::Spread, velocity));
            }
        }
        AttackPattern::Directional => {
            let (cx, cy) = body.center();
            let dx = ctx.player_center.0 - cx;
            let dy = ctx.player_center.1 - cy;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance > 0.0 {
                for i in 0..5 {
                    let spread = (i as f32 - 2.0) * 0.2;
                    let velocity = (dx / distance * 6.0 + spread, dy / distance * 6.0);
                    fire(ctx, body, 0, shot(BossShot::Directional, velocity));
                }
            }
        }
        AttackPattern::SpiralBurst => {
            for ring in 0..3u64 {
                for i in 0..12 {
                    let angle = *spiral + i as f32 * FRAC_PI_6 + ring as f32 * 0.5;
                    let velocity = polar(angle, 3.0 + ring as f32, 1.0);
                    fire(ctx, body, ring * 12, shot(BossShot::Burst, velocity));
                }
            }
            *spiral += 0.5;
        }
        AttackPattern::Cross => {
            const DIRECTIONS: [(f32, f32); 5] =
                [(0.0, 5.0), (5.0, 0.0), (-5.0, 0.0), (3.5, 3.5), (-3.5, 3.5)];
            for velocity in DIRECTIONS {
                for i in 0..3u64 {
                    fire(ctx, body, i * 6, shot(BossShot::Cross, velocity));
                }
            }
        }
        AttackPattern::Wave => {
            for i in 0..15u64 {
                let volley = VolleyShot {
                    offset_x: (i as f32 - 7.0) * 30.0,
                    vx: 0.0,
                    vy: (i as f32 * 0.5).sin() * 2.0 + 4.0,
                    shot: BossShot::Wave,
                };
                fire(ctx, body, i * 3, volley);
            }
        }
        AttackPattern::ChaosSpiral => {
            for i in 0..16 {
                let base = i as f32 * FRAC_PI_8;
                for angle in [*spiral + base, -*spiral + base] {
                    fire(ctx, body, 0, shot(BossShot::Chaos, polar(angle, 5.0, 2.0)));
                }
            }
            *spiral += 0.4;
        }
        AttackPattern::BulletHell => {
            for i in 0..24 {
                let angle = i as f32 / 24.0 * TAU;
                let speed = 3.0 + ctx.rng.unit() * 3.0;
                fire(ctx, body, 0, shot(BossShot::Hell, polar(angle, speed, 1.0)));
            }
        }
        AttackPattern::LaserSweep => {
            for i in 0..20u64 {
                let angle = -FRAC_PI_3 + i as f32 / 19.0 * (2.0 * FRAC_PI_3);
                fire(ctx, body, i * 2, shot(BossShot::Sweep, polar(angle, 8.0, 2.0)));
            }
        }
        AttackPattern::HomingMissiles => {
            for i in 0..4u64 {
                let volley = VolleyShot {
                    offset_x: (i as f32 - 1.5) * 40.0,
                    vx: 0.0,
                    vy: 2.0,
                    shot: BossShot::Homing,
                };
                fire(ctx, body, i * 18, volley);
            }
        }
    }
}
