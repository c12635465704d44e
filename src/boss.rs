//! Final boss state machine.
//!
//! Entering → Phase1 → Phase2 → Phase3 → Defeated, never backwards. Charging
//! is a detour from any combat phase and returns to whichever phase the
//! current health implies.

use tracing::info;

use crate::enemy::ease_in_out;
use crate::entities::{Body, Field, Health, MarkerKind, TickCtx};
use crate::events::GameEvent;
use crate::patterns::{self, Attack};
use crate::projectile::{Projectile, ProjectileKind, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BossState {
    Entering,
    Phase1,
    Phase2,
    Phase3,
    Charging,
    Defeated,
}

impl BossState {
    pub fn is_combat_phase(self) -> bool {
        matches!(self, BossState::Phase1 | BossState::Phase2 | BossState::Phase3)
    }

    /// Ticks between attacks in a combat phase.
    pub fn attack_interval(self) -> Option<u32> {
        match self {
            BossState::Phase1 => Some(180),
            BossState::Phase2 => Some(120),
            BossState::Phase3 => Some(60),
            _ => None,
        }
    }
}

/// A locked-on beam attack in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Charge {
    pub target: (f32, f32),
    pub ticks: u32,
    /// Combat phase the charge interrupted.
    pub left: BossState,
}

#[derive(Clone, Debug)]
pub struct FinalBoss {
    pub state: BossState,
    /// Ticks since the last state change.
    pub state_ticks: u32,
    pub entry_progress: f32,
    pub spiral_angle: f32,
    pub charge: Option<Charge>,
    /// Top-left resting position once the entry completes.
    pub anchor: (f32, f32),
    victory_signalled: bool,
}

impl FinalBoss {
    pub const START_Y: f32 = -150.0;
    pub const ANCHOR_Y: f32 = 80.0;
    const ENTRY_STEP: f32 = 0.008;
    pub const CHARGE_TICKS: u32 = 80;
    pub const VICTORY_DELAY: u32 = 300;
    const SINK_SPEED: f32 = 2.0;
    const EXPLOSION_EVERY: u32 = 20;
    const BEAM_LANES: i32 = 8;
    const BEAM_SPACING: f32 = 10.0;
    const BEAM_SPEED: f32 = 12.0;
    const BEAM_LIFE: u32 = 80;

    pub fn new(field: &Field, width: f32) -> Self {
        Self {
            state: BossState::Entering,
            state_ticks: 0,
            entry_progress: 0.0,
            spiral_angle: 0.0,
            charge: None,
            anchor: (field.width / 2.0 - width / 2.0, Self::ANCHOR_Y),
            victory_signalled: false,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.state == BossState::Defeated
    }

    pub fn has_signalled_victory(&self) -> bool {
        self.victory_signalled
    }

    /// The state implied by `health` alone.
    pub fn phase_for(health: &Health) -> BossState {
        if health.is_depleted() {
            BossState::Defeated
        } else if health.at_or_below_percent(33) {
            BossState::Phase3
        } else if health.at_or_below_percent(66) {
            BossState::Phase2
        } else {
            BossState::Phase1
        }
    }

    /// Applies any transition the current health demands. Called every tick
    /// and right after combat damages the boss.
    pub fn sync_phase(&mut self, health: &Health, events: &mut Vec<GameEvent>) {
        let implied = Self::phase_for(health);
        match self.state {
            BossState::Phase1 | BossState::Phase2 | BossState::Phase3 if implied > self.state => {
                self.transition(implied, events);
            }
            BossState::Entering | BossState::Charging if implied == BossState::Defeated => {
                self.charge = None;
                self.transition(BossState::Defeated, events);
            }
            _ => {}
        }
    }

    fn transition(&mut self, to: BossState, events: &mut Vec<GameEvent>) {
        info!(from = ?self.state, to = ?to, "boss phase transition");
        events.push(GameEvent::PhaseTransition { from: self.state, to });
        if to == BossState::Defeated {
            events.push(GameEvent::BossDefeated);
        }
        self.state = to;
        self.state_ticks = 0;
    }

    pub fn advance(&mut self, body: &mut Body, health: &Health, ctx: &mut TickCtx<'_>) {
        self.state_ticks += 1;
        match self.state {
            BossState::Entering => {
                self.entry_progress += Self::ENTRY_STEP;
                body.x = self.anchor.0;
                if self.entry_progress >= 1.0 {
                    body.y = self.anchor.1;
                    self.transition(BossState::Phase1, ctx.events);
                    self.sync_phase(health, ctx.events);
                } else {
                    let t = ease_in_out(self.entry_progress);
                    body.y = Self::START_Y + (self.anchor.1 - Self::START_Y) * t;
                }
            }
            BossState::Phase1 | BossState::Phase2 | BossState::Phase3 => {
                let range = ctx.field.width - body.width - 40.0;
                let center = ctx.field.width / 2.0 - body.width / 2.0;
                body.x = center + (self.state_ticks as f32 * 0.02).sin() * (range / 2.0);

                let interval = self.state.attack_interval().unwrap_or(u32::MAX);
                if self.state_ticks % interval == 0 {
                    match patterns::choose(self.state, &mut *ctx.rng) {
                        Some(Attack::Charge) => self.start_charge(ctx),
                        Some(Attack::Pattern(pattern)) => {
                            patterns::emit(pattern, body, &mut self.spiral_angle, ctx)
                        }
                        None => {}
                    }
                }
                if self.state.is_combat_phase() {
                    self.sync_phase(health, ctx.events);
                }
            }
            BossState::Charging => {
                if let Some(charge) = self.charge.as_mut() {
                    charge.ticks += 1;
                    if charge.ticks >= Self::CHARGE_TICKS {
                        let Charge { target, left, .. } = *charge;
                        self.charge = None;
                        self.fire_beam(body, target, ctx);
                        let back = Self::phase_for(health);
                        if back == BossState::Defeated {
                            self.transition(back, ctx.events);
                        } else {
                            // Only a changed phase is announced.
                            if back != left {
                                info!(from = ?left, to = ?back, "boss phase transition");
                                ctx.events.push(GameEvent::PhaseTransition { from: left, to: back });
                            }
                            self.state = back;
                            self.state_ticks = 0;
                        }
                    }
                }
            }
            BossState::Defeated => {
                body.y += Self::SINK_SPEED;
                if self.state_ticks % Self::EXPLOSION_EVERY == 0 {
                    let at = body.random_point(&mut *ctx.rng);
                    ctx.spawns.marker(ctx.ids, MarkerKind::Explosion, at, 60.0);
                }
                if self.state_ticks > Self::VICTORY_DELAY && !self.victory_signalled {
                    self.victory_signalled = true;
                    info!("final boss destroyed, victory");
                    ctx.events.push(GameEvent::Victory);
                }
            }
        }
        body.clamp_x(&ctx.field);
    }

    fn start_charge(&mut self, ctx: &mut TickCtx<'_>) {
        info!(target_x = ctx.player_center.0, target_y = ctx.player_center.1, "boss charging beam");
        self.charge = Some(Charge { target: ctx.player_center, ticks: 0, left: self.state });
        self.state = BossState::Charging;
        self.state_ticks = 0;
        ctx.events.push(GameEvent::BossCharging);
        ctx.spawns.marker(ctx.ids, MarkerKind::ChargeWarning, ctx.player_center, 80.0);
    }

    /// Parallel lanes aimed at the locked target; the middle lane is heavier.
    fn fire_beam(&self, body: &Body, target: (f32, f32), ctx: &mut TickCtx<'_>) {
        let (sx, sy) = body.muzzle();
        let dx = target.0 - sx;
        let dy = target.1 - sy;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance <= 0.0 {
            return;
        }
        let velocity = (dx / distance * Self::BEAM_SPEED, dy / distance * Self::BEAM_SPEED);
        for lane in 0..Self::BEAM_LANES {
            let center = lane == Self::BEAM_LANES / 2;
            let offset = (lane - Self::BEAM_LANES / 2) as f32 * Self::BEAM_SPACING;
            let damage = if center { 40 } else { 30 };
            let beam = Projectile::new(
                ctx.ids.next_id(),
                ProjectileKind::BossBeam { center },
                Side::Hostile,
                (sx + offset, sy),
                velocity,
                damage,
            )
            .with_life(Self::BEAM_LIFE);
            ctx.spawns.projectiles.push(beam);
        }
    }
}
