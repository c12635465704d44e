//! Simulation context and the per-tick loop.
//!
//! [`GameState`] owns every collection. [`tick`] advances it by one logical
//! tick; all randomness comes through the injected RNG, so a seeded RNG and a
//! fixed input sequence always reproduce the same encounter.

use rand::{Rng, RngCore};
use tracing::{info, warn};

use crate::combat;
use crate::config::SimConfig;
use crate::director::WaveDirector;
use crate::enemy::Enemy;
use crate::entities::{
    advance_all, Actor, IdAllocator, Marker, MarkerKind, Pickup, Spawns, TickCtx,
};
use crate::error::SimError;
use crate::events::GameEvent;
use crate::input::InputSnapshot;
use crate::patterns;
use crate::persist::{PlayerSnapshot, Snapshot};
use crate::player::Player;
use crate::projectile::Projectile;
use crate::schedule::{Schedule, Timer, VolleyShot};
use crate::upgrades::{self, PlayerUpgrades, Progression, UpgradeKind, UpgradeTargets};
use crate::weapons::{Arsenal, Volley, WeaponKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    /// Waiting for an upgrade choice; only cosmetic timers run.
    Upgrading,
    /// Revive grace period; only cosmetic timers and the revive queue run.
    Reviving,
    Victory,
    Defeat,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        matches!(self, GameStatus::Victory | GameStatus::Defeat)
    }
}

#[derive(Debug)]
pub struct GameState {
    pub config: SimConfig,
    pub status: GameStatus,
    /// Advances on every call to [`tick`].
    pub clock: u64,
    /// Advances only while playing.
    pub sim_tick: u64,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub markers: Vec<Marker>,
    pub arsenal: Arsenal,
    pub upgrades: PlayerUpgrades,
    pub progression: Progression,
    pub director: WaveDirector,
    pub offer: Vec<UpgradeKind>,
    pub ids: IdAllocator,
    pub volleys: Schedule<VolleyShot>,
    pub timers: Schedule<Timer>,
    pub spawns: Spawns,
    pub events: Vec<GameEvent>,
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Fresh encounter for `config`.
pub fn init_state(config: SimConfig) -> GameState {
    let mut ids = IdAllocator::default();
    let player = Player::new(ids.next_id(), &config.field, &config.player);
    let progression = Progression::new(&config.progression);
    GameState {
        status: GameStatus::Playing,
        clock: 0,
        sim_tick: 0,
        player,
        enemies: Vec::new(),
        projectiles: Vec::new(),
        pickups: Vec::new(),
        markers: Vec::new(),
        arsenal: Arsenal::default(),
        upgrades: PlayerUpgrades::default(),
        progression,
        director: WaveDirector::default(),
        offer: Vec::new(),
        ids,
        volleys: Schedule::default(),
        timers: Schedule::default(),
        spawns: Spawns::default(),
        events: Vec::new(),
        config,
    }
}

// ── Per-tick loop ────────────────────────────────────────────────────────────

/// Advance the encounter by one tick.
pub fn tick(state: &mut GameState, input: &InputSnapshot, rng: &mut impl Rng) {
    state.clock += 1;

    // ── 1. Cosmetic timers and the revive queue always run ──────────────────
    for marker in state.markers.iter_mut() {
        marker.tick();
    }
    state.markers.retain(|marker| !marker.is_done());
    for timer in state.timers.drain_due(state.clock) {
        run_timer(state, timer);
    }

    if state.status != GameStatus::Playing {
        return;
    }
    state.sim_tick += 1;

    // ── 2. Player intent ─────────────────────────────────────────────────────
    if let Some(kind) = input.switch_weapon {
        state.switch_weapon(kind);
    }
    if input.bomb {
        state.use_bomb();
    }
    state.player.steer(input);

    // ── 3. Wave director ─────────────────────────────────────────────────────
    let level = state.progression.level;
    state.director.tick(
        &state.config,
        level,
        rng,
        &mut state.ids,
        &mut state.spawns,
        &mut state.events,
    );

    // ── 4. Due boss volleys, aimed from wherever the boss is now ─────────────
    let due = state.volleys.drain_due(state.sim_tick);
    if let Some(boss) = state.enemies.iter().find(|enemy| enemy.is_boss()) {
        for shot in due {
            let projectile = patterns::resolve(shot, &boss.body, &mut state.ids);
            state.spawns.projectiles.push(projectile);
        }
    }

    // ── 5. Advance every entity ──────────────────────────────────────────────
    let pace = state.progression.pace(&state.config.progression);
    {
        let mut ctx = TickCtx {
            sim_tick: state.sim_tick,
            field: state.config.field,
            player_center: state.player.center(),
            pace,
            rng: &mut *rng as &mut dyn RngCore,
            ids: &mut state.ids,
            spawns: &mut state.spawns,
            volleys: &mut state.volleys,
            events: &mut state.events,
        };
        state.player.advance(&mut ctx);
        ctx.player_center = state.player.center();
        advance_all(&mut state.enemies, &mut ctx);
        advance_all(&mut state.projectiles, &mut ctx);
        advance_all(&mut state.pickups, &mut ctx);
    }
    state
        .player
        .regenerate_shield(state.upgrades.shield, &state.config.upgrades.tuning);
    if input.fire {
        fire_weapon(state);
    }

    // ── 6. Combat ────────────────────────────────────────────────────────────
    combat::resolve(state, rng);

    // ── 7. Merge this tick's spawns ──────────────────────────────────────────
    let spawns = std::mem::take(&mut state.spawns);
    state.enemies.extend(spawns.enemies);
    state.projectiles.extend(spawns.projectiles);
    state.pickups.extend(spawns.pickups);
    state.markers.extend(spawns.markers);

    // ── 8. Terminal conditions and progression ───────────────────────────────
    let victory = state
        .enemies
        .iter()
        .filter_map(Enemy::boss)
        .any(|boss| boss.has_signalled_victory());
    if victory {
        state.status = GameStatus::Victory;
        return;
    }

    if state.player.health.is_depleted() {
        revive_or_lose(state);
        return;
    }

    if state.progression.try_level_up(&state.config.progression) {
        state.offer = upgrades::build_offer(&state.upgrades, &state.config.upgrades, rng);
        state.status = GameStatus::Upgrading;
        state.events.push(GameEvent::LevelUp {
            level: state.progression.level,
            offered: state.offer.clone(),
        });
    }
}

fn fire_weapon(state: &mut GameState) {
    if state.player.reload > 0 {
        return;
    }
    match state.arsenal.fire(&mut state.ids, state.player.muzzle()) {
        Volley::Fired(projectiles) => {
            state.spawns.projectiles.extend(projectiles);
            state.player.reload = state.arsenal.current_params().cooldown;
        }
        Volley::OutOfAmmo(kind) => {
            info!(?kind, "out of ammo, switching to normal");
            state.events.push(GameEvent::WeaponSwitched { weapon: WeaponKind::Normal, auto: true });
        }
    }
}

fn run_timer(state: &mut GameState, timer: Timer) {
    match timer {
        Timer::ReviveClear => {
            let cleared = state.clear_hostile_fire();
            let at = state.player.center();
            let size = state.config.field.width;
            state.markers.push(Marker::new(state.ids.next_id(), MarkerKind::BombWave, at, size));
            info!(cleared, "revive screen clear");
        }
        Timer::ReviveResume => {
            if state.status == GameStatus::Reviving {
                state.status = GameStatus::Playing;
                info!("revive grace over, resuming");
            }
        }
    }
}

fn revive_or_lose(state: &mut GameState) {
    if state.upgrades.revives == 0 {
        state.status = GameStatus::Defeat;
        state.events.push(GameEvent::Defeat);
        info!(score = state.progression.score, level = state.progression.level, "defeat");
        return;
    }

    state.upgrades.revives -= 1;
    let player_config = &state.config.player;
    let health = &mut state.player.health;
    health.current = (health.max / 2).max(1);
    state.player.invulnerable = player_config.revive_invulnerability;
    state.status = GameStatus::Reviving;

    for delay in &player_config.revive_clears {
        state.timers.push(state.clock + u64::from(*delay), Timer::ReviveClear);
    }
    state
        .timers
        .push(state.clock + u64::from(player_config.revive_grace), Timer::ReviveResume);

    let at = state.player.center();
    state.markers.push(Marker::new(state.ids.next_id(), MarkerKind::Revive, at, 100.0));
    state.events.push(GameEvent::PlayerRevived { remaining: state.upgrades.revives });
    info!(remaining = state.upgrades.revives, "player revived");
}

// ── Operations driven from outside the tick ─────────────────────────────────

impl GameState {
    pub fn offered(&self) -> &[UpgradeKind] {
        &self.offer
    }

    /// Applies the chosen upgrade and resumes play. `None` skips, which is
    /// only allowed when nothing was offered.
    pub fn select_upgrade(&mut self, choice: Option<UpgradeKind>) -> Result<(), SimError> {
        if self.status != GameStatus::Upgrading {
            return Err(SimError::NotUpgrading);
        }
        match choice {
            None if !self.offer.is_empty() => return Err(SimError::ChoiceRequired(self.offer.len())),
            None => {}
            Some(kind) => {
                if !self.offer.contains(&kind) {
                    warn!(?kind, offer = ?self.offer, "upgrade not offered");
                    return Err(SimError::UpgradeNotOffered(kind));
                }
                upgrades::apply(
                    kind,
                    &self.config.upgrades,
                    UpgradeTargets {
                        upgrades: &mut self.upgrades,
                        arsenal: &mut self.arsenal,
                        player: &mut self.player,
                        player_config: &self.config.player,
                    },
                )?;
            }
        }
        self.offer.clear();
        self.status = GameStatus::Playing;
        Ok(())
    }

    /// Spends a bomb to wipe all hostile projectiles. Returns whether one
    /// was used.
    pub fn use_bomb(&mut self) -> bool {
        if self.status != GameStatus::Playing || self.upgrades.bombs == 0 {
            return false;
        }
        self.upgrades.bombs -= 1;
        let cleared = self.clear_hostile_fire();
        let at = self.player.center();
        let size = self.config.field.width;
        self.markers.push(Marker::new(self.ids.next_id(), MarkerKind::BombWave, at, size));
        self.events.push(GameEvent::BombUsed { remaining: self.upgrades.bombs, cleared });
        info!(remaining = self.upgrades.bombs, cleared, "bomb used");
        true
    }

    /// Selects `kind` if it has ammo. Returns whether the weapon changed.
    pub fn switch_weapon(&mut self, kind: WeaponKind) -> bool {
        let switched = self.arsenal.select(kind);
        if switched {
            self.events.push(GameEvent::WeaponSwitched { weapon: kind, auto: false });
        }
        switched
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn boss(&self) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.is_boss())
    }

    /// Starts over with the same configuration.
    pub fn reset(&mut self) {
        *self = init_state(self.config.clone());
    }

    fn clear_hostile_fire(&mut self) -> usize {
        let before = self.projectiles.len();
        self.projectiles.retain(|projectile| !projectile.is_hostile());
        before - self.projectiles.len()
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        let body = &self.player.body;
        Snapshot {
            score: Some(self.progression.score),
            level: Some(self.progression.level),
            upgrades_taken: Some(self.progression.upgrades_taken),
            next_threshold: Some(self.progression.next_threshold),
            upgrades: Some(self.upgrades.clone()),
            weapons: Some(self.arsenal.snapshot()),
            current_weapon: Some(self.arsenal.current()),
            player: Some(PlayerSnapshot {
                x: Some(body.x),
                y: Some(body.y),
                vx: Some(body.vx),
                vy: Some(body.vy),
                health: Some(self.player.health.current),
                max_health: Some(self.player.health.max),
                max_speed: Some(self.player.max_speed),
            }),
        }
    }

    /// Overlays the fields present in `snapshot`; absent ones keep their
    /// current values.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let progression = &mut self.progression;
        progression.score = snapshot.score.unwrap_or(progression.score);
        progression.level = snapshot.level.unwrap_or(progression.level);
        progression.upgrades_taken = snapshot.upgrades_taken.unwrap_or(progression.upgrades_taken);
        progression.next_threshold = snapshot.next_threshold.unwrap_or(progression.next_threshold);
        if let Some(upgrades) = &snapshot.upgrades {
            self.upgrades = upgrades.clone();
            self.upgrades.clamp_to(&self.config.upgrades);
        }
        if let Some(weapons) = &snapshot.weapons {
            self.arsenal.restore(weapons, snapshot.current_weapon);
        } else if let Some(kind) = snapshot.current_weapon {
            self.arsenal.select(kind);
        }

        if let Some(saved) = &snapshot.player {
            let player = &mut self.player;
            player.body.x = saved.x.unwrap_or(player.body.x);
            player.body.y = saved.y.unwrap_or(player.body.y);
            player.body.vx = saved.vx.unwrap_or(player.body.vx);
            player.body.vy = saved.vy.unwrap_or(player.body.vy);
            player.max_speed = saved.max_speed.unwrap_or(player.max_speed);
            if let Some(max) = saved.max_health.filter(|max| *max > 0) {
                player.health.max = max;
            }
            let health = saved.health.unwrap_or(player.health.current);
            player.health.current = health.min(player.health.max);
        }
    }
}
