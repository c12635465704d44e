//! Combat resolution for one tick.
//!
//! Runs after every entity has advanced. Deaths and consumption only set
//! flags during the scans; the collections are rebuilt with `retain` at the
//! end, so several deaths in one tick are each handled exactly once.

use std::collections::HashSet;

use rand::Rng;
use tracing::debug;

use crate::compute::GameState;
use crate::entities::{distance, MarkerKind, Pickup, PickupKind};
use crate::events::GameEvent;
use crate::rng::EventRng;
use crate::upgrades::roll_lifesteal;
use crate::weapons::WeaponKind;

/// Resolves every collision among the already-advanced entities.
pub fn resolve<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) {
    player_fire(state, rng);
    hostile_fire(state);
    rams(state);
    collect_pickups(state, rng);

    state.enemies.retain(|enemy| !enemy.dead);
    state.projectiles.retain(|projectile| !projectile.consumed);
}

// ── Player fire ───────────────────────────────────────────────────────────────

fn player_fire<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) {
    for pi in 0..state.projectiles.len() {
        let projectile = &state.projectiles[pi];
        if projectile.is_hostile() || projectile.consumed {
            continue;
        }

        if projectile.blast.is_some() {
            let body = projectile.body;
            let touched = state
                .enemies
                .iter()
                .any(|enemy| enemy.is_targetable() && enemy.body.overlaps(&body));
            if touched {
                detonate(state, pi, rng);
            }
            continue;
        }

        for ei in 0..state.enemies.len() {
            let projectile = &mut state.projectiles[pi];
            let enemy = &state.enemies[ei];
            if !enemy.is_targetable() || !projectile.body.overlaps(&enemy.body) {
                continue;
            }
            if !projectile.strike(enemy.id) {
                continue;
            }
            let damage = projectile.damage;
            let spent = projectile.consumed;

            damage_enemy(state, ei, damage, rng);
            lifesteal(state, rng);
            if spent {
                break;
            }
        }
    }
}

/// Splash damage around the projectile center, once per enemy. An enemy the
/// projectile touches is always within the outer radius, however large.
fn detonate<R: Rng + ?Sized>(state: &mut GameState, pi: usize, rng: &mut R) {
    let projectile = &mut state.projectiles[pi];
    projectile.consumed = true;
    let body = projectile.body;
    let center = body.center();
    let damage = projectile.damage;
    let Some(blast) = projectile.blast else {
        return;
    };

    let mut damaged = HashSet::new();
    for ei in 0..state.enemies.len() {
        let enemy = &state.enemies[ei];
        if !enemy.is_targetable() || damaged.contains(&enemy.id) {
            continue;
        }
        let mut reach = distance(enemy.body.center(), center);
        if enemy.body.overlaps(&body) {
            reach = reach.min(blast.outer);
        }
        let Some(amount) = blast.falloff(damage, reach) else {
            continue;
        };
        damaged.insert(enemy.id);
        damage_enemy(state, ei, amount, rng);
    }

    debug!(hits = damaged.len(), "rocket detonated");
    state.spawns.marker(&mut state.ids, MarkerKind::Explosion, center, 60.0);
    state.spawns.marker(&mut state.ids, MarkerKind::RocketBlast, center, 80.0);
    if !damaged.is_empty() {
        lifesteal(state, rng);
    }
}

/// Applies damage to one enemy and settles its phase or death.
pub fn damage_enemy<R: Rng + ?Sized>(state: &mut GameState, ei: usize, amount: u32, rng: &mut R) {
    let enemy = &mut state.enemies[ei];
    let taken = enemy.take_damage(amount);
    state.events.push(GameEvent::Hit { target: enemy.id, damage: taken });

    let health = enemy.health;
    if let Some(boss) = enemy.boss_mut() {
        boss.sync_phase(&health, &mut state.events);
    }
    if health.is_depleted() {
        kill_enemy(state, ei, rng);
    }
}

fn kill_enemy<R: Rng + ?Sized>(state: &mut GameState, ei: usize, rng: &mut R) {
    let enemy = &mut state.enemies[ei];
    let center = enemy.body.center();
    let (x, y) = (enemy.body.x, enemy.body.y);
    // The boss stays on the field to play out its defeat, without the
    // sub-bursts it had queued.
    if enemy.is_boss() {
        state.volleys.clear();
    } else {
        enemy.dead = true;
    }
    let (variant, points, size) = (enemy.variant, enemy.points, enemy.body.width);

    state.progression.add_score(points);
    state.events.push(GameEvent::Kill { variant, points, at: center });
    state.spawns.marker(&mut state.ids, MarkerKind::Explosion, center, size);

    let offspring = state.enemies[ei].offspring(&mut state.ids);
    state.spawns.enemies.extend(offspring);

    if rng.chance(state.config.spawn.drop_chance) {
        let kind = PickupKind::random(rng);
        state.spawns.pickups.push(Pickup::new(state.ids.next_id(), kind, x, y));
    }
}

fn lifesteal<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) {
    let level = state.upgrades.vampire;
    let Some(heal) = roll_lifesteal(level, &state.config.upgrades.tuning, rng) else {
        return;
    };
    let healed = state.player.health.heal(heal);
    if healed > 0 {
        state.events.push(GameEvent::Heal { amount: healed });
    }
}

// ── Damage to the player ──────────────────────────────────────────────────────

/// Runs one hit through the player's defenses and reports what happened.
pub fn hit_player(state: &mut GameState, damage: u32) {
    let ghost = state.upgrades.has_ghost();
    let outcome = state.player.receive_hit(damage, ghost, &state.config.player);
    if outcome.ignored {
        return;
    }
    if outcome.absorbed > 0 {
        state.events.push(GameEvent::ShieldAbsorbed { amount: outcome.absorbed });
    }
    if outcome.shield_broken {
        state.events.push(GameEvent::ShieldBreak);
    }
    if outcome.taken > 0 {
        state.events.push(GameEvent::DamageTaken { amount: outcome.taken });
    }
}

fn hostile_fire(state: &mut GameState) {
    for pi in 0..state.projectiles.len() {
        let projectile = &mut state.projectiles[pi];
        if !projectile.is_hostile()
            || projectile.consumed
            || !projectile.body.overlaps(&state.player.body)
        {
            continue;
        }
        // Spent even when the player is invulnerable.
        projectile.consumed = true;
        let damage = projectile.damage;
        hit_player(state, damage);
    }
}

/// Enemy bodies touching the player. Regular enemies die on impact without
/// scoring; the boss is never removed by contact.
fn rams(state: &mut GameState) {
    for ei in 0..state.enemies.len() {
        let enemy = &state.enemies[ei];
        if !enemy.is_targetable() || !enemy.body.overlaps(&state.player.body) {
            continue;
        }
        let damage = enemy.contact_damage;
        if !enemy.is_boss() {
            let center = enemy.body.center();
            let size = enemy.body.width;
            state.enemies[ei].dead = true;
            state.spawns.marker(&mut state.ids, MarkerKind::Explosion, center, size);
        }
        hit_player(state, damage);
    }
}

// ── Pickups ───────────────────────────────────────────────────────────────────

fn collect_pickups<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) {
    let player = state.player.body;
    let (collected, remaining): (Vec<Pickup>, Vec<Pickup>) = std::mem::take(&mut state.pickups)
        .into_iter()
        .partition(|pickup| pickup.body.overlaps(&player));
    state.pickups = remaining;

    for pickup in collected {
        match pickup.kind {
            PickupKind::Health => {
                let healed = state.player.health.heal(Pickup::HEAL);
                if healed > 0 {
                    state.events.push(GameEvent::Heal { amount: healed });
                }
            }
            PickupKind::Weapon => {
                let weapon = WeaponKind::SPECIAL[rng.index(WeaponKind::SPECIAL.len())];
                let added = state.arsenal.refill_half(weapon);
                debug!(?weapon, added, "weapon pickup");
            }
            PickupKind::Score => state.progression.add_score(Pickup::SCORE_BONUS),
        }
        state.events.push(GameEvent::Pickup { kind: pickup.kind });
    }
}
