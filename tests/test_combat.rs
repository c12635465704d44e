use std::f32::consts::TAU;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use space_shooter::combat;
use space_shooter::compute::{init_state, GameState};
use space_shooter::config::{BossTrigger, SimConfig};
use space_shooter::enemy::{Enemy, EnemyVariant};
use space_shooter::entities::{Body, Health, MarkerKind, Pickup, PickupKind};
use space_shooter::events::GameEvent;
use space_shooter::projectile::{Blast, Projectile, ProjectileKind, Side};
use space_shooter::weapons::WeaponKind;

/// No random spawns, drops or boss; only what a test places on the field.
fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.spawn.base_chance = 0.0;
    config.spawn.level_factor = 0.0;
    config.spawn.pickup_chance = 0.0;
    config.spawn.drop_chance = 0.0;
    config.boss = BossTrigger { level: u32::MAX, ticks: u64::MAX };
    config
}

fn make_state() -> GameState {
    init_state(quiet_config())
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

/// A regular enemy whose box is centered on `center`.
fn enemy_at(state: &mut GameState, variant: EnemyVariant, center: (f32, f32)) -> usize {
    let mut rng = seeded_rng();
    let field = state.config.field;
    let mut enemy = Enemy::spawn(state.ids.next_id(), variant, &field, &mut rng);
    let (w, h) = (enemy.body.width, enemy.body.height);
    enemy.body = Body::new(center.0 - w / 2.0, center.1 - h / 2.0, w, h);
    state.enemies.push(enemy);
    state.enemies.len() - 1
}

fn player_shot(state: &mut GameState, kind: ProjectileKind, at: (f32, f32), damage: u32) -> Projectile {
    Projectile::new(state.ids.next_id(), kind, Side::Player, at, (0.0, 0.0), damage)
}

fn hostile_shot(state: &mut GameState, at: (f32, f32), damage: u32) -> Projectile {
    Projectile::new(state.ids.next_id(), ProjectileKind::EnemyShot, Side::Hostile, at, (0.0, 0.0), damage)
}

// ── Area damage ───────────────────────────────────────────────────────────────

#[test]
fn rocket_blast_falls_off_with_distance() {
    let mut state = make_state();
    let near = enemy_at(&mut state, EnemyVariant::Heavy, (200.0, 208.0));
    let mid = enemy_at(&mut state, EnemyVariant::Heavy, (270.0, 208.0));
    let far = enemy_at(&mut state, EnemyVariant::Heavy, (350.0, 208.0));
    for enemy in state.enemies.iter_mut() {
        enemy.health = Health::full(1000);
    }
    let rocket = player_shot(&mut state, ProjectileKind::Rocket, (200.0, 200.0), 80).with_blast(Blast::ROCKET);
    state.projectiles.push(rocket);

    combat::resolve(&mut state, &mut seeded_rng());

    let health: Vec<u32> = state.enemies.iter().map(|enemy| enemy.health.current).collect();
    assert_eq!(health[near], 920);
    assert_eq!(health[mid], 952);
    assert_eq!(health[far], 1000);
    assert!(state.projectiles.is_empty(), "rocket is spent by the detonation");

    let kinds: Vec<MarkerKind> = state.spawns.markers.iter().map(|marker| marker.kind).collect();
    assert!(kinds.contains(&MarkerKind::Explosion));
    assert!(kinds.contains(&MarkerKind::RocketBlast));
}

#[test]
fn rocket_needs_contact_to_detonate() {
    let mut state = make_state();
    enemy_at(&mut state, EnemyVariant::Basic, (300.0, 100.0));
    let rocket = player_shot(&mut state, ProjectileKind::Rocket, (200.0, 200.0), 80).with_blast(Blast::ROCKET);
    state.projectiles.push(rocket);

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.enemies[0].health.current, 25);
    assert_eq!(state.projectiles.len(), 1);
}

#[test]
fn rocket_clipping_a_large_enemy_still_hurts_it() {
    let mut state = make_state();
    let field = state.config.field;
    let mut boss = Enemy::final_boss(state.ids.next_id(), &field);
    // Center at (200, 160); the rocket grazes the right edge, over 100 away.
    boss.body = Body::new(100.0, 100.0, 200.0, 120.0);
    state.enemies.push(boss);
    let rocket = player_shot(&mut state, ProjectileKind::Rocket, (295.0, 210.0), 80).with_blast(Blast::ROCKET);
    state.projectiles.push(rocket);

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.enemies[0].health.current, 5000 - 48);
    assert!(state.projectiles.is_empty());
}

// ── Direct hits ───────────────────────────────────────────────────────────────

#[test]
fn laser_pierces_but_hits_each_enemy_once() {
    let mut state = make_state();
    enemy_at(&mut state, EnemyVariant::Heavy, (200.0, 200.0));
    enemy_at(&mut state, EnemyVariant::Heavy, (200.0, 205.0));
    let laser = player_shot(&mut state, ProjectileKind::Laser, (200.0, 190.0), 35).piercing();
    state.projectiles.push(laser);

    let mut rng = seeded_rng();
    combat::resolve(&mut state, &mut rng);
    combat::resolve(&mut state, &mut rng);

    assert!(state.enemies.iter().all(|enemy| enemy.health.current == 25));
    assert_eq!(state.projectiles.len(), 1, "a piercing shot keeps flying");
}

#[test]
fn bullet_only_damages_the_first_enemy_it_overlaps() {
    let mut state = make_state();
    enemy_at(&mut state, EnemyVariant::Heavy, (200.0, 200.0));
    enemy_at(&mut state, EnemyVariant::Heavy, (200.0, 205.0));
    let bullet = player_shot(&mut state, ProjectileKind::Bullet, (200.0, 200.0), 12);
    state.projectiles.push(bullet);

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.enemies[0].health.current, 48);
    assert_eq!(state.enemies[1].health.current, 60);
    assert!(state.projectiles.is_empty());
}

#[test]
fn kills_in_one_pass_are_each_counted_once() {
    let mut state = make_state();
    enemy_at(&mut state, EnemyVariant::Basic, (100.0, 100.0));
    enemy_at(&mut state, EnemyVariant::Basic, (300.0, 100.0));
    enemy_at(&mut state, EnemyVariant::Basic, (500.0, 100.0));
    let survivor = state.enemies[1].id;
    for x in [100.0, 500.0] {
        for _ in 0..3 {
            let bullet = player_shot(&mut state, ProjectileKind::Bullet, (x, 95.0), 13);
            state.projectiles.push(bullet);
        }
    }

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.enemies.len(), 1);
    assert_eq!(state.enemies[0].id, survivor);
    assert_eq!(state.progression.score, 20);
    let kills = state.events.iter().filter(|event| matches!(event, GameEvent::Kill { .. })).count();
    assert_eq!(kills, 2);
    // The third bullet on each target found nothing left to hit.
    assert_eq!(state.projectiles.len(), 2);
}

#[test]
fn splitter_death_enqueues_six_shards_on_a_ring() {
    let mut state = make_state();
    let index = enemy_at(&mut state, EnemyVariant::Splitter, (300.0, 200.0));
    state.enemies[index].health.current = 10;
    let origin = (state.enemies[index].body.x, state.enemies[index].body.y);
    let bullet = player_shot(&mut state, ProjectileKind::Bullet, (300.0, 200.0), 12);
    state.projectiles.push(bullet);

    combat::resolve(&mut state, &mut seeded_rng());

    assert!(state.enemies.is_empty(), "the splitter itself is gone");
    assert_eq!(state.progression.score, 50);
    let shards = &state.spawns.enemies;
    assert_eq!(shards.len(), Enemy::SPLIT_COUNT);
    for (i, shard) in shards.iter().enumerate() {
        let angle = i as f32 / 6.0 * TAU;
        assert_eq!(shard.variant, EnemyVariant::Shard);
        assert_relative_eq!(shard.body.vx, angle.cos() * 3.0, epsilon = 1e-5);
        assert_relative_eq!(shard.body.vy, angle.sin() * 3.0, epsilon = 1e-5);
        assert_relative_eq!(shard.body.x, origin.0 + angle.cos() * 30.0, epsilon = 1e-4);
        assert_relative_eq!(shard.body.y, origin.1 + angle.sin() * 30.0, epsilon = 1e-4);
    }
}

#[test]
fn kill_always_drops_with_full_drop_chance() {
    let mut state = make_state();
    state.config.spawn.drop_chance = 1.0;
    enemy_at(&mut state, EnemyVariant::Basic, (300.0, 200.0));
    let bullet = player_shot(&mut state, ProjectileKind::Bullet, (300.0, 200.0), 30);
    state.projectiles.push(bullet);

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.spawns.pickups.len(), 1);
}

// ── Lifesteal ─────────────────────────────────────────────────────────────────

#[test]
fn vampire_heals_on_hit() {
    let mut state = make_state();
    state.config.upgrades.tuning.vampire_base_chance = 1.0;
    state.upgrades.vampire = 1;
    state.player.health.current = 50;
    enemy_at(&mut state, EnemyVariant::Heavy, (300.0, 200.0));
    let bullet = player_shot(&mut state, ProjectileKind::Bullet, (300.0, 200.0), 12);
    state.projectiles.push(bullet);

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.player.health.current, 58);
    assert!(state.events.contains(&GameEvent::Heal { amount: 8 }));
}

#[test]
fn no_lifesteal_without_the_upgrade() {
    let mut state = make_state();
    state.config.upgrades.tuning.vampire_base_chance = 1.0;
    state.player.health.current = 50;
    enemy_at(&mut state, EnemyVariant::Heavy, (300.0, 200.0));
    let bullet = player_shot(&mut state, ProjectileKind::Bullet, (300.0, 200.0), 12);
    state.projectiles.push(bullet);

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.player.health.current, 50);
}

// ── Damage to the player ──────────────────────────────────────────────────────

#[test]
fn shield_soaks_damage_without_invulnerability() {
    let mut state = make_state();
    state.player.shield.active = true;
    state.player.shield.value = 40;

    combat::hit_player(&mut state, 30);
    assert_eq!(state.player.shield.value, 10);
    assert_eq!(state.player.health.current, 100);
    assert_eq!(state.player.invulnerable, 0);
    assert_eq!(state.events, vec![GameEvent::ShieldAbsorbed { amount: 30 }]);
}

#[test]
fn shield_overflow_breaks_it_and_hurts() {
    let mut state = make_state();
    state.player.shield.active = true;
    state.player.shield.value = 10;

    combat::hit_player(&mut state, 25);
    assert!(!state.player.shield.active);
    assert_eq!(state.player.health.current, 85);
    assert_eq!(state.player.invulnerable, state.config.player.hit_invulnerability);
    assert_eq!(
        state.events,
        vec![
            GameEvent::ShieldAbsorbed { amount: 10 },
            GameEvent::ShieldBreak,
            GameEvent::DamageTaken { amount: 15 },
        ]
    );
}

#[test]
fn exact_hit_breaks_the_shield_but_spares_health() {
    let mut state = make_state();
    state.player.shield.active = true;
    state.player.shield.value = 40;

    combat::hit_player(&mut state, 40);
    assert!(!state.player.shield.active);
    assert_eq!(state.player.health.current, 100);
    assert_eq!(state.player.invulnerable, 0);
}

#[test]
fn invulnerable_player_ignores_hits() {
    let mut state = make_state();
    state.player.invulnerable = 10;
    combat::hit_player(&mut state, 50);
    assert_eq!(state.player.health.current, 100);
    assert!(state.events.is_empty());
}

#[test]
fn ghost_extends_invulnerability() {
    let mut state = make_state();
    state.upgrades.ghost = 1;
    combat::hit_player(&mut state, 10);
    assert_eq!(state.player.invulnerable, state.config.player.ghost_invulnerability);
}

#[test]
fn hostile_fire_is_spent_even_on_an_invulnerable_player() {
    let mut state = make_state();
    state.player.invulnerable = 30;
    let (cx, cy) = state.player.center();
    let shot = hostile_shot(&mut state, (cx, cy), 10);
    state.projectiles.push(shot);

    combat::resolve(&mut state, &mut seeded_rng());

    assert!(state.projectiles.is_empty());
    assert_eq!(state.player.health.current, 100);
}

#[test]
fn ramming_enemy_dies_without_scoring() {
    let mut state = make_state();
    let center = state.player.center();
    enemy_at(&mut state, EnemyVariant::Basic, center);

    combat::resolve(&mut state, &mut seeded_rng());

    assert!(state.enemies.is_empty());
    assert_eq!(state.progression.score, 0);
    assert_eq!(state.player.health.current, 85);
}

#[test]
fn boss_survives_contact() {
    let mut state = make_state();
    let field = state.config.field;
    let mut boss = Enemy::final_boss(state.ids.next_id(), &field);
    let (cx, cy) = state.player.center();
    boss.body.x = cx - boss.body.width / 2.0;
    boss.body.y = cy - boss.body.height / 2.0;
    state.enemies.push(boss);

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.enemies.len(), 1);
    assert_eq!(state.player.health.current, 60);
}

// ── Pickups ───────────────────────────────────────────────────────────────────

fn pickup_on_player(state: &mut GameState, kind: PickupKind) {
    let (x, y) = (state.player.body.x, state.player.body.y);
    let id = state.ids.next_id();
    state.pickups.push(Pickup::new(id, kind, x + 5.0, y + 5.0));
}

#[test]
fn health_pickup_heals_up_to_max() {
    let mut state = make_state();
    state.player.health.current = 70;
    pickup_on_player(&mut state, PickupKind::Health);

    combat::resolve(&mut state, &mut seeded_rng());

    assert_eq!(state.player.health.current, 100);
    assert!(state.pickups.is_empty());
    assert!(state.events.contains(&GameEvent::Pickup { kind: PickupKind::Health }));
}

#[test]
fn score_pickup_adds_bonus() {
    let mut state = make_state();
    pickup_on_player(&mut state, PickupKind::Score);
    combat::resolve(&mut state, &mut seeded_rng());
    assert_eq!(state.progression.score, Pickup::SCORE_BONUS);
}

#[test]
fn weapon_pickup_refills_half_a_special_magazine() {
    let mut state = make_state();
    pickup_on_player(&mut state, PickupKind::Weapon);
    combat::resolve(&mut state, &mut seeded_rng());

    let refilled: Vec<(WeaponKind, u32)> = WeaponKind::SPECIAL
        .iter()
        .filter_map(|kind| {
            let ammo = state.arsenal.params(*kind).ammo.unwrap_or(0);
            (ammo > 0).then_some((*kind, ammo))
        })
        .collect();
    assert_eq!(refilled.len(), 1);
    let (kind, ammo) = refilled[0];
    assert_eq!(Some(ammo * 2), state.arsenal.params(kind).max_ammo);
}

#[test]
fn distant_pickup_stays() {
    let mut state = make_state();
    let id = state.ids.next_id();
    state.pickups.push(Pickup::new(id, PickupKind::Score, 10.0, 10.0));
    combat::resolve(&mut state, &mut seeded_rng());
    assert_eq!(state.pickups.len(), 1);
    assert_eq!(state.progression.score, 0);
}
