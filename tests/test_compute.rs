use std::fs;

use rand::rngs::StdRng;
use rand::SeedableRng;

use space_shooter::compute::*;
use space_shooter::config::{BossTrigger, SimConfig};
use space_shooter::enemy::{Enemy, EnemyVariant};
use space_shooter::entities::{Field, Marker, MarkerKind};
use space_shooter::error::{ConfigError, PersistError};
use space_shooter::events::GameEvent;
use space_shooter::input::InputSnapshot;
use space_shooter::persist::{JsonFileStore, MemoryStore, Persistence};
use space_shooter::projectile::{Projectile, ProjectileKind, Side};
use space_shooter::upgrades::UpgradeKind;
use space_shooter::weapons::WeaponKind;

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
    StdRng::seed_from_u64(42)
}

fn hostile_at(state: &mut GameState, at: (f32, f32)) {
    let id = state.ids.next_id();
    state
        .projectiles
        .push(Projectile::new(id, ProjectileKind::Bullet, Side::Hostile, at, (0.0, 0.0), 10));
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_starts_a_fresh_encounter() {
    let state = make_state();
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.clock, 0);
    assert_eq!(state.sim_tick, 0);
    assert_eq!(state.player.health.current, 100);
    assert_eq!(state.progression.level, 1);
    assert_eq!(state.progression.score, 0);
    assert_eq!(state.arsenal.current(), WeaponKind::Normal);
    assert!(state.enemies.is_empty());
    assert!(state.projectiles.is_empty());
    assert!(state.events.is_empty());
}

#[test]
fn player_starts_near_the_bottom_of_the_field() {
    let state = make_state();
    let field = Field::default();
    assert_eq!(state.player.body.x, field.width / 2.0);
    assert_eq!(state.player.body.y, field.height - 100.0);
}

#[test]
fn reset_discards_the_run() {
    let mut state = make_state();
    let mut rng = seeded_rng();
    for _ in 0..30 {
        tick(&mut state, &InputSnapshot::firing(), &mut rng);
    }
    state.progression.score = 40;
    state.upgrades.bombs = 6;

    state.reset();
    assert_eq!(state.clock, 0);
    assert!(state.projectiles.is_empty());
    assert_eq!(state.snapshot(), make_state().snapshot());
}

// ── Player intent ─────────────────────────────────────────────────────────────

#[test]
fn held_direction_moves_the_ship_and_stops_at_the_edge() {
    let mut state = make_state();
    let mut rng = seeded_rng();
    let start = state.player.body.x;
    let right = InputSnapshot { right: true, ..InputSnapshot::idle() };
    tick(&mut state, &right, &mut rng);
    assert!(state.player.body.x > start);

    let left = InputSnapshot { left: true, ..InputSnapshot::idle() };
    for _ in 0..400 {
        tick(&mut state, &left, &mut rng);
    }
    assert_eq!(state.player.body.x, 0.0);
}

#[test]
fn firing_respects_the_weapon_cooldown() {
    let mut state = make_state();
    let mut rng = seeded_rng();
    tick(&mut state, &InputSnapshot::firing(), &mut rng);
    assert_eq!(state.projectiles.len(), 3);
    assert_eq!(state.player.reload, 18);

    tick(&mut state, &InputSnapshot::firing(), &mut rng);
    assert_eq!(state.projectiles.len(), 3, "still reloading");
}

#[test]
fn bomb_input_spends_a_bomb() {
    let mut state = make_state();
    state.upgrades.bombs = 1;
    hostile_at(&mut state, (100.0, 100.0));
    let bomb = InputSnapshot { bomb: true, ..InputSnapshot::idle() };
    tick(&mut state, &bomb, &mut seeded_rng());

    assert_eq!(state.upgrades.bombs, 0);
    assert!(state.projectiles.is_empty());
    assert!(state.events.contains(&GameEvent::BombUsed { remaining: 0, cleared: 1 }));
}

#[test]
fn empty_special_weapon_falls_back_to_normal() {
    let mut state = make_state();
    let mut rng = seeded_rng();
    state.arsenal.add_ammo(WeaponKind::Rocket, 1);
    assert!(state.switch_weapon(WeaponKind::Rocket));

    tick(&mut state, &InputSnapshot::firing(), &mut rng);
    let rockets = state.projectiles.iter().filter(|p| p.kind == ProjectileKind::Rocket).count();
    assert_eq!(rockets, 1);
    assert_eq!(state.arsenal.params(WeaponKind::Rocket).ammo, Some(0));

    state.player.reload = 0;
    tick(&mut state, &InputSnapshot::firing(), &mut rng);
    assert_eq!(state.arsenal.current(), WeaponKind::Normal);
    assert_eq!(state.projectiles.len(), 1, "the empty trigger pull fires nothing");

    let switches: Vec<_> = state
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, GameEvent::WeaponSwitched { .. }))
        .collect();
    assert_eq!(
        switches,
        vec![
            GameEvent::WeaponSwitched { weapon: WeaponKind::Rocket, auto: false },
            GameEvent::WeaponSwitched { weapon: WeaponKind::Normal, auto: true },
        ]
    );
}

#[test]
fn switching_to_an_empty_or_current_weapon_does_nothing() {
    let mut state = make_state();
    assert!(!state.switch_weapon(WeaponKind::Laser));
    assert!(!state.switch_weapon(WeaponKind::Normal));
    assert!(state.events.is_empty());
}

// ── Suspension ────────────────────────────────────────────────────────────────

#[test]
fn upgrade_menu_freezes_the_simulation() {
    let mut state = make_state();
    let mut rng = seeded_rng();
    let enemy = Enemy::spawn(state.ids.next_id(), EnemyVariant::Basic, &state.config.field, &mut rng);
    let before = enemy.body;
    state.enemies.push(enemy);
    let marker = Marker::new(state.ids.next_id(), MarkerKind::Explosion, (0.0, 0.0), 10.0);
    state.markers.push(marker);
    state.status = GameStatus::Upgrading;
    state.offer = vec![UpgradeKind::Bomb];

    for _ in 0..MarkerKind::Explosion.lifetime() {
        tick(&mut state, &InputSnapshot::firing(), &mut rng);
    }
    assert_eq!(state.clock, u64::from(MarkerKind::Explosion.lifetime()));
    assert_eq!(state.sim_tick, 0);
    assert_eq!(state.enemies[0].body, before);
    assert!(state.projectiles.is_empty());
    assert!(state.markers.is_empty(), "cosmetics keep fading");

    state.select_upgrade(Some(UpgradeKind::Bomb)).expect("offered");
    tick(&mut state, &InputSnapshot::idle(), &mut rng);
    assert_eq!(state.sim_tick, 1);
}

#[test]
fn picking_an_upgrade_mid_play_is_rejected() {
    let mut state = make_state();
    assert!(state.select_upgrade(None).is_err());
    assert_eq!(state.status, GameStatus::Playing);
}

// ── Revive & defeat ───────────────────────────────────────────────────────────

#[test]
fn revive_restores_half_health_and_clears_the_screen() {
    let mut state = make_state();
    let mut rng = seeded_rng();
    state.upgrades.revives = 1;
    state.player.health.current = 0;

    tick(&mut state, &InputSnapshot::idle(), &mut rng);
    assert_eq!(state.status, GameStatus::Reviving);
    assert_eq!(state.player.health.current, 50);
    assert_eq!(state.player.invulnerable, 240);
    assert_eq!(state.upgrades.revives, 0);
    assert!(state.events.contains(&GameEvent::PlayerRevived { remaining: 0 }));

    hostile_at(&mut state, (100.0, 100.0));
    for _ in 0..11 {
        tick(&mut state, &InputSnapshot::idle(), &mut rng);
    }
    assert_eq!(state.projectiles.len(), 1, "first clear lands 12 ticks after the revive");
    tick(&mut state, &InputSnapshot::idle(), &mut rng);
    assert!(state.projectiles.is_empty());
    assert_eq!(state.sim_tick, 1, "simulation paused while reviving");

    while state.clock < 90 {
        tick(&mut state, &InputSnapshot::idle(), &mut rng);
        assert_eq!(state.status, GameStatus::Reviving);
    }
    tick(&mut state, &InputSnapshot::idle(), &mut rng);
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.sim_tick, 2);
}

#[test]
fn revive_after_raised_max_health_uses_the_new_max() {
    let mut state = make_state();
    state.upgrades.revives = 2;
    state.player.health.max = 7;
    state.player.health.current = 0;
    tick(&mut state, &InputSnapshot::idle(), &mut seeded_rng());
    assert_eq!(state.player.health.current, 3);
    assert_eq!(state.upgrades.revives, 1);
}

#[test]
fn no_revives_means_defeat() {
    let mut state = make_state();
    let mut rng = seeded_rng();
    state.player.health.current = 0;

    tick(&mut state, &InputSnapshot::idle(), &mut rng);
    assert_eq!(state.status, GameStatus::Defeat);
    assert!(state.status.is_over());
    assert_eq!(state.drain_events(), vec![GameEvent::Defeat]);

    tick(&mut state, &InputSnapshot::firing(), &mut rng);
    assert_eq!(state.sim_tick, 1);
    assert_eq!(state.clock, 2);
    assert!(state.events.is_empty(), "defeat is announced once");
}

// ── Determinism ───────────────────────────────────────────────────────────────

fn scripted_run(seed: u64, ticks: u32) -> GameState {
    let mut config = SimConfig::default();
    config.boss.ticks = 900;
    let mut state = init_state(config);
    let mut rng = StdRng::seed_from_u64(seed);
    for t in 0..ticks {
        if state.status == GameStatus::Upgrading {
            let choice = state.offered().first().copied();
            state.select_upgrade(choice).expect("first offer is always valid");
        }
        let input = InputSnapshot {
            left: (t / 60) % 2 == 0,
            right: (t / 60) % 2 == 1,
            fire: true,
            ..InputSnapshot::idle()
        };
        tick(&mut state, &input, &mut rng);
        state.drain_events();
    }
    state
}

#[test]
fn same_seed_and_inputs_replay_identically() {
    let a = scripted_run(11, 1500);
    let b = scripted_run(11, 1500);
    assert_eq!(a.status, b.status);
    assert_eq!(a.clock, b.clock);
    assert_eq!(a.sim_tick, b.sim_tick);
    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.enemies.len(), b.enemies.len());
    assert_eq!(a.projectiles.len(), b.projectiles.len());
    assert_eq!(a.director, b.director);
    for (x, y) in a.enemies.iter().zip(&b.enemies) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.body, y.body);
        assert_eq!(x.health, y.health);
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[test]
fn partial_save_overlays_only_present_fields() {
    let mut store = MemoryStore::with_json(r#"{ "score": 120, "upgrades": { "bombs": 4 } }"#);
    let snapshot = store.load().expect("valid json").expect("something saved");

    let mut state = make_state();
    state.restore(&snapshot);
    assert_eq!(state.progression.score, 120);
    assert_eq!(state.upgrades.bombs, 4);
    assert_eq!(state.upgrades.revives, 0);
    assert_eq!(state.progression.level, 1);
    assert_eq!(state.player.health.current, 100);
}

#[test]
fn saved_weapon_without_ammo_keeps_an_empty_magazine() {
    let mut store = MemoryStore::with_json(
        r#"{ "weapons": { "rocket": { "damage": 80, "speed": 8.0, "cooldown": 48 } } }"#,
    );
    let snapshot = store.load().expect("valid json").expect("saved");
    let mut state = make_state();
    state.restore(&snapshot);

    let rocket = state.arsenal.params(WeaponKind::Rocket);
    assert_eq!(rocket.ammo, Some(0));
    assert_eq!(rocket.max_ammo, Some(20));
    assert!(!state.switch_weapon(WeaponKind::Rocket));
}

#[test]
fn saved_weapon_fields_overlay_one_by_one() {
    let mut store = MemoryStore::with_json(
        r#"{ "weapons": { "rocket": { "ammo": 5 }, "laser": { "ammo": 999 }, "normal": { "ammo": 3, "damage": 15 } } }"#,
    );
    let snapshot = store.load().expect("partial weapon entries parse").expect("saved");
    let mut state = make_state();
    state.restore(&snapshot);

    let rocket = state.arsenal.params(WeaponKind::Rocket);
    assert_eq!(rocket.ammo, Some(5));
    assert_eq!(rocket.damage, 80);
    assert_eq!(rocket.cooldown, 48);
    assert_eq!(state.arsenal.params(WeaponKind::Laser).ammo, Some(100), "clamped to the magazine");
    let normal = state.arsenal.params(WeaponKind::Normal);
    assert_eq!(normal.ammo, None, "normal never runs dry");
    assert_eq!(normal.damage, 15);
}

#[test]
fn restored_upgrade_levels_respect_their_caps() {
    let mut store = MemoryStore::with_json(r#"{ "upgrades": { "damage": 9, "ghost": 4, "bombs": 40 } }"#);
    let snapshot = store.load().expect("valid").expect("saved");
    let mut state = make_state();
    state.restore(&snapshot);

    assert_eq!(state.upgrades.damage, 5);
    assert_eq!(state.upgrades.ghost, 1);
    assert_eq!(state.upgrades.bombs, 40, "count-based kinds have no cap");
}

#[test]
fn snapshot_survives_a_store_round_trip() {
    let mut state = make_state();
    state.progression.score = 999;
    state.progression.level = 4;
    state.upgrades.shield = 2;
    state.arsenal.add_ammo(WeaponKind::Laser, 30);
    state.switch_weapon(WeaponKind::Laser);
    state.player.body.x = 123.5;
    state.player.health.current = 42;

    let mut store = MemoryStore::default();
    store.save(&state.snapshot()).expect("save");
    assert!(store.raw().is_some_and(|raw| raw.contains("\"score\": 999")));

    let mut fresh = make_state();
    fresh.restore(&store.load().expect("load").expect("saved"));
    assert_eq!(fresh.snapshot(), state.snapshot());
    assert_eq!(fresh.arsenal.current(), WeaponKind::Laser);
}

#[test]
fn empty_memory_store_has_nothing_to_load() {
    assert_eq!(MemoryStore::default().load().expect("no error"), None);
}

#[test]
fn file_store_round_trip_and_missing_file() {
    let path = std::env::temp_dir().join(format!("space_shooter_test_{}.json", std::process::id()));
    let _ = fs::remove_file(&path);
    let mut store = JsonFileStore::new(&path);
    assert_eq!(store.path(), path.as_path());
    assert_eq!(store.load().expect("missing file is not an error"), None);

    let mut state = make_state();
    state.progression.score = 77;
    store.save(&state.snapshot()).expect("save");
    let loaded = store.load().expect("load").expect("saved");
    assert_eq!(loaded.score, Some(77));
    let _ = fs::remove_file(&path);
}

#[test]
fn corrupt_save_is_reported() {
    let mut store = MemoryStore::with_json("not json");
    assert!(matches!(store.load(), Err(PersistError::Json(_))));
}

#[test]
fn restored_health_is_clamped_to_max() {
    let mut store = MemoryStore::with_json(r#"{ "player": { "health": 500, "max_health": 0 } }"#);
    let snapshot = store.load().expect("valid").expect("saved");
    let mut state = make_state();
    state.restore(&snapshot);
    assert_eq!(state.player.health.max, 100);
    assert_eq!(state.player.health.current, 100);
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[test]
fn empty_json_is_the_default_config() {
    let config = SimConfig::from_json_str("{}").expect("defaults are valid");
    assert_eq!(config, SimConfig::default());
}

#[test]
fn partial_json_keeps_other_defaults() {
    let config = SimConfig::from_json_str(r#"{ "seed": 9, "spawn": { "base_chance": 0.5 } }"#)
        .expect("valid");
    assert_eq!(config.seed, Some(9));
    assert_eq!(config.spawn.base_chance, 0.5);
    assert_eq!(config.spawn.max_chance, 0.2);
    assert_eq!(config.player, SimConfig::default().player);
}

#[test]
fn out_of_range_chance_is_invalid() {
    let result = SimConfig::from_json_str(r#"{ "spawn": { "drop_chance": 1.5 } }"#);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn tier_bands_must_ascend() {
    let text = r#"{ "spawn": { "tiers": [
        { "variant": "fast", "min_level": 2, "band": 0.5 },
        { "variant": "heavy", "min_level": 3, "band": 0.2 }
    ] } }"#;
    assert!(matches!(SimConfig::from_json_str(text), Err(ConfigError::Invalid(_))));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(SimConfig::from_json_str("{"), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let result = SimConfig::load("/definitely/not/here/space_shooter.json");
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}
