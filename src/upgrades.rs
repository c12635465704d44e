//! Score-driven progression and the permanent upgrade table.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{PlayerConfig, ProgressionConfig};
use crate::error::SimError;
use crate::player::Player;
use crate::rng::{EventRng, WeightedTable};
use crate::weapons::Arsenal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    Damage,
    FireRate,
    Speed,
    Vampire,
    Shield,
    Bomb,
    Revive,
    Ghost,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 8] = [
        UpgradeKind::Damage,
        UpgradeKind::FireRate,
        UpgradeKind::Speed,
        UpgradeKind::Vampire,
        UpgradeKind::Shield,
        UpgradeKind::Bomb,
        UpgradeKind::Revive,
        UpgradeKind::Ghost,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UpgradeKind::Damage => "Firepower",
            UpgradeKind::FireRate => "Fire rate",
            UpgradeKind::Speed => "Thrusters",
            UpgradeKind::Vampire => "Vampire",
            UpgradeKind::Shield => "Shield",
            UpgradeKind::Bomb => "Bombs",
            UpgradeKind::Revive => "Revive",
            UpgradeKind::Ghost => "Ghost",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            UpgradeKind::Damage => "+12% damage on every weapon",
            UpgradeKind::FireRate => "-5% cooldown on every weapon",
            UpgradeKind::Speed => "+5% movement speed",
            UpgradeKind::Vampire => "hits may restore health",
            UpgradeKind::Shield => "regenerating shield while unhurt",
            UpgradeKind::Bomb => "+3 screen-clearing bombs",
            UpgradeKind::Revive => "+1 automatic revive",
            UpgradeKind::Ghost => "longer invulnerability after hits",
        }
    }
}

/// Offer weight and cap for one upgrade kind. `max_level: None` marks a
/// count-based pick with no cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRule {
    pub kind: UpgradeKind,
    pub weight: u32,
    pub max_level: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeTuning {
    pub damage_factor: f32,
    pub fire_rate_factor: f32,
    pub speed_factor: f32,
    pub vampire_base_chance: f32,
    pub vampire_chance_per_level: f32,
    pub vampire_base_heal: u32,
    pub vampire_heal_per_level: u32,
    pub shield_base: u32,
    pub shield_per_level: u32,
    pub shield_base_cooldown: u32,
    pub shield_cooldown_reduction: u32,
    pub bombs_per_pick: u32,
    pub revives_per_pick: u32,
}

impl Default for UpgradeTuning {
    fn default() -> Self {
        Self {
            damage_factor: 1.12,
            fire_rate_factor: 0.95,
            speed_factor: 1.05,
            vampire_base_chance: 0.15,
            vampire_chance_per_level: 0.08,
            vampire_base_heal: 8,
            vampire_heal_per_level: 4,
            shield_base: 40,
            shield_per_level: 20,
            shield_base_cooldown: 240,
            shield_cooldown_reduction: 36,
            bombs_per_pick: 3,
            revives_per_pick: 1,
        }
    }
}

impl UpgradeTuning {
    pub fn vampire_chance(&self, level: u32) -> f32 {
        self.vampire_base_chance + level.saturating_sub(1) as f32 * self.vampire_chance_per_level
    }

    pub fn vampire_heal(&self, level: u32) -> u32 {
        self.vampire_base_heal + level.saturating_sub(1) * self.vampire_heal_per_level
    }

    pub fn shield_capacity(&self, level: u32) -> u32 {
        self.shield_base + level.saturating_sub(1) * self.shield_per_level
    }

    /// Hit-free ticks before the shield comes back.
    pub fn shield_cooldown(&self, level: u32) -> u32 {
        self.shield_base_cooldown
            .saturating_sub(level.saturating_sub(1) * self.shield_cooldown_reduction)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    pub rules: Vec<UpgradeRule>,
    pub tuning: UpgradeTuning,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        let rule = |kind, weight, max_level| UpgradeRule { kind, weight, max_level };
        Self {
            rules: vec![
                rule(UpgradeKind::Damage, 25, Some(5)),
                rule(UpgradeKind::FireRate, 25, Some(5)),
                rule(UpgradeKind::Speed, 25, Some(5)),
                rule(UpgradeKind::Vampire, 25, Some(3)),
                rule(UpgradeKind::Shield, 25, Some(3)),
                rule(UpgradeKind::Bomb, 35, None),
                rule(UpgradeKind::Revive, 10, None),
                rule(UpgradeKind::Ghost, 10, Some(1)),
            ],
            tuning: UpgradeTuning::default(),
        }
    }
}

impl UpgradeConfig {
    pub fn rule(&self, kind: UpgradeKind) -> Option<&UpgradeRule> {
        self.rules.iter().find(|rule| rule.kind == kind)
    }
}

/// Levels and stock counts the player has accumulated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerUpgrades {
    pub damage: u32,
    pub fire_rate: u32,
    pub speed: u32,
    pub vampire: u32,
    pub shield: u32,
    pub ghost: u32,
    pub bombs: u32,
    pub revives: u32,
}

impl PlayerUpgrades {
    /// Level for level-based kinds, current stock for count-based ones.
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Damage => self.damage,
            UpgradeKind::FireRate => self.fire_rate,
            UpgradeKind::Speed => self.speed,
            UpgradeKind::Vampire => self.vampire,
            UpgradeKind::Shield => self.shield,
            UpgradeKind::Ghost => self.ghost,
            UpgradeKind::Bomb => self.bombs,
            UpgradeKind::Revive => self.revives,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::Damage => &mut self.damage,
            UpgradeKind::FireRate => &mut self.fire_rate,
            UpgradeKind::Speed => &mut self.speed,
            UpgradeKind::Vampire => &mut self.vampire,
            UpgradeKind::Shield => &mut self.shield,
            UpgradeKind::Ghost => &mut self.ghost,
            UpgradeKind::Bomb => &mut self.bombs,
            UpgradeKind::Revive => &mut self.revives,
        }
    }

    pub fn is_capped(&self, rule: &UpgradeRule) -> bool {
        rule.max_level.is_some_and(|max| self.level(rule.kind) >= max)
    }

    /// Pulls every capped level back within its configured maximum.
    pub fn clamp_to(&mut self, config: &UpgradeConfig) {
        for rule in &config.rules {
            let Some(max) = rule.max_level else {
                continue;
            };
            let level = self.level_mut(rule.kind);
            if *level > max {
                warn!(kind = ?rule.kind, level = *level, max, "upgrade level above cap, clamping");
                *level = max;
            }
        }
    }

    pub fn has_ghost(&self) -> bool {
        self.ghost > 0
    }
}

// ── Progression ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progression {
    pub score: u32,
    pub level: u32,
    pub upgrades_taken: u32,
    pub next_threshold: u32,
}

impl Progression {
    pub fn new(config: &ProgressionConfig) -> Self {
        Self { score: 0, level: 1, upgrades_taken: 0, next_threshold: config.first_threshold }
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Descent-speed multiplier for regular enemies.
    pub fn pace(&self, config: &ProgressionConfig) -> f32 {
        (1.0 + self.level as f32 * config.pace_per_level).min(config.max_pace)
    }

    /// Advances one level when the score has reached the threshold and upgrade
    /// slots remain. Returns whether a level-up happened.
    pub fn try_level_up(&mut self, config: &ProgressionConfig) -> bool {
        if self.score < self.next_threshold || self.upgrades_taken >= config.max_upgrades {
            return false;
        }
        self.upgrades_taken += 1;
        let growth = (self.next_threshold as f32 * config.threshold_growth).floor() as u32;
        self.next_threshold = self.next_threshold.saturating_add(growth);
        self.level += 1;
        info!(level = self.level, next = self.next_threshold, "level up");
        true
    }
}

// ── Offers & effects ──────────────────────────────────────────────────────────

/// Up to two distinct kinds that are not at their cap. The first draw uses
/// the full weighted table, the second the table without the first pick.
pub fn build_offer<R: Rng + ?Sized>(
    upgrades: &PlayerUpgrades,
    config: &UpgradeConfig,
    rng: &mut R,
) -> Vec<UpgradeKind> {
    let table = WeightedTable::new(
        config
            .rules
            .iter()
            .filter(|rule| !upgrades.is_capped(rule))
            .map(|rule| (rule.kind, rule.weight)),
    );
    let mut offer = Vec::with_capacity(2);
    if let Some(first) = table.pick(rng) {
        offer.push(first);
        if let Some(second) = table.without(first).pick(rng) {
            offer.push(second);
        }
    }
    debug!(?offer, eligible = table.len(), "built upgrade offer");
    offer
}

/// Everything an upgrade may rewrite.
pub struct UpgradeTargets<'a> {
    pub upgrades: &'a mut PlayerUpgrades,
    pub arsenal: &'a mut Arsenal,
    pub player: &'a mut Player,
    pub player_config: &'a PlayerConfig,
}

/// Increments `kind` and bakes its effect into the live parameters.
/// Repeated picks compound on the already-modified values.
pub fn apply(kind: UpgradeKind, config: &UpgradeConfig, targets: UpgradeTargets<'_>) -> Result<(), SimError> {
    let Some(rule) = config.rule(kind) else {
        warn!(?kind, "upgrade has no configured rule");
        return Err(SimError::UnknownUpgrade(kind));
    };
    if let Some(max) = rule.max_level {
        if targets.upgrades.level(kind) >= max {
            warn!(?kind, max, "upgrade already at cap");
            return Err(SimError::UpgradeAtCap { kind, max });
        }
    }

    let tuning = &config.tuning;
    let step = match kind {
        UpgradeKind::Damage => {
            targets.arsenal.scale_damage(tuning.damage_factor);
            1
        }
        UpgradeKind::FireRate => {
            targets.arsenal.scale_cooldown(tuning.fire_rate_factor, targets.player_config.min_cooldown);
            1
        }
        UpgradeKind::Speed => {
            let player = targets.player;
            player.max_speed = (player.max_speed * tuning.speed_factor).min(targets.player_config.speed_cap);
            1
        }
        UpgradeKind::Vampire | UpgradeKind::Shield | UpgradeKind::Ghost => 1,
        UpgradeKind::Bomb => tuning.bombs_per_pick,
        UpgradeKind::Revive => tuning.revives_per_pick,
    };
    *targets.upgrades.level_mut(kind) += step;
    info!(?kind, level = targets.upgrades.level(kind), "upgrade applied");
    Ok(())
}

/// Lifesteal roll for one successful hit. Draws only when vampire is owned.
pub fn roll_lifesteal(level: u32, tuning: &UpgradeTuning, rng: &mut (impl EventRng + ?Sized)) -> Option<u32> {
    if level == 0 {
        return None;
    }
    rng.chance(tuning.vampire_chance(level)).then(|| tuning.vampire_heal(level))
}
