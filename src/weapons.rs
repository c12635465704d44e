//! Player weapon table.
//!
//! Upgrades bake their effect straight into these parameters, so the values
//! here are always the live ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::IdAllocator;
use crate::projectile::{Blast, Projectile, ProjectileKind, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Normal,
    Rocket,
    Laser,
    Spread,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 4] =
        [WeaponKind::Normal, WeaponKind::Rocket, WeaponKind::Laser, WeaponKind::Spread];

    /// Weapons that run on ammo and can be refilled by pickups.
    pub const SPECIAL: [WeaponKind; 3] = [WeaponKind::Rocket, WeaponKind::Laser, WeaponKind::Spread];

    pub fn name(self) -> &'static str {
        match self {
            WeaponKind::Normal => "Normal",
            WeaponKind::Rocket => "Rocket",
            WeaponKind::Laser => "Laser",
            WeaponKind::Spread => "Spread",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeaponParams {
    pub damage: u32,
    pub speed: f32,
    /// Ticks between shots.
    pub cooldown: u32,
    /// `None` means unlimited.
    pub ammo: Option<u32>,
    pub max_ammo: Option<u32>,
}

impl WeaponParams {
    fn base(kind: WeaponKind) -> Self {
        let (damage, speed, cooldown, max_ammo) = match kind {
            WeaponKind::Normal => (12, 9.0, 18, None),
            WeaponKind::Rocket => (80, 8.0, 48, Some(20)),
            WeaponKind::Laser => (35, 10.0, 18, Some(100)),
            WeaponKind::Spread => (20, 8.0, 21, Some(160)),
        };
        Self { damage, speed, cooldown, ammo: max_ammo.map(|_| 0), max_ammo }
    }

    pub fn has_ammo(&self) -> bool {
        self.ammo.map_or(true, |ammo| ammo > 0)
    }
}

/// One weapon as stored in a save file. Absent fields keep the live value;
/// the magazine size always comes from the weapon itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedWeapon {
    pub damage: Option<u32>,
    pub speed: Option<f32>,
    pub cooldown: Option<u32>,
    pub ammo: Option<u32>,
}

/// Result of pulling the trigger once.
#[derive(Debug)]
pub enum Volley {
    Fired(Vec<Projectile>),
    /// The selected weapon was empty; the arsenal fell back to `Normal`.
    OutOfAmmo(WeaponKind),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arsenal {
    weapons: BTreeMap<WeaponKind, WeaponParams>,
    current: WeaponKind,
}

impl Default for Arsenal {
    fn default() -> Self {
        Self {
            weapons: WeaponKind::ALL.iter().map(|&kind| (kind, WeaponParams::base(kind))).collect(),
            current: WeaponKind::Normal,
        }
    }
}

impl Arsenal {
    pub fn current(&self) -> WeaponKind {
        self.current
    }

    pub fn params(&self, kind: WeaponKind) -> &WeaponParams {
        // Every kind is inserted at construction and never removed.
        &self.weapons[&kind]
    }

    pub fn current_params(&self) -> &WeaponParams {
        self.params(self.current)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WeaponKind, &WeaponParams)> {
        self.weapons.iter().map(|(kind, params)| (*kind, params))
    }

    /// Switches to `kind` unless it is out of ammo. Returns whether the
    /// selection changed.
    pub fn select(&mut self, kind: WeaponKind) -> bool {
        if kind == self.current || !self.params(kind).has_ammo() {
            return false;
        }
        self.current = kind;
        true
    }

    /// Adds ammo, clamped to the magazine. Returns the amount added.
    pub fn add_ammo(&mut self, kind: WeaponKind, amount: u32) -> u32 {
        let Some(params) = self.weapons.get_mut(&kind) else {
            return 0;
        };
        match (params.ammo.as_mut(), params.max_ammo) {
            (Some(ammo), Some(max)) => {
                let added = amount.min(max.saturating_sub(*ammo));
                *ammo += added;
                added
            }
            _ => 0,
        }
    }

    /// Half a magazine, rounded down.
    pub fn refill_half(&mut self, kind: WeaponKind) -> u32 {
        let half = self.params(kind).max_ammo.map_or(0, |max| max / 2);
        self.add_ammo(kind, half)
    }

    /// `damage = floor(damage * factor)` on every weapon.
    pub fn scale_damage(&mut self, factor: f32) {
        for params in self.weapons.values_mut() {
            params.damage = (params.damage as f32 * factor).floor() as u32;
        }
    }

    /// `cooldown = max(min, floor(cooldown * factor))` on every weapon.
    pub fn scale_cooldown(&mut self, factor: f32, min: u32) {
        for params in self.weapons.values_mut() {
            params.cooldown = ((params.cooldown as f32 * factor).floor() as u32).max(min);
        }
    }

    /// Overlays saved values onto the live parameters. Saved ammo is clamped
    /// to the magazine and ignored for unlimited weapons.
    pub fn restore(&mut self, saved: &BTreeMap<WeaponKind, SavedWeapon>, current: Option<WeaponKind>) {
        for (kind, weapon) in saved {
            let Some(params) = self.weapons.get_mut(kind) else {
                continue;
            };
            params.damage = weapon.damage.unwrap_or(params.damage);
            params.speed = weapon.speed.unwrap_or(params.speed);
            params.cooldown = weapon.cooldown.unwrap_or(params.cooldown);
            if let (Some(ammo), Some(max)) = (weapon.ammo, params.max_ammo) {
                params.ammo = Some(ammo.min(max));
            }
        }
        if let Some(kind) = current {
            if self.params(kind).has_ammo() {
                self.current = kind;
            }
        }
    }

    pub fn snapshot(&self) -> BTreeMap<WeaponKind, SavedWeapon> {
        self.weapons
            .iter()
            .map(|(kind, params)| {
                let saved = SavedWeapon {
                    damage: Some(params.damage),
                    speed: Some(params.speed),
                    cooldown: Some(params.cooldown),
                    ammo: params.ammo,
                };
                (*kind, saved)
            })
            .collect()
    }

    /// Fires the current weapon from `muzzle` (top-center of the ship).
    pub fn fire(&mut self, ids: &mut IdAllocator, muzzle: (f32, f32)) -> Volley {
        let kind = self.current;
        let Some(params) = self.weapons.get_mut(&kind) else {
            return Volley::Fired(Vec::new());
        };
        if let Some(ammo) = params.ammo.as_mut() {
            if *ammo == 0 {
                self.current = WeaponKind::Normal;
                return Volley::OutOfAmmo(kind);
            }
            *ammo -= 1;
        }

        let (x, y) = muzzle;
        let vy = -params.speed;
        let damage = params.damage;
        let shot = |ids: &mut IdAllocator, kind, x: f32, vx: f32, damage| {
            Projectile::new(ids.next_id(), kind, Side::Player, (x, y), (vx, vy), damage)
        };

        let projectiles = match kind {
            WeaponKind::Normal => (-1..=1)
                .map(|i| shot(ids, ProjectileKind::Bullet, x, i as f32 * 0.5, damage).with_life(70))
                .collect(),
            WeaponKind::Rocket => vec![shot(ids, ProjectileKind::Rocket, x, 0.0, damage)
                .with_life(120)
                .with_blast(Blast::ROCKET)],
            WeaponKind::Laser => [-8.0, 8.0]
                .into_iter()
                .map(|dx| {
                    shot(ids, ProjectileKind::Laser, x + dx, 0.0, damage)
                        .with_life(120)
                        .piercing()
                })
                .collect(),
            WeaponKind::Spread => (-2..=2)
                .map(|i| {
                    shot(ids, ProjectileKind::Pellet, x, i as f32 * 1.5, damage * 2).with_life(70)
                })
                .collect(),
        };
        Volley::Fired(projectiles)
    }
}
