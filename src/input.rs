use crate::weapons::WeaponKind;

/// Held-key state for one tick, produced by the front end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
    /// Edge-triggered: one bomb per `true`.
    pub bomb: bool,
    pub switch_weapon: Option<WeaponKind>,
}

impl InputSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn firing() -> Self {
        Self { fire: true, ..Self::default() }
    }
}
