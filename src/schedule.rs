//! Tick-keyed queues for deferred work.
//!
//! Boss sub-bursts and the revive sequence are expressed as entries due at a
//! future tick instead of wall-clock timers, so replays stay deterministic.

use std::collections::BTreeMap;

use crate::projectile::BossShot;

#[derive(Clone, Debug)]
pub struct Schedule<T> {
    due: BTreeMap<u64, Vec<T>>,
}

impl<T> Default for Schedule<T> {
    fn default() -> Self {
        Self { due: BTreeMap::new() }
    }
}

impl<T> Schedule<T> {
    pub fn push(&mut self, at: u64, item: T) {
        self.due.entry(at).or_default().push(item);
    }

    /// Removes and returns everything due at or before `now`, earliest tick
    /// first and in insertion order within a tick.
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let later = self.due.split_off(&(now + 1));
        let ready = std::mem::replace(&mut self.due, later);
        ready.into_values().flatten().collect()
    }

    pub fn len(&self) -> usize {
        self.due.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    pub fn clear(&mut self) {
        self.due.clear();
    }
}

/// One delayed boss projectile, resolved against the boss's position when it
/// comes due.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolleyShot {
    /// Horizontal offset from the boss's bottom-center muzzle.
    pub offset_x: f32,
    pub vx: f32,
    pub vy: f32,
    pub shot: BossShot,
}

/// Deferred steps of the revive sequence, keyed by the always-running clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    ReviveClear,
    ReviveResume,
}
