//! Random Event Engine.
//!
//! The simulation never owns a hidden RNG: every system takes an injected
//! `rand::Rng`, so callers control determinism (tests use a seeded `StdRng`).
//! [`EventRng`] adds the few draw shapes the game needs on top of any `Rng`,
//! and [`WeightedTable`] implements cumulative-weight selection with exactly
//! one draw per decision.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic generator for a fixed seed.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Game-flavoured draws. Implemented for every `Rng`, including `dyn RngCore`.
pub trait EventRng: Rng {
    /// Uniform value in `[0, 1)`.
    fn unit(&mut self) -> f32 {
        self.gen::<f32>()
    }

    /// `true` with probability `p`. Always consumes one draw.
    fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// Symmetric jitter in `[-span / 2, span / 2)`.
    fn jitter(&mut self, span: f32) -> f32 {
        (self.unit() - 0.5) * span
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        self.gen_range(0..len)
    }
}

impl<R: Rng + ?Sized> EventRng for R {}

/// Cumulative-weight table sampled with a single draw.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<(T, u32)>,
    total: u32,
}

impl<T: Copy + PartialEq> WeightedTable<T> {
    /// Builds the table in iteration order. Zero weights are dropped.
    pub fn new(weights: impl IntoIterator<Item = (T, u32)>) -> Self {
        let mut total = 0;
        let mut entries = Vec::new();
        for (item, weight) in weights {
            if weight == 0 {
                continue;
            }
            total += weight;
            entries.push((item, total));
        }
        Self { entries, total }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_weight(&self) -> u32 {
        self.total
    }

    pub fn contains(&self, item: T) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == item)
    }

    /// Picks the entry whose cumulative band contains the draw.
    pub fn pick(&self, rng: &mut (impl Rng + ?Sized)) -> Option<T> {
        if self.total == 0 {
            return None;
        }
        let draw = rng.gen_range(0..self.total);
        self.entries
            .iter()
            .find(|(_, upper)| draw < *upper)
            .map(|(item, _)| *item)
    }

    /// A copy of the table with `item` removed.
    pub fn without(&self, item: T) -> Self {
        let mut previous = 0;
        let weights: Vec<(T, u32)> = self
            .entries
            .iter()
            .map(|(entry, upper)| {
                let weight = upper - previous;
                previous = *upper;
                (*entry, weight)
            })
            .filter(|(entry, _)| *entry != item)
            .collect();
        Self::new(weights)
    }
}
