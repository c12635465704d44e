//! Combat simulation core of an arcade space shooter.
//!
//! [`compute::tick`] advances a [`compute::GameState`] one logical tick at a
//! time; the terminal front end in `main.rs` only feeds it input and draws it.

pub mod boss;
pub mod combat;
pub mod compute;
pub mod config;
pub mod director;
pub mod enemy;
pub mod entities;
pub mod error;
pub mod events;
pub mod input;
pub mod patterns;
pub mod persist;
pub mod player;
pub mod projectile;
pub mod rng;
pub mod schedule;
pub mod upgrades;
pub mod weapons;
