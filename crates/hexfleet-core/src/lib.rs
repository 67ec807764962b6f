//! # Hexfleet Core
//!
//! Deterministic turn-based starship combat on a hex grid.
//!
//! Actors (players or the built-in AI) queue one move per ship per turn; the
//! engine resolves all queued moves in a fixed order, updates ships and
//! objectives, and records every change in an append-only event log.
//!
//! ## Architecture
//!
//! - [`registry::ShipRegistry`]: the only writer of ship state
//! - [`tracker::ObjectiveTracker`]: capture-point control and scoring
//! - [`ai`]: one [`ai::Strategy`] per difficulty tier
//! - [`resolver::ActionResolver`]: submission checks and ordered resolution
//! - [`combat::CombatResolver`]: range, arc and damage
//! - [`manager::GameStateManager`]: phase machine and per-game locking
//! - [`event::EventLog`]: audit trail and replay
//!
//! ## Usage
//!
//! ```
//! use hexfleet_core::ai::Difficulty;
//! use hexfleet_core::entity::{Controller, ShipSpec};
//! use hexfleet_core::manager::{GameSetup, GameStateManager};
//! use hexfleet_core::EngineConfig;
//! use hexgrid::{Hex, MapSize};
//!
//! let manager = GameStateManager::new(EngineConfig::default().with_seed(42));
//! let created = manager
//!     .create_game(GameSetup {
//!         map: MapSize::new(20, 15).unwrap(),
//!         ships: vec![
//!             ShipSpec::new("Enterprise", "federation", Controller::Ai(Difficulty::Easy), Hex::new(5, 7)),
//!             ShipSpec::new("Gorkon", "klingon", Controller::Ai(Difficulty::Hard), Hex::new(15, 7)),
//!         ],
//!         objectives: vec![],
//!     })
//!     .unwrap();
//!
//! manager.begin_battle(created.game_id).unwrap();
//! manager.generate_ai_moves(created.game_id).unwrap();
//! let report = manager.resolve_turn(created.game_id).unwrap();
//! assert_eq!(report.summary.turn, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// Re-export hexgrid for coordinates and map bounds
pub use hexgrid;

pub mod action;
pub mod ai;
pub mod auth;
pub mod combat;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod manager;
pub mod registry;
pub mod resolver;
pub mod tracker;
pub mod view;

pub use config::{DamageModel, EngineConfig};
pub use error::{EngineError, Result};

#[cfg(test)]
mod tests;
