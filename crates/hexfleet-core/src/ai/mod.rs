//! AI move generation.
//!
//! Each difficulty tier is a separate [`Strategy`] implementation selected by
//! [`strategy_for`]. Strategies are pure: they read a [`GameSnapshot`] and
//! draw every random choice from the injected generator, so the same snapshot
//! and seed always yield the same actions.
//!
//! # Seeding
//!
//! [`derive_seed`] mixes the engine's master seed with (game, turn, ship), so
//! each ship gets an independent, reproducible stream per turn regardless of
//! the order in which ships are processed.
//!
//! # Example
//!
//! ```
//! use hexfleet_core::ai::{derive_seed, strategy_for, Difficulty};
//! use hexfleet_core::entity::{GameId, ShipId};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let strategy = strategy_for(Difficulty::Random);
//! assert_eq!(strategy.difficulty(), Difficulty::Random);
//!
//! let seed = derive_seed(7, GameId::new(1), 3, ShipId::new(2));
//! assert_eq!(seed, derive_seed(7, GameId::new(1), 3, ShipId::new(2)));
//! let _rng = ChaCha8Rng::seed_from_u64(seed);
//! ```

mod easy;
mod hard;
mod medium;
mod random;

pub use easy::EasyStrategy;
pub use hard::HardStrategy;
pub use medium::MediumStrategy;
pub use random::RandomStrategy;

use hexgrid::Hex;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::action::Action;
use crate::entity::{GameId, Objective, Ship, ShipId, Weapon};
use crate::error::AiError;
use crate::view::GameSnapshot;

/// Difficulty tag carried by AI-controlled ships.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// One random step
    Random,
    /// Close on the nearest enemy, fire on a coin flip
    Easy,
    /// Weigh objectives against fighting
    Medium,
    /// Shield management, objective holding, weapon choice
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Random => "random",
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        f.write_str(name)
    }
}

/// A decision procedure for one difficulty tier.
///
/// # Invariants
///
/// - `decide` must not consult any randomness other than `rng`
/// - `decide` must not depend on anything outside `ship` and `snapshot`
pub trait Strategy: Send + Sync {
    /// The tier this strategy implements.
    fn difficulty(&self) -> Difficulty;

    /// Produces the ordered action list for `ship` this turn.
    ///
    /// An empty list means the ship holds.
    ///
    /// # Errors
    ///
    /// Returns an [`AiError`] if no decision can be made for the ship.
    fn decide(
        &self,
        ship: &Ship,
        snapshot: &GameSnapshot,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Action>, AiError>;
}

static RANDOM: RandomStrategy = RandomStrategy;
static EASY: EasyStrategy = EasyStrategy;
static MEDIUM: MediumStrategy = MediumStrategy;
static HARD: HardStrategy = HardStrategy;

/// Returns the strategy for `difficulty`.
#[must_use]
pub fn strategy_for(difficulty: Difficulty) -> &'static dyn Strategy {
    match difficulty {
        Difficulty::Random => &RANDOM,
        Difficulty::Easy => &EASY,
        Difficulty::Medium => &MEDIUM,
        Difficulty::Hard => &HARD,
    }
}

/// Derives the per-ship, per-turn seed from the master seed.
#[must_use]
pub fn derive_seed(master: u64, game: GameId, turn: u32, ship: ShipId) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    game.hash(&mut hasher);
    turn.hash(&mut hasher);
    ship.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Shared tactics
// =============================================================================

/// Closest enemy, ties broken by lower ship id.
pub(crate) fn nearest_enemy<'a>(ship: &'a Ship, snapshot: &'a GameSnapshot) -> Option<&'a Ship> {
    snapshot
        .enemies_of(ship)
        .min_by_key(|enemy| (ship.position().distance(enemy.position()), enemy.id()))
}

/// Closest capture point not held by the ship's team, ties by objective id.
pub(crate) fn nearest_contested<'a>(
    ship: &Ship,
    snapshot: &'a GameSnapshot,
) -> Option<&'a Objective> {
    snapshot
        .objectives
        .values()
        .filter(|objective| objective.is_contested_for(ship.team()))
        .min_by_key(|objective| (ship.position().distance(objective.position()), objective.id()))
}

/// Walks up to `speed` greedy steps toward `goal`, stopping before any
/// occupied cell. `None` if the ship cannot or need not move.
pub(crate) fn advance_toward(ship: &Ship, snapshot: &GameSnapshot, goal: Hex) -> Option<Action> {
    if !ship.is_operational() {
        return None;
    }
    let map = snapshot.game.map();
    let mut at = ship.position();
    for _ in 0..ship.speed() {
        let Some(next) = map.step_toward(at, goal) else {
            break;
        };
        if snapshot.is_occupied(next, ship.id()) {
            break;
        }
        at = next;
    }
    (at != ship.position()).then_some(Action::Move { to: at })
}

/// First weapon, in loadout order, that can hit `target` from where the
/// ship currently is.
pub(crate) fn first_solution<'a>(ship: &'a Ship, target: &Ship) -> Option<&'a Weapon> {
    if !ship.is_operational() {
        return None;
    }
    ship.weapons()
        .iter()
        .find(|weapon| ship.has_firing_solution(weapon, target.position()))
}
