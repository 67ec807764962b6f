//! Error taxonomy for the battle engine.
//!
//! Every public fallible operation returns [`EngineError`], which wraps one of
//! the branch enums below. Callers that only care about the branch can match
//! on the outer variant; the inner enum carries the specifics.
//!
//! # Propagation
//!
//! - [`ValidationError`], [`AuthorizationError`] and pre-queue [`StateError`]s
//!   reject a request synchronously and leave state untouched.
//! - [`StateError::TargetDestroyed`] and friends raised while a turn is being
//!   resolved degrade the offending action to an `action_skipped` event.
//! - [`NotFoundError`] fails the single request.
//! - [`AiError`] never escapes batch AI generation; it is logged as an
//!   `ai_move_failed` event.

use hexgrid::{Hex, MapError};
use thiserror::Error;

use crate::entity::{GameId, MoveId, ObjectiveId, Phase, PlayerId, ShipId};

/// Result alias used across the crate.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Top-level engine error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Input rejected before queuing
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Actor may not command the ship
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    /// Request conflicts with the game's current state
    #[error(transparent)]
    State(#[from] StateError),
    /// Referenced entity does not exist
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    /// An invariant was found broken; the resolution transaction was discarded
    #[error("engine state inconsistent: {0}")]
    Inconsistent(String),
}

/// Malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Coordinate outside the map
    #[error("coordinate {coord} is outside the map")]
    OutOfBounds {
        /// Offending cell
        coord: Hex,
    },
    /// Move target beyond the ship's speed
    #[error("move of {distance} hexes exceeds speed {speed}")]
    TooFar {
        /// Requested distance
        distance: u32,
        /// Ship speed
        speed: u32,
    },
    /// Ship carries no weapon with this id
    #[error("unknown weapon `{weapon}`")]
    UnknownWeapon {
        /// Requested weapon id
        weapon: String,
    },
    /// Target ship is not part of this game
    #[error("unknown target ship {ship}")]
    UnknownTarget {
        /// Requested target
        ship: ShipId,
    },
    /// Ship targeted itself
    #[error("a ship cannot target itself")]
    SelfTarget,
    /// Facing outside 0..=5
    #[error("facing {0} is not in 0..=5")]
    InvalidFacing(u8),
    /// The same kind of action appears twice in one move
    #[error("action `{kind}` appears more than once")]
    DuplicateAction {
        /// Action kind
        kind: &'static str,
    },
    /// Bad map dimensions
    #[error("invalid map: {0}")]
    InvalidMap(#[from] MapError),
    /// A ship spec failed validation
    #[error("invalid ship spec: {reason}")]
    InvalidShipSpec {
        /// What is wrong
        reason: String,
    },
    /// An objective spec failed validation
    #[error("invalid objective spec: {reason}")]
    InvalidObjectiveSpec {
        /// What is wrong
        reason: String,
    },
}

/// Actor is not allowed to command the ship.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("actor {actor} may not command ship {ship}")]
pub struct AuthorizationError {
    /// Submitting actor, rendered for display
    pub actor: String,
    /// Ship the actor tried to command
    pub ship: ShipId,
}

/// Request conflicts with game state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Submission tagged for a turn other than the current one
    #[error("move is for turn {got} but the game is on turn {expected}")]
    TurnMismatch {
        /// Current turn
        expected: u32,
        /// Turn on the submission
        got: u32,
    },
    /// The turn has been locked for resolution
    #[error("game is locked for resolution")]
    GameLocked,
    /// Ship already has a live move this turn
    #[error("ship {ship} already has a move for turn {turn}")]
    DuplicateMove {
        /// Ship
        ship: ShipId,
        /// Turn
        turn: u32,
    },
    /// Operation not allowed in this phase
    #[error("expected phase {expected}, game is in {actual}")]
    PhaseMismatch {
        /// Required phase
        expected: Phase,
        /// Current phase
        actual: Phase,
    },
    /// Ship no longer exists as a combatant
    #[error("ship {0} is destroyed")]
    ShipDestroyed(ShipId),
    /// Ship is disabled and cannot perform this action
    #[error("ship {0} is disabled")]
    ShipDisabled(ShipId),
    /// The game has ended
    #[error("game is over")]
    GameOver,
    /// The target was destroyed earlier in the same resolution
    #[error("target ship {0} was already destroyed")]
    TargetDestroyed(ShipId),
    /// A game with this id is already loaded
    #[error("game {0} already exists")]
    GameExists(GameId),
    /// Destination cell already holds a ship
    #[error("cell {0} is occupied")]
    CellOccupied(Hex),
    /// Move was already resolved or withdrawn
    #[error("move {0} is no longer pending")]
    MoveNotPending(MoveId),
}

/// Referenced entity is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    /// No such game
    #[error("game {0} not found")]
    Game(GameId),
    /// No such ship in the game
    #[error("ship {0} not found")]
    Ship(ShipId),
    /// No such move in the game
    #[error("move {0} not found")]
    Move(MoveId),
    /// No such objective in the game
    #[error("objective {0} not found")]
    Objective(ObjectiveId),
}

/// AI move generation failed for one ship.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    /// Ship vanished from the snapshot
    #[error("ship {0} is missing from the snapshot")]
    ShipMissing(ShipId),
    /// Ship is driven by a player
    #[error("ship {0} is not AI-controlled")]
    NotAiControlled(ShipId),
    /// Strategy output was rejected on submission
    #[error("generated move rejected: {0}")]
    Rejected(Box<EngineError>),
}

impl AuthorizationError {
    /// Builds the error for a player actor.
    #[must_use]
    pub fn new(actor: impl Into<String>, ship: ShipId) -> Self {
        Self {
            actor: actor.into(),
            ship,
        }
    }

    /// Shorthand for a player.
    #[must_use]
    pub fn player(player: &PlayerId, ship: ShipId) -> Self {
        Self::new(player.as_str(), ship)
    }
}

/// The id allocated after `id` when restoring stored entities.
pub(crate) fn successor_id(what: &str, id: u64) -> Result<u64> {
    id.checked_add(1)
        .ok_or_else(|| EngineError::Inconsistent(format!("{what} id {id} has no successor id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_errors_convert_into_engine_error() {
        let err: EngineError = StateError::GameLocked.into();
        assert!(matches!(err, EngineError::State(StateError::GameLocked)));

        let err: EngineError = NotFoundError::Ship(ShipId::new(4)).into();
        assert_eq!(err.to_string(), "ship 4 not found");
    }

    #[test]
    fn turn_mismatch_message_names_both_turns() {
        let err = StateError::TurnMismatch {
            expected: 3,
            got: 4,
        };
        assert_eq!(
            err.to_string(),
            "move is for turn 4 but the game is on turn 3"
        );
    }
}
