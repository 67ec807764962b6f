//! Orders: actions, moves and submissions.

use hexgrid::Hex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{GameId, MoveId, PlayerId, ShipId};

/// A single instruction inside a [`Move`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Action {
    /// Travel to a cell within `speed` hex steps
    Move {
        /// Destination
        to: Hex,
    },
    /// Turn to an absolute facing (0..=5)
    Rotate {
        /// New facing index
        facing: u8,
    },
    /// Fire a named weapon at another ship
    FireWeapon {
        /// Weapon id on the firing ship
        weapon: String,
        /// Target ship
        target: ShipId,
    },
    /// Restore part of the shield capacity
    RaiseShields,
    /// Do nothing this turn
    Hold,
}

/// Resolution bucket an action belongs to.
///
/// Buckets run in declaration order during resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionPhase {
    /// Positional changes
    Movement,
    /// Weapon fire
    Fire,
    /// Shields, facing and other status effects
    Status,
}

impl Action {
    /// Stable kind name used in events and errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Rotate { .. } => "rotate",
            Self::FireWeapon { .. } => "fire_weapon",
            Self::RaiseShields => "raise_shields",
            Self::Hold => "hold",
        }
    }

    /// Bucket in which the action is applied. `None` for `Hold`.
    #[must_use]
    pub const fn phase(&self) -> Option<ActionPhase> {
        match self {
            Self::Move { .. } => Some(ActionPhase::Movement),
            Self::FireWeapon { .. } => Some(ActionPhase::Fire),
            Self::Rotate { .. } | Self::RaiseShields => Some(ActionPhase::Status),
            Self::Hold => None,
        }
    }

    /// Shorthand for a fire order.
    #[must_use]
    pub fn fire(weapon: impl Into<String>, target: ShipId) -> Self {
        Self::FireWeapon {
            weapon: weapon.into(),
            target,
        }
    }
}

/// Who submitted a move.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// A human player
    Player(PlayerId),
    /// The engine's AI on behalf of an AI-controlled ship
    Ai,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(player) => write!(f, "player:{player}"),
            Self::Ai => f.write_str("ai"),
        }
    }
}

impl From<PlayerId> for Actor {
    fn from(player: PlayerId) -> Self {
        Self::Player(player)
    }
}

/// Move lifecycle. Both `Resolved` and `Invalid` are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    /// Queued, awaiting resolution
    Pending,
    /// Applied during turn resolution
    Resolved,
    /// Withdrawn before resolution
    Invalid,
}

/// A request to queue orders for one ship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSubmission {
    /// Target game
    pub game_id: GameId,
    /// Ship being commanded
    pub ship_id: ShipId,
    /// Who is submitting
    pub actor: Actor,
    /// Turn the orders are meant for
    pub turn: u32,
    /// Ordered actions
    pub actions: Vec<Action>,
}

impl MoveSubmission {
    /// Builds a submission.
    #[must_use]
    pub fn new(
        game_id: GameId,
        ship_id: ShipId,
        actor: impl Into<Actor>,
        turn: u32,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            game_id,
            ship_id,
            actor: actor.into(),
            turn,
            actions,
        }
    }
}

/// A queued set of orders for one ship and turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub(crate) id: MoveId,
    pub(crate) game_id: GameId,
    pub(crate) ship_id: ShipId,
    pub(crate) turn: u32,
    pub(crate) actor: Actor,
    pub(crate) actions: Vec<Action>,
    pub(crate) status: MoveStatus,
}

impl Move {
    /// Move id.
    #[must_use]
    pub const fn id(&self) -> MoveId {
        self.id
    }

    /// Owning game.
    #[must_use]
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Commanded ship.
    #[must_use]
    pub const fn ship_id(&self) -> ShipId {
        self.ship_id
    }

    /// Turn the orders apply to.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Submitting actor.
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Ordered actions.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MoveStatus {
        self.status
    }

    /// Counts toward the one-live-move-per-ship-per-turn rule.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status != MoveStatus::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_fall_into_resolution_buckets() {
        assert_eq!(
            Action::Move { to: Hex::new(1, 1) }.phase(),
            Some(ActionPhase::Movement)
        );
        assert_eq!(
            Action::fire("phaser", ShipId::new(2)).phase(),
            Some(ActionPhase::Fire)
        );
        assert_eq!(Action::RaiseShields.phase(), Some(ActionPhase::Status));
        assert_eq!(Action::Rotate { facing: 2 }.phase(), Some(ActionPhase::Status));
        assert_eq!(Action::Hold.phase(), None);
        assert!(ActionPhase::Movement < ActionPhase::Fire);
        assert!(ActionPhase::Fire < ActionPhase::Status);
    }

    #[test]
    fn action_json_is_tagged() {
        let json = serde_json::to_value(Action::fire("torpedo", ShipId::new(7))).unwrap();
        assert_eq!(json["action"], "fire_weapon");
        assert_eq!(json["weapon"], "torpedo");
        assert_eq!(json["target"], 7);

        let parsed: Action = serde_json::from_str(r#"{"action":"raise_shields"}"#).unwrap();
        assert_eq!(parsed, Action::RaiseShields);
    }

    #[test]
    fn actor_display() {
        assert_eq!(Actor::Player(PlayerId::from("kirk")).to_string(), "player:kirk");
        assert_eq!(Actor::Ai.to_string(), "ai");
    }
}
