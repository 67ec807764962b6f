//! Read-only game snapshots.
//!
//! A [`GameSnapshot`] is an owned copy of one game's ships, objectives and
//! scores at a point in time. It is what the AI strategies decide against and
//! what a rendering layer receives; nothing written to a snapshot flows back
//! into the game.

use hexgrid::Hex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entity::{Game, Objective, ObjectiveId, Ship, ShipId, Team};

/// Owned, serializable copy of one game's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Game record
    pub game: Game,
    /// Ships by id
    pub ships: BTreeMap<ShipId, Ship>,
    /// Objectives by id
    pub objectives: BTreeMap<ObjectiveId, Objective>,
    /// Team scores
    pub scores: BTreeMap<Team, u32>,
}

impl GameSnapshot {
    /// Looks up a ship.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    /// Ships that are not destroyed, in id order.
    pub fn ships_in_play(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values().filter(|ship| !ship.is_destroyed())
    }

    /// Non-destroyed ships of other teams than `ship`, in id order.
    pub fn enemies_of<'a>(&'a self, ship: &'a Ship) -> impl Iterator<Item = &'a Ship> {
        self.ships_in_play().filter(move |other| other.is_enemy_of(ship))
    }

    /// A non-destroyed ship other than `except` sits on `cell`.
    #[must_use]
    pub fn is_occupied(&self, cell: Hex, except: ShipId) -> bool {
        self.ships_in_play()
            .any(|ship| ship.id() != except && ship.position() == cell)
    }

    /// Score of `team`, 0 if it has not scored.
    #[must_use]
    pub fn score(&self, team: &Team) -> u32 {
        self.scores.get(team).copied().unwrap_or(0)
    }
}
