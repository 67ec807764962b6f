//! The game record and its phase cycle.

use hexgrid::MapSize;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{GameId, Team};

/// Sub-stage of a turn.
///
/// `Setup` is left once when the battle begins; afterwards phases cycle
/// `Movement -> Combat -> Resolution -> Movement` with the turn counter
/// incremented on the way back to `Movement`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Ships and objectives placed; no orders accepted yet
    Setup,
    /// Orders are being collected
    Movement,
    /// Orders are locked, awaiting resolution
    Combat,
    /// The turn is being resolved
    Resolution,
}

impl Phase {
    /// The phase that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Setup | Self::Resolution => Self::Movement,
            Self::Movement => Self::Combat,
            Self::Combat => Self::Resolution,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::Movement => "movement",
            Self::Combat => "combat",
            Self::Resolution => "resolution",
        };
        f.write_str(name)
    }
}

/// Why a game ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every other team lost all its ships
    LastTeamStanding,
    /// Every ship on the map was destroyed
    MutualDestruction,
    /// A team reached the configured victory score
    VictoryPoints,
    /// The configured turn cap was reached
    TurnLimit,
}

/// Final result of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum Outcome {
    /// One team won
    Victory {
        /// The winner
        team: Team,
        /// How it was decided
        reason: EndReason,
    },
    /// Nobody won
    Draw {
        /// How it was decided
        reason: EndReason,
    },
}

/// A game: turn counter, phase and lock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub(crate) id: GameId,
    pub(crate) current_turn: u32,
    pub(crate) phase: Phase,
    pub(crate) locked: bool,
    pub(crate) map: MapSize,
    pub(crate) teams: Vec<Team>,
    pub(crate) outcome: Option<Outcome>,
}

impl Game {
    pub(crate) fn new(id: GameId, map: MapSize, teams: Vec<Team>) -> Self {
        Self {
            id,
            current_turn: 1,
            phase: Phase::Setup,
            locked: false,
            map,
            teams,
            outcome: None,
        }
    }

    /// Game id.
    #[must_use]
    pub const fn id(&self) -> GameId {
        self.id
    }

    /// Current turn, starting at 1.
    #[must_use]
    pub const fn current_turn(&self) -> u32 {
        self.current_turn
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Orders are no longer accepted for the current turn.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Map bounds.
    #[must_use]
    pub const fn map(&self) -> MapSize {
        self.map
    }

    /// Teams taking part, sorted by name.
    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Final result, once the game has ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// The game has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_cycle_after_setup() {
        let mut phase = Phase::Setup;
        let mut seen = Vec::new();
        for _ in 0..5 {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                Phase::Movement,
                Phase::Combat,
                Phase::Resolution,
                Phase::Movement,
                Phase::Combat
            ]
        );
    }

    #[test]
    fn new_game_starts_in_setup_on_turn_one() {
        let game = Game::new(GameId::new(1), MapSize::new(20, 15).unwrap(), vec![]);
        assert_eq!(game.current_turn(), 1);
        assert_eq!(game.phase(), Phase::Setup);
        assert!(!game.is_locked());
        assert!(!game.is_over());
    }

    #[test]
    fn outcome_serializes_with_result_tag() {
        let outcome = Outcome::Victory {
            team: Team::from("federation"),
            reason: EndReason::LastTeamStanding,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"], "victory");
        assert_eq!(json["team"], "federation");
    }
}
