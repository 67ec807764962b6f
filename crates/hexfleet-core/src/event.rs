//! Append-only event ledger.
//!
//! Every state change in a game is recorded as exactly one [`Event`]. The log
//! is the durable history: events are never edited or removed, and
//! [`EventLog::replay`] rebuilds ship, objective and score state from them
//! alone.
//!
//! # Staging
//!
//! Turn resolution records into a [`Journal`] first. The journal is appended
//! to the log with [`EventLog::commit`] only once the whole resolution has
//! succeeded, so a failed resolution leaves no trace in the history.

use hexgrid::{Hex, MapSize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::action::{Action, Actor};
use crate::entity::{
    Control, GameId, MoveId, Objective, ObjectiveId, ObjectiveStatus, Outcome, Ship, ShipId,
    ShipStatus, Team,
};
use crate::error::{EngineError, Result};

// =============================================================================
// Event types
// =============================================================================

/// Why a shot did no damage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Target beyond weapon range at the start of the turn
    OutOfRange,
    /// Target outside every firing arc at the start of the turn
    OutOfArc,
}

/// The payload of an event, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EventKind {
    /// A game was set up
    GameCreated {
        /// Map bounds
        map: MapSize,
        /// Participating teams
        teams: Vec<Team>,
    },
    /// A ship was placed
    ShipCreated {
        /// Full initial record
        ship: Ship,
    },
    /// An objective was placed
    ObjectiveCreated {
        /// Full initial record
        objective: Objective,
    },
    /// Setup ended; orders are accepted from now on
    BattleStarted,
    /// A move was queued
    MoveSubmitted {
        /// New move
        move_id: MoveId,
        /// Commanded ship
        ship: ShipId,
        /// Submitter
        actor: Actor,
        /// Queued actions
        actions: Vec<Action>,
    },
    /// A pending move was withdrawn
    MoveInvalidated {
        /// Withdrawn move
        move_id: MoveId,
        /// Commanded ship
        ship: ShipId,
    },
    /// Submissions closed for the turn
    TurnLocked,
    /// A ship changed cell
    ShipMoved {
        /// Ship
        ship: ShipId,
        /// Previous cell
        from: Hex,
        /// New cell
        to: Hex,
    },
    /// A ship changed facing
    ShipRotated {
        /// Ship
        ship: ShipId,
        /// Previous facing index
        from: u8,
        /// New facing index
        to: u8,
    },
    /// A shot connected
    WeaponFired {
        /// Firing ship
        attacker: ShipId,
        /// Target ship
        target: ShipId,
        /// Weapon id
        weapon: String,
        /// Absorbed by shields
        shield_damage: u32,
        /// Dealt to the hull
        hull_damage: u32,
        /// The shot destroyed the target
        destroyed: bool,
        /// Target hull after the shot
        hull: u32,
        /// Target shields after the shot
        shields: u32,
        /// Target status after the shot
        status: ShipStatus,
    },
    /// A shot failed its range or arc check
    WeaponMissed {
        /// Firing ship
        attacker: ShipId,
        /// Intended target
        target: ShipId,
        /// Weapon id
        weapon: String,
        /// Failed check
        reason: MissReason,
    },
    /// Shields were restored
    ShieldsRaised {
        /// Ship
        ship: ShipId,
        /// Points restored
        restored: u32,
        /// Shields afterwards
        shields: u32,
    },
    /// A queued action could not be applied during resolution
    ActionSkipped {
        /// Ship whose action was dropped
        ship: ShipId,
        /// Action kind
        action: String,
        /// Rendered cause
        reason: String,
    },
    /// A team held an objective this turn
    ObjectiveScored {
        /// Objective
        objective: ObjectiveId,
        /// Holder after evaluation
        team: Team,
        /// Holder before evaluation
        previous: Control,
        /// Points awarded
        points: u32,
        /// Team total afterwards
        team_score: u32,
    },
    /// An artifact was taken
    ArtifactClaimed {
        /// Objective
        objective: ObjectiveId,
        /// Claiming ship
        ship: ShipId,
        /// Claiming team
        team: Team,
        /// Points awarded
        points: u32,
        /// Team total afterwards
        team_score: u32,
    },
    /// AI generation failed; the ship holds for the turn
    AiMoveFailed {
        /// Ship
        ship: ShipId,
        /// Rendered cause
        reason: String,
    },
    /// A turn finished resolving
    TurnAdvanced {
        /// Resolved turn
        from: u32,
        /// New current turn
        to: u32,
    },
    /// The game ended
    GameOver {
        /// Result
        outcome: Outcome,
        /// Final scores
        scores: BTreeMap<Team, u32>,
    },
}

impl EventKind {
    /// The serialized `type` tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GameCreated { .. } => "game_created",
            Self::ShipCreated { .. } => "ship_created",
            Self::ObjectiveCreated { .. } => "objective_created",
            Self::BattleStarted => "battle_started",
            Self::MoveSubmitted { .. } => "move_submitted",
            Self::MoveInvalidated { .. } => "move_invalidated",
            Self::TurnLocked => "turn_locked",
            Self::ShipMoved { .. } => "ship_moved",
            Self::ShipRotated { .. } => "ship_rotated",
            Self::WeaponFired { .. } => "weapon_fired",
            Self::WeaponMissed { .. } => "weapon_missed",
            Self::ShieldsRaised { .. } => "shields_raised",
            Self::ActionSkipped { .. } => "action_skipped",
            Self::ObjectiveScored { .. } => "objective_scored",
            Self::ArtifactClaimed { .. } => "artifact_claimed",
            Self::AiMoveFailed { .. } => "ai_move_failed",
            Self::TurnAdvanced { .. } => "turn_advanced",
            Self::GameOver { .. } => "game_over",
        }
    }
}

/// One immutable record of a state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Per-game sequence number, starting at 1
    pub seq: u64,
    /// Game the event belongs to
    pub game_id: GameId,
    /// Turn during which it happened
    pub turn: u32,
    /// What happened
    #[serde(flatten)]
    pub kind: EventKind,
}

// =============================================================================
// Sinks
// =============================================================================

/// Anything events can be written to.
pub trait EventSink {
    /// Records `kind` as happening during `turn`.
    fn record_event(&mut self, turn: u32, kind: EventKind);
}

impl EventSink for Journal {
    fn record_event(&mut self, turn: u32, kind: EventKind) {
        self.record(turn, kind);
    }
}

impl EventSink for EventLog {
    fn record_event(&mut self, turn: u32, kind: EventKind) {
        self.record(turn, kind);
    }
}

// =============================================================================
// Journal
// =============================================================================

/// Staging buffer for events that are not yet part of the log.
#[derive(Debug, Clone)]
pub struct Journal {
    game_id: GameId,
    base_seq: u64,
    events: Vec<Event>,
}

impl Journal {
    /// Records an event, returning its sequence number.
    pub fn record(&mut self, turn: u32, kind: EventKind) -> u64 {
        let seq = self.base_seq + self.events.len() as u64 + 1;
        self.events.push(Event {
            seq,
            game_id: self.game_id,
            turn,
            kind,
        });
        seq
    }

    /// Staged events in recording order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of staged events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// No events staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// =============================================================================
// EventLog
// =============================================================================

/// Append-only ledger of one game's events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    game_id: GameId,
    events: Vec<Event>,
}

impl EventLog {
    /// Creates an empty log for `game_id`.
    #[must_use]
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            events: Vec::new(),
        }
    }

    /// Rebuilds a log from stored events, checking that sequence numbers
    /// run 1, 2, 3... and that every event belongs to `game_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Inconsistent`] if either check fails.
    pub fn from_events(game_id: GameId, events: Vec<Event>) -> Result<Self> {
        for (index, event) in events.iter().enumerate() {
            if event.game_id != game_id || event.seq != index as u64 + 1 {
                return Err(EngineError::Inconsistent(format!(
                    "event {} out of sequence for game {game_id}",
                    event.seq
                )));
            }
        }
        Ok(Self { game_id, events })
    }

    /// Opens a journal whose sequence numbers continue this log.
    #[must_use]
    pub fn journal(&self) -> Journal {
        Journal {
            game_id: self.game_id,
            base_seq: self.last_seq(),
            events: Vec::new(),
        }
    }

    /// Appends a single event directly.
    pub fn record(&mut self, turn: u32, kind: EventKind) -> &Event {
        let seq = self.last_seq() + 1;
        self.events.push(Event {
            seq,
            game_id: self.game_id,
            turn,
            kind,
        });
        &self.events[self.events.len() - 1]
    }

    /// Appends a journal's events.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Inconsistent`] if the log has grown since the
    /// journal was opened or the journal belongs to another game.
    pub fn commit(&mut self, journal: Journal) -> Result<usize> {
        if journal.game_id != self.game_id || journal.base_seq != self.last_seq() {
            return Err(EngineError::Inconsistent(format!(
                "journal based on seq {} cannot commit onto seq {}",
                journal.base_seq,
                self.last_seq()
            )));
        }
        let count = journal.events.len();
        self.events.extend(journal.events);
        Ok(count)
    }

    /// Sequence number of the latest event, 0 if empty.
    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.events.last().map_or(0, |event| event.seq)
    }

    /// Iterates all events in order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// All events as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Nothing recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events with a sequence number greater than `seq`.
    #[must_use]
    pub fn since(&self, seq: u64) -> &[Event] {
        let start = usize::try_from(seq).map_or(self.events.len(), |s| s.min(self.events.len()));
        &self.events[start..]
    }

    /// Events recorded during `turn`.
    pub fn for_turn(&self, turn: u32) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |event| event.turn == turn)
    }

    /// Events whose `type` tag is `name`.
    pub fn of_kind<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events.iter().filter(move |event| event.kind.name() == name)
    }

    /// Reconstructs game state from the events alone.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Inconsistent`] if an event references a ship or
    /// objective that no earlier event created.
    pub fn replay(&self) -> Result<ReplayedGame> {
        let mut game = ReplayedGame::default();
        for event in &self.events {
            game.apply(event)?;
        }
        Ok(game)
    }
}

// =============================================================================
// Replay
// =============================================================================

/// State rebuilt by [`EventLog::replay`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayedGame {
    /// Map bounds, once `game_created` has been seen
    pub map: Option<MapSize>,
    /// Current turn
    pub current_turn: u32,
    /// Ships by id
    pub ships: BTreeMap<ShipId, Ship>,
    /// Objectives by id
    pub objectives: BTreeMap<ObjectiveId, Objective>,
    /// Team scores
    pub scores: BTreeMap<Team, u32>,
    /// Final result, if the game ended
    pub outcome: Option<Outcome>,
}

impl ReplayedGame {
    fn ship_mut(&mut self, id: ShipId) -> Result<&mut Ship> {
        self.ships
            .get_mut(&id)
            .ok_or_else(|| EngineError::Inconsistent(format!("replay references unknown ship {id}")))
    }

    fn objective_mut(&mut self, id: ObjectiveId) -> Result<&mut Objective> {
        self.objectives.get_mut(&id).ok_or_else(|| {
            EngineError::Inconsistent(format!("replay references unknown objective {id}"))
        })
    }

    fn apply(&mut self, event: &Event) -> Result<()> {
        self.current_turn = event.turn;
        match &event.kind {
            EventKind::GameCreated { map, .. } => self.map = Some(*map),
            EventKind::ShipCreated { ship } => {
                self.ships.insert(ship.id(), ship.clone());
            }
            EventKind::ObjectiveCreated { objective } => {
                self.objectives.insert(objective.id(), objective.clone());
            }
            EventKind::ShipMoved { ship, to, .. } => self.ship_mut(*ship)?.position = *to,
            EventKind::ShipRotated { ship, to, .. } => {
                let facing = hexgrid::Direction::from_index(*to).ok_or_else(|| {
                    EngineError::Inconsistent(format!("replay saw facing {to}"))
                })?;
                self.ship_mut(*ship)?.facing = facing;
            }
            EventKind::WeaponFired {
                target,
                hull,
                shields,
                status,
                ..
            } => {
                let ship = self.ship_mut(*target)?;
                ship.hull = *hull;
                ship.shields = *shields;
                ship.status = *status;
            }
            EventKind::ShieldsRaised { ship, shields, .. } => {
                self.ship_mut(*ship)?.shields = *shields;
            }
            EventKind::ObjectiveScored {
                objective,
                team,
                team_score,
                ..
            } => {
                self.objective_mut(*objective)?.controlled_by = Control::Team(team.clone());
                self.scores.insert(team.clone(), *team_score);
            }
            EventKind::ArtifactClaimed {
                objective,
                team,
                team_score,
                ..
            } => {
                let objective = self.objective_mut(*objective)?;
                objective.controlled_by = Control::Team(team.clone());
                objective.status = ObjectiveStatus::Claimed;
                self.scores.insert(team.clone(), *team_score);
            }
            EventKind::TurnAdvanced { to, .. } => self.current_turn = *to,
            EventKind::GameOver { outcome, .. } => self.outcome = Some(outcome.clone()),
            EventKind::BattleStarted
            | EventKind::MoveSubmitted { .. }
            | EventKind::MoveInvalidated { .. }
            | EventKind::TurnLocked
            | EventKind::WeaponMissed { .. }
            | EventKind::ActionSkipped { .. }
            | EventKind::AiMoveFailed { .. } => {}
        }
        Ok(())
    }
}
