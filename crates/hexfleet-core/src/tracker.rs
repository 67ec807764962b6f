//! Objective control and scoring.
//!
//! [`ObjectiveTracker::evaluate`] runs once per turn resolution, after all
//! actions have been applied:
//!
//! - Capture and rally points: if ships of exactly one team are within the
//!   radius, that team takes control and scores `points_per_turn`. With no
//!   ships or several teams present, control is left as it was.
//! - Artifacts: if exactly one ship sits on the artifact's cell, its team
//!   scores `victory_points` once and the artifact becomes `Claimed`, which
//!   removes it from any further evaluation.

use hexgrid::MapSize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::entity::{
    Control, GameId, Objective, ObjectiveId, ObjectiveKind, ObjectiveSpec, ObjectiveStatus,
    ShipId, Team,
};
use crate::error::{successor_id, NotFoundError, Result, ValidationError};
use crate::registry::{ShipFilter, ShipRegistry};

/// One scoring effect produced by [`ObjectiveTracker::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "effect")]
pub enum ObjectiveEffect {
    /// A team held an area objective
    Scored {
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
    Claimed {
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
}

/// Objectives and team scores of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveTracker {
    game_id: GameId,
    map: MapSize,
    next_id: u64,
    objectives: BTreeMap<ObjectiveId, Objective>,
    scores: BTreeMap<Team, u32>,
}

impl ObjectiveTracker {
    /// Creates a tracker with no objectives.
    #[must_use]
    pub fn new(game_id: GameId, map: MapSize) -> Self {
        Self {
            game_id,
            map,
            next_id: 1,
            objectives: BTreeMap::new(),
            scores: BTreeMap::new(),
        }
    }

    /// Rebuilds a tracker from stored objectives and scores.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidObjectiveSpec`] if an objective
    /// belongs to another game or lies off the map, and
    /// [`EngineError::Inconsistent`](crate::error::EngineError::Inconsistent)
    /// for an objective id of `u64::MAX`.
    pub fn from_parts(
        game_id: GameId,
        map: MapSize,
        objectives: impl IntoIterator<Item = Objective>,
        scores: BTreeMap<Team, u32>,
    ) -> Result<Self> {
        let mut tracker = Self::new(game_id, map);
        for objective in objectives {
            if objective.game_id != game_id || !map.contains(objective.position) {
                return Err(ValidationError::InvalidObjectiveSpec {
                    reason: format!("stored objective {} is inconsistent", objective.id),
                }
                .into());
            }
            tracker.next_id = tracker.next_id.max(successor_id("objective", objective.id.as_u64())?);
            tracker.objectives.insert(objective.id, objective);
        }
        tracker.scores = scores;
        Ok(tracker)
    }

    /// Validates `spec` and adds the objective.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::OutOfBounds`] if the position is off the map
    /// - [`ValidationError::InvalidObjectiveSpec`] if an artifact has a
    ///   non-zero radius
    pub fn create(&mut self, spec: ObjectiveSpec) -> Result<ObjectiveId> {
        if !self.map.contains(spec.position) {
            return Err(ValidationError::OutOfBounds {
                coord: spec.position,
            }
            .into());
        }
        if spec.kind == ObjectiveKind::Artifact && spec.radius != 0 {
            return Err(ValidationError::InvalidObjectiveSpec {
                reason: "artifacts must have radius 0".into(),
            }
            .into());
        }
        let id = ObjectiveId::new(self.next_id);
        self.next_id = successor_id("objective", self.next_id)?;
        self.objectives.insert(
            id,
            Objective {
                id,
                game_id: self.game_id,
                name: spec.name,
                kind: spec.kind,
                position: spec.position,
                radius: spec.radius,
                controlled_by: spec.controlled_by,
                points_per_turn: spec.points_per_turn,
                victory_points: spec.victory_points,
                status: ObjectiveStatus::Active,
            },
        );
        Ok(id)
    }

    /// Looks up an objective.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Objective`] if it is not in this game.
    pub fn get(&self, id: ObjectiveId) -> Result<&Objective> {
        self.objectives
            .get(&id)
            .ok_or_else(|| NotFoundError::Objective(id).into())
    }

    /// All objectives in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        self.objectives.values()
    }

    /// Clone of the objective map.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<ObjectiveId, Objective> {
        self.objectives.clone()
    }

    /// Team scores.
    #[must_use]
    pub const fn scores(&self) -> &BTreeMap<Team, u32> {
        &self.scores
    }

    /// Score of `team`, 0 if it has not scored.
    #[must_use]
    pub fn score(&self, team: &Team) -> u32 {
        self.scores.get(team).copied().unwrap_or(0)
    }

    fn award(&mut self, team: &Team, points: u32) -> u32 {
        let score = self.scores.entry(team.clone()).or_insert(0);
        *score = score.saturating_add(points);
        *score
    }

    /// Evaluates every active objective against current ship positions.
    ///
    /// Objectives are processed in id order; the returned effects follow the
    /// same order.
    pub fn evaluate(&mut self, ships: &ShipRegistry) -> Vec<ObjectiveEffect> {
        let in_play = ships.list(&ShipFilter::in_play());
        let mut effects = Vec::new();
        let ids: Vec<ObjectiveId> = self
            .objectives
            .values()
            .filter(|objective| objective.is_active())
            .map(Objective::id)
            .collect();

        for id in ids {
            let Some(objective) = self.objectives.get(&id) else {
                continue;
            };
            let (kind, position, points_per_turn, victory_points) = (
                objective.kind,
                objective.position,
                objective.points_per_turn,
                objective.victory_points,
            );

            match kind {
                ObjectiveKind::CapturePoint | ObjectiveKind::RallyPoint => {
                    let teams: BTreeSet<&Team> = in_play
                        .iter()
                        .filter(|ship| objective.covers(ship.position()))
                        .map(|ship| ship.team())
                        .collect();
                    let mut present = teams.into_iter();
                    let (Some(team), None) = (present.next(), present.next()) else {
                        // Nobody present or contested: control stays put.
                        continue;
                    };
                    let team = team.clone();
                    let team_score = self.award(&team, points_per_turn);
                    let previous = match self.objectives.get_mut(&id) {
                        Some(objective) => std::mem::replace(
                            &mut objective.controlled_by,
                            Control::Team(team.clone()),
                        ),
                        None => continue,
                    };
                    debug!(objective = %id, team = %team, team_score, "objective held");
                    effects.push(ObjectiveEffect::Scored {
                        objective: id,
                        team,
                        previous,
                        points: points_per_turn,
                        team_score,
                    });
                }
                ObjectiveKind::Artifact => {
                    let mut on_cell = in_play.iter().filter(|ship| ship.position() == position);
                    let (Some(ship), None) = (on_cell.next(), on_cell.next()) else {
                        continue;
                    };
                    let (ship_id, team) = (ship.id(), ship.team().clone());
                    let team_score = self.award(&team, victory_points);
                    if let Some(objective) = self.objectives.get_mut(&id) {
                        objective.controlled_by = Control::Team(team.clone());
                        objective.status = ObjectiveStatus::Claimed;
                    }
                    debug!(objective = %id, ship = %ship_id, team_score, "artifact claimed");
                    effects.push(ObjectiveEffect::Claimed {
                        objective: id,
                        ship: ship_id,
                        team,
                        points: victory_points,
                        team_score,
                    });
                }
            }
        }
        effects
    }
}
