//! Map objectives.

use hexgrid::Hex;
use serde::{Deserialize, Serialize};

use crate::entity::{GameId, ObjectiveId, Team};

/// What kind of objective this is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Area held by sole occupancy, scores every turn it is held
    CapturePoint,
    /// Like a capture point, but ignored by AI targeting
    RallyPoint,
    /// Single cell, claimed once for its victory points
    Artifact,
}

/// Who holds an objective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Nobody
    #[default]
    Neutral,
    /// The named team
    Team(Team),
}

impl Control {
    /// Returns true if held by `team`.
    #[must_use]
    pub fn is_held_by(&self, team: &Team) -> bool {
        matches!(self, Self::Team(t) if t == team)
    }
}

/// Lifecycle of an objective. `Claimed` is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    /// Evaluated every resolution step
    Active,
    /// An artifact that has been taken
    Claimed,
}

/// Creation parameters for an objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Kind of objective
    pub kind: ObjectiveKind,
    /// Center cell
    pub position: Hex,
    /// Control radius in hex steps (must be 0 for artifacts)
    #[serde(default)]
    pub radius: u32,
    /// Initial holder
    #[serde(default)]
    pub controlled_by: Control,
    /// Score per turn held (capture and rally points)
    #[serde(default)]
    pub points_per_turn: u32,
    /// One-time score (artifacts)
    #[serde(default)]
    pub victory_points: u32,
}

impl ObjectiveSpec {
    /// A neutral capture point.
    #[must_use]
    pub fn capture_point(position: Hex, radius: u32, points_per_turn: u32) -> Self {
        Self {
            name: String::new(),
            kind: ObjectiveKind::CapturePoint,
            position,
            radius,
            controlled_by: Control::Neutral,
            points_per_turn,
            victory_points: 0,
        }
    }

    /// A neutral artifact.
    #[must_use]
    pub fn artifact(position: Hex, victory_points: u32) -> Self {
        Self {
            name: String::new(),
            kind: ObjectiveKind::Artifact,
            position,
            radius: 0,
            controlled_by: Control::Neutral,
            points_per_turn: 0,
            victory_points,
        }
    }
}

/// An objective in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub(crate) id: ObjectiveId,
    pub(crate) game_id: GameId,
    pub(crate) name: String,
    pub(crate) kind: ObjectiveKind,
    pub(crate) position: Hex,
    pub(crate) radius: u32,
    pub(crate) controlled_by: Control,
    pub(crate) points_per_turn: u32,
    pub(crate) victory_points: u32,
    pub(crate) status: ObjectiveStatus,
}

impl Objective {
    /// Objective id.
    #[must_use]
    pub const fn id(&self) -> ObjectiveId {
        self.id
    }

    /// Owning game.
    #[must_use]
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of objective.
    #[must_use]
    pub const fn kind(&self) -> ObjectiveKind {
        self.kind
    }

    /// Center cell.
    #[must_use]
    pub const fn position(&self) -> Hex {
        self.position
    }

    /// Control radius.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Current holder.
    #[must_use]
    pub const fn controlled_by(&self) -> &Control {
        &self.controlled_by
    }

    /// Score per turn held.
    #[must_use]
    pub const fn points_per_turn(&self) -> u32 {
        self.points_per_turn
    }

    /// One-time score.
    #[must_use]
    pub const fn victory_points(&self) -> u32 {
        self.victory_points
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ObjectiveStatus {
        self.status
    }

    /// Still evaluated each turn.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ObjectiveStatus::Active
    }

    /// `cell` lies within the control radius.
    #[must_use]
    pub fn covers(&self, cell: Hex) -> bool {
        self.position.distance(cell) <= self.radius
    }

    /// An active capture point not already held by `team`.
    #[must_use]
    pub fn is_contested_for(&self, team: &Team) -> bool {
        self.is_active()
            && self.kind == ObjectiveKind::CapturePoint
            && !self.controlled_by.is_held_by(team)
    }
}
