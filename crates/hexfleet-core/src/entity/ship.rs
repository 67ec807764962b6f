//! Ship records, weapons and firing arcs.
//!
//! Ship fields are crate-private: outside the crate a [`Ship`] is read-only,
//! and inside it every vital-stat or position change goes through
//! [`ShipRegistry`](crate::registry::ShipRegistry).

use bitflags::bitflags;
use hexgrid::{Direction, DirectionSet, Hex};
use serde::{Deserialize, Serialize};

use crate::ai::Difficulty;
use crate::entity::{GameId, PlayerId, ShipId, Team};

/// Who issues orders for a ship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    /// A human player
    Player(PlayerId),
    /// The built-in AI at the given difficulty
    Ai(Difficulty),
}

impl Controller {
    /// The AI difficulty, if this ship is AI-driven.
    #[must_use]
    pub const fn difficulty(&self) -> Option<Difficulty> {
        match self {
            Self::Ai(difficulty) => Some(*difficulty),
            Self::Player(_) => None,
        }
    }
}

/// Operational status of a ship.
///
/// `Destroyed` is terminal: once set it never changes again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipStatus {
    /// Fully operational
    Active,
    /// Crippled: cannot move or fire, can still raise shields and be shot
    Disabled,
    /// Hull reached zero
    Destroyed,
}

bitflags! {
    /// Firing sectors relative to the ship's facing.
    ///
    /// Each bit covers the 60 degree wedge centered on one hex direction,
    /// counted clockwise from the bow.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FiringArc: u8 {
        /// Dead ahead
        const FORE = 1 << 0;
        /// Ahead, to the right
        const FORE_STARBOARD = 1 << 1;
        /// Behind, to the right
        const AFT_STARBOARD = 1 << 2;
        /// Dead astern
        const AFT = 1 << 3;
        /// Behind, to the left
        const AFT_PORT = 1 << 4;
        /// Ahead, to the left
        const FORE_PORT = 1 << 5;

        /// The three forward sectors
        const FORWARD = Self::FORE.bits() | Self::FORE_STARBOARD.bits() | Self::FORE_PORT.bits();
        /// The three rear sectors
        const REAR = Self::AFT.bits() | Self::AFT_STARBOARD.bits() | Self::AFT_PORT.bits();
        /// Every sector
        const TURRET = Self::FORWARD.bits() | Self::REAR.bits();
    }
}

impl FiringArc {
    /// Returns true if any absolute direction in `bearing` falls inside
    /// one of these sectors for a ship facing `facing`.
    #[must_use]
    pub fn covers(self, facing: Direction, bearing: DirectionSet) -> bool {
        bearing.directions().any(|d| {
            let sector = Self::from_bits_truncate(1 << d.relative_to(facing));
            self.intersects(sector)
        })
    }
}

/// A named weapon mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    /// Weapon id, unique within the ship's loadout (e.g. `"phaser"`)
    pub id: String,
    /// Base damage per hit
    pub damage: u32,
    /// Maximum range in hex steps
    pub range: u32,
    /// Sectors the mount can fire into
    pub arcs: FiringArc,
    /// Damage goes straight to the hull
    #[serde(default)]
    pub bypasses_shields: bool,
}

impl Weapon {
    /// Creates a weapon that is absorbed by shields first.
    #[must_use]
    pub fn new(id: impl Into<String>, damage: u32, range: u32, arcs: FiringArc) -> Self {
        Self {
            id: id.into(),
            damage,
            range,
            arcs,
            bypasses_shields: false,
        }
    }

    /// Marks the weapon as shield-piercing.
    #[must_use]
    pub fn bypassing_shields(mut self) -> Self {
        self.bypasses_shields = true;
        self
    }
}

/// Creation parameters for a ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSpec {
    /// Display name
    pub name: String,
    /// Hull class (e.g. `"constitution"`)
    #[serde(default)]
    pub class: String,
    /// Side the ship fights for
    pub team: Team,
    /// Who gives the orders
    pub controller: Controller,
    /// Maximum hull points
    pub max_hull: u32,
    /// Starting hull; defaults to `max_hull`
    #[serde(default)]
    pub hull: Option<u32>,
    /// Maximum shield points
    #[serde(default)]
    pub max_shields: u32,
    /// Starting shields; defaults to `max_shields`
    #[serde(default)]
    pub shields: Option<u32>,
    /// Starting cell
    pub position: Hex,
    /// Starting facing
    #[serde(default = "default_facing")]
    pub facing: Direction,
    /// Hex steps per move action
    pub speed: u32,
    /// Weapon loadout
    #[serde(default)]
    pub weapons: Vec<Weapon>,
}

const fn default_facing() -> Direction {
    Direction::North
}

impl ShipSpec {
    /// A 100-hull, 50-shield, speed-2 unarmed ship; adjust with the builder methods.
    #[must_use]
    pub fn new(name: impl Into<String>, team: impl Into<Team>, controller: Controller, position: Hex) -> Self {
        Self {
            name: name.into(),
            class: String::new(),
            team: team.into(),
            controller,
            max_hull: 100,
            hull: None,
            max_shields: 50,
            shields: None,
            position,
            facing: Direction::North,
            speed: 2,
            weapons: Vec::new(),
        }
    }

    /// Sets current and maximum hull.
    #[must_use]
    pub fn hull(mut self, hull: u32, max_hull: u32) -> Self {
        self.hull = Some(hull);
        self.max_hull = max_hull;
        self
    }

    /// Sets current and maximum shields.
    #[must_use]
    pub fn shields(mut self, shields: u32, max_shields: u32) -> Self {
        self.shields = Some(shields);
        self.max_shields = max_shields;
        self
    }

    /// Sets the facing.
    #[must_use]
    pub fn facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    /// Sets the speed.
    #[must_use]
    pub fn speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the hull class.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Adds a weapon to the loadout.
    #[must_use]
    pub fn weapon(mut self, weapon: Weapon) -> Self {
        self.weapons.push(weapon);
        self
    }
}

/// A ship in a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub(crate) id: ShipId,
    pub(crate) game_id: GameId,
    pub(crate) name: String,
    pub(crate) class: String,
    pub(crate) team: Team,
    pub(crate) controller: Controller,
    pub(crate) hull: u32,
    pub(crate) max_hull: u32,
    pub(crate) shields: u32,
    pub(crate) max_shields: u32,
    pub(crate) position: Hex,
    pub(crate) facing: Direction,
    pub(crate) speed: u32,
    pub(crate) status: ShipStatus,
    pub(crate) weapons: Vec<Weapon>,
}

impl Ship {
    /// Ship id.
    #[must_use]
    pub const fn id(&self) -> ShipId {
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

    /// Hull class.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Side the ship fights for.
    #[must_use]
    pub const fn team(&self) -> &Team {
        &self.team
    }

    /// Who gives the orders.
    #[must_use]
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Current hull.
    #[must_use]
    pub const fn hull(&self) -> u32 {
        self.hull
    }

    /// Maximum hull.
    #[must_use]
    pub const fn max_hull(&self) -> u32 {
        self.max_hull
    }

    /// Current shields.
    #[must_use]
    pub const fn shields(&self) -> u32 {
        self.shields
    }

    /// Maximum shields.
    #[must_use]
    pub const fn max_shields(&self) -> u32 {
        self.max_shields
    }

    /// Current cell.
    #[must_use]
    pub const fn position(&self) -> Hex {
        self.position
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Hex steps per move action.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Operational status.
    #[must_use]
    pub const fn status(&self) -> ShipStatus {
        self.status
    }

    /// Weapon loadout.
    #[must_use]
    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    /// Looks up a weapon by id.
    #[must_use]
    pub fn weapon(&self, id: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    /// Hull has reached zero.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.status == ShipStatus::Destroyed
    }

    /// Able to move, rotate and fire.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.status == ShipStatus::Active
    }

    /// Belongs to a different team than `other`.
    #[must_use]
    pub fn is_enemy_of(&self, other: &Self) -> bool {
        self.team != other.team
    }

    /// Target is within range and arc of `weapon`, both measured from
    /// this ship's current position and facing.
    #[must_use]
    pub fn has_firing_solution(&self, weapon: &Weapon, target: Hex) -> bool {
        let range = self.position.distance(target);
        range > 0
            && range <= weapon.range
            && weapon.arcs.covers(self.facing, self.position.bearing_to(target))
    }
}
