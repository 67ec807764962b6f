//! Authoritative per-game ship store.
//!
//! [`ShipRegistry`] is the only place ship state changes. Hull, shields,
//! position, facing and status are mutated exclusively through its methods,
//! which uphold the ship invariants:
//!
//! - `0 <= hull <= max_hull` and `0 <= shields <= max_shields`
//! - `status == Destroyed` exactly when `hull == 0`, and never reverts
//! - a surviving ship at or below the disable threshold is `Disabled`
//!
//! Ships are kept in a `BTreeMap` keyed by [`ShipId`], so every traversal is
//! in ascending id order.

use hexgrid::{Direction, Hex, MapSize};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::config::fraction_of;
use crate::entity::{Controller, GameId, Ship, ShipId, ShipSpec, ShipStatus, Team};
use crate::error::{successor_id, NotFoundError, Result, StateError, ValidationError};

/// Which pool a hit is applied to first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageTarget {
    /// Shields absorb first, overflow goes to the hull
    Shields,
    /// Straight to the hull
    Hull,
}

/// Effect of one [`ShipRegistry::apply_damage`] call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    /// Damaged ship
    pub ship: ShipId,
    /// Points taken off the shields
    pub shield_damage: u32,
    /// Points taken off the hull
    pub hull_damage: u32,
    /// This call destroyed the ship
    pub destroyed: bool,
    /// Hull afterwards
    pub hull: u32,
    /// Shields afterwards
    pub shields: u32,
    /// Status afterwards
    pub status: ShipStatus,
}

/// Criteria for [`ShipRegistry::list`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipFilter {
    /// Only ships of this team
    pub team: Option<Team>,
    /// Only ships with this status
    pub status: Option<ShipStatus>,
    /// Only ships that are not destroyed
    pub in_play: bool,
    /// Only AI-controlled ships
    pub ai_only: bool,
}

impl ShipFilter {
    /// Matches every ship.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches non-destroyed ships.
    #[must_use]
    pub fn in_play() -> Self {
        Self {
            in_play: true,
            ..Self::default()
        }
    }

    /// Restricts to `team`.
    #[must_use]
    pub fn team(mut self, team: impl Into<Team>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Restricts to `status`.
    #[must_use]
    pub fn status(mut self, status: ShipStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to AI-controlled ships.
    #[must_use]
    pub fn ai_only(mut self) -> Self {
        self.ai_only = true;
        self
    }

    fn matches(&self, ship: &Ship) -> bool {
        self.team.as_ref().map_or(true, |team| ship.team() == team)
            && self.status.map_or(true, |status| ship.status() == status)
            && (!self.in_play || !ship.is_destroyed())
            && (!self.ai_only || matches!(ship.controller(), Controller::Ai(_)))
    }
}

/// The ships of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRegistry {
    game_id: GameId,
    map: MapSize,
    disable_threshold: f32,
    next_id: u64,
    ships: BTreeMap<ShipId, Ship>,
}

impl ShipRegistry {
    /// Creates an empty registry for `game_id`.
    ///
    /// # Arguments
    ///
    /// * `game_id` - Owning game
    /// * `map` - Bounds that every position must respect
    /// * `disable_threshold` - Hull fraction at or below which a ship is disabled
    #[must_use]
    pub fn new(game_id: GameId, map: MapSize, disable_threshold: f32) -> Self {
        Self {
            game_id,
            map,
            disable_threshold,
            next_id: 1,
            ships: BTreeMap::new(),
        }
    }

    /// Rebuilds a registry from stored ships.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidShipSpec`] if a ship breaks the hull,
    /// shield, status or bounds invariants, or belongs to another game, and
    /// [`EngineError::Inconsistent`](crate::error::EngineError::Inconsistent)
    /// for a ship id of `u64::MAX`.
    pub fn from_ships(
        game_id: GameId,
        map: MapSize,
        disable_threshold: f32,
        ships: impl IntoIterator<Item = Ship>,
    ) -> Result<Self> {
        let mut registry = Self::new(game_id, map, disable_threshold);
        for ship in ships {
            let consistent = ship.game_id == game_id
                && ship.hull <= ship.max_hull
                && ship.shields <= ship.max_shields
                && (ship.hull == 0) == (ship.status == ShipStatus::Destroyed)
                && map.contains(ship.position);
            if !consistent {
                return Err(ValidationError::InvalidShipSpec {
                    reason: format!("stored ship {} violates ship invariants", ship.id),
                }
                .into());
            }
            registry.next_id = registry.next_id.max(successor_id("ship", ship.id.as_u64())?);
            registry.ships.insert(ship.id, ship);
        }
        Ok(registry)
    }

    /// Owning game.
    #[must_use]
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Validates `spec` and adds the ship, returning its id.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::OutOfBounds`] if the position is off the map
    /// - [`ValidationError::InvalidShipSpec`] for zero hull, values above
    ///   their maximum, duplicate weapon ids, or an occupied start cell
    pub fn create(&mut self, spec: ShipSpec) -> Result<ShipId> {
        let invalid = |reason: &str| ValidationError::InvalidShipSpec {
            reason: format!("{}: {reason}", spec.name),
        };

        if !self.map.contains(spec.position) {
            return Err(ValidationError::OutOfBounds {
                coord: spec.position,
            }
            .into());
        }
        let hull = spec.hull.unwrap_or(spec.max_hull);
        let shields = spec.shields.unwrap_or(spec.max_shields);
        if spec.max_hull == 0 || hull == 0 {
            return Err(invalid("hull must be positive").into());
        }
        if hull > spec.max_hull {
            return Err(invalid("hull exceeds max_hull").into());
        }
        if shields > spec.max_shields {
            return Err(invalid("shields exceed max_shields").into());
        }
        if spec.team.as_str().is_empty() {
            return Err(invalid("team must be named").into());
        }
        let mut seen = HashSet::new();
        if !spec.weapons.iter().all(|weapon| seen.insert(weapon.id.as_str())) {
            return Err(invalid("duplicate weapon id").into());
        }
        if self.occupant(spec.position).is_some() {
            return Err(invalid("start cell is occupied").into());
        }

        let id = ShipId::new(self.next_id);
        self.next_id = successor_id("ship", self.next_id)?;
        let status = if hull <= fraction_of(spec.max_hull, self.disable_threshold) {
            ShipStatus::Disabled
        } else {
            ShipStatus::Active
        };
        let ship = Ship {
            id,
            game_id: self.game_id,
            name: spec.name,
            class: spec.class,
            team: spec.team,
            controller: spec.controller,
            hull,
            max_hull: spec.max_hull,
            shields,
            max_shields: spec.max_shields,
            position: spec.position,
            facing: spec.facing,
            speed: spec.speed,
            status,
            weapons: spec.weapons,
        };
        debug!(game = %self.game_id, ship = %id, name = ship.name(), "ship created");
        self.ships.insert(id, ship);
        Ok(id)
    }

    /// Looks up a ship.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Ship`] if the ship is not in this game.
    pub fn get(&self, id: ShipId) -> Result<&Ship> {
        self.ships
            .get(&id)
            .ok_or_else(|| NotFoundError::Ship(id).into())
    }

    fn get_mut(&mut self, id: ShipId) -> Result<&mut Ship> {
        self.ships
            .get_mut(&id)
            .ok_or_else(|| NotFoundError::Ship(id).into())
    }

    /// Ships matching `filter`, in id order.
    #[must_use]
    pub fn list(&self, filter: &ShipFilter) -> Vec<&Ship> {
        self.ships.values().filter(|ship| filter.matches(ship)).collect()
    }

    /// All ships in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    /// Number of ships, destroyed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ships.len()
    }

    /// No ships at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Clone of the underlying map.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<ShipId, Ship> {
        self.ships.clone()
    }

    /// The non-destroyed ship on `cell`, if any.
    #[must_use]
    pub fn occupant(&self, cell: Hex) -> Option<ShipId> {
        self.ships
            .values()
            .find(|ship| !ship.is_destroyed() && ship.position == cell)
            .map(Ship::id)
    }

    /// Teams with at least one non-destroyed ship.
    #[must_use]
    pub fn teams_in_play(&self) -> BTreeSet<Team> {
        self.ships
            .values()
            .filter(|ship| !ship.is_destroyed())
            .map(|ship| ship.team.clone())
            .collect()
    }

    /// Applies `amount` damage to a ship.
    ///
    /// With [`DamageTarget::Shields`] the shields absorb first and any
    /// remainder goes to the hull. Both pools clamp at zero. A ship whose hull
    /// reaches zero is destroyed; damaging a destroyed ship changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Ship`] if the ship is not in this game.
    pub fn apply_damage(
        &mut self,
        id: ShipId,
        amount: u32,
        target: DamageTarget,
    ) -> Result<DamageReport> {
        let disable_threshold = self.disable_threshold;
        let ship = self.get_mut(id)?;

        let mut report = DamageReport {
            ship: id,
            shield_damage: 0,
            hull_damage: 0,
            destroyed: false,
            hull: ship.hull,
            shields: ship.shields,
            status: ship.status,
        };
        if ship.is_destroyed() {
            return Ok(report);
        }

        let mut remaining = amount;
        if target == DamageTarget::Shields {
            report.shield_damage = remaining.min(ship.shields);
            ship.shields -= report.shield_damage;
            remaining -= report.shield_damage;
        }
        report.hull_damage = remaining.min(ship.hull);
        ship.hull -= report.hull_damage;

        if ship.hull == 0 {
            ship.status = ShipStatus::Destroyed;
            report.destroyed = true;
        } else if ship.hull <= fraction_of(ship.max_hull, disable_threshold) {
            ship.status = ShipStatus::Disabled;
        }

        report.hull = ship.hull;
        report.shields = ship.shields;
        report.status = ship.status;
        debug!(
            ship = %id,
            shield_damage = report.shield_damage,
            hull_damage = report.hull_damage,
            destroyed = report.destroyed,
            "damage applied"
        );
        Ok(report)
    }

    /// Moves a ship, returning its previous cell.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError::Ship`] if the ship is not in this game
    /// - [`ValidationError::OutOfBounds`] if `to` is off the map
    /// - [`StateError::ShipDestroyed`] if the ship is destroyed
    pub fn move_ship(&mut self, id: ShipId, to: Hex) -> Result<Hex> {
        if !self.map.contains(to) {
            return Err(ValidationError::OutOfBounds { coord: to }.into());
        }
        let ship = self.get_mut(id)?;
        if ship.is_destroyed() {
            return Err(StateError::ShipDestroyed(id).into());
        }
        Ok(std::mem::replace(&mut ship.position, to))
    }

    /// Sets a ship's facing (0..=5), returning the previous facing index.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError::Ship`] if the ship is not in this game
    /// - [`ValidationError::InvalidFacing`] if `facing > 5`
    /// - [`StateError::ShipDestroyed`] if the ship is destroyed
    pub fn set_facing(&mut self, id: ShipId, facing: u8) -> Result<u8> {
        let direction =
            Direction::from_index(facing).ok_or(ValidationError::InvalidFacing(facing))?;
        let ship = self.get_mut(id)?;
        if ship.is_destroyed() {
            return Err(StateError::ShipDestroyed(id).into());
        }
        Ok(std::mem::replace(&mut ship.facing, direction).index())
    }

    /// Restores up to `amount` shield points, returning the points actually
    /// restored.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError::Ship`] if the ship is not in this game
    /// - [`StateError::ShipDestroyed`] if the ship is destroyed
    pub fn raise_shields(&mut self, id: ShipId, amount: u32) -> Result<u32> {
        let ship = self.get_mut(id)?;
        if ship.is_destroyed() {
            return Err(StateError::ShipDestroyed(id).into());
        }
        let restored = amount.min(ship.max_shields - ship.shields);
        ship.shields += restored;
        Ok(restored)
    }
}
