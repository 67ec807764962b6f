//! Command authorization seam.
//!
//! The engine does not know who its users are; it asks an [`Authorizer`]
//! whether an actor may command a ship. [`OwnershipAuthorizer`] is the
//! built-in policy: a player commands the ships assigned to them, and the
//! AI actor commands AI-controlled ships.

use crate::action::Actor;
use crate::entity::{Controller, Ship};

/// Decides whether an actor may give orders to a ship.
pub trait Authorizer: Send + Sync {
    /// Returns true if `actor` may command `ship`.
    fn can_command(&self, actor: &Actor, ship: &Ship) -> bool;
}

/// Controller-based ownership check.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnershipAuthorizer;

impl Authorizer for OwnershipAuthorizer {
    fn can_command(&self, actor: &Actor, ship: &Ship) -> bool {
        match (actor, ship.controller()) {
            (Actor::Player(player), Controller::Player(owner)) => player == owner,
            (Actor::Ai, Controller::Ai(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{GameId, PlayerId};
    use crate::registry::ShipRegistry;
    use crate::tests::helpers::{federation, klingon};
    use hexgrid::{Hex, MapSize};

    #[test]
    fn players_command_only_their_ships() {
        let mut registry = ShipRegistry::new(GameId::new(1), MapSize::new(20, 15).unwrap(), 0.2);
        let enterprise = registry.create(federation(Hex::new(1, 1))).unwrap();
        let gorkon = registry.create(klingon(Hex::new(5, 5))).unwrap();
        let enterprise = registry.get(enterprise).unwrap();
        let gorkon = registry.get(gorkon).unwrap();

        let kirk = Actor::Player(PlayerId::from("kirk"));
        let martok = Actor::Player(PlayerId::from("martok"));
        let auth = OwnershipAuthorizer;

        assert!(auth.can_command(&kirk, enterprise));
        assert!(!auth.can_command(&martok, enterprise));
        assert!(!auth.can_command(&kirk, gorkon));
        assert!(auth.can_command(&Actor::Ai, gorkon));
        assert!(!auth.can_command(&Actor::Ai, enterprise));
    }
}
