//! Factories for ships, weapons and game states.

use hexgrid::{Hex, MapSize};
use std::collections::BTreeSet;

use crate::ai::Difficulty;
use crate::entity::{
    Controller, FiringArc, Game, GameId, ObjectiveSpec, Phase, PlayerId, ShipSpec, Weapon,
};
use crate::manager::{CreatedGame, GameSetup, GameStateManager};
use crate::registry::ShipRegistry;
use crate::resolver::BattleState;
use crate::tracker::ObjectiveTracker;
use crate::view::GameSnapshot;

// =============================================================================
// Ships and weapons
// =============================================================================

/// Player-controlled (by "kirk") Federation cruiser: hull 100, shields 80.
pub fn federation(position: Hex) -> ShipSpec {
    ShipSpec::new(
        "USS Enterprise",
        "federation",
        Controller::Player(PlayerId::from("kirk")),
        position,
    )
    .class("constitution")
    .hull(100, 100)
    .shields(80, 80)
    .speed(2)
}

/// Hard-AI Klingon cruiser: hull 95, shields 60.
pub fn klingon(position: Hex) -> ShipSpec {
    ShipSpec::new(
        "IKS Gorkon",
        "klingon",
        Controller::Ai(Difficulty::Hard),
        position,
    )
    .class("vorcha")
    .hull(95, 95)
    .shields(60, 60)
    .speed(2)
}

/// 20 damage, range 3, forward arcs.
pub fn phaser() -> Weapon {
    Weapon::new("phaser", 20, 3, FiringArc::FORWARD)
}

/// 25 damage, range 5, dead ahead only.
pub fn torpedo() -> Weapon {
    Weapon::new("torpedo", 25, 5, FiringArc::FORE)
}

// =============================================================================
// States
// =============================================================================

/// A game on a `width` x `height` map, battle already started.
pub fn battle_state_on(
    width: u32,
    height: u32,
    ships: Vec<ShipSpec>,
    objectives: Vec<ObjectiveSpec>,
) -> BattleState {
    let game_id = GameId::new(1);
    let map = MapSize::new(width, height).unwrap();
    let mut registry = ShipRegistry::new(game_id, map, 0.2);
    for spec in ships {
        registry.create(spec).unwrap();
    }
    let mut tracker = ObjectiveTracker::new(game_id, map);
    for spec in objectives {
        tracker.create(spec).unwrap();
    }
    let teams: BTreeSet<_> = registry.iter().map(|ship| ship.team().clone()).collect();
    let mut game = Game::new(game_id, map, teams.into_iter().collect());
    game.phase = Phase::Movement;
    BattleState::new(game, registry, tracker)
}

/// [`battle_state_on`] with the standard 20 x 15 map.
pub fn battle_state(ships: Vec<ShipSpec>, objectives: Vec<ObjectiveSpec>) -> BattleState {
    battle_state_on(20, 15, ships, objectives)
}

/// Snapshot of [`battle_state_on`].
pub fn snapshot_of(
    width: u32,
    height: u32,
    ships: Vec<ShipSpec>,
    objectives: Vec<ObjectiveSpec>,
) -> GameSnapshot {
    battle_state_on(width, height, ships, objectives).snapshot()
}

/// Creates and starts a game on the standard map.
pub fn started_game(
    manager: &GameStateManager,
    ships: Vec<ShipSpec>,
    objectives: Vec<ObjectiveSpec>,
) -> CreatedGame {
    let created = manager
        .create_game(GameSetup {
            map: MapSize::new(20, 15).unwrap(),
            ships,
            objectives,
        })
        .unwrap();
    manager.begin_battle(created.game_id).unwrap();
    created
}
