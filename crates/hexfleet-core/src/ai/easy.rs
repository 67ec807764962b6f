//! Easy tier: close on the nearest enemy, sometimes shoot.

use rand::{Rng, RngCore};

use super::{advance_toward, first_solution, nearest_enemy, Difficulty, Strategy};
use crate::action::Action;
use crate::entity::Ship;
use crate::error::AiError;
use crate::view::GameSnapshot;

/// Chance of firing when a weapon bears.
const FIRE_CHANCE: f64 = 0.5;

/// Advances on the nearest enemy and, on a coin flip, fires the first
/// weapon that bears on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct EasyStrategy;

impl Strategy for EasyStrategy {
    fn difficulty(&self) -> Difficulty {
        Difficulty::Easy
    }

    fn decide(
        &self,
        ship: &Ship,
        snapshot: &GameSnapshot,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Action>, AiError> {
        let Some(enemy) = nearest_enemy(ship, snapshot) else {
            return Ok(Vec::new());
        };

        let mut actions = Vec::with_capacity(2);
        actions.extend(advance_toward(ship, snapshot, enemy.position()));
        // Fire resolves from start-of-turn positions, so aim from where we are now.
        if let Some(weapon) = first_solution(ship, enemy) {
            if rng.gen_bool(FIRE_CHANCE) {
                actions.push(Action::fire(weapon.id.clone(), enemy.id()));
            }
        }
        Ok(actions)
    }
}
