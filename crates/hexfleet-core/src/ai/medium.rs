//! Medium tier: weighs objectives against fighting.

use rand::{Rng, RngCore};

use super::{advance_toward, first_solution, nearest_contested, nearest_enemy, Difficulty, Strategy};
use crate::action::Action;
use crate::entity::Ship;
use crate::error::AiError;
use crate::view::GameSnapshot;

/// Chance of going for a contested objective when one exists.
const OBJECTIVE_BIAS: f64 = 0.7;

/// Goes for a contested capture point most of the time; otherwise shoots the
/// nearest enemy and raises shields.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediumStrategy;

impl Strategy for MediumStrategy {
    fn difficulty(&self) -> Difficulty {
        Difficulty::Medium
    }

    fn decide(
        &self,
        ship: &Ship,
        snapshot: &GameSnapshot,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Action>, AiError> {
        if let Some(objective) = nearest_contested(ship, snapshot) {
            if rng.gen_bool(OBJECTIVE_BIAS) {
                return Ok(advance_toward(ship, snapshot, objective.position())
                    .into_iter()
                    .collect());
            }
        }

        let mut actions = Vec::with_capacity(2);
        if let Some(enemy) = nearest_enemy(ship, snapshot) {
            if let Some(weapon) = first_solution(ship, enemy) {
                actions.push(Action::fire(weapon.id.clone(), enemy.id()));
            }
        }
        actions.push(Action::RaiseShields);
        Ok(actions)
    }
}
