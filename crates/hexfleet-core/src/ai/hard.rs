//! Hard tier: shield discipline, objective holding and weapon choice.

use rand::RngCore;

use super::{advance_toward, first_solution, nearest_contested, nearest_enemy, Difficulty, Strategy};
use crate::action::Action;
use crate::entity::{Ship, Weapon};
use crate::error::AiError;
use crate::view::GameSnapshot;

/// Distance at which the ship stops and holds an objective.
const HOLD_RADIUS: u32 = 2;

/// Prioritised decision list; the first branch that applies wins.
///
/// 1. Shields below half: raise shields and nothing else.
/// 2. Within [`HOLD_RADIUS`] of a contested capture point: hold position and
///    fire a torpedo at the nearest enemy if it bears.
/// 3. A contested capture point exists: advance toward it.
/// 4. Otherwise: fire the phaser (or the first weapon that bears) at the
///    nearest enemy, closing in if nothing bears.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardStrategy;

fn bearing_weapon<'a>(ship: &'a Ship, target: &Ship, preferred: &str) -> Option<&'a Weapon> {
    ship.weapon(preferred)
        .filter(|weapon| ship.is_operational() && ship.has_firing_solution(weapon, target.position()))
}

impl Strategy for HardStrategy {
    fn difficulty(&self) -> Difficulty {
        Difficulty::Hard
    }

    fn decide(
        &self,
        ship: &Ship,
        snapshot: &GameSnapshot,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Action>, AiError> {
        if u64::from(ship.shields()) * 2 < u64::from(ship.max_shields()) {
            return Ok(vec![Action::RaiseShields]);
        }

        let enemy = nearest_enemy(ship, snapshot);

        if let Some(objective) = nearest_contested(ship, snapshot) {
            if ship.position().distance(objective.position()) <= HOLD_RADIUS {
                let shot = enemy.and_then(|enemy| {
                    bearing_weapon(ship, enemy, "torpedo")
                        .map(|weapon| Action::fire(weapon.id.clone(), enemy.id()))
                });
                return Ok(shot.into_iter().collect());
            }
            return Ok(advance_toward(ship, snapshot, objective.position())
                .into_iter()
                .collect());
        }

        let Some(enemy) = enemy else {
            return Ok(Vec::new());
        };
        let weapon = bearing_weapon(ship, enemy, "phaser").or_else(|| first_solution(ship, enemy));
        Ok(match weapon {
            Some(weapon) => vec![Action::fire(weapon.id.clone(), enemy.id())],
            None => advance_toward(ship, snapshot, enemy.position())
                .into_iter()
                .collect(),
        })
    }
}
