//! Random tier: one uniformly chosen step.

use rand::seq::SliceRandom;
use rand::RngCore;

use super::{Difficulty, Strategy};
use crate::action::Action;
use crate::entity::Ship;
use crate::error::AiError;
use crate::view::GameSnapshot;

/// Steps to a uniformly random in-bounds neighbor.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomStrategy;

impl Strategy for RandomStrategy {
    fn difficulty(&self) -> Difficulty {
        Difficulty::Random
    }

    fn decide(
        &self,
        ship: &Ship,
        snapshot: &GameSnapshot,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Action>, AiError> {
        if !ship.is_operational() || ship.speed() == 0 {
            return Ok(Vec::new());
        }
        let options = snapshot.game.map().neighbors(ship.position());
        Ok(options
            .choose(rng)
            .map(|&to| vec![Action::Move { to }])
            .unwrap_or_default())
    }
}
