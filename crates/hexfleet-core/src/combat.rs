//! Weapon fire.
//!
//! [`CombatResolver::fire`] checks range and arc from the attacker's
//! start-of-turn position and facing against the defender's start-of-turn
//! position, then applies damage through the [`ShipRegistry`]. A failed check
//! is a miss, not an error.

use rand::{Rng, RngCore};
use tracing::debug;

use crate::config::DamageModel;
use crate::entity::{Ship, Weapon};
use crate::error::{Result, StateError};
use crate::event::MissReason;
use crate::registry::{DamageReport, DamageTarget, ShipRegistry};

/// Result of one shot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// Range and arc checks passed; damage was applied
    Hit(DamageReport),
    /// A check failed; nothing changed
    Miss(MissReason),
}

impl FireOutcome {
    /// The shot connected.
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Computes weapon-fire outcomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatResolver {
    model: DamageModel,
}

impl CombatResolver {
    /// Creates a resolver using `model` for hit damage.
    #[must_use]
    pub const fn new(model: DamageModel) -> Self {
        Self { model }
    }

    /// Damage dealt by a hit with `base` damage.
    pub fn roll_damage(&self, base: u32, rng: &mut dyn RngCore) -> u32 {
        match self.model {
            DamageModel::Deterministic => base,
            DamageModel::Variance { spread } => {
                let spread = f64::from(spread.clamp(0.0, 1.0));
                if spread == 0.0 {
                    return base;
                }
                let factor = rng.gen_range((1.0 - spread)..=(1.0 + spread));
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let damage = (f64::from(base) * factor).round() as u32;
                damage
            }
        }
    }

    /// Fires `weapon` from `attacker` at `defender`.
    ///
    /// Both ship arguments are start-of-turn snapshots: range and arc are
    /// measured between them, and the attacker's eligibility is judged by its
    /// start-of-turn status. Damage lands on the defender's live record.
    ///
    /// # Errors
    ///
    /// - [`StateError::ShipDestroyed`] / [`StateError::ShipDisabled`] if the
    ///   attacker could not fire at the start of the turn
    /// - [`StateError::TargetDestroyed`] if the defender has already been
    ///   destroyed this turn
    /// - [`crate::error::NotFoundError::Ship`] if the defender is not in the
    ///   registry
    pub fn fire(
        &self,
        attacker: &Ship,
        weapon: &Weapon,
        defender: &Ship,
        registry: &mut ShipRegistry,
        rng: &mut dyn RngCore,
    ) -> Result<FireOutcome> {
        if attacker.is_destroyed() {
            return Err(StateError::ShipDestroyed(attacker.id()).into());
        }
        if !attacker.is_operational() {
            return Err(StateError::ShipDisabled(attacker.id()).into());
        }
        if registry.get(defender.id())?.is_destroyed() {
            return Err(StateError::TargetDestroyed(defender.id()).into());
        }

        let distance = attacker.position().distance(defender.position());
        if distance > weapon.range {
            return Ok(FireOutcome::Miss(MissReason::OutOfRange));
        }
        if !attacker.has_firing_solution(weapon, defender.position()) {
            return Ok(FireOutcome::Miss(MissReason::OutOfArc));
        }

        let damage = self.roll_damage(weapon.damage, rng);
        let target = if weapon.bypasses_shields {
            DamageTarget::Hull
        } else {
            DamageTarget::Shields
        };
        let report = registry.apply_damage(defender.id(), damage, target)?;
        debug!(
            attacker = %attacker.id(),
            defender = %defender.id(),
            weapon = %weapon.id,
            damage,
            "weapon hit"
        );
        Ok(FireOutcome::Hit(report))
    }
}
