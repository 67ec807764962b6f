//! Engine tuning knobs.
//!
//! All fields have defaults, so an empty JSON object (or a missing `config`
//! key in a battle package) yields [`EngineConfig::default`].

use serde::{Deserialize, Serialize};

/// How weapon damage is computed on a hit.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "model")]
pub enum DamageModel {
    /// Damage equals the weapon's base damage
    #[default]
    Deterministic,
    /// Base damage scaled by a uniform factor in `[1 - spread, 1 + spread]`
    ///
    /// The factor is drawn from a `ChaCha8` stream seeded from
    /// (ai seed, game, turn, attacker), so a replay with the same seed
    /// reproduces the same damage.
    Variance {
        /// Half-width of the scaling interval, clamped to `0.0..=1.0`
        spread: f32,
    },
}

/// Per-manager engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fraction of `max_shields` restored by `raise_shields`
    pub shield_regen_fraction: f32,
    /// Hull fraction at or below which a surviving ship is disabled
    pub disable_threshold: f32,
    /// Score that ends the game immediately
    pub victory_points_to_win: Option<u32>,
    /// Turn cap; the game ends after this turn resolves
    pub max_turns: Option<u32>,
    /// Master seed for AI decisions and damage variance
    pub ai_seed: u64,
    /// Damage computation
    pub damage_model: DamageModel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shield_regen_fraction: 0.25,
            disable_threshold: 0.2,
            victory_points_to_win: None,
            max_turns: None,
            ai_seed: 0,
            damage_model: DamageModel::Deterministic,
        }
    }
}

impl EngineConfig {
    /// Sets the master seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.ai_seed = seed;
        self
    }

    /// Sets the turn cap.
    #[must_use]
    pub const fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns);
        self
    }

    /// Sets the winning score.
    #[must_use]
    pub const fn with_victory_points(mut self, points: u32) -> Self {
        self.victory_points_to_win = Some(points);
        self
    }

    /// Shield points restored by one `raise_shields` on a ship with
    /// `max_shields` capacity. Always at least 1 when capacity is non-zero.
    #[must_use]
    pub fn shield_regen(&self, max_shields: u32) -> u32 {
        if max_shields == 0 {
            return 0;
        }
        let fraction = self.shield_regen_fraction.clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let amount = (f64::from(max_shields) * f64::from(fraction)).round() as u32;
        amount.clamp(1, max_shields)
    }

    /// Hull value at or below which a ship with `max_hull` is disabled.
    #[must_use]
    pub fn disable_hull(&self, max_hull: u32) -> u32 {
        fraction_of(max_hull, self.disable_threshold)
    }
}

/// `floor(value * fraction)` with `fraction` clamped to `0.0..=1.0`.
pub(crate) fn fraction_of(value: u32, fraction: f32) -> u32 {
    let fraction = fraction.clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = (f64::from(value) * f64::from(fraction)).floor() as u32;
    scaled
}
