//! Move validation, queuing and ordered turn resolution.
//!
//! [`ActionResolver`] owns the rules that turn queued orders into state
//! changes. It works on a [`BattleState`] and writes one event per effect to
//! an [`EventSink`].
//!
//! # Submission
//!
//! Checks run in a fixed order and the first failure is returned:
//!
//! 1. game and ship exist ([`NotFoundError`])
//! 2. the actor may command the ship ([`AuthorizationError`])
//! 3. the game is not over, the turn matches, the game is not locked, the
//!    battle has started, the ship has no live move yet and is not destroyed
//!    ([`StateError`])
//! 4. every action is well formed ([`ValidationError`])
//!
//! # Resolution order
//!
//! Queued moves for the turn are applied in three passes, each in ascending
//! ship id order:
//!
//! 1. **Movement**: `move` actions.
//! 2. **Fire**: `fire_weapon` actions, with range, arc and attacker
//!    eligibility taken from the snapshot captured before movement.
//! 3. **Status**: `raise_shields` and `rotate`.
//!
//! An action that can no longer be applied (target destroyed, cell occupied,
//! ship disabled) is recorded as `action_skipped` and resolution continues.
//! Objectives are then evaluated, the outcome checked, and the turn advanced.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

use crate::action::{Action, ActionPhase, Move, MoveStatus, MoveSubmission};
use crate::ai::derive_seed;
use crate::auth::Authorizer;
use crate::combat::{CombatResolver, FireOutcome};
use crate::config::EngineConfig;
use crate::entity::{EndReason, Game, GameId, MoveId, Outcome, Phase, Ship, ShipId, Team};
use crate::error::{
    AuthorizationError, EngineError, NotFoundError, Result, StateError, ValidationError,
};
use crate::event::{EventKind, EventSink};
use crate::registry::ShipRegistry;
use crate::tracker::{ObjectiveEffect, ObjectiveTracker};
use crate::view::GameSnapshot;

/// Offset separating the damage-variance stream from the AI stream.
const DAMAGE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed for one weapon's damage roll; each mount of an attacker rolls
/// independently.
fn damage_seed(master: u64, game: GameId, turn: u32, attacker: ShipId, weapon: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    derive_seed(master.wrapping_add(DAMAGE_STREAM), game, turn, attacker).hash(&mut hasher);
    weapon.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// BattleState
// =============================================================================

/// Everything one game owns apart from its event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub(crate) game: Game,
    pub(crate) ships: ShipRegistry,
    pub(crate) objectives: ObjectiveTracker,
    pub(crate) moves: BTreeMap<MoveId, Move>,
    pub(crate) next_move_id: u64,
}

impl BattleState {
    /// Assembles a state with no moves queued.
    #[must_use]
    pub fn new(game: Game, ships: ShipRegistry, objectives: ObjectiveTracker) -> Self {
        Self {
            game,
            ships,
            objectives,
            moves: BTreeMap::new(),
            next_move_id: 1,
        }
    }

    /// Game record.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Ship store.
    #[must_use]
    pub const fn ships(&self) -> &ShipRegistry {
        &self.ships
    }

    /// Objectives and scores.
    #[must_use]
    pub const fn objectives(&self) -> &ObjectiveTracker {
        &self.objectives
    }

    /// Every move ever submitted, by id.
    #[must_use]
    pub const fn moves(&self) -> &BTreeMap<MoveId, Move> {
        &self.moves
    }

    /// Looks up a move.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Move`] if the move is not in this game.
    pub fn get_move(&self, id: MoveId) -> Result<&Move> {
        self.moves
            .get(&id)
            .ok_or_else(|| NotFoundError::Move(id).into())
    }

    /// The live move for `ship` on `turn`, if any.
    #[must_use]
    pub fn live_move(&self, ship: ShipId, turn: u32) -> Option<&Move> {
        self.moves
            .values()
            .find(|m| m.ship_id == ship && m.turn == turn && m.is_live())
    }

    /// Owned read-only copy for AI and rendering.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game: self.game.clone(),
            ships: self.ships.to_map(),
            objectives: self.objectives.to_map(),
            scores: self.objectives.scores().clone(),
        }
    }
}

/// Counts from one resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    /// The turn that was resolved
    pub turn: u32,
    /// Moves applied
    pub moves: usize,
    /// Actions applied
    pub applied: usize,
    /// Actions degraded to `action_skipped`
    pub skipped: usize,
    /// Set if this resolution ended the game
    pub outcome: Option<Outcome>,
}

// =============================================================================
// ActionResolver
// =============================================================================

/// Validates submissions and applies queued moves.
#[derive(Debug, Clone, Default)]
pub struct ActionResolver {
    config: EngineConfig,
    combat: CombatResolver,
}

/// Queued orders of one ship, extracted for resolution.
struct Orders {
    ship: ShipId,
    actions: Vec<Action>,
}

impl ActionResolver {
    /// Creates a resolver governed by `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let combat = CombatResolver::new(config.damage_model);
        Self { config, combat }
    }

    /// Engine configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates `submission` and queues it as a pending move.
    ///
    /// # Errors
    ///
    /// Returns the first failing check in the order documented on this
    /// module. Nothing is queued or recorded on failure.
    pub fn submit(
        &self,
        state: &mut BattleState,
        authorizer: &dyn Authorizer,
        submission: MoveSubmission,
        sink: &mut dyn EventSink,
    ) -> Result<MoveId> {
        let game = &state.game;
        if submission.game_id != game.id {
            return Err(NotFoundError::Game(submission.game_id).into());
        }
        let ship = state.ships.get(submission.ship_id)?;
        if !authorizer.can_command(&submission.actor, ship) {
            return Err(AuthorizationError::new(submission.actor.to_string(), ship.id()).into());
        }
        if game.is_over() {
            return Err(StateError::GameOver.into());
        }
        if submission.turn != game.current_turn {
            return Err(StateError::TurnMismatch {
                expected: game.current_turn,
                got: submission.turn,
            }
            .into());
        }
        if game.locked {
            return Err(StateError::GameLocked.into());
        }
        if game.phase == Phase::Setup {
            return Err(StateError::PhaseMismatch {
                expected: Phase::Movement,
                actual: game.phase,
            }
            .into());
        }
        if state.live_move(ship.id(), game.current_turn).is_some() {
            return Err(StateError::DuplicateMove {
                ship: ship.id(),
                turn: game.current_turn,
            }
            .into());
        }
        if ship.is_destroyed() {
            return Err(StateError::ShipDestroyed(ship.id()).into());
        }
        self.validate_actions(state, ship, &submission.actions)?;

        let id = MoveId::new(state.next_move_id);
        state.next_move_id += 1;
        let turn = state.game.current_turn;
        debug!(
            game = %submission.game_id,
            ship = %submission.ship_id,
            move_id = %id,
            actions = submission.actions.len(),
            "move queued"
        );
        sink.record_event(
            turn,
            EventKind::MoveSubmitted {
                move_id: id,
                ship: submission.ship_id,
                actor: submission.actor.clone(),
                actions: submission.actions.clone(),
            },
        );
        state.moves.insert(
            id,
            Move {
                id,
                game_id: submission.game_id,
                ship_id: submission.ship_id,
                turn,
                actor: submission.actor,
                actions: submission.actions,
                status: MoveStatus::Pending,
            },
        );
        Ok(id)
    }

    fn validate_actions(&self, state: &BattleState, ship: &Ship, actions: &[Action]) -> Result<()> {
        let map = state.game.map;
        let mut kinds = HashSet::new();
        let mut weapons = HashSet::new();

        for action in actions {
            let repeatable = matches!(action, Action::FireWeapon { .. });
            if !repeatable && !kinds.insert(action.kind()) {
                return Err(ValidationError::DuplicateAction {
                    kind: action.kind(),
                }
                .into());
            }
            match action {
                Action::Move { to } => {
                    if !map.contains(*to) {
                        return Err(ValidationError::OutOfBounds { coord: *to }.into());
                    }
                    let distance = ship.position().distance(*to);
                    if distance > ship.speed() {
                        return Err(ValidationError::TooFar {
                            distance,
                            speed: ship.speed(),
                        }
                        .into());
                    }
                    if !ship.is_operational() {
                        return Err(StateError::ShipDisabled(ship.id()).into());
                    }
                }
                Action::Rotate { facing } => {
                    if *facing > 5 {
                        return Err(ValidationError::InvalidFacing(*facing).into());
                    }
                    if !ship.is_operational() {
                        return Err(StateError::ShipDisabled(ship.id()).into());
                    }
                }
                Action::FireWeapon { weapon, target } => {
                    if ship.weapon(weapon).is_none() {
                        return Err(ValidationError::UnknownWeapon {
                            weapon: weapon.clone(),
                        }
                        .into());
                    }
                    if !weapons.insert(weapon.as_str()) {
                        return Err(ValidationError::DuplicateAction {
                            kind: action.kind(),
                        }
                        .into());
                    }
                    if *target == ship.id() {
                        return Err(ValidationError::SelfTarget.into());
                    }
                    let Ok(defender) = state.ships.get(*target) else {
                        return Err(ValidationError::UnknownTarget { ship: *target }.into());
                    };
                    if defender.is_destroyed() {
                        return Err(StateError::TargetDestroyed(*target).into());
                    }
                    if !ship.is_operational() {
                        return Err(StateError::ShipDisabled(ship.id()).into());
                    }
                }
                Action::RaiseShields | Action::Hold => {}
            }
        }
        Ok(())
    }

    /// Withdraws a pending move so the ship can submit again this turn.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError::Move`] if the move does not exist
    /// - [`AuthorizationError`] if `actor` may not command the move's ship
    /// - [`StateError::GameLocked`] once the turn is locked
    /// - [`StateError::MoveNotPending`] if the move was resolved or withdrawn
    /// - [`StateError::TurnMismatch`] if the move is for an earlier turn
    pub fn withdraw(
        &self,
        state: &mut BattleState,
        authorizer: &dyn Authorizer,
        actor: &crate::action::Actor,
        move_id: MoveId,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let queued = state.get_move(move_id)?;
        let ship = state.ships.get(queued.ship_id)?;
        if !authorizer.can_command(actor, ship) {
            return Err(AuthorizationError::new(actor.to_string(), ship.id()).into());
        }
        if state.game.locked {
            return Err(StateError::GameLocked.into());
        }
        if queued.status != MoveStatus::Pending {
            return Err(StateError::MoveNotPending(move_id).into());
        }
        if queued.turn != state.game.current_turn {
            return Err(StateError::TurnMismatch {
                expected: state.game.current_turn,
                got: queued.turn,
            }
            .into());
        }

        let ship_id = queued.ship_id;
        let turn = state.game.current_turn;
        if let Some(queued) = state.moves.get_mut(&move_id) {
            queued.status = MoveStatus::Invalid;
        }
        sink.record_event(
            turn,
            EventKind::MoveInvalidated {
                move_id,
                ship: ship_id,
            },
        );
        Ok(())
    }

    /// Closes submissions for the current turn.
    ///
    /// # Errors
    ///
    /// - [`StateError::GameOver`] if the game has ended
    /// - [`StateError::PhaseMismatch`] before the battle has started
    /// - [`StateError::GameLocked`] if already locked
    pub fn lock(&self, state: &mut BattleState, sink: &mut dyn EventSink) -> Result<()> {
        let game = &mut state.game;
        if game.is_over() {
            return Err(StateError::GameOver.into());
        }
        if game.phase == Phase::Setup {
            return Err(StateError::PhaseMismatch {
                expected: Phase::Movement,
                actual: game.phase,
            }
            .into());
        }
        if game.locked {
            return Err(StateError::GameLocked.into());
        }
        game.locked = true;
        game.phase = game.phase.next();
        sink.record_event(game.current_turn, EventKind::TurnLocked);
        Ok(())
    }

    /// Applies every pending move of the current turn and advances the turn.
    ///
    /// Locks the turn first if it is not locked yet. `state` is modified in
    /// place; callers that need all-or-nothing semantics resolve into a copy
    /// and keep it only on success.
    ///
    /// # Errors
    ///
    /// - [`StateError::GameOver`] / [`StateError::PhaseMismatch`] as for [`Self::lock`]
    /// - [`EngineError::Inconsistent`] if a queued move references a ship
    ///   the registry does not know
    pub fn resolve(
        &self,
        state: &mut BattleState,
        sink: &mut dyn EventSink,
    ) -> Result<ResolutionSummary> {
        if state.game.is_over() {
            return Err(StateError::GameOver.into());
        }
        if !state.game.locked {
            self.lock(state, sink)?;
        }
        state.game.phase = Phase::Resolution;
        let turn = state.game.current_turn;

        let mut pending: Vec<(ShipId, MoveId)> = state
            .moves
            .values()
            .filter(|m| m.turn == turn && m.status == MoveStatus::Pending)
            .map(|m| (m.ship_id, m.id))
            .collect();
        pending.sort_unstable();
        let orders: Vec<Orders> = pending
            .iter()
            .filter_map(|(ship, id)| {
                state.moves.get(id).map(|m| Orders {
                    ship: *ship,
                    actions: m.actions.clone(),
                })
            })
            .collect();

        let start = state.ships.to_map();
        let mut summary = ResolutionSummary {
            turn,
            moves: orders.len(),
            applied: 0,
            skipped: 0,
            outcome: None,
        };

        for phase in [ActionPhase::Movement, ActionPhase::Fire, ActionPhase::Status] {
            for order in &orders {
                for action in order
                    .actions
                    .iter()
                    .filter(|action| action.phase() == Some(phase))
                {
                    let step = match action {
                        Action::Move { to } => self.apply_move(state, order.ship, *to, turn, sink),
                        Action::FireWeapon { weapon, target } => {
                            self.apply_fire(state, &start, order.ship, weapon, *target, turn, sink)
                        }
                        Action::RaiseShields => self.apply_shields(state, order.ship, turn, sink),
                        Action::Rotate { facing } => {
                            self.apply_rotate(state, order.ship, *facing, turn, sink)
                        }
                        Action::Hold => Ok(()),
                    };
                    match step {
                        Ok(()) => summary.applied += 1,
                        Err(err @ (EngineError::State(_) | EngineError::Validation(_))) => {
                            warn!(ship = %order.ship, action = action.kind(), error = %err, "action skipped");
                            sink.record_event(
                                turn,
                                EventKind::ActionSkipped {
                                    ship: order.ship,
                                    action: action.kind().to_owned(),
                                    reason: err.to_string(),
                                },
                            );
                            summary.skipped += 1;
                        }
                        Err(err) => {
                            return Err(EngineError::Inconsistent(format!(
                                "resolving {} for ship {}: {err}",
                                action.kind(),
                                order.ship
                            )))
                        }
                    }
                }
            }
        }

        for (_, id) in &pending {
            if let Some(m) = state.moves.get_mut(id) {
                m.status = MoveStatus::Resolved;
            }
        }

        for effect in state.objectives.evaluate(&state.ships) {
            sink.record_event(turn, effect.into_event());
        }

        if let Some(outcome) = self.check_outcome(state) {
            state.game.outcome = Some(outcome.clone());
            sink.record_event(
                turn,
                EventKind::GameOver {
                    outcome: outcome.clone(),
                    scores: state.objectives.scores().clone(),
                },
            );
            summary.outcome = Some(outcome);
            return Ok(summary);
        }

        state.game.current_turn = turn + 1;
        state.game.phase = Phase::Resolution.next();
        state.game.locked = false;
        sink.record_event(turn, EventKind::TurnAdvanced { from: turn, to: turn + 1 });
        Ok(summary)
    }

    fn apply_move(
        &self,
        state: &mut BattleState,
        ship: ShipId,
        to: hexgrid::Hex,
        turn: u32,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let mover = state.ships.get(ship)?;
        if mover.is_destroyed() {
            return Err(StateError::ShipDestroyed(ship).into());
        }
        if !mover.is_operational() {
            return Err(StateError::ShipDisabled(ship).into());
        }
        if state.ships.occupant(to).is_some_and(|other| other != ship) {
            return Err(StateError::CellOccupied(to).into());
        }
        let from = state.ships.move_ship(ship, to)?;
        debug!(ship = %ship, %from, %to, "ship moved");
        sink.record_event(turn, EventKind::ShipMoved { ship, from, to });
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_fire(
        &self,
        state: &mut BattleState,
        start: &BTreeMap<ShipId, Ship>,
        attacker: ShipId,
        weapon: &str,
        target: ShipId,
        turn: u32,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let shooter = start
            .get(&attacker)
            .ok_or(NotFoundError::Ship(attacker))?;
        let defender = start
            .get(&target)
            .ok_or(ValidationError::UnknownTarget { ship: target })?;
        let mount = shooter
            .weapon(weapon)
            .ok_or_else(|| ValidationError::UnknownWeapon {
                weapon: weapon.to_owned(),
            })?;

        let seed = damage_seed(self.config.ai_seed, state.game.id, turn, attacker, weapon);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let kind = match self
            .combat
            .fire(shooter, mount, defender, &mut state.ships, &mut rng)?
        {
            FireOutcome::Hit(report) => EventKind::WeaponFired {
                attacker,
                target,
                weapon: weapon.to_owned(),
                shield_damage: report.shield_damage,
                hull_damage: report.hull_damage,
                destroyed: report.destroyed,
                hull: report.hull,
                shields: report.shields,
                status: report.status,
            },
            FireOutcome::Miss(reason) => EventKind::WeaponMissed {
                attacker,
                target,
                weapon: weapon.to_owned(),
                reason,
            },
        };
        sink.record_event(turn, kind);
        Ok(())
    }

    fn apply_shields(
        &self,
        state: &mut BattleState,
        ship: ShipId,
        turn: u32,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let amount = self.config.shield_regen(state.ships.get(ship)?.max_shields());
        let restored = state.ships.raise_shields(ship, amount)?;
        let shields = state.ships.get(ship)?.shields();
        sink.record_event(
            turn,
            EventKind::ShieldsRaised {
                ship,
                restored,
                shields,
            },
        );
        Ok(())
    }

    fn apply_rotate(
        &self,
        state: &mut BattleState,
        ship: ShipId,
        facing: u8,
        turn: u32,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let rotor = state.ships.get(ship)?;
        if !rotor.is_destroyed() && !rotor.is_operational() {
            return Err(StateError::ShipDisabled(ship).into());
        }
        let from = state.ships.set_facing(ship, facing)?;
        sink.record_event(turn, EventKind::ShipRotated { ship, from, to: facing });
        Ok(())
    }

    /// Decides whether the game has ended after the current turn.
    fn check_outcome(&self, state: &BattleState) -> Option<Outcome> {
        let alive = state.ships.teams_in_play();
        if alive.is_empty() && !state.ships.is_empty() {
            return Some(Outcome::Draw {
                reason: EndReason::MutualDestruction,
            });
        }
        if alive.len() == 1 && state.game.teams.len() > 1 {
            let team = alive.into_iter().next()?;
            return Some(Outcome::Victory {
                team,
                reason: EndReason::LastTeamStanding,
            });
        }

        let scores = state.objectives.scores();
        if let Some(target) = self.config.victory_points_to_win {
            if scores.values().any(|&score| score >= target) {
                return Some(leader(scores, EndReason::VictoryPoints));
            }
        }
        if let Some(limit) = self.config.max_turns {
            if state.game.current_turn >= limit {
                return Some(leader(scores, EndReason::TurnLimit));
            }
        }
        None
    }
}

/// Highest scorer wins; a tie at the top (or no scores) is a draw.
fn leader(scores: &BTreeMap<Team, u32>, reason: EndReason) -> Outcome {
    let best = scores.values().copied().max();
    let mut top = scores
        .iter()
        .filter(|(_, &score)| Some(score) == best)
        .map(|(team, _)| team);
    match (top.next(), top.next()) {
        (Some(team), None) => Outcome::Victory {
            team: team.clone(),
            reason,
        },
        _ => Outcome::Draw { reason },
    }
}

impl ObjectiveEffect {
    /// The event recording this effect.
    #[must_use]
    pub fn into_event(self) -> EventKind {
        match self {
            Self::Scored {
                objective,
                team,
                previous,
                points,
                team_score,
            } => EventKind::ObjectiveScored {
                objective,
                team,
                previous,
                points,
                team_score,
            },
            Self::Claimed {
                objective,
                ship,
                team,
                points,
                team_score,
            } => EventKind::ArtifactClaimed {
                objective,
                ship,
                team,
                points,
                team_score,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Actor;
    use crate::auth::OwnershipAuthorizer;
    use crate::entity::{ObjectiveSpec, PlayerId, ShipStatus};
    use crate::event::EventLog;
    use crate::tests::helpers::{battle_state, federation, klingon, phaser, torpedo};
    use hexgrid::{Direction, Hex};

    fn kirk() -> Actor {
        Actor::Player(PlayerId::from("kirk"))
    }

    fn submit(
        resolver: &ActionResolver,
        state: &mut BattleState,
        log: &mut EventLog,
        ship: u64,
        actor: Actor,
        actions: Vec<Action>,
    ) -> Result<MoveId> {
        let submission = MoveSubmission::new(
            state.game.id(),
            ShipId::new(ship),
            actor,
            state.game.current_turn(),
            actions,
        );
        resolver.submit(state, &OwnershipAuthorizer, submission, log)
    }

    mod submit_tests {
        use super::*;

        #[test]
        fn checks_run_in_documented_order() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(vec![federation(Hex::new(5, 7)), klingon(Hex::new(15, 7))], vec![]);
            let mut log = EventLog::new(state.game.id());

            // Unknown ship beats authorization.
            let err = submit(&resolver, &mut state, &mut log, 9, Actor::Ai, vec![]).unwrap_err();
            assert_eq!(err, NotFoundError::Ship(ShipId::new(9)).into());

            // Authorization beats turn checks.
            let submission = MoveSubmission::new(state.game.id(), ShipId::new(1), Actor::Ai, 7, vec![]);
            let err = resolver
                .submit(&mut state, &OwnershipAuthorizer, submission, &mut log)
                .unwrap_err();
            assert!(matches!(err, EngineError::Authorization(_)));

            // Turn mismatch beats the lock.
            resolver.lock(&mut state, &mut log).unwrap();
            let submission = MoveSubmission::new(state.game.id(), ShipId::new(1), kirk(), 2, vec![]);
            let err = resolver
                .submit(&mut state, &OwnershipAuthorizer, submission, &mut log)
                .unwrap_err();
            assert_eq!(
                err,
                StateError::TurnMismatch {
                    expected: 1,
                    got: 2
                }
                .into()
            );

            let err = submit(&resolver, &mut state, &mut log, 1, kirk(), vec![]).unwrap_err();
            assert_eq!(err, StateError::GameLocked.into());
            assert!(state.moves.is_empty());
        }

        #[test]
        fn second_move_is_rejected_and_first_kept() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(vec![federation(Hex::new(5, 7))], vec![]);
            let mut log = EventLog::new(state.game.id());

            let first = submit(&resolver, &mut state, &mut log, 1, kirk(), vec![Action::RaiseShields]).unwrap();
            let err = submit(&resolver, &mut state, &mut log, 1, kirk(), vec![Action::Hold]).unwrap_err();
            assert_eq!(
                err,
                StateError::DuplicateMove {
                    ship: ShipId::new(1),
                    turn: 1
                }
                .into()
            );
            assert_eq!(state.moves.len(), 1);
            assert_eq!(state.get_move(first).unwrap().actions(), &[Action::RaiseShields]);
            assert_eq!(log.of_kind("move_submitted").count(), 1);
        }

        #[test]
        fn withdrawn_move_frees_the_slot() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(vec![federation(Hex::new(5, 7))], vec![]);
            let mut log = EventLog::new(state.game.id());

            let first = submit(&resolver, &mut state, &mut log, 1, kirk(), vec![Action::RaiseShields]).unwrap();
            resolver
                .withdraw(&mut state, &OwnershipAuthorizer, &kirk(), first, &mut log)
                .unwrap();
            assert_eq!(state.get_move(first).unwrap().status(), MoveStatus::Invalid);
            submit(&resolver, &mut state, &mut log, 1, kirk(), vec![Action::Hold]).unwrap();
            assert_eq!(log.of_kind("move_invalidated").count(), 1);
        }

        #[test]
        fn withdrawing_twice_reports_the_move_as_closed() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(vec![federation(Hex::new(5, 7))], vec![]);
            let mut log = EventLog::new(state.game.id());

            let queued = submit(&resolver, &mut state, &mut log, 1, kirk(), vec![Action::Hold]).unwrap();
            resolver
                .withdraw(&mut state, &OwnershipAuthorizer, &kirk(), queued, &mut log)
                .unwrap();
            let err = resolver
                .withdraw(&mut state, &OwnershipAuthorizer, &kirk(), queued, &mut log)
                .unwrap_err();
            assert_eq!(err, StateError::MoveNotPending(queued).into());
            assert_eq!(log.of_kind("move_invalidated").count(), 1);
        }

        #[test]
        fn malformed_actions_are_rejected() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(
                vec![federation(Hex::new(5, 7)).weapon(phaser()), klingon(Hex::new(15, 7))],
                vec![],
            );
            let mut log = EventLog::new(state.game.id());
            let cases = [
                (vec![Action::Move { to: Hex::new(5, 10) }], "exceeds speed"),
                (vec![Action::Move { to: Hex::new(-1, 7) }], "outside the map"),
                (vec![Action::fire("torpedo", ShipId::new(2))], "unknown weapon"),
                (vec![Action::fire("phaser", ShipId::new(1))], "cannot target itself"),
                (vec![Action::fire("phaser", ShipId::new(8))], "unknown target"),
                (vec![Action::Rotate { facing: 6 }], "not in 0..=5"),
                (vec![Action::RaiseShields, Action::RaiseShields], "more than once"),
            ];
            for (actions, message) in cases {
                let err = submit(&resolver, &mut state, &mut log, 1, kirk(), actions).unwrap_err();
                assert!(err.to_string().contains(message), "{err} lacks {message}");
            }
            assert!(state.moves.is_empty());
            assert!(log.is_empty());
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn fire_uses_pre_movement_positions() {
            let resolver = ActionResolver::default();
            // Klingon starts in phaser range, then flees out of it this turn.
            let mut state = battle_state(
                vec![
                    federation(Hex::new(5, 7)).facing(Direction::South).weapon(phaser()),
                    klingon(Hex::new(5, 9)).speed(3),
                ],
                vec![],
            );
            let mut log = EventLog::new(state.game.id());
            submit(&resolver, &mut state, &mut log, 1, kirk(), vec![Action::fire("phaser", ShipId::new(2))]).unwrap();
            submit(&resolver, &mut state, &mut log, 2, Actor::Ai, vec![Action::Move { to: Hex::new(5, 12) }]).unwrap();

            resolver.resolve(&mut state, &mut log).unwrap();
            assert_eq!(state.ships.get(ShipId::new(2)).unwrap().position(), Hex::new(5, 12));
            assert_eq!(log.of_kind("weapon_fired").count(), 1);
            assert!(state.ships.get(ShipId::new(2)).unwrap().shields() < 60);
        }

        #[test]
        fn destroyed_target_degrades_later_shots() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(
                vec![
                    federation(Hex::new(5, 7)).facing(Direction::South).weapon(torpedo()),
                    federation(Hex::new(6, 7)).facing(Direction::South).weapon(torpedo()),
                    klingon(Hex::new(5, 9)).hull(5, 95).shields(0, 60),
                ],
                vec![],
            );
            let mut log = EventLog::new(state.game.id());
            for ship in [1, 2] {
                submit(&resolver, &mut state, &mut log, ship, kirk(), vec![Action::fire("torpedo", ShipId::new(3))]).unwrap();
            }

            let summary = resolver.resolve(&mut state, &mut log).unwrap();
            assert_eq!(summary.skipped, 1);
            assert_eq!(state.ships.get(ShipId::new(3)).unwrap().status(), ShipStatus::Destroyed);
            assert_eq!(log.of_kind("action_skipped").count(), 1);
            assert!(matches!(
                summary.outcome,
                Some(Outcome::Victory { reason: EndReason::LastTeamStanding, .. })
            ));
            assert_eq!(log.of_kind("game_over").count(), 1);
        }

        #[test]
        fn occupied_destination_is_skipped() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(
                vec![federation(Hex::new(5, 7)), klingon(Hex::new(7, 7))],
                vec![],
            );
            let mut log = EventLog::new(state.game.id());
            // Ship 1 moves first (lower id) and takes the cell ship 2 wanted.
            submit(&resolver, &mut state, &mut log, 1, kirk(), vec![Action::Move { to: Hex::new(6, 7) }]).unwrap();
            submit(&resolver, &mut state, &mut log, 2, Actor::Ai, vec![Action::Move { to: Hex::new(6, 7) }]).unwrap();

            resolver.resolve(&mut state, &mut log).unwrap();
            assert_eq!(state.ships.get(ShipId::new(1)).unwrap().position(), Hex::new(6, 7));
            assert_eq!(state.ships.get(ShipId::new(2)).unwrap().position(), Hex::new(7, 7));
            assert_eq!(log.of_kind("action_skipped").count(), 1);
        }

        #[test]
        fn status_actions_apply_last_and_turn_advances() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(
                vec![federation(Hex::new(5, 7)).shields(40, 80), klingon(Hex::new(15, 7))],
                vec![],
            );
            let mut log = EventLog::new(state.game.id());
            submit(
                &resolver,
                &mut state,
                &mut log,
                1,
                kirk(),
                vec![Action::RaiseShields, Action::Rotate { facing: 2 }, Action::Move { to: Hex::new(6, 7) }],
            )
            .unwrap();

            resolver.resolve(&mut state, &mut log).unwrap();
            let kinds: Vec<&str> = log.iter().map(|e| e.kind.name()).collect();
            assert_eq!(
                kinds,
                vec![
                    "move_submitted",
                    "turn_locked",
                    "ship_moved",
                    "shields_raised",
                    "ship_rotated",
                    "turn_advanced"
                ]
            );
            let ship = state.ships.get(ShipId::new(1)).unwrap();
            assert_eq!(ship.shields(), 60);
            assert_eq!(ship.facing(), Direction::SouthEast);
            assert_eq!(state.game.current_turn(), 2);
            assert_eq!(state.game.phase(), Phase::Movement);
            assert!(!state.game.is_locked());
        }

        #[test]
        fn reaching_victory_points_wins() {
            let resolver = ActionResolver::new(EngineConfig::default().with_victory_points(5));
            let mut state = battle_state(
                vec![federation(Hex::new(7, 7)), klingon(Hex::new(15, 7))],
                vec![ObjectiveSpec::capture_point(Hex::new(7, 7), 1, 5)],
            );
            let mut log = EventLog::new(state.game.id());
            let summary = resolver.resolve(&mut state, &mut log).unwrap();
            assert_eq!(
                summary.outcome,
                Some(Outcome::Victory {
                    team: Team::from("federation"),
                    reason: EndReason::VictoryPoints
                })
            );
            assert_eq!(log.of_kind("turn_advanced").count(), 0);
            assert_eq!(state.game.current_turn(), 1);
        }

        #[test]
        fn tied_victory_points_draw() {
            let resolver = ActionResolver::new(EngineConfig::default().with_victory_points(5));
            let mut state = battle_state(
                vec![federation(Hex::new(3, 3)), klingon(Hex::new(15, 10))],
                vec![
                    ObjectiveSpec::capture_point(Hex::new(3, 3), 1, 5),
                    ObjectiveSpec::capture_point(Hex::new(15, 10), 1, 5),
                ],
            );
            let mut log = EventLog::new(state.game.id());
            let summary = resolver.resolve(&mut state, &mut log).unwrap();
            assert_eq!(
                summary.outcome,
                Some(Outcome::Draw {
                    reason: EndReason::VictoryPoints
                })
            );
        }

        #[test]
        fn simultaneous_kills_are_mutual_destruction() {
            let resolver = ActionResolver::default();
            let mut state = battle_state(
                vec![
                    federation(Hex::new(5, 7))
                        .facing(Direction::South)
                        .hull(25, 100)
                        .shields(0, 80)
                        .weapon(torpedo()),
                    klingon(Hex::new(5, 9))
                        .facing(Direction::North)
                        .hull(25, 95)
                        .shields(0, 60)
                        .weapon(torpedo()),
                ],
                vec![],
            );
            let mut log = EventLog::new(state.game.id());
            submit(&resolver, &mut state, &mut log, 1, kirk(), vec![Action::fire("torpedo", ShipId::new(2))]).unwrap();
            submit(&resolver, &mut state, &mut log, 2, Actor::Ai, vec![Action::fire("torpedo", ShipId::new(1))]).unwrap();

            let summary = resolver.resolve(&mut state, &mut log).unwrap();
            assert_eq!(log.of_kind("weapon_fired").count(), 2);
            assert!(state.ships.iter().all(Ship::is_destroyed));
            assert_eq!(
                summary.outcome,
                Some(Outcome::Draw {
                    reason: EndReason::MutualDestruction
                })
            );
        }

        #[test]
        fn each_weapon_rolls_its_own_damage() {
            let (game, ship) = (GameId::new(1), ShipId::new(1));
            assert_eq!(
                damage_seed(7, game, 3, ship, "phaser"),
                damage_seed(7, game, 3, ship, "phaser")
            );
            assert_ne!(
                damage_seed(7, game, 3, ship, "phaser"),
                damage_seed(7, game, 3, ship, "torpedo")
            );
        }

        #[test]
        fn turn_limit_ends_in_draw_without_scores() {
            let resolver = ActionResolver::new(EngineConfig::default().with_max_turns(1));
            let mut state = battle_state(vec![federation(Hex::new(5, 7)), klingon(Hex::new(15, 7))], vec![]);
            let mut log = EventLog::new(state.game.id());
            let summary = resolver.resolve(&mut state, &mut log).unwrap();
            assert_eq!(
                summary.outcome,
                Some(Outcome::Draw {
                    reason: EndReason::TurnLimit
                })
            );
            assert!(state.game.is_over());
            let err = submit(&resolver, &mut state, &mut log, 1, kirk(), vec![]).unwrap_err();
            assert_eq!(err, StateError::GameOver.into());
            assert_eq!(
                resolver.resolve(&mut state, &mut log).unwrap_err(),
                StateError::GameOver.into()
            );
            assert_eq!(state.game.current_turn(), 1);
        }
    }
}
