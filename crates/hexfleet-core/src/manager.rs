//! Top-level orchestration: the arena of independently locked games.
//!
//! [`GameStateManager`] keeps every game behind its own `Mutex`, so work on
//! one game never waits on another. The map of games itself sits behind an
//! `RwLock` that is only write-locked to add a game.
//!
//! # Atomic resolution
//!
//! [`GameStateManager::resolve_turn`] resolves into a copy of the game's
//! state and a staging [`Journal`](crate::event::Journal). Only when the
//! whole turn has resolved are the copy swapped in and the journal committed,
//! so a failure leaves both state and history exactly as they were.
//!
//! # AI generation
//!
//! AI decisions are computed from a snapshot taken under the game lock, with
//! the lock released while strategies run. The resulting moves are then
//! submitted like any other actor's. A failure for one ship is recorded as
//! `ai_move_failed` and never affects other ships.

use hexgrid::MapSize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, info_span, warn};

use crate::action::{Action, Actor, MoveSubmission};
use crate::ai::{derive_seed, strategy_for};
use crate::auth::{Authorizer, OwnershipAuthorizer};
use crate::config::EngineConfig;
use crate::entity::{
    Controller, Game, GameId, MoveId, ObjectiveId, ObjectiveSpec, Phase, ShipId, ShipSpec,
};
use crate::error::{successor_id, AiError, EngineError, NotFoundError, Result, StateError};
use crate::event::{Event, EventKind, EventLog, ReplayedGame};
use crate::registry::{ShipFilter, ShipRegistry};
use crate::resolver::{ActionResolver, BattleState, ResolutionSummary};
use crate::tracker::ObjectiveTracker;
use crate::view::GameSnapshot;

// =============================================================================
// Request / response types
// =============================================================================

/// Input for [`GameStateManager::create_game`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSetup {
    /// Map bounds
    pub map: MapSize,
    /// Initial ships of every team
    #[serde(default)]
    pub ships: Vec<ShipSpec>,
    /// Map objectives
    #[serde(default)]
    pub objectives: Vec<ObjectiveSpec>,
}

/// Ids assigned by [`GameStateManager::create_game`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedGame {
    /// New game
    pub game_id: GameId,
    /// Ships, in the order of the setup's specs
    pub ships: Vec<ShipId>,
    /// Objectives, in the order of the setup's specs
    pub objectives: Vec<ObjectiveId>,
}

/// Result of [`GameStateManager::resolve_turn`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Game
    pub game_id: GameId,
    /// Counts and outcome
    pub summary: ResolutionSummary,
    /// Events recorded by this resolution
    pub events: Vec<Event>,
}

/// Result of [`GameStateManager::generate_ai_moves`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiBatchReport {
    /// Ships whose generated move was queued
    pub submitted: Vec<(ShipId, MoveId)>,
    /// Ships whose generation failed; they hold this turn
    pub failed: Vec<ShipId>,
}

/// Complete persisted form of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Entity state
    pub state: BattleState,
    /// Full event history
    pub events: Vec<Event>,
}

// =============================================================================
// GameStateManager
// =============================================================================

#[derive(Debug)]
struct GameInstance {
    state: BattleState,
    log: EventLog,
}

type GameHandle = Arc<Mutex<GameInstance>>;

fn lock(handle: &GameHandle) -> MutexGuard<'_, GameInstance> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Arena of games, each serialized behind its own lock.
pub struct GameStateManager {
    resolver: ActionResolver,
    authorizer: Arc<dyn Authorizer>,
    games: RwLock<BTreeMap<GameId, GameHandle>>,
    next_game_id: AtomicU64,
}

impl std::fmt::Debug for GameStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStateManager")
            .field("config", self.resolver.config())
            .field("games", &self.game_ids().len())
            .finish_non_exhaustive()
    }
}

impl Default for GameStateManager {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GameStateManager {
    /// Creates a manager using [`OwnershipAuthorizer`].
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_authorizer(config, Arc::new(OwnershipAuthorizer))
    }

    /// Creates a manager with a custom authorization policy.
    #[must_use]
    pub fn with_authorizer(config: EngineConfig, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            resolver: ActionResolver::new(config),
            authorizer,
            games: RwLock::new(BTreeMap::new()),
            next_game_id: AtomicU64::new(1),
        }
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        self.resolver.config()
    }

    /// Ids of all loaded games.
    #[must_use]
    pub fn game_ids(&self) -> Vec<GameId> {
        self.games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    fn handle(&self, id: GameId) -> Result<GameHandle> {
        self.games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| NotFoundError::Game(id).into())
    }

    /// Sets up a game with its initial ships and objectives.
    ///
    /// The game starts on turn 1 in the `setup` phase. Nothing is stored if
    /// any spec is invalid.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`](crate::error::ValidationError) of the
    /// first invalid ship or objective spec.
    pub fn create_game(&self, setup: GameSetup) -> Result<CreatedGame> {
        let game_id = GameId::new(self.next_game_id.fetch_add(1, Ordering::Relaxed));
        let config = self.resolver.config();

        let mut ships = ShipRegistry::new(game_id, setup.map, config.disable_threshold);
        let ship_ids = setup
            .ships
            .into_iter()
            .map(|spec| ships.create(spec))
            .collect::<Result<Vec<_>>>()?;
        let mut objectives = ObjectiveTracker::new(game_id, setup.map);
        let objective_ids = setup
            .objectives
            .into_iter()
            .map(|spec| objectives.create(spec))
            .collect::<Result<Vec<_>>>()?;

        let teams: BTreeSet<_> = ships.iter().map(|ship| ship.team().clone()).collect();
        let game = Game::new(game_id, setup.map, teams.into_iter().collect());

        let mut log = EventLog::new(game_id);
        log.record(
            game.current_turn,
            EventKind::GameCreated {
                map: setup.map,
                teams: game.teams.clone(),
            },
        );
        for ship in ships.iter() {
            log.record(game.current_turn, EventKind::ShipCreated { ship: ship.clone() });
        }
        for objective in objectives.iter() {
            log.record(
                game.current_turn,
                EventKind::ObjectiveCreated {
                    objective: objective.clone(),
                },
            );
        }

        info!(
            game = %game_id,
            ships = ship_ids.len(),
            objectives = objective_ids.len(),
            "game created"
        );
        let instance = GameInstance {
            state: BattleState::new(game, ships, objectives),
            log,
        };
        self.games
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(game_id, Arc::new(Mutex::new(instance)));

        Ok(CreatedGame {
            game_id,
            ships: ship_ids,
            objectives: objective_ids,
        })
    }

    /// Leaves setup and opens turn 1 for orders.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError::Game`] if the game does not exist
    /// - [`StateError::PhaseMismatch`] if the battle has already started
    pub fn begin_battle(&self, game_id: GameId) -> Result<()> {
        let handle = self.handle(game_id)?;
        let mut instance = lock(&handle);
        let game = &mut instance.state.game;
        if game.phase != Phase::Setup {
            return Err(StateError::PhaseMismatch {
                expected: Phase::Setup,
                actual: game.phase,
            }
            .into());
        }
        game.phase = game.phase.next();
        let turn = game.current_turn;
        instance.log.record(turn, EventKind::BattleStarted);
        info!(game = %game_id, "battle started");
        Ok(())
    }

    /// Validates and queues a move.
    ///
    /// # Errors
    ///
    /// Propagates every rejection from [`ActionResolver::submit`] unchanged,
    /// plus [`NotFoundError::Game`] for an unknown game.
    pub fn submit_move(&self, submission: MoveSubmission) -> Result<MoveId> {
        let handle = self.handle(submission.game_id)?;
        let mut instance = lock(&handle);
        let GameInstance { state, log } = &mut *instance;
        self.resolver
            .submit(state, self.authorizer.as_ref(), submission, log)
    }

    /// Withdraws a pending move.
    ///
    /// # Errors
    ///
    /// See [`ActionResolver::withdraw`].
    pub fn withdraw_move(&self, game_id: GameId, actor: &Actor, move_id: MoveId) -> Result<()> {
        let handle = self.handle(game_id)?;
        let mut instance = lock(&handle);
        let GameInstance { state, log } = &mut *instance;
        self.resolver
            .withdraw(state, self.authorizer.as_ref(), actor, move_id, log)
    }

    /// Closes submissions for the current turn.
    ///
    /// # Errors
    ///
    /// See [`ActionResolver::lock`].
    pub fn lock_turn(&self, game_id: GameId) -> Result<()> {
        let handle = self.handle(game_id)?;
        let mut instance = lock(&handle);
        let GameInstance { state, log } = &mut *instance;
        self.resolver.lock(state, log)?;
        debug!(game = %game_id, turn = state.game.current_turn, "turn locked");
        Ok(())
    }

    /// Resolves the current turn as one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Game`], or any error from
    /// [`ActionResolver::resolve`]; on error the game is unchanged.
    pub fn resolve_turn(&self, game_id: GameId) -> Result<TurnReport> {
        let handle = self.handle(game_id)?;
        let mut instance = lock(&handle);
        let turn = instance.state.game.current_turn;
        let _span = info_span!("resolve_turn", game = %game_id, turn).entered();

        let mut next = instance.state.clone();
        let mut journal = instance.log.journal();
        let summary = self.resolver.resolve(&mut next, &mut journal)?;

        let events = journal.events().to_vec();
        instance.log.commit(journal)?;
        instance.state = next;

        info!(
            applied = summary.applied,
            skipped = summary.skipped,
            events = events.len(),
            "turn resolved"
        );
        if let Some(outcome) = &summary.outcome {
            info!(?outcome, "game over");
        }
        Ok(TurnReport {
            game_id,
            summary,
            events,
        })
    }

    /// Runs the AI for one ship and queues the result.
    ///
    /// Returns `Ok(None)` when generation failed; the failure is recorded as
    /// `ai_move_failed` and the ship holds this turn.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if the game or ship does not exist.
    pub fn generate_ai_move(&self, game_id: GameId, ship_id: ShipId) -> Result<Option<MoveId>> {
        let handle = self.handle(game_id)?;
        let snapshot = {
            let instance = lock(&handle);
            instance.state.ships.get(ship_id)?;
            instance.state.snapshot()
        };
        let decision = self.decide(&snapshot, ship_id);

        let mut instance = lock(&handle);
        Ok(self.submit_decision(&mut instance, &snapshot, ship_id, decision))
    }

    /// Runs the AI for every AI-controlled ship that has no move yet.
    ///
    /// Strategies run in parallel against one snapshot; moves are then queued
    /// in ascending ship id order.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Game`] if the game does not exist.
    pub fn generate_ai_moves(&self, game_id: GameId) -> Result<AiBatchReport> {
        let handle = self.handle(game_id)?;
        let (snapshot, candidates) = {
            let instance = lock(&handle);
            let state = &instance.state;
            let turn = state.game.current_turn;
            let candidates: Vec<ShipId> = state
                .ships
                .list(&ShipFilter::in_play().ai_only())
                .into_iter()
                .filter(|ship| state.live_move(ship.id(), turn).is_none())
                .map(|ship| ship.id())
                .collect();
            (state.snapshot(), candidates)
        };

        let decisions: Vec<(ShipId, std::result::Result<Vec<Action>, AiError>)> = candidates
            .par_iter()
            .map(|&ship| (ship, self.decide(&snapshot, ship)))
            .collect();

        let mut instance = lock(&handle);
        let mut report = AiBatchReport::default();
        for (ship, decision) in decisions {
            match self.submit_decision(&mut instance, &snapshot, ship, decision) {
                Some(move_id) => report.submitted.push((ship, move_id)),
                None => report.failed.push(ship),
            }
        }
        debug!(
            game = %game_id,
            submitted = report.submitted.len(),
            failed = report.failed.len(),
            "ai moves generated"
        );
        Ok(report)
    }

    fn decide(
        &self,
        snapshot: &GameSnapshot,
        ship_id: ShipId,
    ) -> std::result::Result<Vec<Action>, AiError> {
        let ship = snapshot.ship(ship_id).ok_or(AiError::ShipMissing(ship_id))?;
        let Controller::Ai(difficulty) = ship.controller() else {
            return Err(AiError::NotAiControlled(ship_id));
        };
        let seed = derive_seed(
            self.resolver.config().ai_seed,
            snapshot.game.id(),
            snapshot.game.current_turn(),
            ship_id,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        strategy_for(*difficulty).decide(ship, snapshot, &mut rng)
    }

    fn submit_decision(
        &self,
        instance: &mut GameInstance,
        snapshot: &GameSnapshot,
        ship_id: ShipId,
        decision: std::result::Result<Vec<Action>, AiError>,
    ) -> Option<MoveId> {
        let GameInstance { state, log } = instance;
        let outcome = decision.and_then(|actions| {
            let submission = MoveSubmission::new(
                snapshot.game.id(),
                ship_id,
                Actor::Ai,
                snapshot.game.current_turn(),
                actions,
            );
            self.resolver
                .submit(&mut *state, self.authorizer.as_ref(), submission, &mut *log)
                .map_err(|err| AiError::Rejected(Box::new(err)))
        });
        match outcome {
            Ok(move_id) => Some(move_id),
            Err(err) => {
                warn!(game = %snapshot.game.id(), ship = %ship_id, error = %err, "ai move failed");
                log.record(
                    state.game.current_turn,
                    EventKind::AiMoveFailed {
                        ship: ship_id,
                        reason: err.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Read-only copy of a game's state.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Game`] if the game does not exist.
    pub fn snapshot(&self, game_id: GameId) -> Result<GameSnapshot> {
        let handle = self.handle(game_id)?;
        let instance = lock(&handle);
        Ok(instance.state.snapshot())
    }

    /// The full event history of a game.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Game`] if the game does not exist.
    pub fn events(&self, game_id: GameId) -> Result<Vec<Event>> {
        self.events_since(game_id, 0)
    }

    /// Events with a sequence number greater than `seq`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Game`] if the game does not exist.
    pub fn events_since(&self, game_id: GameId, seq: u64) -> Result<Vec<Event>> {
        let handle = self.handle(game_id)?;
        let instance = lock(&handle);
        Ok(instance.log.since(seq).to_vec())
    }

    /// Rebuilds a game's state from its event history alone.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Game`], or [`EngineError::Inconsistent`] if
    /// the history does not replay.
    pub fn replay(&self, game_id: GameId) -> Result<ReplayedGame> {
        let handle = self.handle(game_id)?;
        let instance = lock(&handle);
        instance.log.replay()
    }

    /// Exports a game for durable storage.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Game`] if the game does not exist.
    pub fn export(&self, game_id: GameId) -> Result<GameRecord> {
        let handle = self.handle(game_id)?;
        let instance = lock(&handle);
        Ok(GameRecord {
            state: instance.state.clone(),
            events: instance.log.as_slice().to_vec(),
        })
    }

    /// Loads an exported game under its original id.
    ///
    /// # Errors
    ///
    /// - [`StateError::GameExists`] if that id is already loaded
    /// - [`ValidationError`](crate::error::ValidationError) if stored ships
    ///   or objectives break their invariants
    /// - [`EngineError::Inconsistent`] if the event history is out of sequence
    ///   or an id of `u64::MAX` leaves no room for later ids
    pub fn import(&self, record: GameRecord) -> Result<GameId> {
        let GameRecord { state, events } = record;
        let game_id = state.game.id;
        let map = state.game.map;
        let next_game_id = successor_id("game", game_id.as_u64())?;

        let ships = ShipRegistry::from_ships(
            game_id,
            map,
            self.resolver.config().disable_threshold,
            state.ships.iter().cloned(),
        )?;
        let objectives = ObjectiveTracker::from_parts(
            game_id,
            map,
            state.objectives.iter().cloned(),
            state.objectives.scores().clone(),
        )?;
        if state.moves.values().any(|m| m.game_id != game_id) {
            return Err(EngineError::Inconsistent(format!(
                "record for game {game_id} carries foreign moves"
            )));
        }
        let log = EventLog::from_events(game_id, events)?;
        let state = BattleState {
            ships,
            objectives,
            ..state
        };

        let mut games = self.games.write().unwrap_or_else(PoisonError::into_inner);
        if games.contains_key(&game_id) {
            return Err(StateError::GameExists(game_id).into());
        }
        games.insert(game_id, Arc::new(Mutex::new(GameInstance { state, log })));
        self.next_game_id.fetch_max(next_game_id, Ordering::Relaxed);
        info!(game = %game_id, "game imported");
        Ok(game_id)
    }
}
