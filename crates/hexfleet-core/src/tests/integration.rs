//! End-to-end flows through the manager.

use hexgrid::{Direction, Hex, MapSize};
use std::sync::Arc;

use super::helpers::{federation, klingon, phaser, started_game, torpedo};
use crate::action::{Action, Actor, Move, MoveStatus, MoveSubmission};
use crate::ai::Difficulty;
use crate::auth::Authorizer;
use crate::entity::{
    Controller, GameId, MoveId, ObjectiveSpec, Phase, PlayerId, Ship, ShipId, ShipSpec,
};
use crate::error::{EngineError, NotFoundError, StateError};
use crate::manager::{GameRecord, GameSetup, GameStateManager};
use crate::EngineConfig;

fn kirk() -> Actor {
    Actor::Player(PlayerId::from("kirk"))
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn creation_records_setup_events() {
        let manager = GameStateManager::default();
        let created = manager
            .create_game(GameSetup {
                map: MapSize::new(20, 15).unwrap(),
                ships: vec![federation(Hex::new(5, 7)), klingon(Hex::new(15, 7))],
                objectives: vec![ObjectiveSpec::capture_point(Hex::new(10, 7), 1, 5)],
            })
            .unwrap();

        let names: Vec<&str> = manager
            .events(created.game_id)
            .unwrap()
            .iter()
            .map(|e| e.kind.name())
            .collect();
        assert_eq!(
            names,
            vec!["game_created", "ship_created", "ship_created", "objective_created"]
        );
        let snapshot = manager.snapshot(created.game_id).unwrap();
        assert_eq!(snapshot.game.phase(), Phase::Setup);
        assert_eq!(snapshot.game.teams().len(), 2);
    }

    #[test]
    fn invalid_setup_stores_nothing() {
        let manager = GameStateManager::default();
        let err = manager
            .create_game(GameSetup {
                map: MapSize::new(20, 15).unwrap(),
                ships: vec![federation(Hex::new(5, 7)), klingon(Hex::new(40, 7))],
                objectives: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(manager.game_ids().is_empty());
    }

    #[test]
    fn orders_wait_for_battle_start() {
        let manager = GameStateManager::default();
        let created = manager
            .create_game(GameSetup {
                map: MapSize::new(20, 15).unwrap(),
                ships: vec![federation(Hex::new(5, 7))],
                objectives: vec![],
            })
            .unwrap();
        let game = created.game_id;
        let submission = MoveSubmission::new(game, created.ships[0], kirk(), 1, vec![]);
        assert!(matches!(
            manager.submit_move(submission.clone()),
            Err(EngineError::State(StateError::PhaseMismatch { .. }))
        ));

        manager.begin_battle(game).unwrap();
        assert!(manager.begin_battle(game).is_err());
        manager.submit_move(submission).unwrap();
    }

    #[test]
    fn unknown_game_is_not_found() {
        let manager = GameStateManager::default();
        let missing = GameId::new(77);
        assert_eq!(
            manager.resolve_turn(missing).unwrap_err(),
            NotFoundError::Game(missing).into()
        );
    }

    #[test]
    fn lock_blocks_submissions_until_resolved() {
        let manager = GameStateManager::default();
        let created = started_game(&manager, vec![federation(Hex::new(5, 7)), klingon(Hex::new(15, 7))], vec![]);
        let game = created.game_id;

        manager.lock_turn(game).unwrap();
        assert_eq!(manager.lock_turn(game).unwrap_err(), StateError::GameLocked.into());
        let err = manager
            .submit_move(MoveSubmission::new(game, created.ships[0], kirk(), 1, vec![]))
            .unwrap_err();
        assert_eq!(err, StateError::GameLocked.into());

        let report = manager.resolve_turn(game).unwrap();
        assert_eq!(report.summary.turn, 1);
        let snapshot = manager.snapshot(game).unwrap();
        assert_eq!(snapshot.game.current_turn(), 2);
        assert!(!snapshot.game.is_locked());
        manager
            .submit_move(MoveSubmission::new(game, created.ships[0], kirk(), 2, vec![]))
            .unwrap();
    }

    #[test]
    fn withdraw_then_resubmit() {
        let manager = GameStateManager::default();
        let created = started_game(&manager, vec![federation(Hex::new(5, 7))], vec![]);
        let game = created.game_id;
        let first = manager
            .submit_move(MoveSubmission::new(game, created.ships[0], kirk(), 1, vec![Action::RaiseShields]))
            .unwrap();
        manager.withdraw_move(game, &kirk(), first).unwrap();
        let second = manager
            .submit_move(MoveSubmission::new(game, created.ships[0], kirk(), 1, vec![Action::Hold]))
            .unwrap();
        let record = manager.export(game).unwrap();
        assert_eq!(record.state.moves()[&first].status(), MoveStatus::Invalid);
        assert_eq!(record.state.moves()[&second].status(), MoveStatus::Pending);
    }
}

mod atomicity_tests {
    use super::*;

    #[test]
    fn failed_resolution_leaves_no_trace() {
        let source = GameStateManager::default();
        let created = started_game(&source, vec![federation(Hex::new(5, 7)), klingon(Hex::new(15, 7))], vec![]);
        let mut record = source.export(created.game_id).unwrap();

        // A pending move for a ship the registry has never seen.
        let ghost = MoveId::new(99);
        record.state.moves.insert(
            ghost,
            Move {
                id: ghost,
                game_id: created.game_id,
                ship_id: ShipId::new(42),
                turn: 1,
                actor: Actor::Ai,
                actions: vec![Action::Move { to: Hex::new(1, 1) }],
                status: MoveStatus::Pending,
            },
        );
        let manager = GameStateManager::default();
        let game = manager.import(record).unwrap();
        let events_before = manager.events(game).unwrap();
        let snapshot_before = manager.snapshot(game).unwrap();

        let err = manager.resolve_turn(game).unwrap_err();
        assert!(matches!(err, EngineError::Inconsistent(_)));
        assert_eq!(manager.events(game).unwrap(), events_before);
        assert_eq!(manager.snapshot(game).unwrap(), snapshot_before);
        assert!(!snapshot_before.game.is_locked());
    }
}

mod ai_tests {
    use super::*;

    #[test]
    fn ai_failure_is_fail_soft() {
        let manager = GameStateManager::default();
        let created = started_game(&manager, vec![federation(Hex::new(5, 7)), klingon(Hex::new(15, 7))], vec![]);
        let game = created.game_id;

        // The Federation ship is player-controlled.
        assert_eq!(manager.generate_ai_move(game, created.ships[0]).unwrap(), None);
        let failures = manager
            .events(game)
            .unwrap()
            .iter()
            .filter(|e| e.kind.name() == "ai_move_failed")
            .count();
        assert_eq!(failures, 1);
        assert!(manager.resolve_turn(game).is_ok());
    }

    #[test]
    fn batch_skips_ships_with_moves_and_reports_failures() {
        let manager = GameStateManager::default();
        let created = started_game(
            &manager,
            vec![
                federation(Hex::new(5, 7)),
                klingon(Hex::new(15, 7)),
                klingon(Hex::new(15, 9)),
            ],
            vec![],
        );
        let game = created.game_id;
        manager
            .submit_move(MoveSubmission::new(game, created.ships[1], Actor::Ai, 1, vec![Action::Hold]))
            .unwrap();

        let report = manager.generate_ai_moves(game).unwrap();
        assert_eq!(report.submitted.len(), 1);
        assert_eq!(report.submitted[0].0, created.ships[2]);
        assert!(report.failed.is_empty());

        manager.resolve_turn(game).unwrap();
        manager.lock_turn(game).unwrap();
        let report = manager.generate_ai_moves(game).unwrap();
        assert!(report.submitted.is_empty());
        assert_eq!(report.failed, vec![created.ships[1], created.ships[2]]);
        // Locked turn still resolves; failed ships simply hold.
        manager.resolve_turn(game).unwrap();
    }

    #[test]
    fn full_ai_battle_reaches_an_outcome() {
        let manager = GameStateManager::new(EngineConfig::default().with_seed(3).with_max_turns(30));
        let created = started_game(
            &manager,
            vec![
                ShipSpec::new("USS Reliant", "federation", Controller::Ai(Difficulty::Medium), Hex::new(4, 7))
                    .facing(Direction::SouthEast)
                    .weapon(phaser())
                    .weapon(torpedo()),
                klingon(Hex::new(14, 7)).weapon(phaser()),
            ],
            vec![],
        );
        let game = created.game_id;
        let mut outcome = None;
        for _ in 0..30 {
            manager.generate_ai_moves(game).unwrap();
            outcome = manager.resolve_turn(game).unwrap().summary.outcome;
            if outcome.is_some() {
                break;
            }
        }
        assert!(outcome.is_some());
        assert!(manager.snapshot(game).unwrap().game.is_over());
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn replay_matches_live_state() {
        let manager = GameStateManager::new(EngineConfig::default().with_seed(9));
        let created = started_game(
            &manager,
            vec![
                federation(Hex::new(5, 7)).weapon(phaser()).weapon(torpedo()),
                klingon(Hex::new(9, 7)).weapon(phaser()).weapon(torpedo()),
            ],
            vec![
                ObjectiveSpec::capture_point(Hex::new(7, 7), 2, 4),
                ObjectiveSpec::artifact(Hex::new(5, 9), 10),
            ],
        );
        let game = created.game_id;
        for turn in 1..=4 {
            let _ = manager.submit_move(MoveSubmission::new(
                game,
                created.ships[0],
                kirk(),
                turn,
                vec![
                    Action::fire("phaser", created.ships[1]),
                    Action::Rotate { facing: u8::try_from(turn % 6).unwrap() },
                ],
            ));
            manager.generate_ai_moves(game).unwrap();
            if manager.resolve_turn(game).unwrap().summary.outcome.is_some() {
                break;
            }
        }

        let live = manager.snapshot(game).unwrap();
        let replayed = manager.replay(game).unwrap();
        assert_eq!(replayed.ships, live.ships);
        assert_eq!(replayed.objectives, live.objectives);
        assert_eq!(replayed.scores, live.scores);
        assert_eq!(replayed.outcome.as_ref(), live.game.outcome());
    }

    #[test]
    fn export_import_round_trips_through_json() {
        let source = GameStateManager::default();
        let created = started_game(&source, vec![federation(Hex::new(5, 7)), klingon(Hex::new(15, 7))], vec![]);
        source
            .submit_move(MoveSubmission::new(created.game_id, created.ships[0], kirk(), 1, vec![Action::RaiseShields]))
            .unwrap();
        source.resolve_turn(created.game_id).unwrap();

        let json = serde_json::to_string(&source.export(created.game_id).unwrap()).unwrap();
        let record: GameRecord = serde_json::from_str(&json).unwrap();

        let target = GameStateManager::default();
        let game = target.import(record.clone()).unwrap();
        assert_eq!(game, created.game_id);
        assert_eq!(target.snapshot(game).unwrap(), source.snapshot(game).unwrap());
        assert_eq!(target.events(game).unwrap(), source.events(game).unwrap());
        assert_eq!(
            target.import(record).unwrap_err(),
            StateError::GameExists(game).into()
        );

        // New games never reuse an imported id.
        let next = started_game(&target, vec![federation(Hex::new(1, 1))], vec![]);
        assert!(next.game_id > game);
    }

    #[test]
    fn import_rejects_exhausted_game_id() {
        let source = GameStateManager::default();
        let created = started_game(&source, vec![federation(Hex::new(5, 7))], vec![]);
        let mut record = source.export(created.game_id).unwrap();
        record.state.game.id = GameId::new(u64::MAX);

        let target = GameStateManager::default();
        let err = target.import(record).unwrap_err();
        assert!(matches!(&err, EngineError::Inconsistent(msg) if msg.contains("successor")), "{err}");
        assert!(target.game_ids().is_empty());
    }

    #[test]
    fn events_since_returns_tail() {
        let manager = GameStateManager::default();
        let created = started_game(&manager, vec![federation(Hex::new(5, 7))], vec![]);
        let all = manager.events(created.game_id).unwrap();
        let last = all.last().unwrap().seq;
        manager.resolve_turn(created.game_id).unwrap();
        let tail = manager.events_since(created.game_id, last).unwrap();
        assert!(tail.iter().all(|e| e.seq > last));
        assert_eq!(tail.first().unwrap().kind.name(), "turn_locked");
    }
}

mod isolation_tests {
    use super::*;

    struct Nobody;

    impl Authorizer for Nobody {
        fn can_command(&self, _actor: &Actor, _ship: &Ship) -> bool {
            false
        }
    }

    #[test]
    fn custom_authorizer_is_consulted() {
        let manager = GameStateManager::with_authorizer(EngineConfig::default(), Arc::new(Nobody));
        let created = started_game(&manager, vec![federation(Hex::new(5, 7))], vec![]);
        let err = manager
            .submit_move(MoveSubmission::new(created.game_id, created.ships[0], kirk(), 1, vec![]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Authorization(_)));
    }

    #[test]
    fn games_resolve_concurrently() {
        let manager = GameStateManager::default();
        let games: Vec<_> = (0..4)
            .map(|_| {
                started_game(&manager, vec![federation(Hex::new(5, 7)), klingon(Hex::new(15, 7))], vec![])
                    .game_id
            })
            .collect();

        std::thread::scope(|scope| {
            for &game in &games {
                let manager = &manager;
                scope.spawn(move || {
                    for _ in 0..5 {
                        manager.generate_ai_moves(game).unwrap();
                        manager.resolve_turn(game).unwrap();
                    }
                });
            }
        });

        for game in games {
            assert_eq!(manager.snapshot(game).unwrap().game.current_turn(), 6);
        }
    }
}
