//! Integration tests for the engine actor.
//!
//! Uses `start_paused = true`: Tokio auto-advances time whenever every
//! task is idle, so a one second `sleep` runs twenty server ticks
//! without waiting for them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use skirmish::prelude::*;
use tokio::time::sleep;

// =========================================================================
// Helpers
// =========================================================================

/// Announces every phase it enters and requests `next` after `after`
/// game ticks. Finishes the game from `Postgame`.
struct Phase {
    after: u64,
    next: Option<GameState>,
}

impl Phase {
    fn stay() -> Self {
        Self { after: 0, next: None }
    }

    fn then(after: u64, next: GameState) -> Self {
        Self {
            after,
            next: Some(next),
        }
    }
}

impl GameStateHandler for Phase {
    fn handle_setup(&mut self, ctx: &mut GameContext) {
        let text = format!("enter {}", ctx.state());
        ctx.broadcast_raw_message(text);
        if ctx.state() == GameState::Postgame {
            ctx.request_finish();
        }
    }

    fn handle_tick(&mut self, ctx: &mut GameContext, elapsed: u64) {
        if let Some(next) = self.next {
            if elapsed + 1 >= self.after {
                ctx.request_state(next);
            }
        }
    }

    fn handle_finish(&mut self, _ctx: &mut GameContext) {}
}

/// Cancels block breaks and records whether a quitting player was still a
/// member when the quit was delivered.
struct Guard {
    quits: Arc<Mutex<Vec<bool>>>,
}

impl GameEventHandler for Guard {
    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(OccurrenceKind::BlockBreak),
            Subscription::new(OccurrenceKind::PlayerQuit),
        ]
    }

    fn handle_event(&mut self, ctx: &mut GameContext, event: &mut Event) {
        match event.occurrence() {
            Occurrence::BlockBreak { .. } => event.cancel(),
            Occurrence::PlayerQuit { player } => {
                let member = ctx.is_in_game(*player);
                self.quits.lock().unwrap().push(member);
            }
            _ => {}
        }
    }
}

fn config(arenas: u32) -> EngineConfig {
    EngineConfig {
        clock: ClockConfig {
            initial_jitter_us: 0,
            ..ClockConfig::with_rate(20)
        },
        arenas: (1..=arenas)
            .map(|id| Arena::new(ArenaId(id), format!("arena-{id}"), WorldId(id)))
            .collect(),
        ..EngineConfig::default()
    }
}

fn every_tick() -> GameConfig {
    GameConfig {
        heartbeat_period: 1,
        heartbeat_delay: 1,
        ..GameConfig::default()
    }
}

/// A game that walks to `InGame` and stays there.
fn lasting(id: &str) -> GameBuilder {
    GameBuilder::new(id)
        .config(every_tick())
        .handler(GameState::Waiting, Phase::then(2, GameState::Starting))
        .handler(GameState::Starting, Phase::then(2, GameState::InGame))
        .handler(GameState::InGame, Phase::stay())
        .handler(GameState::Postgame, Phase::stay())
}

/// A game that plays straight through and finishes itself.
fn short(id: &str) -> GameBuilder {
    GameBuilder::new(id)
        .config(every_tick())
        .handler(GameState::Waiting, Phase::then(1, GameState::Starting))
        .handler(GameState::Starting, Phase::then(1, GameState::InGame))
        .handler(GameState::InGame, Phase::then(1, GameState::Postgame))
        .handler(GameState::Postgame, Phase::stay())
}

/// A game that never leaves `Waiting`.
fn idle(id: &str) -> GameBuilder {
    GameBuilder::new(id)
        .config(every_tick())
        .handler(GameState::Waiting, Phase::stay())
        .handler(GameState::Starting, Phase::stay())
        .handler(GameState::InGame, Phase::stay())
        .handler(GameState::Postgame, Phase::stay())
}

fn messages(rx: &mut skirmish::DeliveryReceiver) -> Vec<(GameId, String)> {
    let mut out = Vec::new();
    while let Ok((game, broadcast)) = rx.try_recv() {
        if let BroadcastKind::Message { text } = broadcast.kind {
            out.push((game, text));
        }
    }
    out
}

fn gid(id: &str) -> GameId {
    GameId::new(id)
}

// =========================================================================
// Games
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_game_reports_waiting_info() {
    let (engine, _rx) = Engine::spawn(config(1));

    let id = engine.create_game(idle("lobby")).await.unwrap();
    assert_eq!(id, gid("lobby"));

    let info = engine.info(id.clone()).await.unwrap().unwrap();
    assert_eq!(info.state, GameState::Waiting);
    assert_eq!(info.arena, ArenaId(1));
    assert_eq!(info.players, 0);
    assert_eq!(engine.free_games().await.unwrap(), vec![id]);
}

#[tokio::test(start_paused = true)]
async fn test_create_game_without_open_arena_fails() {
    let (engine, _rx) = Engine::spawn(config(1));
    engine.create_game(idle("a")).await.unwrap();

    let err = engine.create_game(idle("b")).await.unwrap_err();
    assert!(matches!(err, SkirmishError::Game(GameError::NoOpenArena)));

    engine
        .add_arena(Arena::new(ArenaId(2), "spare", WorldId(2)))
        .await
        .unwrap();
    assert_eq!(engine.create_game(idle("b")).await.unwrap(), gid("b"));
}

#[tokio::test(start_paused = true)]
async fn test_game_advances_on_server_ticks() {
    let (engine, mut rx) = Engine::spawn(config(1));
    let id = engine.create_game(lasting("duels")).await.unwrap();
    engine.join(id.clone(), Player::new(1, "Alice")).await.unwrap();

    sleep(Duration::from_secs(1)).await;

    let info = engine.info(id.clone()).await.unwrap().unwrap();
    assert_eq!(info.state, GameState::InGame);
    assert!(engine.free_games().await.unwrap().is_empty());
    assert_eq!(
        messages(&mut rx),
        vec![
            (id.clone(), "enter starting".to_string()),
            (id, "enter in_game".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_self_finishing_game_is_removed() {
    let (engine, mut rx) = Engine::spawn(config(1));
    let id = engine.create_game(short("quick")).await.unwrap();
    engine.join(id.clone(), Player::new(1, "Alice")).await.unwrap();

    sleep(Duration::from_secs(1)).await;

    assert_eq!(engine.info(id.clone()).await.unwrap(), None);
    let texts: Vec<String> = messages(&mut rx).into_iter().map(|(_, text)| text).collect();
    assert_eq!(texts, vec!["enter starting", "enter in_game", "enter postgame"]);

    // The arena came back.
    assert_eq!(engine.create_game(idle("next")).await.unwrap(), gid("next"));
}

#[tokio::test(start_paused = true)]
async fn test_finish_removes_game_once() {
    let (engine, _rx) = Engine::spawn(config(1));
    let id = engine.create_game(idle("a")).await.unwrap();

    engine.finish(id.clone()).await.unwrap();
    assert_eq!(engine.info(id.clone()).await.unwrap(), None);

    let err = engine.finish(id).await.unwrap_err();
    assert!(matches!(err, SkirmishError::Game(GameError::UnknownGame(_))));
}

// =========================================================================
// Players and occurrences
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_join_errors_surface() {
    let (engine, _rx) = Engine::spawn(config(2));
    let a = engine.create_game(idle("a")).await.unwrap();
    let b = engine.create_game(idle("b")).await.unwrap();

    assert_eq!(
        engine.join(a.clone(), Player::new(1, "Alice")).await.unwrap(),
        JoinOutcome::Participant
    );

    let err = engine.join(b, Player::new(1, "Alice")).await.unwrap_err();
    assert!(matches!(
        err,
        SkirmishError::Game(GameError::AlreadyInGame(PlayerId(1), ref game)) if *game == a
    ));

    let err = engine.join(gid("nope"), Player::new(2, "Bob")).await.unwrap_err();
    assert!(matches!(err, SkirmishError::Game(GameError::UnknownGame(_))));
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_returns_cancel_flag() {
    let (engine, _rx) = Engine::spawn(config(1));
    let quits = Arc::new(Mutex::new(Vec::new()));
    let id = engine
        .create_game(idle("a").listener(Guard { quits }))
        .await
        .unwrap();
    engine.join(id, Player::new(1, "Alice")).await.unwrap();

    let mine = Occurrence::BlockBreak {
        player: PlayerId(1),
        position: Position::new(WorldId(1), 0.0, 64.0, 0.0),
    };
    assert!(engine.dispatch(mine).await.unwrap());

    let elsewhere = Occurrence::BlockBreak {
        player: PlayerId(2),
        position: Position::new(WorldId(9), 0.0, 64.0, 0.0),
    };
    assert!(!engine.dispatch(elsewhere).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_quit_delivers_player_quit_while_still_member() {
    let (engine, _rx) = Engine::spawn(config(1));
    let quits = Arc::new(Mutex::new(Vec::new()));
    let id = engine
        .create_game(idle("a").listener(Guard { quits: quits.clone() }))
        .await
        .unwrap();
    engine.join(id.clone(), Player::new(1, "Alice")).await.unwrap();

    assert_eq!(engine.quit(PlayerId(1)).await.unwrap(), Some(id.clone()));
    assert_eq!(*quits.lock().unwrap(), vec![true]);
    assert_eq!(engine.info(id).await.unwrap().unwrap().players, 0);

    assert_eq!(engine.quit(PlayerId(1)).await.unwrap(), None);
    assert_eq!(quits.lock().unwrap().len(), 1);
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_engine() {
    let (engine, mut rx) = Engine::spawn(config(1));
    engine.create_game(idle("a")).await.unwrap();

    engine.shutdown().await.unwrap();
    // The delivery channel closes once the engine task is gone.
    assert!(rx.recv().await.is_none());

    let err = engine.create_game(idle("b")).await.unwrap_err();
    assert!(matches!(err, SkirmishError::EngineStopped));
}
