//! # Skirmish
//!
//! Lifecycle engine for multiplayer matches.
//!
//! A game moves through `Waiting → Starting → InGame → Postgame`, with one
//! handler per phase deciding when to move on. Around that state machine
//! Skirmish manages teams and their liveness, best-of-N rounds, per-game
//! event subscriptions and the pool of arenas games are played in.
//!
//! This crate re-exports the sub-crates and adds an [`Engine`]: a Tokio
//! task that owns the game registry and drives it from a fixed-rate
//! server clock.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn run(builder: GameBuilder) -> Result<(), SkirmishError> {
//! skirmish::init_logging();
//!
//! let config = EngineConfig::from_json_str(
//!     r#"{ "arenas": [{ "id": 1, "name": "Crater", "world": 1 }] }"#,
//! )?;
//! let (engine, mut broadcasts) = Engine::spawn(config);
//!
//! let game = engine.create_game(builder).await?;
//! engine.join(game, Player::new(1, "Alice")).await?;
//!
//! while let Some((game, broadcast)) = broadcasts.recv().await {
//!     println!("{game}: {broadcast:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;

pub use config::EngineConfig;
pub use engine::{Delivery, DeliveryReceiver, Engine, EngineHandle};
pub use error::SkirmishError;

pub use skirmish_game as game;
pub use skirmish_protocol as protocol;
pub use skirmish_team as team;
pub use skirmish_tick as tick;

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that writes to stderr, filtered by
/// `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set, so tests may call
/// it freely.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The types most hosts and game modes need.
pub mod prelude {
    pub use crate::{Delivery, Engine, EngineConfig, EngineHandle, SkirmishError};

    pub use skirmish_game::{
        Arena, Broadcast, BroadcastKind, GameBuilder, GameConfig, GameContext, GameError, GameEventHandler,
        GameInfo, GameStateHandler, JoinOutcome, RoundManager, RoundRules, RoundState, StateListener, Subscription,
        Updatable,
    };
    pub use skirmish_protocol::{
        ArenaId, Bounds, EntityRef, Event, EventPriority, GameId, GameState, Occurrence, OccurrenceKind, Player,
        PlayerId, Position, TeamId, WorldId,
    };
    pub use skirmish_team::{MemberState, TeamConfig, TeamError, TeamMode, TeamState};
    pub use skirmish_tick::ClockConfig;
}
