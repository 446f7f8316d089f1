//! Game lifecycle for Skirmish.
//!
//! A [`Game`] is one match. It moves through four phases,
//!
//! ```text
//! Waiting → Starting → InGame → Postgame
//! ```
//!
//! with one [`GameStateHandler`] per phase deciding when to move on. The
//! game owns its teams, optional [`RoundManager`], spectators and
//! unassociated players (all reachable through [`GameContext`]) and holds
//! an [`Arena`] from the [`ArenaPool`] until it finishes.
//!
//! # Key types
//!
//! - [`GameBuilder`]: assembles a game, refusing one that lacks a phase
//!   handler
//! - [`GameRegistry`]: all active games plus the shared event bus, task
//!   table and arena pool; the host drives everything through it
//! - [`ScopedDispatcher`] / [`EventBus`]: per-game event subscriptions,
//!   attached and detached as a unit and filtered by [`should_handle`]
//! - [`RoundManager`] / [`RoundRules`]: best-of-N round formats
//!
//! # Driving a game
//!
//! ```ignore
//! let mut registry = GameRegistry::new(arenas);
//! let id = registry.create_game(builder)?;
//! registry.join(&id, Player::new(1, "Alice"))?;
//!
//! // once per server tick
//! registry.on_server_tick();
//! // for every host occurrence
//! let event = registry.dispatch(occurrence);
//! ```

mod arena;
mod broadcast;
mod builder;
mod config;
mod context;
mod dispatch;
mod error;
mod game;
mod handler;
mod registry;
mod round;
mod spectator;

pub use arena::{Arena, ArenaPool};
pub use broadcast::{Broadcast, BroadcastKind};
pub use builder::GameBuilder;
pub use config::GameConfig;
pub use context::GameContext;
pub use dispatch::{
    BusEntry, EventBus, GameEventHandler, ListenerKey, ListenerScope, ScopedDispatcher, Subscription, should_handle,
};
pub use error::GameError;
pub use game::{Game, GameInfo, GameServices, JoinOutcome};
pub use handler::{GameStateHandler, StateListener, Updatable};
pub use registry::GameRegistry;
pub use round::{COUNTDOWN_LENGTH, Round, RoundManager, RoundRules, RoundState};
pub use spectator::SpectatorSet;
