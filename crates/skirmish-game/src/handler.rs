//! The per-phase behaviour of a game and its other collaborators.
//!
//! A game owns exactly one [`GameStateHandler`] per [`GameState`]. The
//! game calls the hooks; handlers never call each other.

use skirmish_protocol::{GameId, GameState};

use crate::GameContext;

/// Behaviour for one lifecycle phase.
///
/// Hooks get the game's [`GameContext`] and mutate it directly. To move
/// the game to another phase, call [`GameContext::request_state`]; the
/// game runs the transition as soon as the hook returns.
///
/// Within a transition the game calls `handle_finish` on the outgoing
/// phase's handler, then `handle_setup` on the incoming one. `finish` on
/// the whole game also calls `handle_finish` on the current handler.
pub trait GameStateHandler: Send {
    /// The phase has become active.
    fn handle_setup(&mut self, ctx: &mut GameContext);

    /// One game tick. `elapsed` counts game ticks since the phase began,
    /// starting at 0.
    fn handle_tick(&mut self, ctx: &mut GameContext, elapsed: u64);

    /// The phase is about to stop being active.
    fn handle_finish(&mut self, ctx: &mut GameContext);
}

/// Something that refreshes once per game tick, before the phase handler
/// runs (a scoreboard, a boss bar).
pub trait Updatable: Send {
    fn update(&mut self, ctx: &GameContext);

    /// The game is finishing. Default: no-op.
    fn finish(&mut self) {}
}

/// Observes state changes as they happen.
///
/// Called synchronously at the very start of a transition, while the game
/// is still in `old`.
pub trait StateListener: Send {
    fn on_state_change(&mut self, game: &GameId, old: GameState, new: GameState);
}
