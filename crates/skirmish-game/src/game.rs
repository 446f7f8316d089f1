//! The game state machine.

use skirmish_protocol::{ArenaId, Event, GameId, GameState, Occurrence, Player, PlayerId};
use skirmish_tick::{Heartbeat, TaskId, TaskScheduler};

use crate::dispatch::should_handle;
use crate::{
    ArenaPool, Broadcast, EventBus, GameContext, GameError, GameStateHandler, ListenerScope, ScopedDispatcher,
    StateListener, Updatable,
};

/// The host services a game borrows while it is being driven.
///
/// The registry owns all three and lends them for the length of one call.
pub struct GameServices<'a> {
    pub bus: &'a mut EventBus,
    pub tasks: &'a mut TaskScheduler,
    pub arenas: &'a mut ArenaPool,
}

/// Where a joining player ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Unassociated, waiting to be put on a team.
    Participant,
    Spectator,
}

/// A snapshot of game metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GameInfo {
    pub id: GameId,
    pub state: GameState,
    pub arena: ArenaId,
    pub elapsed: u64,
    pub teams: usize,
    pub players: usize,
    pub spectators: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Built,
    Running,
    Finished,
}

/// One match: its context, one handler per phase, its event handlers and
/// its heartbeat.
///
/// ```text
/// build ──start──→ Running ──tick/events/set_state──→ ... ──finish──→ Finished
/// ```
///
/// # State transitions
///
/// [`set_state`](Self::set_state) (and any transition a hook requests)
/// always runs these steps in order:
///
/// 1. state listeners are notified and a `GameStateChange` occurrence is
///    posted to the bus
/// 2. the outgoing handler's `handle_finish`
/// 3. the outgoing phase's event handlers are unregistered
/// 4. the phase changes and the elapsed counter resets to 0
/// 5. the incoming handler's `handle_setup`
/// 6. the incoming phase's event handlers are registered
pub struct Game {
    ctx: GameContext,
    /// Indexed by [`GameState::index`].
    handlers: [Box<dyn GameStateHandler>; 4],
    listener: Option<ScopedDispatcher>,
    /// Indexed by [`GameState::index`].
    state_listeners: [Vec<ScopedDispatcher>; 4],
    observers: Vec<Box<dyn StateListener>>,
    updatables: Vec<Box<dyn Updatable>>,
    heartbeat: Heartbeat,
    lifecycle: Lifecycle,
}

impl Game {
    pub(crate) fn new(
        ctx: GameContext,
        handlers: [Box<dyn GameStateHandler>; 4],
        listener: Option<ScopedDispatcher>,
        state_listeners: [Vec<ScopedDispatcher>; 4],
        observers: Vec<Box<dyn StateListener>>,
        updatables: Vec<Box<dyn Updatable>>,
    ) -> Self {
        let heartbeat = Heartbeat::new(ctx.config().heartbeat_period);
        Self {
            ctx,
            handlers,
            listener,
            state_listeners,
            observers,
            updatables,
            heartbeat,
            lifecycle: Lifecycle::Built,
        }
    }

    pub fn id(&self) -> &GameId {
        self.ctx.id()
    }

    pub fn state(&self) -> GameState {
        self.ctx.state()
    }

    /// The advisory next phase. Handlers decide when to actually move.
    pub fn next_state(&self) -> Option<GameState> {
        self.ctx.state().next()
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut GameContext {
        &mut self.ctx
    }

    pub fn is_in_game(&self, player: PlayerId) -> bool {
        self.ctx.is_in_game(player)
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn is_finished(&self) -> bool {
        self.lifecycle == Lifecycle::Finished
    }

    /// The repeating task driving this game, while it runs.
    pub fn heartbeat_task(&self) -> Option<TaskId> {
        self.heartbeat.task_id()
    }

    /// Whether `occurrence` concerns this game.
    pub fn should_handle(&self, occurrence: &Occurrence) -> bool {
        should_handle(&self.ctx, occurrence)
    }

    pub fn info(&self) -> GameInfo {
        GameInfo {
            id: self.ctx.id().clone(),
            state: self.ctx.state(),
            arena: self.ctx.arena().id,
            elapsed: self.ctx.elapsed(),
            teams: self.ctx.teams().len(),
            players: self.ctx.teams().players().len() + self.ctx.unassociated().len(),
            spectators: self.ctx.spectators().len(),
        }
    }

    /// Broadcasts made since the last call.
    pub fn drain_broadcasts(&mut self) -> Vec<Broadcast> {
        self.ctx.take_broadcasts()
    }

    // -- lifecycle --------------------------------------------------------

    /// Enters `Waiting`: registers the game's own event handler and the
    /// waiting phase's handlers, runs the waiting setup hook and deploys
    /// the heartbeat.
    ///
    /// # Errors
    /// - [`GameError::AlreadyStarted`] if called twice
    /// - [`GameError::AlreadyFinished`] after `finish`
    pub fn start(&mut self, services: &mut GameServices<'_>) -> Result<(), GameError> {
        match self.lifecycle {
            Lifecycle::Running => return Err(GameError::AlreadyStarted(self.id().clone())),
            Lifecycle::Finished => return Err(GameError::AlreadyFinished(self.id().clone())),
            Lifecycle::Built => {}
        }

        if let Some(listener) = self.listener.as_mut() {
            listener.register(services.bus)?;
        }
        let state = self.ctx.state();
        self.handlers[state.index()].handle_setup(&mut self.ctx);
        for listener in &mut self.state_listeners[state.index()] {
            listener.register(services.bus)?;
        }

        let delay = self.ctx.config().heartbeat_delay;
        let task = self.heartbeat.deploy(services.tasks, delay)?;
        self.lifecycle = Lifecycle::Running;
        tracing::info!(
            game_id = %self.id(),
            arena_id = %self.ctx.arena().id,
            %task,
            period = self.heartbeat.period(),
            "game started"
        );

        self.settle(services)
    }

    /// One game tick: updatables first, then the current handler, then
    /// the elapsed counter moves on.
    ///
    /// # Errors
    /// [`GameError::NotStarted`] / [`GameError::AlreadyFinished`] outside
    /// the running window, or whatever a requested transition fails with.
    pub fn tick(&mut self, services: &mut GameServices<'_>) -> Result<(), GameError> {
        self.ensure_running()?;

        for updatable in &mut self.updatables {
            updatable.update(&self.ctx);
        }
        let state = self.ctx.state();
        let elapsed = self.ctx.elapsed();
        tracing::trace!(game_id = %self.id(), %state, elapsed, "game tick");
        self.handlers[state.index()].handle_tick(&mut self.ctx, elapsed);
        self.ctx.increment_elapsed();

        self.settle(services)
    }

    /// Moves the game to `new`, running the six transition steps.
    ///
    /// # Errors
    /// - [`GameError::InvalidTransition`] unless `new` comes later in the
    ///   lifecycle than the current phase
    /// - [`GameError::NotStarted`] / [`GameError::AlreadyFinished`]
    ///   outside the running window
    pub fn set_state(&mut self, new: GameState, services: &mut GameServices<'_>) -> Result<(), GameError> {
        self.ensure_running()?;
        self.transition(new, services)?;
        self.settle(services)
    }

    /// Hands an occurrence to one of this game's event handlers. The
    /// registry calls this after the scope filter passed.
    ///
    /// A handler that is no longer registered (its phase ended earlier in
    /// the same dispatch) is skipped.
    pub fn handle_event(
        &mut self,
        scope: ListenerScope,
        event: &mut Event,
        services: &mut GameServices<'_>,
    ) -> Result<(), GameError> {
        self.ensure_running()?;
        let dispatcher = match scope {
            ListenerScope::Game => self.listener.as_mut(),
            ListenerScope::State { state, index } => self.state_listeners[state.index()].get_mut(index),
        };
        let Some(dispatcher) = dispatcher.filter(|d| d.is_registered()) else {
            return Ok(());
        };
        dispatcher.deliver(&mut self.ctx, event);
        self.settle(services)
    }

    /// Adds a player: unassociated while waiting, a spectator afterwards.
    ///
    /// # Errors
    /// - [`GameError::AlreadyInGame`] if the player is already here
    /// - [`GameError::NotJoinable`] past `Waiting` when spectators are off
    pub fn handle_join(&mut self, player: Player) -> Result<JoinOutcome, GameError> {
        self.ensure_running()?;
        if self.ctx.is_in_game(player.id) {
            return Err(GameError::AlreadyInGame(player.id, self.id().clone()));
        }
        if self.ctx.state().is_joinable() {
            let player_id = player.id;
            self.ctx.add_unassociated(player)?;
            tracing::info!(game_id = %self.id(), %player_id, "player joined");
            return Ok(JoinOutcome::Participant);
        }
        if !self.ctx.config().allow_spectators {
            return Err(GameError::NotJoinable {
                game: self.id().clone(),
                state: self.ctx.state(),
            });
        }
        let player_id = player.id;
        self.ctx.add_spectator(player)?;
        tracing::info!(game_id = %self.id(), %player_id, "player joined as spectator");
        Ok(JoinOutcome::Spectator)
    }

    /// Removes a player from every membership set.
    ///
    /// # Errors
    /// [`GameError::NotInGame`] if the player was not here.
    pub fn handle_quit(&mut self, player: PlayerId) -> Result<(), GameError> {
        if !self.ctx.remove_player(player) {
            return Err(GameError::NotInGame(player, self.id().clone()));
        }
        tracing::info!(game_id = %self.id(), player_id = %player, "player left");
        Ok(())
    }

    /// Tears the game down. Runs at most once.
    ///
    /// Calls the current handler's `handle_finish`, cancels the heartbeat,
    /// unregisters every registered event handler, releases the arena and
    /// clears teams, rounds, spectators and unassociated players.
    ///
    /// # Errors
    /// [`GameError::AlreadyFinished`] on a second call. Nothing is torn
    /// down twice.
    pub fn finish(&mut self, services: &mut GameServices<'_>) -> Result<(), GameError> {
        if self.lifecycle == Lifecycle::Finished {
            return Err(GameError::AlreadyFinished(self.id().clone()));
        }
        let was_running = self.lifecycle == Lifecycle::Running;
        self.lifecycle = Lifecycle::Finished;

        if was_running {
            let state = self.ctx.state();
            self.handlers[state.index()].handle_finish(&mut self.ctx);
            self.heartbeat.cancel(services.tasks)?;
        }

        if let Some(listener) = self.listener.as_mut().filter(|l| l.is_registered()) {
            listener.unregister(services.bus)?;
        }
        for listener in self.state_listeners.iter_mut().flatten() {
            if listener.is_registered() {
                listener.unregister(services.bus)?;
            }
        }

        for updatable in &mut self.updatables {
            updatable.finish();
        }
        self.flush_emitted(services);
        let arena = self.ctx.arena().id;
        if services.arenas.is_occupied(arena) {
            services.arenas.release(arena)?;
        }
        self.ctx.clear();

        tracing::info!(game_id = %self.id(), state = %self.ctx.state(), "game finished");
        Ok(())
    }

    // -- internals --------------------------------------------------------

    fn ensure_running(&self) -> Result<(), GameError> {
        match self.lifecycle {
            Lifecycle::Running => Ok(()),
            Lifecycle::Built => Err(GameError::NotStarted(self.id().clone())),
            Lifecycle::Finished => Err(GameError::AlreadyFinished(self.id().clone())),
        }
    }

    fn transition(&mut self, new: GameState, services: &mut GameServices<'_>) -> Result<(), GameError> {
        let old = self.ctx.state();
        if new.index() <= old.index() {
            return Err(GameError::InvalidTransition {
                game: self.id().clone(),
                from: old,
                to: new,
            });
        }

        // 1
        for observer in &mut self.observers {
            observer.on_state_change(self.ctx.id(), old, new);
        }
        services.bus.post(Occurrence::GameStateChange {
            game: self.id().clone(),
            old,
            new,
        });
        // 2
        self.handlers[old.index()].handle_finish(&mut self.ctx);
        // 3
        for listener in &mut self.state_listeners[old.index()] {
            listener.unregister(services.bus)?;
        }
        // 4
        self.ctx.set_state(new);
        // 5
        self.handlers[new.index()].handle_setup(&mut self.ctx);
        // 6
        for listener in &mut self.state_listeners[new.index()] {
            listener.register(services.bus)?;
        }

        tracing::info!(game_id = %self.id(), from = %old, to = %new, "game state changed");
        Ok(())
    }

    /// Applies whatever the last hook asked for: chained transitions first,
    /// then a finish request. Emitted occurrences go to the bus.
    ///
    /// A rejected transition drops any further requests but still flushes
    /// and finishes; its error is returned afterwards.
    fn settle(&mut self, services: &mut GameServices<'_>) -> Result<(), GameError> {
        let mut outcome = Ok(());
        while let Some(next) = self.ctx.take_requested_state() {
            if self.lifecycle != Lifecycle::Running {
                break;
            }
            if let Err(err) = self.transition(next, services) {
                self.ctx.take_requested_state();
                outcome = Err(err);
                break;
            }
        }
        self.flush_emitted(services);
        if self.ctx.is_finish_requested() && self.lifecycle == Lifecycle::Running {
            self.finish(services)?;
        }
        outcome
    }

    fn flush_emitted(&mut self, services: &mut GameServices<'_>) {
        for occurrence in self.ctx.take_emitted() {
            services.bus.post(occurrence);
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("ctx", &self.ctx)
            .field("listener", &self.listener)
            .field("state_listeners", &self.state_listeners)
            .field("heartbeat", &self.heartbeat)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}
