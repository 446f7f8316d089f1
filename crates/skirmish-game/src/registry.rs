//! The registry: every active game, the host services they share, and
//! the two entry points that drive them (server ticks and occurrences).

use std::collections::{BTreeMap, HashMap};

use skirmish_protocol::{ArenaId, Event, GameId, GameState, Occurrence, Player, PlayerId, WorldId};
use skirmish_tick::{TaskId, TaskScheduler};

use crate::{ArenaPool, Broadcast, EventBus, Game, GameBuilder, GameError, GameServices, JoinOutcome};

/// Process-wide table of games.
///
/// A player is in at most one game at a time and an arena is bound to at
/// most one game at a time; both are enforced here.
///
/// Everything runs on the caller's thread. Neither [`on_server_tick`]
/// nor [`dispatch`] may be re-entered from inside a game hook, which the
/// `&mut self` receivers guarantee.
///
/// [`on_server_tick`]: Self::on_server_tick
/// [`dispatch`]: Self::dispatch
#[derive(Debug, Default)]
pub struct GameRegistry {
    games: BTreeMap<GameId, Game>,
    heartbeats: HashMap<TaskId, GameId>,
    arenas: ArenaPool,
    bus: EventBus,
    tasks: TaskScheduler,
    /// Broadcasts of games that left the table before they were drained.
    orphaned: Vec<(GameId, Broadcast)>,
}

impl GameRegistry {
    pub fn new(arenas: ArenaPool) -> Self {
        Self {
            arenas,
            ..Self::default()
        }
    }

    pub fn arenas(&self) -> &ArenaPool {
        &self.arenas
    }

    pub fn arenas_mut(&mut self) -> &mut ArenaPool {
        &mut self.arenas
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn tasks(&self) -> &TaskScheduler {
        &self.tasks
    }

    // -- membership of the table ------------------------------------------

    /// Binds the game's arena, starts the game and adds it.
    ///
    /// # Errors
    /// - [`GameError::DuplicateGame`] if the id is taken
    /// - [`GameError::UnknownArena`] / [`GameError::ArenaOccupied`] if
    ///   its arena cannot be bound
    /// - anything `start` fails with; the arena is released again
    pub fn add(&mut self, mut game: Game) -> Result<(), GameError> {
        let id = game.id().clone();
        if self.games.contains_key(&id) {
            return Err(GameError::DuplicateGame(id));
        }
        let arena = game.context().arena().id;
        self.arenas.occupy(arena)?;

        let mut services = GameServices {
            bus: &mut self.bus,
            tasks: &mut self.tasks,
            arenas: &mut self.arenas,
        };
        if let Err(err) = game.start(&mut services) {
            tracing::error!(game_id = %id, error = %err, "game failed to start");
            if !game.is_finished() {
                let _ = game.finish(&mut services);
            }
            if self.arenas.is_occupied(arena) {
                self.arenas.release(arena)?;
            }
            return Err(err);
        }

        if let Some(task) = game.heartbeat_task() {
            self.heartbeats.insert(task, id.clone());
        }
        self.games.insert(id.clone(), game);
        tracing::info!(game_id = %id, games = self.games.len(), "game registered");
        self.flush();
        self.reap();
        Ok(())
    }

    /// Builds a game and adds it. If the builder has no arena, the first
    /// open arena is claimed for it.
    ///
    /// # Errors
    /// [`GameError::NoOpenArena`] when every arena is taken, plus anything
    /// [`GameBuilder::build`] or [`add`](Self::add) fails with.
    pub fn create_game(&mut self, mut builder: GameBuilder) -> Result<GameId, GameError> {
        if self.games.contains_key(builder.id()) {
            return Err(GameError::DuplicateGame(builder.id().clone()));
        }
        if !builder.has_arena() {
            let arena = self.arenas.find_open_arena().cloned().ok_or(GameError::NoOpenArena)?;
            builder.set_arena(arena);
        }
        let game = builder.build()?;
        let id = game.id().clone();
        self.add(game)?;
        Ok(id)
    }

    /// Finishes a game if it is still running and takes it out of the
    /// table. Its undrained broadcasts stay with the registry and come
    /// out of the next [`drain_broadcasts`](Self::drain_broadcasts).
    ///
    /// # Errors
    /// [`GameError::UnknownGame`] if no such game is registered.
    pub fn remove(&mut self, id: &GameId) -> Result<Game, GameError> {
        let mut game = self.games.remove(id).ok_or_else(|| GameError::UnknownGame(id.clone()))?;
        self.heartbeats.retain(|_, game_id| game_id != id);
        if !game.is_finished() {
            let mut services = GameServices {
                bus: &mut self.bus,
                tasks: &mut self.tasks,
                arenas: &mut self.arenas,
            };
            game.finish(&mut services)?;
        }
        self.keep_broadcasts(&mut game);
        tracing::info!(game_id = %id, games = self.games.len(), "game removed");
        self.flush();
        Ok(game)
    }

    pub fn get(&self, id: &GameId) -> Option<&Game> {
        self.games.get(id)
    }

    pub fn get_mut(&mut self, id: &GameId) -> Option<&mut Game> {
        self.games.get_mut(id)
    }

    /// Games still in `Waiting`.
    pub fn free_games(&self) -> Vec<&Game> {
        self.games
            .values()
            .filter(|game| game.state() == GameState::Waiting)
            .collect()
    }

    pub fn game_by_player(&self, player: PlayerId) -> Option<&Game> {
        self.games.values().find(|game| game.is_in_game(player))
    }

    pub fn game_by_arena(&self, arena: ArenaId) -> Option<&Game> {
        self.games.values().find(|game| game.context().arena().id == arena)
    }

    pub fn game_by_world(&self, world: WorldId) -> Option<&Game> {
        self.games.values().find(|game| game.context().arena().world == world)
    }

    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    // -- players ----------------------------------------------------------

    /// Adds a player to a game.
    ///
    /// # Errors
    /// - [`GameError::UnknownGame`] if no such game is registered
    /// - [`GameError::AlreadyInGame`] if the player is in any game
    /// - whatever [`Game::handle_join`] fails with
    pub fn join(&mut self, id: &GameId, player: Player) -> Result<JoinOutcome, GameError> {
        if let Some(current) = self.game_by_player(player.id) {
            return Err(GameError::AlreadyInGame(player.id, current.id().clone()));
        }
        let game = self.games.get_mut(id).ok_or_else(|| GameError::UnknownGame(id.clone()))?;
        game.handle_join(player)
    }

    /// Removes a player from whatever game they are in. Returns that game.
    pub fn quit(&mut self, player: PlayerId) -> Option<GameId> {
        let game = self.games.values_mut().find(|game| game.is_in_game(player))?;
        // The lookup just found the player, so this cannot fail.
        let _ = game.handle_quit(player);
        Some(game.id().clone())
    }

    // -- driving ----------------------------------------------------------

    /// Advances the task table one server tick and ticks every game whose
    /// heartbeat is due, then dispatches what the games emitted and drops
    /// games that finished. Returns how many games ticked.
    pub fn on_server_tick(&mut self) -> usize {
        let due = self.tasks.advance();
        let mut ticked = 0;
        for task in due {
            if !self.tasks.is_scheduled(task) {
                continue;
            }
            let Some(id) = self.heartbeats.get(&task) else {
                continue;
            };
            let Some(game) = self.games.get_mut(id) else {
                continue;
            };
            let mut services = GameServices {
                bus: &mut self.bus,
                tasks: &mut self.tasks,
                arenas: &mut self.arenas,
            };
            if let Err(err) = game.tick(&mut services) {
                tracing::error!(game_id = %id, error = %err, "game tick failed");
            }
            ticked += 1;
        }
        self.flush();
        self.reap();
        ticked
    }

    /// Delivers an occurrence to every subscription for its kind, lowest
    /// priority first, skipping games it does not concern. Returns the
    /// event so the host can read the cancel flag.
    ///
    /// Occurrences the games emit while handling it are dispatched right
    /// after, in the order they were emitted.
    pub fn dispatch(&mut self, occurrence: Occurrence) -> Event {
        let event = self.deliver(Event::new(occurrence));
        self.flush();
        self.reap();
        event
    }

    /// Everything the games broadcast since the last call.
    pub fn drain_broadcasts(&mut self) -> Vec<(GameId, Broadcast)> {
        let mut drained = std::mem::take(&mut self.orphaned);
        for game in self.games.values_mut() {
            let id = game.id().clone();
            drained.extend(game.drain_broadcasts().into_iter().map(|b| (id.clone(), b)));
        }
        drained
    }

    fn keep_broadcasts(&mut self, game: &mut Game) {
        let id = game.id().clone();
        self.orphaned
            .extend(game.drain_broadcasts().into_iter().map(|b| (id.clone(), b)));
    }

    fn deliver(&mut self, mut event: Event) -> Event {
        let subscribers = self.bus.subscribers(event.occurrence().kind());
        for entry in subscribers {
            if event.is_cancelled() && !entry.subscription.handle_cancelled {
                continue;
            }
            // Handlers earlier in this dispatch may have detached it.
            if !self.bus.is_subscribed(&entry.listener) {
                continue;
            }
            let Some(game) = self.games.get_mut(&entry.listener.game) else {
                continue;
            };
            if !game.should_handle(event.occurrence()) {
                continue;
            }
            let mut services = GameServices {
                bus: &mut self.bus,
                tasks: &mut self.tasks,
                arenas: &mut self.arenas,
            };
            if let Err(err) = game.handle_event(entry.listener.scope, &mut event, &mut services) {
                tracing::error!(listener = %entry.listener, error = %err, "event handler failed");
            }
        }
        event
    }

    /// Dispatches everything games posted to the bus, including whatever
    /// those dispatches post in turn.
    fn flush(&mut self) {
        while let Some(occurrence) = self.bus.next_posted() {
            self.deliver(Event::new(occurrence));
        }
    }

    /// Drops games that finished themselves.
    fn reap(&mut self) {
        let finished: Vec<GameId> = self
            .games
            .values()
            .filter(|game| game.is_finished())
            .map(|game| game.id().clone())
            .collect();
        for id in finished {
            if let Some(mut game) = self.games.remove(&id) {
                self.keep_broadcasts(&mut game);
            }
            self.heartbeats.retain(|_, game_id| *game_id != id);
            tracing::info!(game_id = %id, games = self.games.len(), "finished game removed");
        }
    }
}
