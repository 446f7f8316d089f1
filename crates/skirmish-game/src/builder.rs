//! Assembling a game.

use skirmish_protocol::{GameId, GameState};
use skirmish_team::{TeamConfig, TeamManager};

use crate::{
    Arena, Game, GameConfig, GameContext, GameError, GameEventHandler, GameStateHandler, ListenerKey, ListenerScope,
    RoundManager, ScopedDispatcher, StateListener, Updatable,
};

/// Collects everything a [`Game`] is made of and checks it is complete.
///
/// ```ignore
/// let game = GameBuilder::new("duels-1")
///     .arena(arena)
///     .handler(GameState::Waiting, Lobby::default())
///     .handler(GameState::Starting, Countdown::new(10))
///     .handler(GameState::InGame, Fight)
///     .handler(GameState::Postgame, Cleanup)
///     .build()?;
/// ```
pub struct GameBuilder {
    id: GameId,
    arena: Option<Arena>,
    config: GameConfig,
    team_config: TeamConfig,
    rounds: Option<RoundManager>,
    handlers: [Option<Box<dyn GameStateHandler>>; 4],
    listener: Option<Box<dyn GameEventHandler>>,
    state_listeners: [Vec<Box<dyn GameEventHandler>>; 4],
    observers: Vec<Box<dyn StateListener>>,
    updatables: Vec<Box<dyn Updatable>>,
}

impl GameBuilder {
    pub fn new(id: impl Into<GameId>) -> Self {
        Self {
            id: id.into(),
            arena: None,
            config: GameConfig::default(),
            team_config: TeamConfig::default(),
            rounds: None,
            handlers: Default::default(),
            listener: None,
            state_listeners: Default::default(),
            observers: Vec::new(),
            updatables: Vec::new(),
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// The arena the game will hold. Leave unset to have the registry
    /// claim the first open one.
    pub fn arena(mut self, arena: Arena) -> Self {
        self.arena = Some(arena);
        self
    }

    pub fn has_arena(&self) -> bool {
        self.arena.is_some()
    }

    pub(crate) fn set_arena(&mut self, arena: Arena) {
        self.arena = Some(arena);
    }

    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn team_config(mut self, team_config: TeamConfig) -> Self {
        self.team_config = team_config;
        self
    }

    /// Makes the game round based.
    pub fn rounds(mut self, rounds: RoundManager) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Sets the handler for one phase, replacing any earlier one.
    pub fn handler(mut self, state: GameState, handler: impl GameStateHandler + 'static) -> Self {
        self.handlers[state.index()] = Some(Box::new(handler));
        self
    }

    /// The game's own event handler, registered for its whole life.
    pub fn listener(mut self, handler: impl GameEventHandler + 'static) -> Self {
        self.listener = Some(Box::new(handler));
        self
    }

    /// An extra event handler registered only while `state` is active.
    pub fn state_listener(mut self, state: GameState, handler: impl GameEventHandler + 'static) -> Self {
        self.state_listeners[state.index()].push(Box::new(handler));
        self
    }

    pub fn observer(mut self, observer: impl StateListener + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn updatable(mut self, updatable: impl Updatable + 'static) -> Self {
        self.updatables.push(Box::new(updatable));
        self
    }

    /// # Errors
    /// - [`GameError::MissingArena`] if no arena was set
    /// - [`GameError::MissingStateHandler`] for the first phase, in
    ///   lifecycle order, that has no handler
    pub fn build(self) -> Result<Game, GameError> {
        let arena = self.arena.ok_or_else(|| GameError::MissingArena(self.id.clone()))?;

        let [waiting, starting, in_game, postgame] = self.handlers;
        let handlers = [
            waiting.ok_or(GameError::MissingStateHandler(GameState::Waiting))?,
            starting.ok_or(GameError::MissingStateHandler(GameState::Starting))?,
            in_game.ok_or(GameError::MissingStateHandler(GameState::InGame))?,
            postgame.ok_or(GameError::MissingStateHandler(GameState::Postgame))?,
        ];

        let listener = self.listener.map(|handler| {
            let key = ListenerKey {
                game: self.id.clone(),
                scope: ListenerScope::Game,
            };
            ScopedDispatcher::new(key, handler)
        });

        let mut state_listeners: [Vec<ScopedDispatcher>; 4] = Default::default();
        for (state, handlers) in GameState::ALL.into_iter().zip(self.state_listeners) {
            state_listeners[state.index()] = handlers
                .into_iter()
                .enumerate()
                .map(|(index, handler)| {
                    let key = ListenerKey {
                        game: self.id.clone(),
                        scope: ListenerScope::State { state, index },
                    };
                    ScopedDispatcher::new(key, handler)
                })
                .collect();
        }

        let teams = TeamManager::new(self.config.team_mode.clone(), self.team_config);
        let ctx = GameContext::new(self.id, arena, self.config, teams, self.rounds);
        tracing::debug!(game_id = %ctx.id(), arena_id = %ctx.arena().id, "game built");

        Ok(Game::new(
            ctx,
            handlers,
            listener,
            state_listeners,
            self.observers,
            self.updatables,
        ))
    }
}

impl std::fmt::Debug for GameBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameBuilder")
            .field("id", &self.id)
            .field("arena", &self.arena)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
