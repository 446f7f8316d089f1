//! Error types for the game layer.

use skirmish_protocol::{ArenaId, GameId, GameState, PlayerId};
use skirmish_team::TeamError;
use skirmish_tick::TickError;

/// Errors that can occur while building, running or tearing down games.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    /// The builder has no handler for this phase.
    #[error("no state handler registered for {0}")]
    MissingStateHandler(GameState),

    /// The builder has no arena and none was claimed for it.
    #[error("game {0} has no arena")]
    MissingArena(GameId),

    /// `start` was called on a game that is already running.
    #[error("game {0} already started")]
    AlreadyStarted(GameId),

    /// The game has not been started yet.
    #[error("game {0} not started")]
    NotStarted(GameId),

    /// `finish` already ran for this game, or the game is being operated
    /// on after it finished.
    #[error("game {0} already finished")]
    AlreadyFinished(GameId),

    /// The transition is not allowed (leaving the terminal phase, or
    /// "transitioning" to the current phase).
    #[error("game {game} cannot move from {from} to {to}")]
    InvalidTransition {
        game: GameId,
        from: GameState,
        to: GameState,
    },

    /// An event handler was registered while already registered.
    #[error("event handler {0} already registered")]
    AlreadyRegistered(String),

    /// An event handler was unregistered while not registered.
    #[error("event handler {0} not registered")]
    NotRegistered(String),

    /// A game with this id is already in the registry.
    #[error("game {0} already exists")]
    DuplicateGame(GameId),

    /// No game with this id is in the registry.
    #[error("game {0} not found")]
    UnknownGame(GameId),

    /// An arena with this id is already in the pool.
    #[error("arena {0} already exists")]
    DuplicateArena(ArenaId),

    /// No arena with this id is in the pool.
    #[error("arena {0} not found")]
    UnknownArena(ArenaId),

    /// The arena is bound to another game.
    #[error("arena {0} is occupied")]
    ArenaOccupied(ArenaId),

    /// Every arena in the pool is occupied.
    #[error("no open arena")]
    NoOpenArena,

    /// The player already belongs to a game.
    #[error("player {0} already in game {1}")]
    AlreadyInGame(PlayerId, GameId),

    /// The player does not belong to this game.
    #[error("player {0} not in game {1}")]
    NotInGame(PlayerId, GameId),

    /// The game is past the waiting phase and takes no spectators.
    #[error("game {game} is not joinable in state {state}")]
    NotJoinable { game: GameId, state: GameState },

    /// The game does not allow spectators.
    #[error("game {0} does not allow spectators")]
    SpectatorsDisabled(GameId),

    /// A round operation was used on a game without a round manager.
    #[error("game {0} is not round based")]
    NoRounds(GameId),

    #[error(transparent)]
    Team(#[from] TeamError),

    #[error(transparent)]
    Tick(#[from] TickError),
}

impl GameError {
    /// Returns `true` for errors that mean the caller broke an assumption
    /// rather than hit a runtime condition. These should abort the
    /// operation and are never worth retrying.
    pub fn is_programming_error(&self) -> bool {
        match self {
            Self::MissingStateHandler(_)
            | Self::MissingArena(_)
            | Self::AlreadyStarted(_)
            | Self::NotStarted(_)
            | Self::AlreadyFinished(_)
            | Self::InvalidTransition { .. }
            | Self::AlreadyRegistered(_)
            | Self::NotRegistered(_)
            | Self::DuplicateGame(_)
            | Self::DuplicateArena(_)
            | Self::NoRounds(_) => true,
            Self::Team(err) => err.is_programming_error(),
            Self::Tick(err) => err.is_programming_error(),
            Self::UnknownGame(_)
            | Self::UnknownArena(_)
            | Self::ArenaOccupied(_)
            | Self::NoOpenArena
            | Self::AlreadyInGame(..)
            | Self::NotInGame(..)
            | Self::NotJoinable { .. }
            | Self::SpectatorsDisabled(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::TeamId;

    #[test]
    fn test_categories() {
        assert!(GameError::AlreadyFinished(GameId::new("g")).is_programming_error());
        assert!(GameError::MissingStateHandler(GameState::InGame).is_programming_error());
        assert!(!GameError::NoOpenArena.is_programming_error());
        assert!(!GameError::ArenaOccupied(ArenaId(1)).is_programming_error());
    }

    #[test]
    fn test_wrapped_errors_keep_their_category() {
        let err: GameError = TeamError::NoTeam(PlayerId(1)).into();
        assert!(err.is_programming_error());
        let err: GameError = TeamError::TeamNotFound(TeamId(1)).into();
        assert!(!err.is_programming_error());
        let err: GameError = TickError::AlreadyDeployed.into();
        assert!(err.is_programming_error());
    }
}
