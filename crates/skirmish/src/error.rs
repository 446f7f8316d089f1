//! Unified error type for Skirmish.

use skirmish_game::GameError;
use skirmish_team::TeamError;
use skirmish_tick::TickError;

/// Top-level error that wraps every crate-specific error.
///
/// Callers of the `skirmish` facade deal with this one type; `?`
/// converts sub-crate errors through the generated `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A game, registry or arena error.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A team roster error.
    #[error(transparent)]
    Team(#[from] TeamError),

    /// A heartbeat or task scheduling error.
    #[error(transparent)]
    Tick(#[from] TickError),

    /// The engine configuration could not be parsed.
    #[error("invalid engine config: {0}")]
    Config(#[from] serde_json::Error),

    /// The engine task has stopped and no longer takes commands.
    #[error("engine is not running")]
    EngineStopped,
}

impl SkirmishError {
    /// Whether the error comes from misuse of the API rather than from a
    /// condition the host should expect (a full team, a taken arena).
    pub fn is_programming_error(&self) -> bool {
        match self {
            Self::Game(err) => err.is_programming_error(),
            Self::Team(err) => err.is_programming_error(),
            Self::Tick(err) => err.is_programming_error(),
            Self::Config(_) | Self::EngineStopped => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use skirmish_protocol::{ArenaId, GameId, TeamId};

    use super::*;

    #[test]
    fn test_from_game_error() {
        let err = GameError::UnknownGame(GameId::new("duels-1"));
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Game(_)));
        assert!(skirmish_err.to_string().contains("duels-1"));
    }

    #[test]
    fn test_from_team_error() {
        let err = TeamError::TeamNotFound(TeamId(3));
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Team(_)));
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Config(_)));
        assert!(!skirmish_err.is_programming_error());
    }

    #[test]
    fn test_occupied_arena_is_not_a_programming_error() {
        let skirmish_err: SkirmishError = GameError::ArenaOccupied(ArenaId(1)).into();
        assert!(!skirmish_err.is_programming_error());
    }
}
