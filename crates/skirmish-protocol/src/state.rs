//! The lifecycle phase of a game.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle phase of a game.
///
/// Phases advance in one direction only:
///
/// ```text
/// Waiting → Starting → InGame → Postgame
/// ```
///
/// - **Waiting**: the game exists and accepts players; nobody is on a
///   team yet.
/// - **Starting**: enough players joined; teams are formed and a
///   countdown runs.
/// - **InGame**: the match is being played.
/// - **Postgame**: a winner was decided (or not). The game is cleaned up
///   from here and never reused.
///
/// [`next`](Self::next) is advisory: state handlers decide when to move
/// on, nothing advances a game automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Waiting,
    Starting,
    InGame,
    Postgame,
}

impl GameState {
    /// Every phase, in lifecycle order.
    pub const ALL: [GameState; 4] = [
        GameState::Waiting,
        GameState::Starting,
        GameState::InGame,
        GameState::Postgame,
    ];

    /// The phase that normally follows this one, or `None` at the end.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Starting),
            Self::Starting => Some(Self::InGame),
            Self::InGame => Some(Self::Postgame),
            Self::Postgame => None,
        }
    }

    /// Returns `true` while new players may join as participants.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` for the phase a game never leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Postgame)
    }

    /// Position in [`ALL`](Self::ALL); used to index per-phase tables.
    pub fn index(self) -> usize {
        match self {
            Self::Waiting => 0,
            Self::Starting => 1,
            Self::InGame => 2,
            Self::Postgame => 3,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Starting => write!(f, "starting"),
            Self::InGame => write!(f, "in_game"),
            Self::Postgame => write!(f, "postgame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_follows_strict_order() {
        assert_eq!(GameState::Waiting.next(), Some(GameState::Starting));
        assert_eq!(GameState::Starting.next(), Some(GameState::InGame));
        assert_eq!(GameState::InGame.next(), Some(GameState::Postgame));
        assert_eq!(GameState::Postgame.next(), None);
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, state) in GameState::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
        }
    }

    #[test]
    fn test_only_waiting_is_joinable() {
        assert!(GameState::Waiting.is_joinable());
        assert!(!GameState::Starting.is_joinable());
        assert!(!GameState::InGame.is_joinable());
        assert!(!GameState::Postgame.is_joinable());
        assert!(GameState::Postgame.is_terminal());
    }

    #[test]
    fn test_display_and_serde_agree() {
        for state in GameState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }
}
