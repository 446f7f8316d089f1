//! Error types for the team layer.

use skirmish_protocol::{PlayerId, TeamId};

/// Errors that can occur while managing teams.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeamError {
    /// The player is not on any team. Returned by the non-optional
    /// lookup [`TeamManager::team_of`](crate::TeamManager::team_of), where
    /// the caller asserted the player has one.
    #[error("player {0} has no team")]
    NoTeam(PlayerId),

    /// No team with this id is registered.
    #[error("team {0} not found")]
    TeamNotFound(TeamId),

    /// A team with this id is already registered.
    #[error("team {0} already exists")]
    DuplicateTeam(TeamId),

    /// The team already holds as many members as the team mode allows.
    #[error("team {team} is full ({max} members)")]
    TeamFull { team: TeamId, max: usize },

    /// The player is already on a team (possibly another one).
    #[error("player {0} is already on team {1}")]
    AlreadyOnTeam(PlayerId, TeamId),

    /// The player is not on this team.
    #[error("player {0} is not on team {1}")]
    NotAMember(PlayerId, TeamId),

    /// No preset team mode has this name.
    #[error("invalid team mode {0}")]
    UnknownMode(String),
}

impl TeamError {
    /// Returns `true` for errors that mean the caller broke an assumption
    /// rather than hit a runtime condition.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::NoTeam(_) | Self::DuplicateTeam(_))
    }
}
