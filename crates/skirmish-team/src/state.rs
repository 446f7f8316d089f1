//! Per-team liveness.

use std::collections::HashMap;

use skirmish_protocol::{PlayerId, TeamId};

use crate::{MemberState, Team, TeamError};

/// Liveness of every member of one team, parallel to the team's roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamState {
    team_id: TeamId,
    states: HashMap<PlayerId, MemberState>,
}

impl TeamState {
    /// Every current member of `team`, all alive.
    pub fn for_team(team: &Team) -> Self {
        Self {
            team_id: team.id(),
            states: team.member_ids().map(|id| (id, MemberState::Alive)).collect(),
        }
    }

    pub fn team_id(&self) -> TeamId {
        self.team_id
    }

    pub fn get(&self, player: PlayerId) -> Option<MemberState> {
        self.states.get(&player).copied()
    }

    /// # Errors
    /// [`TeamError::NotAMember`] if the player has no entry in this team.
    pub fn set(&mut self, player: PlayerId, state: MemberState) -> Result<(), TeamError> {
        let entry = self
            .states
            .get_mut(&player)
            .ok_or(TeamError::NotAMember(player, self.team_id))?;
        *entry = state;
        Ok(())
    }

    pub(crate) fn insert(&mut self, player: PlayerId) {
        self.states.insert(player, MemberState::Alive);
    }

    pub(crate) fn remove(&mut self, player: PlayerId) -> Option<MemberState> {
        self.states.remove(&player)
    }

    /// At least one member is alive.
    pub fn is_alive(&self) -> bool {
        self.states.values().any(|s| s.is_alive())
    }

    pub fn alive_members(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.states
            .iter()
            .filter(|(_, s)| s.is_alive())
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::Player;

    fn duo() -> Team {
        Team::with_members(
            TeamId(1),
            "red",
            [&Player::new(1, "Alice"), &Player::new(2, "Bob")],
        )
    }

    #[test]
    fn test_for_team_marks_everyone_alive() {
        let state = TeamState::for_team(&duo());
        assert_eq!(state.len(), 2);
        assert_eq!(state.get(PlayerId(1)), Some(MemberState::Alive));
        assert_eq!(state.get(PlayerId(2)), Some(MemberState::Alive));
        assert!(state.is_alive());
    }

    #[test]
    fn test_alive_while_any_member_alive() {
        let mut state = TeamState::for_team(&duo());
        state.set(PlayerId(1), MemberState::Dead).unwrap();
        assert!(state.is_alive());
        state.set(PlayerId(2), MemberState::Dead).unwrap();
        assert!(!state.is_alive());
    }

    #[test]
    fn test_empty_team_is_not_alive() {
        let state = TeamState::for_team(&Team::new(TeamId(9), "blue"));
        assert!(!state.is_alive());
    }

    #[test]
    fn test_set_unknown_member_fails() {
        let mut state = TeamState::for_team(&duo());
        assert_eq!(
            state.set(PlayerId(3), MemberState::Dead),
            Err(TeamError::NotAMember(PlayerId(3), TeamId(1)))
        );
    }
}
