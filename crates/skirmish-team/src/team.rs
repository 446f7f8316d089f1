//! A team roster.

use std::fmt;

use skirmish_protocol::{Player, PlayerId, TeamId};

use crate::MemberData;

/// A group of players competing together.
///
/// Members are kept in the order they joined. A team built outside a
/// [`TeamManager`](crate::TeamManager) can be given its starting roster
/// directly; once registered, membership changes go through the manager
/// so liveness entries stay in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    id: TeamId,
    color: String,
    members: Vec<MemberData>,
}

impl Team {
    pub fn new(id: TeamId, color: impl Into<String>) -> Self {
        Self {
            id,
            color: color.into(),
            members: Vec::new(),
        }
    }

    /// Builds a team with a starting roster. Duplicate players are kept
    /// once.
    pub fn with_members<'a>(
        id: TeamId,
        color: impl Into<String>,
        players: impl IntoIterator<Item = &'a Player>,
    ) -> Self {
        let mut team = Self::new(id, color);
        for player in players {
            team.add_member(player);
        }
        team
    }

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Colour label followed by the team name, e.g. `"[red] Team #2"`.
    pub fn formatted_name(&self) -> String {
        format!("[{}] {}", self.color, self)
    }

    /// Appends a member. Returns `false` if they were already on the roster.
    pub fn add_member(&mut self, player: &Player) -> bool {
        if self.is_member(player.id) {
            return false;
        }
        self.members.push(MemberData::from(player));
        true
    }

    /// Removes a member by identity key.
    pub fn remove_member(&mut self, player: PlayerId) -> Option<MemberData> {
        let index = self.members.iter().position(|m| m.id == player)?;
        Some(self.members.remove(index))
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.members.iter().any(|m| m.id == player)
    }

    pub fn members(&self) -> &[MemberData] {
        &self.members
    }

    pub fn member_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.iter().map(|m| m.id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team {}", self.id)
    }
}
