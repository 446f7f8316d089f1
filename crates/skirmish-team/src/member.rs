//! Per-member records.

use std::fmt;

use serde::{Deserialize, Serialize};
use skirmish_protocol::{Player, PlayerId};

/// What a roster remembers about a member. Kept even if the player goes
/// offline, so a team can still list who played for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberData {
    pub id: PlayerId,
    pub username: String,
}

impl From<&Player> for MemberData {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            username: player.username.clone(),
        }
    }
}

/// Liveness of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberState {
    #[default]
    Alive,
    Dead,
}

impl MemberState {
    pub fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }
}

impl fmt::Display for MemberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive => write!(f, "ALIVE"),
            Self::Dead => write!(f, "DEAD"),
        }
    }
}
