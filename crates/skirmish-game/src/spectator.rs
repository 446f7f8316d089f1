//! Spectators of a game.

use skirmish_protocol::{Player, PlayerId};

/// Players watching a game without taking part, in the order they
/// started spectating.
#[derive(Debug, Clone, Default)]
pub struct SpectatorSet {
    players: Vec<Player>,
}

impl SpectatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the player was already spectating.
    pub fn insert(&mut self, player: Player) -> bool {
        if self.contains(player.id) {
            return false;
        }
        self.players.push(player);
        true
    }

    pub fn remove(&mut self, player: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == player)?;
        Some(self.players.remove(index))
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
