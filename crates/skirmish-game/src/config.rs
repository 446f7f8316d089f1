//! Per-game settings.

use serde::{Deserialize, Serialize};
use skirmish_team::TeamMode;

/// Configuration for one game instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Server ticks between two game ticks.
    pub heartbeat_period: u64,

    /// Server ticks before the first game tick.
    pub heartbeat_delay: u64,

    /// Title shown by scoreboard-style updatables.
    pub scoreboard_title: String,

    /// Prepended to every chat broadcast. Empty disables it.
    pub message_prefix: String,

    /// Whether players joining after the waiting phase become spectators.
    pub allow_spectators: bool,

    /// Team size for this game.
    pub team_mode: TeamMode,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            heartbeat_period: 20,
            heartbeat_delay: 1,
            scoreboard_title: "Skirmish".to_string(),
            message_prefix: "Game > ".to_string(),
            allow_spectators: true,
            team_mode: TeamMode::solo(),
        }
    }
}
