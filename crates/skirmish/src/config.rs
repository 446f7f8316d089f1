//! Engine configuration.

use serde::{Deserialize, Serialize};
use skirmish_game::{Arena, ArenaPool};
use skirmish_tick::ClockConfig;

use crate::SkirmishError;

/// Settings for one [`Engine`](crate::Engine).
///
/// Every field has a default, so a config file only needs the parts it
/// changes:
///
/// ```json
/// {
///   "clock": { "tick_rate_hz": 20 },
///   "arenas": [
///     { "id": 1, "name": "Crater", "world": 1 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The server clock that drives every heartbeat.
    pub clock: ClockConfig,

    /// Arenas available to games, in the order they are handed out.
    pub arenas: Vec<Arena>,

    /// Capacity of the engine's command channel.
    pub command_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            arenas: Vec::new(),
            command_buffer: 64,
        }
    }
}

impl EngineConfig {
    /// # Errors
    /// [`SkirmishError::Config`] if the text is not a valid config.
    pub fn from_json_str(json: &str) -> Result<Self, SkirmishError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the arena pool. Duplicate arena ids are skipped with a
    /// warning.
    pub fn arena_pool(&self) -> ArenaPool {
        self.arenas.iter().cloned().collect()
    }
}
