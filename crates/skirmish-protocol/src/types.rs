//! Identity and value types shared by every Skirmish layer.
//!
//! Every identifier is a newtype so a `TeamId` can never be passed where
//! a `PlayerId` is expected, even though both wrap an integer.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The stable identity key of a player on the host.
///
/// Usernames can change between sessions; this key cannot. Every
/// membership set in the engine is keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The unique identifier of a game instance.
///
/// Chosen by whoever creates the game (e.g. `"skywars-3"`), so it is a
/// string rather than a counter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A team identifier, unique within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies an arena inside the arena pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(pub u32);

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// Identifies a host world (a loaded map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub u32);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// A player as the host knows them: identity key plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
}

impl Player {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id: PlayerId(id),
            username: username.into(),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}

/// A point inside a host world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Self { world, x, y, z }
    }
}

/// An axis-aligned box. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds {
    /// Builds a box from two arbitrary corners, normalising min/max per axis.
    pub fn from_corners(a: [f64; 3], b: [f64; 3]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
            max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
        }
    }

    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        (self.min[0]..=self.max[0]).contains(&x)
            && (self.min[1]..=self.max[1]).contains(&y)
            && (self.min[2]..=self.max[2]).contains(&z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_game_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&GameId::new("duels-1")).unwrap();
        assert_eq!(json, "\"duels-1\"");
        let back: GameId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "duels-1");
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(TeamId(3).to_string(), "#3");
        assert_eq!(ArenaId(1).to_string(), "A-1");
        assert_eq!(WorldId(9).to_string(), "W-9");
        assert_eq!(Player::new(1, "Alice").to_string(), "Alice (P-1)");
    }

    #[test]
    fn test_bounds_from_corners_normalises() {
        let b = Bounds::from_corners([10.0, 0.0, -5.0], [0.0, 64.0, 5.0]);
        assert_eq!(b.min, [0.0, 0.0, -5.0]);
        assert_eq!(b.max, [10.0, 64.0, 5.0]);
    }

    #[test]
    fn test_bounds_contains_is_inclusive() {
        let b = Bounds::from_corners([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        assert!(b.contains(0.0, 0.0, 0.0));
        assert!(b.contains(10.0, 10.0, 10.0));
        assert!(b.contains(5.0, 2.5, 7.0));
        assert!(!b.contains(10.5, 5.0, 5.0));
        assert!(!b.contains(5.0, -0.1, 5.0));
    }
}
