//! Host occurrences: the things that happen on the host that a game may
//! want to react to.
//!
//! Every occurrence falls into one scope category. The category is what
//! the game core uses to decide whether an occurrence concerns a given
//! game instance; see [`Occurrence::scope`].

use serde::{Deserialize, Serialize};

use crate::{GameId, GameState, PlayerId, Position, TeamId};

/// Something in the host that is either a player or another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Player(PlayerId),
    /// A non-player entity, identified by the host's runtime id.
    Other(u64),
}

/// A typed record delivered by the host event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Occurrence {
    // -- game-scoped ------------------------------------------------------
    /// A game changed lifecycle phase.
    GameStateChange {
        game: GameId,
        old: GameState,
        new: GameState,
    },
    /// A game decided its outcome. `winner` is `None` for a draw.
    GameWin {
        game: GameId,
        winner: Option<TeamId>,
    },

    // -- player-scoped ----------------------------------------------------
    PlayerChat { player: PlayerId, message: String },
    PlayerMove { player: PlayerId, to: Position },
    PlayerInteract { player: PlayerId, position: Position },
    PlayerQuit { player: PlayerId },

    // -- world-scoped -----------------------------------------------------
    /// A player broke a block. Also relevant when a non-member breaks a
    /// block inside an arena.
    BlockBreak { player: PlayerId, position: Position },
    /// A player placed a block.
    BlockPlace { player: PlayerId, position: Position },
    /// A block changed on its own (growth, decay, fluid flow).
    BlockUpdate { position: Position },

    // -- entity-scoped ----------------------------------------------------
    EntityDamage {
        entity: EntityRef,
        position: Position,
        amount: f32,
        attacker: Option<EntityRef>,
    },
    EntityDeath { entity: EntityRef, position: Position },

    // -- unrecognised -----------------------------------------------------
    /// Anything the core has no category for. Delivered to every
    /// subscriber of [`OccurrenceKind::Custom`].
    Custom { name: String, payload: String },
}

/// The type of an occurrence without its data. Subscriptions are keyed by
/// this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OccurrenceKind {
    GameStateChange,
    GameWin,
    PlayerChat,
    PlayerMove,
    PlayerInteract,
    PlayerQuit,
    BlockBreak,
    BlockPlace,
    BlockUpdate,
    EntityDamage,
    EntityDeath,
    Custom,
}

/// Which part of the host an occurrence is about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OccurrenceScope<'a> {
    /// Names one specific game.
    Game(&'a GameId),
    /// Performed by a player.
    Player(PlayerId),
    /// Positioned in a world. `actor` is set for the kinds where the acting
    /// player also counts (block break and place).
    World {
        position: &'a Position,
        actor: Option<PlayerId>,
    },
    /// Happened to an entity, which may or may not be a player.
    Entity {
        entity: EntityRef,
        position: &'a Position,
    },
    /// No category; delivery is unconditional.
    Unscoped,
}

impl Occurrence {
    pub fn kind(&self) -> OccurrenceKind {
        match self {
            Self::GameStateChange { .. } => OccurrenceKind::GameStateChange,
            Self::GameWin { .. } => OccurrenceKind::GameWin,
            Self::PlayerChat { .. } => OccurrenceKind::PlayerChat,
            Self::PlayerMove { .. } => OccurrenceKind::PlayerMove,
            Self::PlayerInteract { .. } => OccurrenceKind::PlayerInteract,
            Self::PlayerQuit { .. } => OccurrenceKind::PlayerQuit,
            Self::BlockBreak { .. } => OccurrenceKind::BlockBreak,
            Self::BlockPlace { .. } => OccurrenceKind::BlockPlace,
            Self::BlockUpdate { .. } => OccurrenceKind::BlockUpdate,
            Self::EntityDamage { .. } => OccurrenceKind::EntityDamage,
            Self::EntityDeath { .. } => OccurrenceKind::EntityDeath,
            Self::Custom { .. } => OccurrenceKind::Custom,
        }
    }

    pub fn scope(&self) -> OccurrenceScope<'_> {
        match self {
            Self::GameStateChange { game, .. } | Self::GameWin { game, .. } => {
                OccurrenceScope::Game(game)
            }
            Self::PlayerChat { player, .. }
            | Self::PlayerMove { player, .. }
            | Self::PlayerInteract { player, .. }
            | Self::PlayerQuit { player } => OccurrenceScope::Player(*player),
            Self::BlockBreak { player, position } | Self::BlockPlace { player, position } => {
                OccurrenceScope::World {
                    position,
                    actor: Some(*player),
                }
            }
            Self::BlockUpdate { position } => OccurrenceScope::World {
                position,
                actor: None,
            },
            Self::EntityDamage {
                entity, position, ..
            }
            | Self::EntityDeath { entity, position } => OccurrenceScope::Entity {
                entity: *entity,
                position,
            },
            Self::Custom { .. } => OccurrenceScope::Unscoped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorldId;

    fn pos() -> Position {
        Position::new(WorldId(1), 1.0, 2.0, 3.0)
    }

    #[test]
    fn test_kind_matches_variant() {
        let occ = Occurrence::PlayerQuit {
            player: PlayerId(1),
        };
        assert_eq!(occ.kind(), OccurrenceKind::PlayerQuit);
        let occ = Occurrence::Custom {
            name: "x".into(),
            payload: String::new(),
        };
        assert_eq!(occ.kind(), OccurrenceKind::Custom);
    }

    #[test]
    fn test_block_break_scope_carries_actor() {
        let occ = Occurrence::BlockBreak {
            player: PlayerId(4),
            position: pos(),
        };
        match occ.scope() {
            OccurrenceScope::World { actor, position } => {
                assert_eq!(actor, Some(PlayerId(4)));
                assert_eq!(position.world, WorldId(1));
            }
            other => panic!("unexpected scope {other:?}"),
        }
    }

    #[test]
    fn test_block_update_scope_has_no_actor() {
        let occ = Occurrence::BlockUpdate { position: pos() };
        assert!(matches!(
            occ.scope(),
            OccurrenceScope::World { actor: None, .. }
        ));
    }

    #[test]
    fn test_game_scope_names_game() {
        let occ = Occurrence::GameWin {
            game: GameId::new("g1"),
            winner: Some(TeamId(2)),
        };
        assert!(matches!(occ.scope(), OccurrenceScope::Game(id) if id.as_str() == "g1"));
    }

    #[test]
    fn test_occurrence_json_is_tagged() {
        let occ = Occurrence::PlayerChat {
            player: PlayerId(3),
            message: "gg".into(),
        };
        let json = serde_json::to_value(&occ).unwrap();
        assert_eq!(json["type"], "player_chat");
        assert_eq!(json["player"], 3);
    }
}
