//! Host contract for Skirmish.
//!
//! This crate defines the records that cross the boundary between the
//! match engine and the host it runs inside:
//!
//! - **Identity** ([`PlayerId`], [`GameId`], [`TeamId`], [`ArenaId`],
//!   [`WorldId`]) and small value types ([`Player`], [`Position`],
//!   [`Bounds`]).
//! - **Lifecycle phase** ([`GameState`]), shared here because it travels
//!   inside game-scoped occurrences.
//! - **Occurrences** ([`Occurrence`], [`Event`]): the typed records the
//!   host event bus delivers, and the [`OccurrenceScope`] used to decide
//!   which game instance they belong to.
//!
//! # Architecture
//!
//! ```text
//! Host (players, worlds, scheduler) → Protocol (records) → Game core
//! ```
//!
//! Nothing in here knows about teams, rounds or registries.

mod event;
mod occurrence;
mod state;
mod types;

pub use event::{Event, EventPriority};
pub use occurrence::{EntityRef, Occurrence, OccurrenceKind, OccurrenceScope};
pub use state::GameState;
pub use types::{ArenaId, Bounds, GameId, Player, PlayerId, Position, TeamId, WorldId};
