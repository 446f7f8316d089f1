//! Teams for Skirmish.
//!
//! A game's players compete in teams. This crate owns:
//!
//! 1. **Rosters**: who is on which [`Team`], in join order.
//! 2. **Liveness**: a parallel [`TeamState`] per team recording whether
//!    each member is [`MemberState::Alive`] or [`MemberState::Dead`].
//! 3. **Team modes**: how many members a team may hold ([`TeamMode`]).
//!
//! [`TeamManager`] keeps rosters and liveness in step: a member gets a
//! liveness entry exactly when they join a team and loses it when they
//! leave.
//!
//! # Liveness policy
//!
//! A team is alive while **at least one** of its members is alive. A
//! team without members is not alive.

mod error;
mod manager;
mod member;
mod mode;
mod state;
mod team;

pub use error::TeamError;
pub use manager::{TeamConfig, TeamData, TeamManager};
pub use member::{MemberData, MemberState};
pub use mode::TeamMode;
pub use state::TeamState;
pub use team::Team;
