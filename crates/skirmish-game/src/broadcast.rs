//! Broadcast records.
//!
//! The game decides who hears something; the host decides how it is
//! delivered. Games push [`Broadcast`]s into an outbox that the host
//! drains after every tick or dispatch.

use serde::{Deserialize, Serialize};
use skirmish_protocol::PlayerId;

/// What kind of output a broadcast is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BroadcastKind {
    /// A chat line.
    Message { text: String },
    /// A short line above the hotbar.
    Tip { text: String },
    /// A centered popup.
    Popup { text: String },
    Sound { name: String, volume: f32, pitch: f32 },
}

/// Output for a fixed set of players.
///
/// `recipients` is a snapshot taken when the broadcast was made. A player
/// who joins afterwards does not receive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub recipients: Vec<PlayerId>,
    #[serde(flatten)]
    pub kind: BroadcastKind,
}

impl Broadcast {
    pub fn new(recipients: Vec<PlayerId>, kind: BroadcastKind) -> Self {
        Self { recipients, kind }
    }
}
