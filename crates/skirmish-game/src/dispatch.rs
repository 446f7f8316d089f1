//! Scoped event dispatch.
//!
//! Host occurrences reach games through an [`EventBus`]. A game's event
//! handlers never subscribe one method at a time: each handler declares
//! its whole subscription table up front and a [`ScopedDispatcher`]
//! attaches or detaches that table as a unit.
//!
//! Delivery is filtered per game by [`should_handle`], so a handler only
//! sees occurrences that concern its own game:
//!
//! | Scope | Delivered when |
//! |---|---|
//! | game | it names this game |
//! | player | the player is in this game |
//! | world | it is inside this game's arena, or (block break/place) the acting player is in this game |
//! | entity | player entities: the player rule; other entities: the arena rule |
//! | unscoped | always |

use std::collections::VecDeque;
use std::fmt;

use skirmish_protocol::{EntityRef, Event, EventPriority, GameId, GameState, Occurrence, OccurrenceKind, OccurrenceScope};

use crate::{GameContext, GameError};

// ---------------------------------------------------------------------------
// Handler side
// ---------------------------------------------------------------------------

/// One entry of a handler's subscription table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub kind: OccurrenceKind,
    pub priority: EventPriority,
    /// Also run when an earlier subscription cancelled the event.
    pub handle_cancelled: bool,
}

impl Subscription {
    /// Normal priority, skipped for cancelled events.
    pub fn new(kind: OccurrenceKind) -> Self {
        Self {
            kind,
            priority: EventPriority::Normal,
            handle_cancelled: false,
        }
    }

    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn receive_cancelled(mut self) -> Self {
        self.handle_cancelled = true;
        self
    }
}

/// A game-side consumer of host occurrences.
///
/// `subscriptions` is read once, at registration. `handle_event` is only
/// called for kinds in that table and only for occurrences that passed
/// the game's scope filter.
pub trait GameEventHandler: Send {
    fn subscriptions(&self) -> Vec<Subscription>;

    fn handle_event(&mut self, ctx: &mut GameContext, event: &mut Event);
}

/// Which of a game's handlers a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerScope {
    /// Registered for the whole life of the game.
    Game,
    /// The `index`-th extra handler of one phase, registered only while
    /// that phase is active.
    State { state: GameState, index: usize },
}

/// Identifies one registered handler across every game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    pub game: GameId,
    pub scope: ListenerScope,
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            ListenerScope::Game => write!(f, "{}/game", self.game),
            ListenerScope::State { state, index } => write!(f, "{}/{}#{}", self.game, state, index),
        }
    }
}

/// An event handler plus whether its table is attached to the bus.
///
/// `register` twice or `unregister` while detached are caller bugs and
/// fail with [`GameError::AlreadyRegistered`] / [`GameError::NotRegistered`].
pub struct ScopedDispatcher {
    key: ListenerKey,
    handler: Box<dyn GameEventHandler>,
    registered: bool,
}

impl ScopedDispatcher {
    pub fn new(key: ListenerKey, handler: Box<dyn GameEventHandler>) -> Self {
        Self {
            key,
            handler,
            registered: false,
        }
    }

    pub fn key(&self) -> &ListenerKey {
        &self.key
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Attaches every subscription of the handler. Returns how many.
    ///
    /// # Errors
    /// [`GameError::AlreadyRegistered`] if already attached.
    pub fn register(&mut self, bus: &mut EventBus) -> Result<usize, GameError> {
        if self.registered {
            return Err(GameError::AlreadyRegistered(self.key.to_string()));
        }
        let subscriptions = self.handler.subscriptions();
        let count = subscriptions.len();
        bus.subscribe(&self.key, subscriptions);
        self.registered = true;
        tracing::debug!(listener = %self.key, subscriptions = count, "event handler registered");
        Ok(count)
    }

    /// Detaches every subscription of the handler. Returns how many.
    ///
    /// # Errors
    /// [`GameError::NotRegistered`] if not attached.
    pub fn unregister(&mut self, bus: &mut EventBus) -> Result<usize, GameError> {
        if !self.registered {
            return Err(GameError::NotRegistered(self.key.to_string()));
        }
        let count = bus.unsubscribe(&self.key);
        self.registered = false;
        tracing::debug!(listener = %self.key, subscriptions = count, "event handler unregistered");
        Ok(count)
    }

    pub(crate) fn deliver(&mut self, ctx: &mut GameContext, event: &mut Event) {
        self.handler.handle_event(ctx, event);
    }
}

impl fmt::Debug for ScopedDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedDispatcher")
            .field("key", &self.key)
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Bus side
// ---------------------------------------------------------------------------

/// One attached subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEntry {
    pub listener: ListenerKey,
    pub subscription: Subscription,
    /// Attachment order; breaks ties within a priority.
    seq: u64,
}

/// The host-side subscription table plus the queue of occurrences games
/// emitted while being driven.
///
/// The bus holds no handler objects. Handlers stay inside their game; the
/// registry looks the game up by [`ListenerKey`] and delivers there.
#[derive(Debug, Default)]
pub struct EventBus {
    /// Sorted by `(priority, seq)`.
    entries: Vec<BusEntry>,
    next_seq: u64,
    outbox: VecDeque<Occurrence>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&mut self, listener: &ListenerKey, subscriptions: Vec<Subscription>) {
        for subscription in subscriptions {
            self.next_seq += 1;
            self.entries.push(BusEntry {
                listener: listener.clone(),
                subscription,
                seq: self.next_seq,
            });
        }
        self.entries
            .sort_by_key(|entry| (entry.subscription.priority, entry.seq));
    }

    pub(crate) fn unsubscribe(&mut self, listener: &ListenerKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.listener != listener);
        before - self.entries.len()
    }

    pub fn is_subscribed(&self, listener: &ListenerKey) -> bool {
        self.entries.iter().any(|entry| &entry.listener == listener)
    }

    /// Subscriptions for `kind`, lowest priority first, ties in
    /// attachment order.
    pub fn subscribers(&self, kind: OccurrenceKind) -> Vec<BusEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.subscription.kind == kind)
            .cloned()
            .collect()
    }

    /// Attached subscriptions across every listener.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queues an occurrence for dispatch.
    pub fn post(&mut self, occurrence: Occurrence) {
        self.outbox.push_back(occurrence);
    }

    pub(crate) fn next_posted(&mut self) -> Option<Occurrence> {
        self.outbox.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Whether an occurrence concerns the game behind `ctx`.
pub fn should_handle(ctx: &GameContext, occurrence: &Occurrence) -> bool {
    match occurrence.scope() {
        OccurrenceScope::Game(game) => game == ctx.id(),
        OccurrenceScope::Player(player) => ctx.is_in_game(player),
        OccurrenceScope::World { position, actor } => {
            ctx.arena().contains(position) || actor.is_some_and(|player| ctx.is_in_game(player))
        }
        OccurrenceScope::Entity { entity, position } => match entity {
            EntityRef::Player(player) => ctx.is_in_game(player),
            EntityRef::Other(_) => ctx.arena().contains(position),
        },
        OccurrenceScope::Unscoped => true,
    }
}
