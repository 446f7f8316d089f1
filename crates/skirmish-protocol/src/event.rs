//! The envelope an occurrence travels in while it is being dispatched.

use serde::{Deserialize, Serialize};

use crate::Occurrence;

/// Order in which subscriptions see an event. Lower priorities run first
/// so higher ones get the final say; `Monitor` runs last and should only
/// observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum EventPriority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
    Monitor,
}

/// An occurrence being dispatched, plus its cancellation flag.
///
/// Cancellation is opaque to the core: it only decides whether later
/// subscriptions that did not opt into cancelled events still run. What
/// "cancelled" means for the host is up to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    occurrence: Occurrence,
    cancelled: bool,
}

impl Event {
    pub fn new(occurrence: Occurrence) -> Self {
        Self {
            occurrence,
            cancelled: false,
        }
    }

    pub fn occurrence(&self) -> &Occurrence {
        &self.occurrence
    }

    pub fn into_occurrence(self) -> Occurrence {
        self.occurrence
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn uncancel(&mut self) {
        self.cancelled = false;
    }
}

impl From<Occurrence> for Event {
    fn from(occurrence: Occurrence) -> Self {
        Self::new(occurrence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerId;

    #[test]
    fn test_priority_order() {
        assert!(EventPriority::Lowest < EventPriority::Normal);
        assert!(EventPriority::Highest < EventPriority::Monitor);
        assert_eq!(EventPriority::default(), EventPriority::Normal);
    }

    #[test]
    fn test_cancel_flag() {
        let mut event = Event::new(Occurrence::PlayerQuit {
            player: PlayerId(1),
        });
        assert!(!event.is_cancelled());
        event.cancel();
        assert!(event.is_cancelled());
        event.uncancel();
        assert!(!event.is_cancelled());
    }
}
