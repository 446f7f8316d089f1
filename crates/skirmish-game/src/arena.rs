//! Arenas and the pool that hands them out.
//!
//! An arena is a reusable play space. The pool records which arenas are
//! bound to a running game; a game holds its arena from creation until
//! `finish` and then hands it back.
//!
//! The pool has no locking. Finding an open arena and marking it occupied
//! must happen as one step, which [`ArenaPool::claim_open_arena`] does
//! under the `&mut` borrow.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use skirmish_protocol::{ArenaId, Bounds, Position, WorldId};

use crate::GameError;

/// A bounded play space in one host world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub id: ArenaId,
    pub name: String,
    pub world: WorldId,
    /// `None` means the whole world belongs to the arena.
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

impl Arena {
    pub fn new(id: ArenaId, name: impl Into<String>, world: WorldId) -> Self {
        Self {
            id,
            name: name.into(),
            world,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Same world and, when bounds are set, inside them.
    pub fn contains(&self, position: &Position) -> bool {
        position.world == self.world
            && self
                .bounds
                .is_none_or(|b| b.contains(position.x, position.y, position.z))
    }
}

/// Every arena the host knows about, plus which ones are occupied.
///
/// Arenas keep the order they were added in; `find_open_arena` returns
/// the first free one in that order.
#[derive(Debug, Default)]
pub struct ArenaPool {
    arenas: Vec<Arena>,
    occupied: HashSet<ArenaId>,
}

impl ArenaPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// [`GameError::DuplicateArena`] if the id is taken.
    pub fn add(&mut self, arena: Arena) -> Result<(), GameError> {
        if self.get(arena.id).is_some() {
            return Err(GameError::DuplicateArena(arena.id));
        }
        tracing::debug!(arena_id = %arena.id, name = %arena.name, "arena added");
        self.arenas.push(arena);
        Ok(())
    }

    /// Takes an arena out of the pool.
    ///
    /// # Errors
    /// - [`GameError::UnknownArena`] if it is not in the pool
    /// - [`GameError::ArenaOccupied`] if a game holds it
    pub fn remove(&mut self, id: ArenaId) -> Result<Arena, GameError> {
        let index = self
            .arenas
            .iter()
            .position(|a| a.id == id)
            .ok_or(GameError::UnknownArena(id))?;
        if self.occupied.contains(&id) {
            return Err(GameError::ArenaOccupied(id));
        }
        tracing::debug!(arena_id = %id, "arena removed");
        Ok(self.arenas.remove(index))
    }

    pub fn get(&self, id: ArenaId) -> Option<&Arena> {
        self.arenas.iter().find(|a| a.id == id)
    }

    /// The first arena no game holds.
    pub fn find_open_arena(&self) -> Option<&Arena> {
        self.arenas.iter().find(|a| !self.occupied.contains(&a.id))
    }

    /// # Errors
    /// [`GameError::UnknownArena`] if it is not in the pool.
    pub fn set_occupied(&mut self, id: ArenaId, occupied: bool) -> Result<(), GameError> {
        if self.get(id).is_none() {
            return Err(GameError::UnknownArena(id));
        }
        if occupied {
            self.occupied.insert(id);
        } else {
            self.occupied.remove(&id);
        }
        Ok(())
    }

    pub fn is_occupied(&self, id: ArenaId) -> bool {
        self.occupied.contains(&id)
    }

    /// Marks a specific arena occupied, failing if a game already holds it.
    ///
    /// # Errors
    /// - [`GameError::UnknownArena`] if it is not in the pool
    /// - [`GameError::ArenaOccupied`] if a game holds it
    pub fn occupy(&mut self, id: ArenaId) -> Result<Arena, GameError> {
        let arena = self.get(id).cloned().ok_or(GameError::UnknownArena(id))?;
        if !self.occupied.insert(id) {
            return Err(GameError::ArenaOccupied(id));
        }
        tracing::info!(arena_id = %id, "arena claimed");
        Ok(arena)
    }

    /// Finds the first open arena and marks it occupied in one step.
    pub fn claim_open_arena(&mut self) -> Option<Arena> {
        let arena = self.find_open_arena()?.clone();
        self.occupied.insert(arena.id);
        tracing::info!(arena_id = %arena.id, "arena claimed");
        Some(arena)
    }

    /// Hands an arena back to the pool.
    ///
    /// # Errors
    /// [`GameError::UnknownArena`] if it is not in the pool.
    pub fn release(&mut self, id: ArenaId) -> Result<(), GameError> {
        self.set_occupied(id, false)?;
        tracing::info!(arena_id = %id, "arena released");
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arena> {
        self.arenas.iter()
    }

    pub fn open_count(&self) -> usize {
        self.arenas.len() - self.occupied.len()
    }

    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }
}

impl FromIterator<Arena> for ArenaPool {
    /// Arenas with a repeated id are skipped.
    fn from_iter<I: IntoIterator<Item = Arena>>(iter: I) -> Self {
        let mut pool = Self::new();
        for arena in iter {
            if let Err(err) = pool.add(arena) {
                tracing::warn!(error = %err, "skipping arena");
            }
        }
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(id: u32) -> Arena {
        Arena::new(ArenaId(id), format!("arena-{id}"), WorldId(id))
    }

    #[test]
    fn test_contains_checks_world_then_bounds() {
        let open = arena(1);
        assert!(open.contains(&Position::new(WorldId(1), 1e6, -4.0, 0.0)));
        assert!(!open.contains(&Position::new(WorldId(2), 0.0, 0.0, 0.0)));

        let boxed = arena(1).with_bounds(Bounds::from_corners([0.0; 3], [10.0; 3]));
        assert!(boxed.contains(&Position::new(WorldId(1), 5.0, 5.0, 5.0)));
        assert!(!boxed.contains(&Position::new(WorldId(1), 11.0, 5.0, 5.0)));
    }

    #[test]
    fn test_find_open_skips_occupied() {
        let mut pool: ArenaPool = [arena(1), arena(2)].into_iter().collect();
        assert_eq!(pool.find_open_arena().map(|a| a.id), Some(ArenaId(1)));

        pool.set_occupied(ArenaId(1), true).unwrap();
        assert_eq!(pool.find_open_arena().map(|a| a.id), Some(ArenaId(2)));

        pool.set_occupied(ArenaId(2), true).unwrap();
        assert!(pool.find_open_arena().is_none());
        assert_eq!(pool.open_count(), 0);
    }

    #[test]
    fn test_claim_marks_occupied() {
        let mut pool: ArenaPool = [arena(1), arena(2)].into_iter().collect();
        let first = pool.claim_open_arena().unwrap();
        let second = pool.claim_open_arena().unwrap();
        assert_ne!(first.id, second.id);
        assert!(pool.claim_open_arena().is_none());

        pool.release(first.id).unwrap();
        assert_eq!(pool.claim_open_arena().map(|a| a.id), Some(first.id));
    }

    #[test]
    fn test_occupy_twice_fails() {
        let mut pool: ArenaPool = [arena(1)].into_iter().collect();
        pool.occupy(ArenaId(1)).unwrap();
        assert_eq!(pool.occupy(ArenaId(1)), Err(GameError::ArenaOccupied(ArenaId(1))));
        assert_eq!(pool.occupy(ArenaId(9)), Err(GameError::UnknownArena(ArenaId(9))));
    }

    #[test]
    fn test_remove_refuses_occupied_arena() {
        let mut pool: ArenaPool = [arena(1)].into_iter().collect();
        pool.set_occupied(ArenaId(1), true).unwrap();
        assert_eq!(pool.remove(ArenaId(1)), Err(GameError::ArenaOccupied(ArenaId(1))));
        pool.release(ArenaId(1)).unwrap();
        assert_eq!(pool.remove(ArenaId(1)).unwrap().id, ArenaId(1));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut pool = ArenaPool::new();
        pool.add(arena(1)).unwrap();
        assert_eq!(pool.add(arena(1)), Err(GameError::DuplicateArena(ArenaId(1))));
        let pool: ArenaPool = [arena(1), arena(1), arena(2)].into_iter().collect();
        assert_eq!(pool.len(), 2);
    }
}
