//! Slot registry
//!
//! Fixed-capacity table of monitor slots, addressed by 1-based index. Each
//! slot is empty or owns exactly one occupant. Out-of-range indices are
//! treated as "no slot": reads return `None` and writes are ignored (with
//! a warning), so callers that compute indices from `get_empty_slots` never
//! have to handle an error.

use crate::session::{Session, SessionId};

/// Number of monitor slots in the grid
pub const MAX_MONITOR_INDEX: usize = 8;

/// 1-based slot index in `[1, MAX_MONITOR_INDEX]`
pub type SlotIndex = usize;

/// Anything that can sit in a slot and be found again by identity
pub trait SlotOccupant {
    fn occupant_id(&self) -> SessionId;
}

impl SlotOccupant for Box<dyn Session> {
    fn occupant_id(&self) -> SessionId {
        self.id()
    }
}

/// Fixed-size slot table
pub struct SlotRegistry<T> {
    slots: Vec<Option<T>>,
}

impl<T: SlotOccupant> Default for SlotRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SlotOccupant> SlotRegistry<T> {
    /// Create a registry with `MAX_MONITOR_INDEX` empty slots
    pub fn new() -> Self {
        Self::with_capacity(MAX_MONITOR_INDEX)
    }

    /// Create a registry with `capacity` empty slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether `index` addresses a slot
    pub fn is_valid_index(&self, index: SlotIndex) -> bool {
        (1..=self.slots.len()).contains(&index)
    }

    /// 1-based index of the slot holding `id`, or `None` when absent
    pub fn get_index_of_slot(&self, id: SessionId) -> Option<SlotIndex> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.occupant_id() == id))
            .map(|pos| pos + 1)
    }

    /// Occupant of slot `index`; out of range reads as empty
    pub fn get_slot_by_index(&self, index: SlotIndex) -> Option<&T> {
        if !self.is_valid_index(index) {
            return None;
        }
        self.slots[index - 1].as_ref()
    }

    /// Ascending indices of empty slots
    pub fn get_empty_slots(&self) -> Vec<SlotIndex> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Ascending indices of occupied slots
    pub fn get_used_slots(&self) -> Vec<SlotIndex> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Place `occupant` in slot `index`
    ///
    /// Returns whatever did not end up in the registry: the displaced
    /// previous occupant, or `occupant` itself when `index` is out of range.
    /// The registry never drops an occupant on the caller's behalf.
    pub fn set_slot(&mut self, index: SlotIndex, occupant: T) -> Option<T> {
        if !self.is_valid_index(index) {
            tracing::warn!(index, capacity = self.capacity(), "set_slot ignored: index out of range");
            return Some(occupant);
        }

        debug_assert!(
            self.get_index_of_slot(occupant.occupant_id())
                .map_or(true, |existing| existing == index),
            "occupant already registered in another slot"
        );

        self.slots[index - 1].replace(occupant)
    }

    /// Empty slot `index`, returning its previous occupant
    pub fn clear_slot(&mut self, index: SlotIndex) -> Option<T> {
        if !self.is_valid_index(index) {
            tracing::warn!(index, capacity = self.capacity(), "clear_slot ignored: index out of range");
            return None;
        }
        self.slots[index - 1].take()
    }

    /// Number of occupied slots
    pub fn used_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether every slot is occupied
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Iterate over `(index, occupant)` for occupied slots
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (i + 1, s)))
    }

    /// Iterate mutably over `(index, occupant)` for occupied slots
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|s| (i + 1, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    struct Tile(SessionId);

    impl SlotOccupant for Tile {
        fn occupant_id(&self) -> SessionId {
            self.0
        }
    }

    fn tile() -> Tile {
        Tile(SessionId::next())
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry: SlotRegistry<Tile> = SlotRegistry::new();
        assert_eq!(registry.capacity(), MAX_MONITOR_INDEX);
        assert_eq!(registry.get_empty_slots(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(registry.get_used_slots().is_empty());
    }

    #[test]
    fn test_set_and_lookup() {
        let mut registry = SlotRegistry::new();
        let t = tile();
        let id = t.0;
        assert!(registry.set_slot(3, t).is_none());

        assert_eq!(registry.get_index_of_slot(id), Some(3));
        assert_eq!(registry.get_slot_by_index(3).map(|t| t.0), Some(id));
        assert_eq!(registry.get_used_slots(), vec![3]);
        assert_eq!(registry.get_empty_slots(), vec![1, 2, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_lookup_absent_occupant() {
        let mut registry = SlotRegistry::new();
        registry.set_slot(1, tile());
        assert_eq!(registry.get_index_of_slot(SessionId::next()), None);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut registry = SlotRegistry::new();
        let t = tile();
        let id = t.0;

        let rejected = registry.set_slot(0, t);
        assert_eq!(rejected.map(|t| t.0), Some(id));
        assert!(registry.set_slot(9, tile()).is_some());
        assert!(registry.clear_slot(0).is_none());
        assert!(registry.clear_slot(42).is_none());
        assert!(registry.get_slot_by_index(0).is_none());
        assert!(registry.get_slot_by_index(9).is_none());
        assert_eq!(registry.used_count(), 0);
    }

    #[test]
    fn test_set_returns_displaced_occupant() {
        let mut registry = SlotRegistry::new();
        let first = tile();
        let first_id = first.0;
        registry.set_slot(2, first);

        let displaced = registry.set_slot(2, tile());
        assert_eq!(displaced.map(|t| t.0), Some(first_id));
        assert_eq!(registry.get_index_of_slot(first_id), None);
    }

    #[test]
    fn test_clear_slot_returns_occupant() {
        let mut registry = SlotRegistry::new();
        let t = tile();
        let id = t.0;
        registry.set_slot(5, t);

        assert_eq!(registry.clear_slot(5).map(|t| t.0), Some(id));
        assert!(registry.clear_slot(5).is_none());
        assert_eq!(registry.get_index_of_slot(id), None);
    }

    #[test]
    fn test_random_sequences_partition_slots() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut registry = SlotRegistry::new();
        let all: BTreeSet<SlotIndex> = (1..=MAX_MONITOR_INDEX).collect();

        for _ in 0..2000 {
            let index = rng.random_range(1..=MAX_MONITOR_INDEX);
            if rng.random_bool(0.5) {
                registry.set_slot(index, tile());
            } else {
                registry.clear_slot(index);
            }

            let used: BTreeSet<_> = registry.get_used_slots().into_iter().collect();
            let empty: BTreeSet<_> = registry.get_empty_slots().into_iter().collect();
            assert!(used.is_disjoint(&empty));
            assert_eq!(used.union(&empty).copied().collect::<BTreeSet<_>>(), all);

            for (i, occupant) in registry.iter() {
                assert_eq!(registry.get_index_of_slot(occupant.occupant_id()), Some(i));
            }
        }
    }

    #[test]
    fn test_is_full() {
        let mut registry = SlotRegistry::new();
        for i in 1..=MAX_MONITOR_INDEX {
            assert!(!registry.is_full());
            registry.set_slot(i, tile());
        }
        assert!(registry.is_full());
        assert!(registry.get_empty_slots().is_empty());
    }
}
