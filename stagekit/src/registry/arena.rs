//! Slot storage for registered stages.

use std::fmt;

/// A handle to a registry slot.
///
/// Carries the slot index and a generation counter, so a handle left over
/// from a destroyed stage never matches the stage that reuses its slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId {
    idx: u32,
    generation: u32,
}

impl StageId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StageId({}@gen{})", self.idx, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    /// Insertion sequence number; higher is newer.
    seq: u64,
    value: Option<T>,
}

/// Generational slot arena with O(1) insert and remove.
///
/// Iteration is newest-first, matching the order in which stages were
/// linked into the registry.
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    next_seq: u64,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            next_seq: 0,
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> StageId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.len += 1;

        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.seq = seq;
            slot.value = Some(value);
            return StageId {
                idx,
                generation: slot.generation,
            };
        }

        let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            seq,
            value: Some(value),
        });
        StageId { idx, generation: 0 }
    }

    /// Removes the value behind `id`. Stale ids are ignored.
    pub(crate) fn remove(&mut self, id: StageId) -> Option<T> {
        let slot = self.slots.get_mut(id.idx as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        // Bump generation so old handles immediately fail validation.
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.idx);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, id: StageId) -> Option<&T> {
        self.slots
            .get(id.idx as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Live values in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    pub(crate) fn newest_first(&self) -> Vec<&T> {
        let mut live: Vec<&Slot<T>> = self
            .slots
            .iter()
            .filter(|slot| slot.value.is_some())
            .collect();
        live.sort_unstable_by(|a, b| b.seq.cmp(&a.seq));
        live.into_iter().filter_map(|slot| slot.value.as_ref()).collect()
    }

    /// Empties the arena, returning the values newest-first.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut taken: Vec<(u64, T)> = Vec::with_capacity(self.len);
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(u32::try_from(idx).unwrap_or(u32::MAX));
                taken.push((slot.seq, value));
            }
        }
        self.len = 0;
        taken.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        taken.into_iter().map(|(_, value)| value).collect()
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
