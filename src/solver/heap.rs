//! Binary min-heap over the solver's cell arena with back-indexed
//! slots: every `Info` record stores its own position in the heap's
//! backing array, so an improved distance is a direct O(log n)
//! decrease-key instead of a linear scan.

use crate::maze::Direction;

use super::Info;

/// Sentinel slot meaning "not currently in the heap".
pub const NOT_IN_HEAP: u16 = u16::MAX;

/// Frontier ordering: smallest distance first; among equal distances
/// prefer the longer straight run (fewer projected turns), then the
/// fixed direction priority order for determinism.
fn before(a: &Info, b: &Info) -> bool {
    if a.distance != b.distance {
        return a.distance < b.distance;
    }
    if a.run_len != b.run_len {
        return a.run_len > b.run_len;
    }
    Direction::ALL
        .iter()
        .position(|d| *d == a.heading)
        .unwrap_or(usize::MAX)
        < Direction::ALL
            .iter()
            .position(|d| *d == b.heading)
            .unwrap_or(usize::MAX)
}

/// Min-heap of cell indices into the solver's `Info` arena. The arena
/// is passed into every operation so the heap itself stays a plain
/// index vector.
#[derive(Debug, Default)]
pub struct InfoHeap {
    slots: Vec<u16>,
}

impl InfoHeap {
    pub fn new() -> InfoHeap {
        InfoHeap { slots: Vec::new() }
    }

    /// Drop all entries. Stale `heap_slot` values in the arena are
    /// harmless: a new epoch overwrites them on first touch.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Insert a cell not currently in the heap.
    pub fn push(&mut self, arena: &mut [Info], cell: u16) {
        let slot = self.slots.len();
        self.slots.push(cell);
        arena[cell as usize].heap_slot = slot as u16;
        self.sift_up(arena, slot);
    }

    /// Remove and return the cell with the smallest distance.
    pub fn pop(&mut self, arena: &mut [Info]) -> Option<u16> {
        let top = *self.slots.first()?;
        arena[top as usize].heap_slot = NOT_IN_HEAP;
        let last = self.slots.len() - 1;
        if last > 0 {
            self.slots.swap(0, last);
            arena[self.slots[0] as usize].heap_slot = 0;
        }
        self.slots.pop();
        if !self.slots.is_empty() {
            self.sift_down(arena, 0);
        }
        Some(top)
    }

    /// Restore heap order after a cell's distance improved in place.
    pub fn decrease(&mut self, arena: &mut [Info], cell: u16) {
        let slot = arena[cell as usize].heap_slot;
        debug_assert_ne!(slot, NOT_IN_HEAP);
        self.sift_up(arena, slot as usize);
    }

    /// Swap two slots, keeping both records' back-indices in step.
    fn swap(&mut self, arena: &mut [Info], a: usize, b: usize) {
        self.slots.swap(a, b);
        arena[self.slots[a] as usize].heap_slot = a as u16;
        arena[self.slots[b] as usize].heap_slot = b as u16;
    }

    fn sift_up(&mut self, arena: &mut [Info], mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if before(
                &arena[self.slots[slot] as usize],
                &arena[self.slots[parent] as usize],
            ) {
                self.swap(arena, slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, arena: &mut [Info], mut slot: usize) {
        loop {
            let mut smallest = slot;
            for child in [2 * slot + 1, 2 * slot + 2] {
                if child < self.slots.len()
                    && before(
                        &arena[self.slots[child] as usize],
                        &arena[self.slots[smallest] as usize],
                    )
                {
                    smallest = child;
                }
            }
            if smallest == slot {
                break;
            }
            self.swap(arena, slot, smallest);
            slot = smallest;
        }
    }
}
