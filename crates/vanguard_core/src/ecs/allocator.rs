//! # Identity Allocator
//!
//! Issues and recycles [`EntityId`]s.
//!
//! - Freed indices go on a free list and are preferred over fresh ones
//! - Each free bumps the slot's generation, invalidating old identifiers
//! - Exhaustion returns [`EntityId::INVALID`]; nothing here panics or errors

use super::bitset::SlotBits;
use super::entity::{EntityId, MAX_GENERATION, MAX_INDEX};

/// First generation handed out for a slot. Zero is reserved for the sentinel.
const FIRST_GENERATION: u32 = 1;

/// Returns the generation that follows `generation`, skipping zero on wrap.
#[inline]
#[must_use]
pub const fn next_generation(generation: u32) -> u32 {
    if generation >= MAX_GENERATION {
        FIRST_GENERATION
    } else {
        generation + 1
    }
}

/// Generational index allocator with a fixed capacity.
///
/// # Example
///
/// ```rust
/// use vanguard_core::IdAllocator;
///
/// let mut ids = IdAllocator::new(2);
/// let a = ids.allocate();
/// let _b = ids.allocate();
/// assert!(ids.allocate().is_null());
///
/// ids.free(a);
/// let c = ids.allocate();
/// assert_eq!(c.index(), a.index());
/// assert!(!ids.is_valid(a));
/// ```
#[derive(Clone, Debug)]
pub struct IdAllocator {
    /// Maximum number of simultaneously live identifiers.
    capacity: u32,
    /// Current generation per issued slot. Its length is the high-water mark.
    generations: Vec<u32>,
    /// Slots currently handed out.
    allocated: SlotBits,
    /// Recyclable slot indices (LIFO).
    free_list: Vec<u32>,
}

impl IdAllocator {
    /// Creates an allocator for up to `capacity` live identifiers.
    ///
    /// `capacity` is clamped to the number of indices an [`EntityId`] can
    /// address.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_reserve(capacity, 0)
    }

    /// Like [`new`](Self::new), pre-reserving bookkeeping for `reserve` slots.
    #[must_use]
    pub fn with_reserve(capacity: usize, reserve: usize) -> Self {
        let capacity = u32::try_from(capacity)
            .unwrap_or(u32::MAX)
            .min(MAX_INDEX + 1);
        let reserve = reserve.min(capacity as usize);

        Self {
            capacity,
            generations: Vec::with_capacity(reserve),
            allocated: SlotBits::with_capacity(reserve),
            free_list: Vec::new(),
        }
    }

    /// Maximum number of simultaneously live identifiers.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Number of currently live identifiers.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.allocated.len()
    }

    /// Number of distinct slot indices ever issued.
    #[inline]
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.generations.len()
    }

    /// Number of recycled indices waiting on the free list.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Issues an identifier.
    ///
    /// Prefers a recycled index; otherwise extends the high-water mark.
    /// Returns [`EntityId::INVALID`] once every slot is live.
    pub fn allocate(&mut self) -> EntityId {
        let index = if let Some(index) = self.free_list.pop() {
            index
        } else if self.generations.len() < self.capacity as usize {
            self.generations.push(FIRST_GENERATION);
            #[allow(clippy::cast_possible_truncation)]
            let index = (self.generations.len() - 1) as u32;
            index
        } else {
            return EntityId::INVALID;
        };

        self.allocated.insert(index as usize);
        EntityId::new(index, self.generations[index as usize])
    }

    /// Releases an identifier.
    ///
    /// Returns `false` and does nothing if `id` is stale, unknown, already
    /// freed or the sentinel.
    pub fn free(&mut self, id: EntityId) -> bool {
        if !self.is_valid(id) {
            return false;
        }

        let index = id.index();
        let slot = &mut self.generations[index as usize];
        *slot = next_generation(*slot);
        self.allocated.remove(index as usize);
        self.free_list.push(index);
        true
    }

    /// Checks that `id` names a currently live identifier.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, id: EntityId) -> bool {
        if id.is_null() {
            return false;
        }
        let index = id.index() as usize;
        self.allocated.contains(index)
            && self.generations.get(index).copied() == Some(id.generation())
    }

    /// Whether slot `index` is currently handed out.
    #[inline]
    #[must_use]
    pub fn is_allocated(&self, index: u32) -> bool {
        self.allocated.contains(index as usize)
    }

    /// Current generation recorded for slot `index`, if it was ever issued.
    #[inline]
    #[must_use]
    pub fn generation_of(&self, index: u32) -> Option<u32> {
        self.generations.get(index as usize).copied()
    }

    /// The live identifier occupying slot `index`, if any.
    #[inline]
    #[must_use]
    pub fn current_id(&self, index: u32) -> Option<EntityId> {
        if !self.is_allocated(index) {
            return None;
        }
        self.generation_of(index)
            .map(|generation| EntityId::new(index, generation))
    }

    /// Iterates live identifiers in ascending index order.
    pub fn iter_live(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.allocated.iter().map(|index| {
            #[allow(clippy::cast_possible_truncation)]
            let index = index as u32;
            EntityId::new(index, self.generations[index as usize])
        })
    }

    /// Frees every live identifier at once.
    ///
    /// Generations are kept and bumped, so identifiers issued before the
    /// clear stay invalid afterwards. All issued indices return to the free
    /// list, lowest index first in line.
    pub fn clear(&mut self) {
        for index in self.allocated.iter() {
            self.generations[index] = next_generation(self.generations[index]);
        }
        self.allocated.clear();

        self.free_list.clear();
        #[allow(clippy::cast_possible_truncation)]
        let issued = self.generations.len() as u32;
        self.free_list.extend((0..issued).rev());
    }
}
