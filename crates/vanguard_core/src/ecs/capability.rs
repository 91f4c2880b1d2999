//! # Capability Index
//!
//! For every component type, the set of entity slots currently holding it.
//! The world updates it on every add/remove, so queries never rescan the
//! entity table.
//!
//! ## Layout
//!
//! ```text
//! CapabilitySet (sparse set):
//!   dense:  [7, 2, 9]            <- iteration order
//!   sparse: [_, _, 1, _, _, _, _, 0, _, 2]   <- slot -> position in dense
//! ```
//!
//! Insert, remove and membership are O(1). An intersection walks the smallest
//! set and probes the others, so its cost is bounded by the smallest set.

use super::component::{ComponentId, ComponentMask, MAX_COMPONENT_TYPES};

/// Marks a slot as absent from the sparse table.
const ABSENT: u32 = u32::MAX;

/// Sparse set of entity slot indices.
#[derive(Clone, Debug, Default)]
pub struct CapabilitySet {
    /// Member slots, packed.
    dense: Vec<u32>,
    /// Slot index -> position in `dense`, or [`ABSENT`].
    sparse: Vec<u32>,
}

impl CapabilitySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot. Returns `true` if it was not already a member.
    pub fn insert(&mut self, index: u32) -> bool {
        let slot = index as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, ABSENT);
        } else if self.sparse[slot] != ABSENT {
            return false;
        }

        #[allow(clippy::cast_possible_truncation)]
        let position = self.dense.len() as u32;
        self.sparse[slot] = position;
        self.dense.push(index);
        true
    }

    /// Removes a slot. Returns `true` if it was a member.
    ///
    /// The last member moves into the freed position.
    pub fn remove(&mut self, index: u32) -> bool {
        let Some(&position) = self.sparse.get(index as usize) else {
            return false;
        };
        if position == ABSENT {
            return false;
        }

        self.dense.swap_remove(position as usize);
        if let Some(&moved) = self.dense.get(position as usize) {
            self.sparse[moved as usize] = position;
        }
        self.sparse[index as usize] = ABSENT;
        true
    }

    /// Checks membership.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: u32) -> bool {
        self.sparse
            .get(index as usize)
            .is_some_and(|&position| position != ABSENT)
    }

    /// Number of members.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the set has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Members in dense order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.dense
    }

    /// Removes every member, keeping allocations.
    pub fn clear(&mut self) {
        for &index in &self.dense {
            self.sparse[index as usize] = ABSENT;
        }
        self.dense.clear();
    }
}

/// One [`CapabilitySet`] per component type.
#[derive(Clone, Debug)]
pub struct CapabilityIndex {
    sets: [CapabilitySet; MAX_COMPONENT_TYPES],
}

impl Default for CapabilityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityIndex {
    /// Creates an index with every set empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: std::array::from_fn(|_| CapabilitySet::new()),
        }
    }

    /// The set of slots holding component `id`.
    #[inline]
    #[must_use]
    pub fn set(&self, id: ComponentId) -> &CapabilitySet {
        &self.sets[id.index()]
    }

    /// Records that slot `index` now holds component `id`.
    #[inline]
    pub fn insert(&mut self, id: ComponentId, index: u32) -> bool {
        self.sets[id.index()].insert(index)
    }

    /// Records that slot `index` no longer holds component `id`.
    #[inline]
    pub fn remove(&mut self, id: ComponentId, index: u32) -> bool {
        self.sets[id.index()].remove(index)
    }

    /// Drops slot `index` from every set named in `mask`.
    pub fn remove_all(&mut self, mask: ComponentMask, index: u32) {
        for id in mask.iter() {
            self.sets[id.index()].remove(index);
        }
    }

    /// Iterates the slots present in every requested set.
    ///
    /// Walks the smallest requested set and probes the rest. An empty request
    /// yields nothing; it has no smallest set to drive the walk, and the world
    /// answers it from the allocator instead.
    pub fn intersect<'a>(&'a self, ids: &'a [ComponentId]) -> impl Iterator<Item = u32> + 'a {
        let driver = ids
            .iter()
            .copied()
            .min_by_key(|id| self.sets[id.index()].len());

        let driving: &[u32] = match driver {
            Some(id) => self.sets[id.index()].as_slice(),
            None => &[],
        };

        driving.iter().copied().filter(move |&index| {
            ids.iter()
                .filter(|&&id| Some(id) != driver)
                .all(|id| self.sets[id.index()].contains(index))
        })
    }

    /// Writes the result of [`intersect`](Self::intersect) into `out`, clearing it first.
    pub fn intersect_into(&self, ids: &[ComponentId], out: &mut Vec<u32>) {
        out.clear();
        out.extend(self.intersect(ids));
    }

    /// Counts the slots present in every requested set without collecting them.
    #[must_use]
    pub fn intersect_count(&self, ids: &[ComponentId]) -> usize {
        self.intersect(ids).count()
    }

    /// Sizes of all non-empty sets, in tag order.
    #[must_use]
    pub fn set_sizes(&self) -> Vec<(ComponentId, usize)> {
        (0..MAX_COMPONENT_TYPES)
            .filter(|&i| !self.sets[i].is_empty())
            .map(|i| {
                #[allow(clippy::cast_possible_truncation)]
                let id = ComponentId::new(i as u8);
                (id, self.sets[i].len())
            })
            .collect()
    }

    /// Empties every set.
    pub fn clear(&mut self) {
        for set in &mut self.sets {
            set.clear();
        }
    }
}
