//! NodePool: slab of entry/value nodes addressed by generation-checked keys.
//!
//! Arena memory cannot be returned piecemeal, so deleted nodes are kept on a
//! free list and handed out again before the slab grows. `SlotMap` provides
//! both the free list and the generation check: a key that outlived its node
//! resolves to `None` instead of aliasing whatever reused the slot.

use slotmap::{Key, SlotMap};

pub(crate) struct NodePool<H: Key, N> {
    nodes: SlotMap<H, N>,
    // Vacant slots waiting on the slab's free list.
    free: usize,
}

impl<H: Key, N> NodePool<H, N> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            free: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Recycled nodes available before the slab needs fresh memory.
    #[inline]
    pub(crate) fn free_len(&self) -> usize {
        self.free
    }

    pub(crate) fn alloc(&mut self, node: N) -> H {
        self.free = self.free.saturating_sub(1);
        self.nodes.insert(node)
    }

    pub(crate) fn recycle(&mut self, h: H) -> Option<N> {
        let node = self.nodes.remove(h)?;
        self.free += 1;
        Some(node)
    }

    #[inline]
    pub(crate) fn get(&self, h: H) -> Option<&N> {
        self.nodes.get(h)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, h: H) -> Option<&mut N> {
        self.nodes.get_mut(h)
    }

    /// Returns every live node to the free list.
    pub(crate) fn clear(&mut self) {
        self.free += self.nodes.len();
        self.nodes.clear();
    }
}
