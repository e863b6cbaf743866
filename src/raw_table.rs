//! RawTable: the open-addressing engine shared by every container.
//!
//! The table is an arena-allocated slice of [`Slot`]s whose length is always a
//! power of two. Occupied slots hold slot-map keys into a [`NodePool`]; the
//! nodes themselves carry the precomputed hash and key bytes, exposed through
//! [`ProbeEntry`]. Probing is linear from `hash & mask` and bounded by the
//! table length.
//!
//! Invariants
//! - `occupied + tombstones <= len`, and an `Empty` slot always remains after
//!   an insert because growth is checked before placing a new key.
//! - Every `Occupied` handle resolves in the pool. A node that reports
//!   `!is_live()` is logically gone: the mutating probe turns its slot into a
//!   tombstone and recycles it, read-only probes step over it.
//! - `generation` changes on every structural mutation so cursors created
//!   before the change can tell they are stale.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::node_pool::NodePool;
use crate::options::TableOptions;
use slotmap::Key;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot<H> {
    Empty,
    Tombstone,
    Occupied(H),
}

/// What the probe engine needs to know about a node.
pub(crate) trait ProbeEntry {
    fn hash(&self) -> u64;
    fn key_bytes(&self) -> &[u8];
    fn is_live(&self) -> bool {
        true
    }
}

/// Result of a mutating probe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Probe<H> {
    Found { index: usize, handle: H },
    Vacant { index: usize },
    Exhausted,
}

/// Snapshot of table occupancy, mainly for tests and diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableStats {
    pub table_len: usize,
    pub occupied: usize,
    pub tombstones: usize,
    /// Recycled nodes waiting to be reused.
    pub free_nodes: usize,
    pub generation: u64,
}

pub(crate) struct RawTable<'a, H: Key> {
    arena: &'a Arena,
    slots: &'a mut [Slot<H>],
    occupied: usize,
    tombstones: usize,
    load_factor: f64,
    generation: u64,
}

impl<'a, H: Key> RawTable<'a, H> {
    pub(crate) fn with_options(arena: &'a Arena, options: &TableOptions) -> Result<Self> {
        let len = options.table_len()?;
        let slots = arena.alloc_filled(len, Slot::Empty)?;
        Ok(Self {
            arena,
            slots,
            occupied: 0,
            tombstones: 0,
            load_factor: options.get_load_factor(),
            generation: 0,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn occupied(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub(crate) fn tombstones(&self) -> usize {
        self.tombstones
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn arena(&self) -> &'a Arena {
        self.arena
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> Slot<H> {
        self.slots[index]
    }

    /// Records a mutation that does not change slot occupancy, e.g. a map
    /// value overwrite or a multimap list edit.
    #[inline]
    pub(crate) fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Read-only probe: `(slot index, handle)` of the live entry matching
    /// `key`, if any.
    pub(crate) fn find<N: ProbeEntry>(
        &self,
        nodes: &NodePool<H, N>,
        hash: u64,
        key: &[u8],
    ) -> Option<(usize, H)> {
        let mask = self.mask();
        let mut index = hash as usize & mask;
        for _ in 0..self.slots.len() {
            match self.slots[index] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied(h) => match nodes.get(h) {
                    Some(n) if n.is_live() && n.hash() == hash && n.key_bytes() == key => {
                        return Some((index, h));
                    }
                    Some(_) => {}
                    None => debug_assert!(false, "occupied slot with dangling handle"),
                },
            }
            index = (index + 1) & mask;
        }
        None
    }

    /// Mutating probe used by inserts. Emptied entries met along the way are
    /// tombstoned and recycled.
    pub(crate) fn probe<N: ProbeEntry>(
        &mut self,
        nodes: &mut NodePool<H, N>,
        hash: u64,
        key: &[u8],
    ) -> Probe<H> {
        let mask = self.mask();
        let mut index = hash as usize & mask;
        let mut first_tombstone = None;
        for _ in 0..self.slots.len() {
            match self.slots[index] {
                Slot::Empty => {
                    return Probe::Vacant {
                        index: first_tombstone.unwrap_or(index),
                    };
                }
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(index);
                }
                Slot::Occupied(h) => {
                    let (live, matches) = match nodes.get(h) {
                        Some(n) => (
                            n.is_live(),
                            n.hash() == hash && n.key_bytes() == key,
                        ),
                        None => (false, false),
                    };
                    if !live {
                        self.vacate(index);
                        nodes.recycle(h);
                        first_tombstone.get_or_insert(index);
                    } else if matches {
                        return Probe::Found { index, handle: h };
                    }
                }
            }
            index = (index + 1) & mask;
        }
        match first_tombstone {
            Some(index) => Probe::Vacant { index },
            None => Probe::Exhausted,
        }
    }

    /// Probe for `key`, growing the table first if placing a new key would
    /// cross the load threshold. On error nothing reachable has changed.
    pub(crate) fn find_or_vacant<N: ProbeEntry>(
        &mut self,
        nodes: &mut NodePool<H, N>,
        hash: u64,
        key: &[u8],
    ) -> Result<Probe<H>> {
        match self.probe(nodes, hash, key) {
            found @ Probe::Found { .. } => return Ok(found),
            vacant @ Probe::Vacant { .. } if !self.needs_rehash(1) => return Ok(vacant),
            _ => {}
        }
        self.grow(nodes)?;
        match self.probe(nodes, hash, key) {
            Probe::Exhausted => Err(Error::TableFull),
            p => Ok(p),
        }
    }

    pub(crate) fn needs_rehash(&self, additional: usize) -> bool {
        let used = self.occupied + self.tombstones + additional;
        used as f64 >= self.load_factor * self.slots.len() as f64
            || self.tombstones > self.slots.len() / 4
    }

    /// Rehash ahead of an insert into the next power of two, doubling again
    /// until the new key fits under the load factor.
    pub(crate) fn grow<N: ProbeEntry>(&mut self, nodes: &mut NodePool<H, N>) -> Result<()> {
        let live_after = (self.occupied + 1) as f64;
        let mut new_len = self.slots.len();
        loop {
            new_len = new_len.checked_mul(2).ok_or(Error::CapacityOverflow)?;
            if live_after < self.load_factor * new_len as f64 {
                break;
            }
        }
        self.rehash(nodes, new_len)
    }

    /// All-or-nothing rehash into a fresh table of `new_len` slots.
    pub(crate) fn rehash<N: ProbeEntry>(
        &mut self,
        nodes: &mut NodePool<H, N>,
        new_len: usize,
    ) -> Result<()> {
        debug_assert!(new_len.is_power_of_two() && new_len >= self.slots.len());
        let fresh = self.arena.alloc_filled(new_len, Slot::<H>::Empty)?;
        let mask = new_len - 1;
        let mut placed = 0usize;
        let mut dead = Vec::new();
        for slot in self.slots.iter() {
            let Slot::Occupied(h) = *slot else { continue };
            let node = match nodes.get(h) {
                Some(n) if n.is_live() => n,
                _ => {
                    dead.push(h);
                    continue;
                }
            };
            let mut index = node.hash() as usize & mask;
            let mut done = false;
            for _ in 0..new_len {
                if fresh[index] == Slot::Empty {
                    fresh[index] = Slot::Occupied(h);
                    done = true;
                    break;
                }
                index = (index + 1) & mask;
            }
            if !done {
                // `fresh` is abandoned in the arena; the old table stays.
                return Err(Error::TableFull);
            }
            placed += 1;
        }
        self.slots = fresh;
        self.occupied = placed;
        self.tombstones = 0;
        self.generation = self.generation.wrapping_add(1);
        for h in dead {
            nodes.recycle(h);
        }
        Ok(())
    }

    /// Marks a vacant slot (from [`Probe::Vacant`]) as holding `handle`.
    pub(crate) fn occupy(&mut self, index: usize, handle: H) {
        match self.slots[index] {
            Slot::Tombstone => self.tombstones -= 1,
            Slot::Empty => {}
            Slot::Occupied(_) => debug_assert!(false, "occupying a live slot"),
        }
        self.slots[index] = Slot::Occupied(handle);
        self.occupied += 1;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Replaces a live slot with a tombstone. The caller recycles the node.
    pub(crate) fn vacate(&mut self, index: usize) {
        debug_assert!(matches!(self.slots[index], Slot::Occupied(_)));
        self.slots[index] = Slot::Tombstone;
        self.occupied -= 1;
        self.tombstones += 1;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Empties every slot but keeps the allocation.
    pub(crate) fn clear(&mut self) {
        self.slots.fill(Slot::Empty);
        self.occupied = 0;
        self.tombstones = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn stats(&self, free_nodes: usize) -> TableStats {
        TableStats {
            table_len: self.slots.len(),
            occupied: self.occupied,
            tombstones: self.tombstones(),
            free_nodes,
            generation: self.generation,
        }
    }
}

/// Position in a table walk, stamped with the generation it was created at.
#[derive(Copy, Clone, Debug)]
pub(crate) struct RawCursor {
    next_slot: usize,
    generation: u64,
    done: bool,
}

impl RawCursor {
    pub(crate) fn new<H: Key>(table: &RawTable<'_, H>) -> Self {
        Self {
            next_slot: 0,
            generation: table.generation(),
            done: false,
        }
    }

    /// False once the table has been mutated since the cursor was created.
    /// Staleness latches: a cursor never becomes valid again.
    pub(crate) fn check<H: Key>(&mut self, table: &RawTable<'_, H>) -> bool {
        if self.done || self.generation != table.generation() {
            self.done = true;
            return false;
        }
        true
    }

    pub(crate) fn finish(&mut self) {
        self.done = true;
    }

    /// Next live node, in slot order.
    pub(crate) fn next<H: Key, N: ProbeEntry>(
        &mut self,
        table: &RawTable<'_, H>,
        nodes: &NodePool<H, N>,
    ) -> Option<H> {
        if !self.check(table) {
            return None;
        }
        while self.next_slot < table.len() {
            let index = self.next_slot;
            self.next_slot += 1;
            if let Slot::Occupied(h) = table.slot(index) {
                if nodes.get(h).is_some_and(ProbeEntry::is_live) {
                    return Some(h);
                }
            }
        }
        self.done = true;
        None
    }
}
