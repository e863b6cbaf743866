//! StrSet: a set of byte strings on the shared probe engine.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::node_pool::NodePool;
use crate::options::TableOptions;
use crate::payload::{Payload, Stored, SSO_LEN};
use crate::raw_table::{Probe, ProbeEntry, RawCursor, RawTable, TableStats};
use ahash::RandomState;
use core::hash::BuildHasher;

slotmap::new_key_type! {
    /// Handle of a set entry node.
    pub struct SetKey;
}

struct SetEntry<'a> {
    hash: u64,
    value: Stored<'a, SSO_LEN>,
}

impl ProbeEntry for SetEntry<'_> {
    #[inline]
    fn hash(&self) -> u64 {
        self.hash
    }
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }
}

pub struct StrSet<'a, S = RandomState> {
    hasher: S,
    table: RawTable<'a, SetKey>,
    entries: NodePool<SetKey, SetEntry<'a>>,
}

impl<'a> StrSet<'a> {
    /// Empty set with the default table size, hashing with `seed`.
    pub fn new(arena: &'a Arena, seed: u64) -> Result<Self> {
        Self::with_options(arena, seed, TableOptions::default())
    }

    pub fn with_options(arena: &'a Arena, seed: u64, options: TableOptions) -> Result<Self> {
        Self::with_hasher(arena, RandomState::with_seed(seed as usize), options)
    }
}

impl<'a, S: BuildHasher> StrSet<'a, S> {
    pub fn with_hasher(arena: &'a Arena, hasher: S, options: TableOptions) -> Result<Self> {
        let table = RawTable::with_options(arena, &options)?;
        Ok(Self {
            hasher,
            table,
            entries: NodePool::with_capacity(options.get_capacity()),
        })
    }

    #[inline]
    fn make_hash(&self, bytes: &[u8]) -> u64 {
        self.hasher.hash_one(bytes)
    }

    pub fn len(&self) -> usize {
        self.table.occupied()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current lookup table length (always a power of two).
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    pub fn stats(&self) -> TableStats {
        debug_assert_eq!(self.entries.len(), self.table.occupied());
        self.table.stats(self.entries.free_len())
    }

    /// Adds `value`. Returns `Ok(false)` if it was already present, in which
    /// case nothing changes.
    pub fn insert(&mut self, value: Payload<'a, '_>) -> Result<bool> {
        let hash = self.make_hash(value.bytes());
        match self.table.find_or_vacant(&mut self.entries, hash, value.bytes())? {
            Probe::Found { .. } => Ok(false),
            Probe::Vacant { index } => {
                let value = Stored::store(self.table.arena(), value)?;
                let h = self.entries.alloc(SetEntry { hash, value });
                self.table.occupy(index, h);
                Ok(true)
            }
            Probe::Exhausted => Err(Error::TableFull),
        }
    }

    pub fn contains(&self, value: &[u8]) -> bool {
        let hash = self.make_hash(value);
        self.table.find(&self.entries, hash, value).is_some()
    }

    /// Stored copy of `value`, if present. For static inserts this is the
    /// caller's original slice.
    pub fn get(&self, value: &[u8]) -> Option<&[u8]> {
        let hash = self.make_hash(value);
        let (_, h) = self.table.find(&self.entries, hash, value)?;
        self.entries.get(h).map(|e| e.value.as_bytes())
    }

    /// Removes `value`; its node goes on the free list.
    pub fn delete(&mut self, value: &[u8]) -> bool {
        let hash = self.make_hash(value);
        match self.table.find(&self.entries, hash, value) {
            Some((index, h)) => {
                self.table.vacate(index);
                self.entries.recycle(h);
                true
            }
            None => false,
        }
    }

    /// Removes everything, keeping the table allocation and recycling nodes.
    pub fn clear(&mut self) {
        self.table.clear();
        self.entries.clear();
    }

    /// Releases the node slab. The table memory is reclaimed with the arena.
    pub fn free(self) {}

    pub fn cursor(&self) -> SetCursor {
        SetCursor {
            raw: RawCursor::new(&self.table),
        }
    }

    pub fn iter(&self) -> Iter<'_, 'a, S> {
        Iter {
            set: self,
            cursor: self.cursor(),
        }
    }

    /// Fills `out` with values present in both sets.
    pub fn intersection<S2, S3>(
        &self,
        other: &StrSet<'_, S2>,
        out: &mut StrSet<'_, S3>,
    ) -> Result<()>
    where
        S2: BuildHasher,
        S3: BuildHasher,
    {
        for v in self.iter() {
            if other.contains(v) {
                out.insert(Payload::Transient(v))?;
            }
        }
        Ok(())
    }

    /// Fills `out` with values present in either set.
    pub fn union<S2, S3>(&self, other: &StrSet<'_, S2>, out: &mut StrSet<'_, S3>) -> Result<()>
    where
        S2: BuildHasher,
        S3: BuildHasher,
    {
        for v in self.iter().chain(other.iter()) {
            out.insert(Payload::Transient(v))?;
        }
        Ok(())
    }

    /// Fills `out` with values of `self` absent from `other`.
    pub fn difference<S2, S3>(
        &self,
        other: &StrSet<'_, S2>,
        out: &mut StrSet<'_, S3>,
    ) -> Result<()>
    where
        S2: BuildHasher,
        S3: BuildHasher,
    {
        for v in self.iter() {
            if !other.contains(v) {
                out.insert(Payload::Transient(v))?;
            }
        }
        Ok(())
    }
}

/// Detached position in a [`StrSet`] walk.
///
/// Unlike [`Iter`] a cursor does not borrow the set, so the set may be
/// mutated while it exists. Any mutation makes the cursor report exhaustion.
#[derive(Copy, Clone, Debug)]
pub struct SetCursor {
    raw: RawCursor,
}

impl SetCursor {
    pub fn next<'s, S>(&mut self, set: &'s StrSet<'_, S>) -> Option<&'s [u8]> {
        let h = self.raw.next(&set.table, &set.entries)?;
        set.entries.get(h).map(|e| e.value.as_bytes())
    }
}

pub struct Iter<'s, 'a, S> {
    set: &'s StrSet<'a, S>,
    cursor: SetCursor,
}

impl<'s, 'a, S> Iterator for Iter<'s, 'a, S> {
    type Item = &'s [u8];
    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next(self.set)
    }
}

impl<'s, 'a, S: BuildHasher> IntoIterator for &'s StrSet<'a, S> {
    type Item = &'s [u8];
    type IntoIter = Iter<'s, 'a, S>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S> core::fmt::Debug for StrSet<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut cursor = SetCursor {
            raw: RawCursor::new(&self.table),
        };
        let mut set = f.debug_set();
        while let Some(v) = cursor.next(self) {
            set.entry(&String::from_utf8_lossy(v));
        }
        set.finish()
    }
}
