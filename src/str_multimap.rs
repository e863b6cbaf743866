//! StrMultiMap: each byte-string key maps to a list of values, newest first.
//!
//! Key entries live in the probe table like the other containers. Values are
//! separate nodes in their own pool, chained through `next` from the entry's
//! `head`. New values are pushed at the head, so walking a key's list yields
//! values in reverse insertion order.
//!
//! An entry is live while its list is non-empty. Removing the last value
//! tombstones the key's slot and recycles the entry at once, so the table
//! never holds an empty key.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::node_pool::NodePool;
use crate::options::TableOptions;
use crate::payload::{Payload, Stored, SSO_LEN};
use crate::raw_table::{Probe, ProbeEntry, RawCursor, RawTable, TableStats};
use ahash::RandomState;
use core::hash::BuildHasher;

slotmap::new_key_type! {
    /// Handle of a multimap key entry.
    pub struct MultiKey;
    /// Handle of a multimap value node.
    pub struct ValueKey;
}

struct KeyEntry<'a> {
    hash: u64,
    key: Stored<'a, SSO_LEN>,
    head: Option<ValueKey>,
    count: usize,
}

impl ProbeEntry for KeyEntry<'_> {
    #[inline]
    fn hash(&self) -> u64 {
        self.hash
    }
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self.key.as_bytes()
    }
    #[inline]
    fn is_live(&self) -> bool {
        self.count > 0
    }
}

struct ValueNode<'a> {
    value: Stored<'a, SSO_LEN>,
    next: Option<ValueKey>,
}

pub struct StrMultiMap<'a, S = RandomState> {
    hasher: S,
    table: RawTable<'a, MultiKey>,
    entries: NodePool<MultiKey, KeyEntry<'a>>,
    values: NodePool<ValueKey, ValueNode<'a>>,
    value_count: usize,
}

impl<'a> StrMultiMap<'a> {
    pub fn new(arena: &'a Arena, seed: u64) -> Result<Self> {
        Self::with_options(arena, seed, TableOptions::default())
    }

    pub fn with_options(arena: &'a Arena, seed: u64, options: TableOptions) -> Result<Self> {
        Self::with_hasher(arena, RandomState::with_seed(seed as usize), options)
    }
}

impl<'a, S: BuildHasher> StrMultiMap<'a, S> {
    pub fn with_hasher(arena: &'a Arena, hasher: S, options: TableOptions) -> Result<Self> {
        let table = RawTable::with_options(arena, &options)?;
        Ok(Self {
            hasher,
            table,
            entries: NodePool::with_capacity(options.get_capacity()),
            values: NodePool::with_capacity(options.get_capacity()),
            value_count: 0,
        })
    }

    #[inline]
    fn make_hash(&self, key: &[u8]) -> u64 {
        self.hasher.hash_one(key)
    }

    fn lookup(&self, key: &[u8]) -> Option<(usize, MultiKey)> {
        let hash = self.make_hash(key);
        self.table.find(&self.entries, hash, key)
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.table.occupied()
    }

    /// Number of values across all keys.
    pub fn value_count(&self) -> usize {
        self.value_count
    }

    /// Number of values stored under `key`; 0 when absent.
    pub fn value_count_for(&self, key: &[u8]) -> usize {
        self.lookup(key)
            .and_then(|(_, h)| self.entries.get(h))
            .map_or(0, |e| e.count)
    }

    pub fn is_empty(&self) -> bool {
        self.value_count == 0
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Table occupancy; `free_nodes` counts recycled key entries.
    pub fn stats(&self) -> TableStats {
        debug_assert_eq!(self.entries.len(), self.table.occupied());
        self.table.stats(self.entries.free_len())
    }

    /// Recycled value nodes waiting to be reused.
    pub fn free_value_nodes(&self) -> usize {
        self.values.free_len()
    }

    /// Adds `value` under `key`, in front of any values already there.
    pub fn insert(&mut self, key: Payload<'a, '_>, value: Payload<'a, '_>) -> Result<()> {
        let hash = self.make_hash(key.bytes());
        let arena = self.table.arena();
        match self.table.find_or_vacant(&mut self.entries, hash, key.bytes())? {
            Probe::Found { handle, .. } => {
                let value = Stored::store(arena, value)?;
                let head = self.entries.get(handle).and_then(|e| e.head);
                let vh = self.values.alloc(ValueNode { value, next: head });
                if let Some(e) = self.entries.get_mut(handle) {
                    e.head = Some(vh);
                    e.count += 1;
                }
                self.table.touch();
            }
            Probe::Vacant { index } => {
                let key = Stored::store(arena, key)?;
                let value = Stored::store(arena, value)?;
                let vh = self.values.alloc(ValueNode { value, next: None });
                let h = self.entries.alloc(KeyEntry {
                    hash,
                    key,
                    head: Some(vh),
                    count: 1,
                });
                self.table.occupy(index, h);
            }
            Probe::Exhausted => return Err(Error::TableFull),
        }
        self.value_count += 1;
        Ok(())
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.lookup(key).is_some()
    }

    /// True if `value` (byte-equal) is stored under `key`.
    pub fn contains_value(&self, key: &[u8], value: &[u8]) -> bool {
        self.values_for(key).any(|v| v == value)
    }

    /// Most recently inserted value under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.values_for(key).next()
    }

    /// Removes the newest value under `key` that equals `value`. Removing the
    /// last value removes the key as well.
    pub fn delete_value(&mut self, key: &[u8], value: &[u8]) -> bool {
        let Some((index, eh)) = self.lookup(key) else {
            return false;
        };
        let mut prev: Option<ValueKey> = None;
        let mut cur = self.entries.get(eh).and_then(|e| e.head);
        while let Some(vh) = cur {
            let Some(node) = self.values.get(vh) else {
                return false;
            };
            if node.value.as_bytes() == value {
                break;
            }
            prev = Some(vh);
            cur = node.next;
        }
        let Some(vh) = cur else {
            return false;
        };

        let next = self.values.recycle(vh).and_then(|n| n.next);
        match prev {
            Some(p) => {
                if let Some(n) = self.values.get_mut(p) {
                    n.next = next;
                }
            }
            None => {
                if let Some(e) = self.entries.get_mut(eh) {
                    e.head = next;
                }
            }
        }
        self.value_count -= 1;

        let remaining = self.entries.get_mut(eh).map_or(0, |e| {
            e.count -= 1;
            e.count
        });
        if remaining == 0 {
            self.table.vacate(index);
            self.entries.recycle(eh);
        } else {
            self.table.touch();
        }
        true
    }

    /// Removes `key` and all of its values. Returns how many values went.
    pub fn delete_key(&mut self, key: &[u8]) -> usize {
        let Some((index, eh)) = self.lookup(key) else {
            return 0;
        };
        self.table.vacate(index);
        let mut cur = self.entries.recycle(eh).and_then(|e| e.head);
        let mut removed = 0;
        while let Some(vh) = cur {
            cur = self.values.recycle(vh).and_then(|n| n.next);
            removed += 1;
        }
        self.value_count -= removed;
        removed
    }

    /// Recycles every key entry and value node; the table allocation is kept.
    pub fn clear(&mut self) {
        self.table.clear();
        self.entries.clear();
        self.values.clear();
        self.value_count = 0;
    }

    /// Releases both node slabs. The table memory is reclaimed with the arena.
    pub fn free(self) {}

    /// Cursor over every `(key, value)` pair.
    pub fn cursor(&self) -> MultiMapCursor {
        MultiMapCursor {
            raw: RawCursor::new(&self.table),
            current: None,
        }
    }

    /// Cursor over the values of one key, newest first. Empty if `key` is absent.
    pub fn value_cursor(&self, key: &[u8]) -> ValueCursor {
        let next = self
            .lookup(key)
            .and_then(|(_, h)| self.entries.get(h))
            .and_then(|e| e.head);
        ValueCursor {
            raw: RawCursor::new(&self.table),
            next,
        }
    }

    pub fn iter(&self) -> Iter<'_, 'a, S> {
        Iter {
            map: self,
            cursor: self.cursor(),
        }
    }

    pub fn values_for(&self, key: &[u8]) -> ValuesFor<'_, 'a, S> {
        ValuesFor {
            map: self,
            cursor: self.value_cursor(key),
        }
    }

    /// Distinct keys, each once.
    pub fn keys(&self) -> Keys<'_, 'a, S> {
        Keys {
            map: self,
            raw: RawCursor::new(&self.table),
        }
    }
}

/// Detached cursor over all `(key, value)` pairs of a [`StrMultiMap`].
///
/// Each key's list is walked to the end before moving to the next occupied
/// slot. Reports exhaustion once the multimap has been mutated.
#[derive(Copy, Clone, Debug)]
pub struct MultiMapCursor {
    raw: RawCursor,
    current: Option<(MultiKey, Option<ValueKey>)>,
}

impl MultiMapCursor {
    pub fn next<'s, S>(&mut self, map: &'s StrMultiMap<'_, S>) -> Option<(&'s [u8], &'s [u8])> {
        loop {
            if !self.raw.check(&map.table) {
                return None;
            }
            if let Some((eh, Some(vh))) = self.current {
                let (Some(entry), Some(node)) = (map.entries.get(eh), map.values.get(vh)) else {
                    self.raw.finish();
                    return None;
                };
                self.current = Some((eh, node.next));
                return Some((entry.key.as_bytes(), node.value.as_bytes()));
            }
            let eh = self.raw.next(&map.table, &map.entries)?;
            let head = map.entries.get(eh).and_then(|e| e.head);
            self.current = Some((eh, head));
        }
    }
}

/// Detached cursor over the values of a single key.
#[derive(Copy, Clone, Debug)]
pub struct ValueCursor {
    raw: RawCursor,
    next: Option<ValueKey>,
}

impl ValueCursor {
    pub fn next<'s, S>(&mut self, map: &'s StrMultiMap<'_, S>) -> Option<&'s [u8]> {
        if !self.raw.check(&map.table) {
            return None;
        }
        let Some(node) = self.next.and_then(|vh| map.values.get(vh)) else {
            self.raw.finish();
            return None;
        };
        self.next = node.next;
        Some(node.value.as_bytes())
    }
}

pub struct Iter<'s, 'a, S> {
    map: &'s StrMultiMap<'a, S>,
    cursor: MultiMapCursor,
}

impl<'s, 'a, S> Iterator for Iter<'s, 'a, S> {
    type Item = (&'s [u8], &'s [u8]);
    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next(self.map)
    }
}

pub struct ValuesFor<'s, 'a, S> {
    map: &'s StrMultiMap<'a, S>,
    cursor: ValueCursor,
}

impl<'s, 'a, S> Iterator for ValuesFor<'s, 'a, S> {
    type Item = &'s [u8];
    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next(self.map)
    }
}

pub struct Keys<'s, 'a, S> {
    map: &'s StrMultiMap<'a, S>,
    raw: RawCursor,
}

impl<'s, 'a, S> Iterator for Keys<'s, 'a, S> {
    type Item = &'s [u8];
    fn next(&mut self) -> Option<Self::Item> {
        let h = self.raw.next(&self.map.table, &self.map.entries)?;
        self.map.entries.get(h).map(|e| e.key.as_bytes())
    }
}

impl<'s, 'a, S: BuildHasher> IntoIterator for &'s StrMultiMap<'a, S> {
    type Item = (&'s [u8], &'s [u8]);
    type IntoIter = Iter<'s, 'a, S>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S> core::fmt::Debug for StrMultiMap<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut keys = RawCursor::new(&self.table);
        let mut map = f.debug_map();
        while let Some(eh) = keys.next(&self.table, &self.entries) {
            let Some(entry) = self.entries.get(eh) else {
                continue;
            };
            let mut values = Vec::with_capacity(entry.count);
            let mut cur = entry.head;
            while let Some(node) = cur.and_then(|vh| self.values.get(vh)) {
                values.push(String::from_utf8_lossy(node.value.as_bytes()));
                cur = node.next;
            }
            map.entry(&String::from_utf8_lossy(entry.key.as_bytes()), &values);
        }
        map.finish()
    }
}
