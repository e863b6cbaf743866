//! StrMap: one value per byte-string key, overwritten on reinsert.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::node_pool::NodePool;
use crate::options::TableOptions;
use crate::payload::{Payload, Stored, MAP_SSO_LEN};
use crate::raw_table::{Probe, ProbeEntry, RawCursor, RawTable, TableStats};
use ahash::RandomState;
use core::hash::BuildHasher;

slotmap::new_key_type! {
    /// Handle of a map entry node.
    pub struct MapKey;
}

struct MapEntry<'a> {
    hash: u64,
    key: Stored<'a, MAP_SSO_LEN>,
    value: Stored<'a, MAP_SSO_LEN>,
}

impl ProbeEntry for MapEntry<'_> {
    #[inline]
    fn hash(&self) -> u64 {
        self.hash
    }
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self.key.as_bytes()
    }
}

/// Arena-backed map from byte strings to byte strings.
///
/// Keys and values are each tagged [`Payload::Static`] (kept by reference) or
/// [`Payload::Transient`] (copied: inline up to 8 bytes, arena otherwise).
///
/// ```
/// use arena_strmap::{Arena, Payload, StrMap};
///
/// let arena = Arena::new();
/// let mut map = StrMap::new(&arena, 7).unwrap();
/// map.insert(Payload::Static(b"lang"), Payload::Transient(b"rust")).unwrap();
/// assert_eq!(map.get(b"lang"), Some(&b"rust"[..]));
/// ```
pub struct StrMap<'a, S = RandomState> {
    hasher: S,
    table: RawTable<'a, MapKey>,
    entries: NodePool<MapKey, MapEntry<'a>>,
}

impl<'a> StrMap<'a> {
    pub fn new(arena: &'a Arena, seed: u64) -> Result<Self> {
        Self::with_options(arena, seed, TableOptions::default())
    }

    pub fn with_options(arena: &'a Arena, seed: u64, options: TableOptions) -> Result<Self> {
        Self::with_hasher(arena, RandomState::with_seed(seed as usize), options)
    }
}

impl<'a, S: BuildHasher> StrMap<'a, S> {
    pub fn with_hasher(arena: &'a Arena, hasher: S, options: TableOptions) -> Result<Self> {
        let table = RawTable::with_options(arena, &options)?;
        Ok(Self {
            hasher,
            table,
            entries: NodePool::with_capacity(options.get_capacity()),
        })
    }

    #[inline]
    fn make_hash(&self, key: &[u8]) -> u64 {
        self.hasher.hash_one(key)
    }

    pub fn len(&self) -> usize {
        self.table.occupied()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    pub fn stats(&self) -> TableStats {
        debug_assert_eq!(self.entries.len(), self.table.occupied());
        self.table.stats(self.entries.free_len())
    }

    /// Inserts `key -> value`, or replaces the value of an existing key. The
    /// stored key is left untouched on replacement.
    ///
    /// Returns `Ok(true)` when the key was new.
    pub fn insert(&mut self, key: Payload<'a, '_>, value: Payload<'a, '_>) -> Result<bool> {
        let hash = self.make_hash(key.bytes());
        let arena = self.table.arena();
        match self.table.find_or_vacant(&mut self.entries, hash, key.bytes())? {
            Probe::Found { handle, .. } => {
                let value = Stored::store(arena, value)?;
                if let Some(e) = self.entries.get_mut(handle) {
                    e.value = value;
                }
                self.table.touch();
                Ok(false)
            }
            Probe::Vacant { index } => {
                let key = Stored::store(arena, key)?;
                let value = Stored::store(arena, value)?;
                let h = self.entries.alloc(MapEntry { hash, key, value });
                self.table.occupy(index, h);
                Ok(true)
            }
            Probe::Exhausted => Err(Error::TableFull),
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let hash = self.make_hash(key);
        let (_, h) = self.table.find(&self.entries, hash, key)?;
        self.entries.get(h).map(|e| e.value.as_bytes())
    }

    /// Stored key and value for `key`.
    pub fn get_key_value(&self, key: &[u8]) -> Option<(&[u8], &[u8])> {
        let hash = self.make_hash(key);
        let (_, h) = self.table.find(&self.entries, hash, key)?;
        self.entries
            .get(h)
            .map(|e| (e.key.as_bytes(), e.value.as_bytes()))
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        let hash = self.make_hash(key);
        self.table.find(&self.entries, hash, key).is_some()
    }

    /// Removes `key`, tombstoning its slot and recycling the entry node.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        let hash = self.make_hash(key);
        let Some((index, h)) = self.table.find(&self.entries, hash, key) else {
            return false;
        };
        self.table.vacate(index);
        self.entries.recycle(h);
        true
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.entries.clear();
    }

    /// Releases the node slab. The table memory is reclaimed with the arena.
    pub fn free(self) {}

    pub fn cursor(&self) -> MapCursor {
        MapCursor {
            raw: RawCursor::new(&self.table),
        }
    }

    pub fn iter(&self) -> Iter<'_, 'a, S> {
        Iter {
            map: self,
            cursor: self.cursor(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

/// Detached, generation-stamped position in a [`StrMap`] walk.
#[derive(Copy, Clone, Debug)]
pub struct MapCursor {
    raw: RawCursor,
}

impl MapCursor {
    /// Next `(key, value)` pair, or `None` once exhausted or once the map has
    /// been mutated since this cursor was created.
    pub fn next<'s, S>(&mut self, map: &'s StrMap<'_, S>) -> Option<(&'s [u8], &'s [u8])> {
        let h = self.raw.next(&map.table, &map.entries)?;
        map.entries
            .get(h)
            .map(|e| (e.key.as_bytes(), e.value.as_bytes()))
    }
}

pub struct Iter<'s, 'a, S> {
    map: &'s StrMap<'a, S>,
    cursor: MapCursor,
}

impl<'s, 'a, S> Iterator for Iter<'s, 'a, S> {
    type Item = (&'s [u8], &'s [u8]);
    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next(self.map)
    }
}

impl<'s, 'a, S: BuildHasher> IntoIterator for &'s StrMap<'a, S> {
    type Item = (&'s [u8], &'s [u8]);
    type IntoIter = Iter<'s, 'a, S>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S> core::fmt::Debug for StrMap<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut cursor = MapCursor {
            raw: RawCursor::new(&self.table),
        };
        let mut map = f.debug_map();
        while let Some((k, v)) = cursor.next(self) {
            map.entry(&String::from_utf8_lossy(k), &String::from_utf8_lossy(v));
        }
        map.finish()
    }
}
