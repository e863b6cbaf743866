//! arena-strmap: byte-string set, map, and multimap on one open-addressing
//! engine whose tables and copied payloads live in a bump arena.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: associative containers that never free individual allocations.
//!   Memory comes from an [`Arena`]; what cannot be returned to the arena is
//!   recycled through per-node-kind free lists.
//! - Layers:
//!   - `Arena`: bump allocator (`bumpalo`) with an optional byte limit.
//!   - `NodePool<H, N>`: `slotmap` slab of nodes with generation-checked
//!     keys. Removed nodes are reused by later inserts.
//!   - `RawTable<H>`: power-of-two slot array of `Empty | Tombstone |
//!     Occupied(H)`, linear probing, all-or-nothing rehash, and the
//!     container's generation counter.
//!   - [`StrSet`], [`StrMap`], [`StrMultiMap`]: entry-type specialisations of
//!     `RawTable` through the `ProbeEntry` trait.
//!
//! Constraints
//! - Single-threaded: containers borrow a `!Sync` arena.
//! - Tables only grow. Deletion leaves tombstones that later rehashes purge.
//! - Failure is reported through `Result`/`Option`/`bool`; a failed call
//!   leaves every previously reachable item intact.
//!
//! Payload lifetimes
//! - [`Payload::Static`] bytes must outlive the container (`'a`) and are
//!   stored by reference, so lookups return the caller's own slice.
//! - [`Payload::Transient`] bytes are copied: inline into the node when short
//!   (8 bytes for map keys and values, 16 elsewhere), into the arena
//!   otherwise.
//!
//! Hashing
//! - Each entry stores its `u64` hash; rehashing never rehashes bytes.
//! - The default hasher is `ahash::RandomState` seeded by the caller. Any
//!   `BuildHasher` can be supplied through `with_hasher`.
//!
//! Cursors
//! - `cursor()` returns a detached, generation-stamped position that does not
//!   borrow the container. After any mutation (insert, overwrite, delete,
//!   clear, rehash) its `next` reports exhaustion for good.
//! - `iter()` wraps a cursor in a borrowing `Iterator`.
//!
//! Notes and non-goals
//! - No shrinking, no persistence, byte-string keys and values only.
//! - `free(self)` consumes a container; an uninitialised or freed container
//!   cannot be named, so there is no runtime validity check.

pub mod arena;
pub mod error;
mod node_pool;
pub mod options;
pub mod payload;
mod raw_table;
mod raw_table_proptest;
pub mod str_map;
pub mod str_multimap;
pub mod str_set;

// Public surface
pub use arena::Arena;
pub use error::{Error, Result};
pub use options::TableOptions;
pub use payload::Payload;
pub use raw_table::TableStats;
pub use str_map::{MapCursor, StrMap};
pub use str_multimap::{MultiMapCursor, StrMultiMap, ValueCursor};
pub use str_set::{SetCursor, StrSet};
