//! Arena: bump allocator backing lookup tables and duplicated payloads.
//!
//! Allocations are pointer-stable for the lifetime of the borrow and are
//! never released individually. `reset` takes `&mut self`, so an arena
//! cannot be reset while any container still borrows it.

use crate::error::{Error, Result};
use bumpalo::Bump;
use core::alloc::Layout;
use core::ptr;
use core::slice;

pub struct Arena {
    bump: Bump,
}

impl Arena {
    /// Unbounded arena; grows by allocating new chunks on demand.
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Arena limited to `bytes` of chunk memory. Allocations past the limit
    /// fail with [`Error::ArenaExhausted`].
    pub fn with_capacity(bytes: usize) -> Self {
        // The limit must be set before the first chunk exists: bumpalo ignores
        // a limit that is already exceeded.
        let bump = Bump::new();
        bump.set_allocation_limit(Some(bytes));
        Self { bump }
    }

    /// Total chunk memory currently held by the arena.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    pub fn limit(&self) -> Option<usize> {
        self.bump.allocation_limit()
    }

    /// Invalidates every allocation at once.
    pub fn reset(&mut self) {
        self.bump.reset();
    }

    fn raw(&self, layout: Layout) -> Result<ptr::NonNull<u8>> {
        self.bump
            .try_alloc_layout(layout)
            .map_err(|_| Error::ArenaExhausted {
                requested: layout.size(),
            })
    }

    /// Duplicates `src` into the arena.
    pub(crate) fn copy_bytes(&self, src: &[u8]) -> Result<&[u8]> {
        if src.is_empty() {
            return Ok(&[]);
        }
        let layout = Layout::for_value(src);
        let dst = self.raw(layout)?;
        // SAFETY: `dst` is a fresh allocation of `src.len()` bytes owned by the
        // bump for as long as `self` is borrowed, and cannot overlap `src`.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), src.len());
            Ok(slice::from_raw_parts(dst.as_ptr(), src.len()))
        }
    }

    /// Allocates `len` copies of `fill`. Used for lookup tables; abandoned
    /// tables stay allocated until `reset`.
    #[allow(clippy::mut_from_ref)]
    pub(crate) fn alloc_filled<T: Copy>(&self, len: usize, fill: T) -> Result<&mut [T]> {
        let layout = Layout::array::<T>(len).map_err(|_| Error::CapacityOverflow)?;
        if layout.size() == 0 {
            return Ok(&mut []);
        }
        let base = self.raw(layout)?.cast::<T>();
        // SAFETY: `base` points at a fresh, exclusively owned, properly aligned
        // block large enough for `len` values of `T`; every element is written
        // before the slice is formed. `T: Copy` means nothing needs dropping.
        unsafe {
            for i in 0..len {
                base.as_ptr().add(i).write(fill);
            }
            Ok(slice::from_raw_parts_mut(base.as_ptr(), len))
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Arena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("allocated_bytes", &self.allocated_bytes())
            .field("limit", &self.limit())
            .finish()
    }
}
