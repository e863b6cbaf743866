//! Caller-declared payload lifetimes and their stored representation.

use crate::arena::Arena;
use crate::error::Result;

/// Inline capacity of map keys and values.
pub const MAP_SSO_LEN: usize = 8;
/// Inline capacity of set keys, multimap keys, and multimap value nodes.
pub const SSO_LEN: usize = 16;

/// A byte string tagged with how the container may hold it.
///
/// - `Static` bytes outlive the container (`'a`) and are stored by reference;
///   lookups hand back the very same slice.
/// - `Transient` bytes only need to live for the call. Short ones are copied
///   inline into the node, longer ones are duplicated into the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload<'a, 't> {
    Static(&'a [u8]),
    Transient(&'t [u8]),
}

impl<'a, 't> Payload<'a, 't> {
    pub fn bytes(&self) -> &[u8] {
        match *self {
            Payload::Static(b) => b,
            Payload::Transient(b) => b,
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) enum Stored<'a, const N: usize> {
    Borrowed(&'a [u8]),
    Arena(&'a [u8]),
    Inline { len: u8, buf: [u8; N] },
}

impl<'a, const N: usize> Stored<'a, N> {
    pub(crate) fn store(arena: &'a Arena, payload: Payload<'a, '_>) -> Result<Self> {
        match payload {
            Payload::Static(b) => Ok(Stored::Borrowed(b)),
            Payload::Transient(b) if b.len() <= N => {
                let mut buf = [0u8; N];
                buf[..b.len()].copy_from_slice(b);
                Ok(Stored::Inline {
                    len: b.len() as u8,
                    buf,
                })
            }
            Payload::Transient(b) => Ok(Stored::Arena(arena.copy_bytes(b)?)),
        }
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            Stored::Borrowed(b) | Stored::Arena(b) => b,
            Stored::Inline { len, buf } => &buf[..*len as usize],
        }
    }

    #[cfg(test)]
    pub(crate) fn is_inline(&self) -> bool {
        matches!(self, Stored::Inline { .. })
    }
}

impl<const N: usize> core::fmt::Debug for Stored<'_, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self {
            Stored::Borrowed(_) => "borrowed",
            Stored::Arena(_) => "arena",
            Stored::Inline { .. } => "inline",
        };
        write!(
            f,
            "{}({:?})",
            kind,
            String::from_utf8_lossy(self.as_bytes())
        )
    }
}
