//! Error type shared by every container.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    /// Load factor must be finite and strictly between 0 and 1.
    #[error("load factor {0} is outside the open interval (0, 1)")]
    InvalidLoadFactor(f64),
    #[error("requested table length overflows the address space")]
    CapacityOverflow,
    /// The backing arena refused an allocation. Container state is unchanged.
    #[error("arena exhausted while allocating {requested} bytes")]
    ArenaExhausted { requested: usize },
    #[error("no free slot in lookup table after rehash")]
    TableFull,
}

pub type Result<T> = std::result::Result<T, Error>;
