//! Construction-time table configuration.

use crate::error::{Error, Result};

pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
pub(crate) const MIN_TABLE_LEN: usize = 8;

/// Capacity guess and load factor for a new container.
///
/// ```
/// use arena_strmap::TableOptions;
/// let opts = TableOptions::new().capacity(100).load_factor(0.5);
/// assert_eq!(opts.table_len().unwrap(), 256);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableOptions {
    capacity: usize,
    load_factor: f64,
}

impl TableOptions {
    pub const fn new() -> Self {
        Self {
            capacity: 0,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    /// Number of items expected; the first table is sized to hold them
    /// without rehashing.
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub const fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn get_capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_load_factor(&self) -> f64 {
        self.load_factor
    }

    pub fn validate(&self) -> Result<()> {
        let lf = self.load_factor;
        if !lf.is_finite() || lf <= 0.0 || lf >= 1.0 {
            return Err(Error::InvalidLoadFactor(lf));
        }
        Ok(())
    }

    /// Initial table length: the smallest power of two (at least 8) that keeps
    /// `capacity` items under the load factor.
    pub fn table_len(&self) -> Result<usize> {
        self.validate()?;
        let needed = (self.capacity as f64 / self.load_factor).floor();
        if needed >= usize::MAX as f64 {
            return Err(Error::CapacityOverflow);
        }
        (needed as usize)
            .checked_add(1)
            .and_then(usize::checked_next_power_of_two)
            .map(|len| len.max(MIN_TABLE_LEN))
            .ok_or(Error::CapacityOverflow)
    }
}

impl Default for TableOptions {
    fn default() -> Self {
        Self::new()
    }
}
