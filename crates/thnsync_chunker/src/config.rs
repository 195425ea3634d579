//! Chunker configuration.

use crate::error::{ChunkerError, ChunkerResult};

/// Default minimum chunk size (4 KiB).
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Default average chunk size (8 KiB).
pub const DEFAULT_AVG_CHUNK_SIZE: usize = 8 * 1024;

/// Default maximum chunk size (64 KiB).
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Size bounds for content-defined chunking.
///
/// Must satisfy `0 < min_size <= avg_size <= max_size`, and `max_size`
/// must fit in a `u32` because chunk lengths are stored as `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// No boundary is placed before a chunk reaches this length.
    pub min_size: usize,
    /// Target mean chunk length; determines the boundary mask.
    pub avg_size: usize,
    /// A boundary is always placed at this length.
    pub max_size: usize,
}

impl ChunkerConfig {
    /// Creates a configuration with explicit bounds.
    pub fn new(min_size: usize, avg_size: usize, max_size: usize) -> Self {
        Self {
            min_size,
            avg_size,
            max_size,
        }
    }

    /// Sets the minimum chunk size.
    pub fn with_min_size(mut self, size: usize) -> Self {
        self.min_size = size;
        self
    }

    /// Sets the average chunk size.
    pub fn with_avg_size(mut self, size: usize) -> Self {
        self.avg_size = size;
        self
    }

    /// Sets the maximum chunk size.
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Checks the size bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkerError::InvalidConfig`] when the bounds are not
    /// ordered `0 < min <= avg <= max` or `max` exceeds `u32::MAX`.
    pub fn validate(&self) -> ChunkerResult<()> {
        if self.min_size == 0 {
            return Err(ChunkerError::invalid_config(
                "min_size must be greater than zero",
            ));
        }
        if self.min_size > self.avg_size || self.avg_size > self.max_size {
            return Err(ChunkerError::invalid_config(format!(
                "chunk size bounds must satisfy 0 < min <= avg <= max (got {} / {} / {})",
                self.min_size, self.avg_size, self.max_size
            )));
        }
        if u32::try_from(self.max_size).is_err() {
            return Err(ChunkerError::invalid_config(format!(
                "max_size {} does not fit in 32 bits",
                self.max_size
            )));
        }
        Ok(())
    }

    /// Returns the boundary mask derived from `avg_size`.
    ///
    /// The mask keeps every bit below the highest set bit of `avg_size`,
    /// e.g. `8192 -> 8191` and `5000 -> 4095`.
    pub fn mask(&self) -> u32 {
        let bit_length = usize::BITS - self.avg_size.leading_zeros();
        if bit_length == 0 {
            return 0;
        }
        let highest = (bit_length - 1).min(31);
        (1u32 << highest) - 1
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_CHUNK_SIZE,
            DEFAULT_AVG_CHUNK_SIZE,
            DEFAULT_MAX_CHUNK_SIZE,
        )
    }
}
