//! Radix-2 sizing
//!
//! Normalizes a requested length to the smallest power of two that covers it.
//! Used for the FFT length and for the interpolation degree.

use crate::error::PwvdError;
use crate::Result;

/// A power-of-two length together with its base-2 exponent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Radix2 {
    /// Power-of-two length, `2^order`
    pub length: usize,
    /// Base-2 exponent of `length`
    pub order: u32,
}

impl Radix2 {
    /// Smallest power of two `>= requested`. A request of 0 yields length 1, order 0.
    ///
    /// Fails with `Allocation` when the power of two does not fit in `usize`.
    pub fn for_length(requested: usize) -> Result<Self> {
        let length = requested
            .max(1)
            .checked_next_power_of_two()
            .ok_or(PwvdError::Allocation {
                rows: requested,
                cols: 1,
            })?;
        Ok(Self {
            length,
            order: length.trailing_zeros(),
        })
    }
}

/// Shorthand for `Radix2::for_length(requested)?.length`
pub fn radix2(requested: usize) -> Result<usize> {
    Ok(Radix2::for_length(requested)?.length)
}
