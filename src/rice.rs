//! Rice (Golomb) coding of non-negative gaps.
//!
//! A gap $`g`$ is split against the divisor $`p`$ into a quotient
//! $`q = \lfloor g / p \rfloor`$ and a remainder $`r = g \bmod p`$. The code
//! is $`q`$ one bits, a terminating zero, then $`r`$ in exactly
//! $`\lceil \lg p \rceil`$ bits, MSB first. For gaps drawn from sorting
//! uniform buckets in $`[0, n \cdot p)`$ the gap distribution is geometric
//! with mean $`p`$, which is the regime Rice codes are optimal for.
//!
//! Since `p >= 2` everywhere in this crate, the remainder field is always at
//! least one bit wide and the shortest possible code (`g = 0`) is
//! `width + 1` bits.

use crate::bits::{BitReader, BitWriter};
use crate::error::Result;

/// Returns the number of bits needed to represent values below `p`, i.e.
/// $`\lceil \lg p \rceil`$ for `p >= 2`.
///
/// # Examples
///
/// ```
/// use gcset::rice::log2_ceil;
///
/// assert_eq!(log2_ceil(2), 1);
/// assert_eq!(log2_ceil(3), 2);
/// assert_eq!(log2_ceil(4), 2);
/// assert_eq!(log2_ceil(1000), 10);
/// assert_eq!(log2_ceil(1024), 10);
/// ```
#[inline]
pub const fn log2_ceil(p: u64) -> u8 {
    debug_assert!(p >= 2);
    (64 - (p - 1).leading_zeros()) as u8
}

/// Encodes gaps against a fixed divisor into a [`BitWriter`].
#[derive(Debug, Clone, Copy)]
pub struct RiceEncoder {
    p: u64,
    width: u8,
}

impl RiceEncoder {
    /// Creates an encoder for divisor `p`, which must be at least 2.
    pub fn new(p: u64) -> Self {
        Self {
            p,
            width: log2_ceil(p),
        }
    }

    /// Returns the remainder field width in bits.
    #[inline]
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Appends the code for `gap` to `writer`.
    #[inline]
    pub fn encode(&self, writer: &mut BitWriter, gap: u64) {
        writer.write_unary(gap / self.p);
        writer.write_bits(gap % self.p, self.width);
    }

    /// Returns the exact bit length of the code for `gap`.
    #[inline]
    pub fn code_len(&self, gap: u64) -> u64 {
        gap / self.p + 1 + u64::from(self.width)
    }
}

/// Decodes gaps produced by [`RiceEncoder`] from a [`BitReader`].
#[derive(Debug, Clone, Copy)]
pub struct RiceDecoder {
    p: u64,
    width: u8,
}

impl RiceDecoder {
    /// Creates a decoder for divisor `p`, which must be at least 2.
    pub fn new(p: u64) -> Self {
        Self {
            p,
            width: log2_ceil(p),
        }
    }

    /// Reads one code and returns the decoded gap.
    ///
    /// Fails only when the stream ends inside the code. The quotient is not
    /// capped: worst-case unary runs of `N / p` bits decode fine.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u64> {
        let q = reader.read_unary()?;
        let r = reader.read_bits(self.width)?;
        Ok(q.saturating_mul(self.p).saturating_add(r))
    }
}
