//! On-disk layout of a set file.
//!
//! A file is a fixed 64-byte header, the Rice-coded payload, zero padding up
//! to an 8-byte boundary, then the anchor table:
//!
//! ```text
//! offset  size  field
//! ------  ----  -----
//! 0       4     magic = "GCS1"
//! 4       1     hash_id
//! 5       1     index_log2_granularity
//! 6       2     reserved (zero)
//! 8       8     n_items           gaps actually encoded
//! 16      8     p                 inverse false-positive rate
//! 24      8     N                 bucket universe
//! 32      8     payload_bit_len
//! 40      8     index_entry_count
//! 48      8     index_offset      byte offset from file start
//! 56      8     payload_offset    byte offset from file start (64)
//! 64      ...   payload bytes, MSB-first, zero-padded
//! ...     ...   index: repeated (u64 anchor_value, u64 anchor_bit_offset)
//! ```
//!
//! All multi-byte integers are little-endian. The format is self-describing:
//! a reader takes `p`, `N`, the hash identity, and both section offsets from
//! the header and needs no side-channel knowledge. The header is expressed
//! as a [`zerocopy`] type so that opening a file reinterprets mapped bytes
//! in place rather than parsing field by field.

use zerocopy::little_endian::U64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::rice::log2_ceil;

/// Magic bytes identifying a set file; an incompatible future layout would
/// bump the trailing version digit.
pub const GCS_MAGIC: [u8; 4] = *b"GCS1";

/// Size of [`FileHeader`] on disk.
pub const HEADER_LEN: usize = std::mem::size_of::<FileHeader>();

/// Default log2 of the anchor stride (stride 1024): anchor-table overhead of
/// 16 bytes per 1024 codes, about 1.5% of a typical payload.
pub const DEFAULT_INDEX_LOG2_GRANULARITY: u8 = 10;

/// Largest accepted log2 anchor stride.
pub const MAX_INDEX_LOG2_GRANULARITY: u8 = 31;

/// The fixed-size header at the start of every set file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FileHeader {
    /// Magic bytes, [`GCS_MAGIC`].
    pub magic: [u8; 4],
    /// Hash identity byte, resolved via [`BucketHash`](crate::hash::BucketHash).
    pub hash_id: u8,
    /// Log2 of the anchor stride used by the builder.
    pub index_log2_granularity: u8,
    /// Reserved, written as zero.
    pub reserved: [u8; 2],
    /// Number of gaps encoded in the payload.
    pub n_items: U64,
    /// Inverse false-positive rate (Rice divisor).
    pub p: U64,
    /// Bucket universe size `N`.
    pub n_buckets: U64,
    /// Exact payload length in bits (excluding padding).
    pub payload_bit_len: U64,
    /// Number of entries in the anchor table.
    pub index_entry_count: U64,
    /// Byte offset of the anchor table from the file start.
    pub index_offset: U64,
    /// Byte offset of the payload from the file start.
    pub payload_offset: U64,
}

/// One anchor: the bucket value reached after a stride of codes and the bit
/// position immediately after the final bit of the corresponding code.
///
/// The implicit anchor `(0, 0)` is never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct IndexEntry {
    /// Running sum of gaps after the anchored code, i.e. a bucket value.
    pub value: U64,
    /// Absolute bit offset just past the anchored code.
    pub bit_offset: U64,
}

impl IndexEntry {
    /// Creates an entry from native integers.
    pub fn new(value: u64, bit_offset: u64) -> Self {
        Self {
            value: U64::new(value),
            bit_offset: U64::new(bit_offset),
        }
    }
}

/// Rounds `n` up to a multiple of 8.
#[inline]
pub(crate) const fn align8(n: u64) -> u64 {
    (n + 7) & !7
}

impl FileHeader {
    /// Number of payload bytes implied by `payload_bit_len`.
    #[inline]
    pub fn payload_byte_len(&self) -> u64 {
        self.payload_bit_len.get().div_ceil(8)
    }

    /// Remainder field width implied by `p`.
    #[inline]
    pub fn remainder_width(&self) -> u8 {
        log2_ceil(self.p.get())
    }

    /// Checks magic and internal arithmetic of the header.
    ///
    /// Section *contents* are validated separately against the file length
    /// and the payload; this only rejects headers that are malformed on
    /// their own.
    pub fn validate(&self) -> Result<()> {
        if self.magic != GCS_MAGIC {
            return Err(Error::BadMagic);
        }
        let p = self.p.get();
        if p < 2 {
            return Err(Error::invalid_metadata(format!("p must be >= 2, got {p}")));
        }
        let n_items = self.n_items.get();
        if n_items == 0 {
            return Err(Error::invalid_metadata("empty sets are not supported"));
        }
        if self.n_buckets.get() == 0 {
            return Err(Error::invalid_metadata("bucket universe must be nonzero"));
        }
        if self.index_log2_granularity > MAX_INDEX_LOG2_GRANULARITY {
            return Err(Error::invalid_metadata(format!(
                "index granularity log2 must be <= {MAX_INDEX_LOG2_GRANULARITY}, got {}",
                self.index_log2_granularity
            )));
        }
        if self.payload_offset.get() < HEADER_LEN as u64 {
            return Err(Error::invalid_metadata(format!(
                "payload offset {} overlaps the header",
                self.payload_offset.get()
            )));
        }

        // Every code is at least width+1 bits, so a payload shorter than
        // that lower bound cannot hold n_items codes.
        let min_bits = n_items.saturating_mul(u64::from(self.remainder_width()) + 1);
        if self.payload_bit_len.get() < min_bits {
            return Err(Error::truncated(format!(
                "{} payload bits cannot hold {n_items} codes",
                self.payload_bit_len.get()
            )));
        }

        let payload_end = self
            .payload_offset
            .get()
            .checked_add(self.payload_byte_len())
            .ok_or_else(|| Error::invalid_metadata("payload extent overflows"))?;
        if self.index_offset.get() < payload_end {
            return Err(Error::invalid_metadata(format!(
                "index offset {} overlaps payload ending at {payload_end}",
                self.index_offset.get()
            )));
        }
        self.index_entry_count
            .get()
            .checked_mul(std::mem::size_of::<IndexEntry>() as u64)
            .and_then(|bytes| self.index_offset.get().checked_add(bytes))
            .ok_or_else(|| Error::invalid_metadata("index extent overflows"))?;
        Ok(())
    }
}
