//! Opening and querying set files.
//!
//! A [`GolombSet`] is the read side of the codec: it wraps the file bytes
//! (preferably a read-only memory map), validates the header and the anchor
//! table once at open, and then answers membership probes without ever
//! failing — any byte string is a legal probe.
//!
//! A probe hashes the item to a bucket `v`, binary-searches the anchor
//! table for the closest preceding anchor, seeks the bit reader there, and
//! decodes gaps until the running sum meets or passes `v`. Absent probes
//! stop as soon as the sum passes `v`, after about half a stride of decodes
//! on average.

use std::fs::File;
use std::path::Path;

use anybytes::{Bytes, View};
use memmap2::Mmap;
use tracing::debug;

use crate::bits::BitReader;
use crate::error::{Error, Result};
use crate::format::{FileHeader, IndexEntry};
use crate::hash::BucketHash;
use crate::index::SparseIndex;
use crate::rice::RiceDecoder;

/// Immutable membership set backed by file bytes.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use gcset::{GcsBuilder, GolombSet};
///
/// let mut builder = GcsBuilder::new(16)?;
/// builder.insert(b"a")?;
/// builder.insert(b"b")?;
/// builder.insert(b"c")?;
/// let mut file = Vec::new();
/// builder.finish(&mut file)?;
///
/// let set = GolombSet::from_bytes(anybytes::Bytes::from_source(file))?;
/// assert!(set.contains(b"a"));
/// assert!(set.contains(b"b"));
/// // Never-inserted items are absent except at rate about 1/p.
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GolombSet {
    payload: View<[u8]>,
    payload_bits: u64,
    index: SparseIndex,
    decoder: RiceDecoder,
    p: u64,
    n_items: u64,
    n_buckets: u64,
    hash: BucketHash,
    log2_granularity: u8,
}

impl GolombSet {
    /// Memory-maps `path` read-only and validates it.
    ///
    /// The mapping is shared by all clones of the internal views and stays
    /// alive for the lifetime of the set. Nothing is copied; queries decode
    /// straight out of the page cache.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path).map_err(|err| Error::io(err, 0))?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|err| Error::io(err, 0))?;
        Self::from_bytes(Bytes::from_source(mmap))
    }

    /// Validates and wraps an in-memory file image.
    ///
    /// This is the non-mapped twin of [`GolombSet::open`] for embedders that
    /// already hold the bytes (tests, network blobs, archives).
    pub fn from_bytes(mut bytes: Bytes) -> Result<Self> {
        let header: FileHeader = *bytes
            .view_prefix::<FileHeader>()
            .map_err(|_| Error::truncated("file shorter than the 64-byte header"))?;
        header.validate()?;
        let hash = BucketHash::from_id(header.hash_id)?;

        let consumed = std::mem::size_of::<FileHeader>() as u64;
        let payload = Self::take_section(
            &mut bytes,
            header.payload_offset.get() - consumed,
            header.payload_byte_len(),
            "payload",
        )?;
        let payload_end = header.payload_offset.get() + header.payload_byte_len();
        let entries = {
            let gap = header.index_offset.get() - payload_end;
            Self::skip(&mut bytes, gap)?;
            let count = usize::try_from(header.index_entry_count.get())
                .map_err(|_| Error::invalid_metadata("index entry count exceeds address space"))?;
            bytes
                .view_prefix_with_elems::<[IndexEntry]>(count)
                .map_err(|_| Error::truncated("index shorter than its entry count implies"))?
        };

        let payload_bits = header.payload_bit_len.get();
        let p = header.p.get();
        let n_buckets = header.n_buckets.get();
        let decoder = RiceDecoder::new(p);
        let index = SparseIndex::new(entries);
        index.validate(n_buckets, payload.as_ref(), payload_bits, &decoder)?;

        debug!(
            n_items = header.n_items.get(),
            p,
            n_buckets,
            payload_bits,
            anchors = index.len(),
            hash = %hash,
            "opened golomb set"
        );

        Ok(Self {
            payload,
            payload_bits,
            index,
            decoder,
            p,
            n_items: header.n_items.get(),
            n_buckets,
            hash,
            log2_granularity: header.index_log2_granularity,
        })
    }

    fn skip(bytes: &mut Bytes, len: u64) -> Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| Error::invalid_metadata("section offset exceeds address space"))?;
        bytes
            .view_prefix_with_elems::<[u8]>(len)
            .map_err(|_| Error::truncated("file shorter than its section offsets imply"))?;
        Ok(())
    }

    fn take_section(
        bytes: &mut Bytes,
        gap: u64,
        len: u64,
        what: &str,
    ) -> Result<View<[u8]>> {
        Self::skip(bytes, gap)?;
        let len = usize::try_from(len)
            .map_err(|_| Error::invalid_metadata("section size exceeds address space"))?;
        bytes
            .view_prefix_with_elems::<[u8]>(len)
            .map_err(|_| Error::truncated(format!("{what} shorter than the header implies")))
    }

    /// Returns `true` if `item` might be in the set.
    ///
    /// No false negatives: every item inserted at build time answers `true`.
    /// A never-inserted item answers `true` with probability about `1/p`.
    #[inline]
    pub fn contains(&self, item: &[u8]) -> bool {
        self.contains_bucket(self.hash.bucket(item, self.n_buckets))
    }

    /// Queries an already-hashed item (the full 64-bit hash, before
    /// reduction).
    #[inline]
    pub fn contains_hash(&self, hash: u64) -> bool {
        self.contains_bucket(hash % self.n_buckets)
    }

    fn contains_bucket(&self, v: u64) -> bool {
        let (mut running, start) = match self.index.locate(v) {
            Some(anchor) => {
                // Anchors are real bucket values.
                if anchor.value.get() == v {
                    return true;
                }
                (anchor.value.get(), anchor.bit_offset.get())
            }
            None => (0, 0),
        };
        let mut reader = BitReader::new(self.payload.as_ref(), self.payload_bits);
        if reader.seek(start).is_err() {
            return false;
        }
        while let Ok(gap) = self.decoder.decode(&mut reader) {
            running = running.saturating_add(gap);
            if running >= v {
                return running == v;
            }
        }
        // Payload exhausted below the target.
        false
    }

    /// Returns the number of gaps encoded in the payload.
    pub fn num_items(&self) -> u64 {
        self.n_items
    }

    /// Returns the inverse false-positive rate `p`.
    pub fn p(&self) -> u64 {
        self.p
    }

    /// Returns the bucket universe size `N`.
    pub fn num_buckets(&self) -> u64 {
        self.n_buckets
    }

    /// Returns the hash identity recorded in the file.
    pub fn hash(&self) -> BucketHash {
        self.hash
    }

    /// Returns the log2 anchor stride recorded in the file.
    pub fn index_log2_granularity(&self) -> u8 {
        self.log2_granularity
    }

    /// Returns the number of anchors in the sparse index.
    pub fn num_anchors(&self) -> usize {
        self.index.len()
    }

    /// Returns the expected false-positive rate, `n_items / N`.
    ///
    /// This is `1/p` exactly when no buckets collided during the build and
    /// marginally below it otherwise.
    pub fn false_positive_rate(&self) -> f64 {
        self.n_items as f64 / self.n_buckets as f64
    }
}
