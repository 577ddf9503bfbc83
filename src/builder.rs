//! Streaming construction of set files.
//!
//! The pipeline is ingest → sort → dedup → gap → Rice-encode, with the
//! anchor table sampled on the fly. Ingest stores one 64-bit hash per item;
//! every later stage works on that single array in place, so peak memory is
//! `8 * n` bytes plus the anchor table. The encoded payload and the anchors
//! are buffered and the file is then written strictly sequentially: header,
//! payload, padding, index. The sink only needs [`io::Write`].
//!
//! The bucket universe is fixed from the *observed* number of unique hashed
//! items (`N = u * p`), which preserves the `1/p` false-positive guarantee
//! when the caller's estimate of `n` was off. Duplicate hashes are removed
//! before `N` is fixed and colliding buckets are removed before encoding,
//! so the output is a deterministic function of the input set.

use std::io;

use tracing::debug;
use zerocopy::IntoBytes;

use crate::bits::BitWriter;
use crate::error::{Error, Result};
use crate::format::{
    align8, FileHeader, IndexEntry, DEFAULT_INDEX_LOG2_GRANULARITY, GCS_MAGIC, HEADER_LEN,
    MAX_INDEX_LOG2_GRANULARITY,
};
use crate::hash::BucketHash;
use crate::rice::RiceEncoder;

/// Counters reported by a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Items pushed into the builder, duplicates included.
    pub items_ingested: u64,
    /// Distinct 64-bit hashes after the first dedup pass.
    pub unique_hashes: u64,
    /// Gaps actually encoded (distinct buckets).
    pub buckets_encoded: u64,
    /// Bucket universe size `N`.
    pub n_buckets: u64,
    /// Exact payload length in bits.
    pub payload_bits: u64,
    /// Anchors written to the index.
    pub index_entries: u64,
    /// Total file size in bytes.
    pub bytes_written: u64,
}

/// Builder collecting hashed items and freezing them into a set file.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use gcset::{GcsBuilder, GolombSet};
///
/// let mut builder = GcsBuilder::new(16)?;
/// for item in [&b"a"[..], b"b", b"c"] {
///     builder.insert(item)?;
/// }
/// let mut file = Vec::new();
/// let stats = builder.finish(&mut file)?;
/// assert_eq!(stats.unique_hashes, 3);
///
/// let set = GolombSet::from_bytes(anybytes::Bytes::from_source(file))?;
/// assert!(set.contains(b"a"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GcsBuilder {
    p: u64,
    log2_granularity: u8,
    hash: BucketHash,
    hashes: Vec<u64>,
}

impl GcsBuilder {
    /// Creates a builder for inverse false-positive rate `p`, which must be
    /// at least 2. The hash identity defaults to SipHash-2-4 and the anchor
    /// stride to 1024.
    pub fn new(p: u64) -> Result<Self> {
        if p < 2 {
            return Err(Error::invalid_argument(format!(
                "p must be >= 2, but got {p}."
            )));
        }
        Ok(Self {
            p,
            log2_granularity: DEFAULT_INDEX_LOG2_GRANULARITY,
            hash: BucketHash::default(),
            hashes: Vec::new(),
        })
    }

    /// Creates a builder reserving room for `items_hint` items up front.
    ///
    /// The hint is not binding: ingesting more items grows the array, fewer
    /// wastes a little reservation. A failed reservation is reported as
    /// [`Error::OutOfMemory`] instead of aborting the process.
    pub fn with_capacity(p: u64, items_hint: usize) -> Result<Self> {
        let mut builder = Self::new(p)?;
        builder.hashes.try_reserve(items_hint)?;
        Ok(builder)
    }

    /// Selects the hash identity recorded in the file.
    pub fn with_hash(mut self, hash: BucketHash) -> Self {
        self.hash = hash;
        self
    }

    /// Sets the anchor stride to `2^log2_granularity` codes.
    pub fn with_index_log2_granularity(mut self, log2_granularity: u8) -> Result<Self> {
        if log2_granularity > MAX_INDEX_LOG2_GRANULARITY {
            return Err(Error::invalid_argument(format!(
                "index granularity log2 must be <= {MAX_INDEX_LOG2_GRANULARITY}, but got {log2_granularity}."
            )));
        }
        self.log2_granularity = log2_granularity;
        Ok(self)
    }

    /// Hashes `item` and ingests it.
    #[inline]
    pub fn insert(&mut self, item: &[u8]) -> Result<()> {
        self.insert_hash(self.hash.hash64(item))
    }

    /// Ingests an already-hashed item.
    ///
    /// The value must come from the same hash identity the builder was
    /// configured with, applied to the full 64-bit range; reduction modulo
    /// `N` happens at finish time, once the item count is known.
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) -> Result<()> {
        if self.hashes.len() == self.hashes.capacity() {
            self.hashes.try_reserve(1)?;
        }
        self.hashes.push(hash);
        Ok(())
    }

    /// Returns the number of items ingested so far, duplicates included.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Returns `true` if nothing was ingested yet.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Sorts, deduplicates, encodes, and writes the complete file to `sink`.
    ///
    /// # Errors
    ///
    /// Fails on an empty builder (`n = 0` sets are rejected), when `n * p`
    /// does not fit in a `u64`, and on any I/O failure (reported with the
    /// byte offset at which it occurred).
    pub fn finish<W: io::Write>(self, sink: W) -> Result<BuildStats> {
        let Self {
            p,
            log2_granularity,
            hash,
            mut hashes,
        } = self;
        if hashes.is_empty() {
            return Err(Error::invalid_argument(
                "cannot build an empty set; at least one item is required.",
            ));
        }
        let items_ingested = hashes.len() as u64;

        hashes.sort_unstable();
        hashes.dedup();
        let unique_hashes = hashes.len() as u64;
        let n_buckets = unique_hashes.checked_mul(p).ok_or_else(|| {
            Error::invalid_argument(format!(
                "bucket universe {unique_hashes} * {p} overflows u64."
            ))
        })?;

        for h in &mut hashes {
            *h %= n_buckets;
        }
        hashes.sort_unstable();
        hashes.dedup();

        let stride = 1usize << log2_granularity;
        let encoder = RiceEncoder::new(p);
        let mut writer = BitWriter::new();
        let mut anchors: Vec<IndexEntry> = Vec::new();
        anchors.try_reserve(hashes.len().saturating_sub(1) >> log2_granularity)?;

        let mut prev = 0u64;
        for (i, &v) in hashes.iter().enumerate() {
            encoder.encode(&mut writer, v - prev);
            prev = v;
            let nth = i + 1;
            if nth & (stride - 1) == 0 && nth < hashes.len() {
                anchors.push(IndexEntry::new(v, writer.bit_position()));
            }
        }
        let buckets_encoded = hashes.len() as u64;
        let (payload, payload_bits) = writer.finish();

        let payload_offset = HEADER_LEN as u64;
        let payload_end = payload_offset + payload.len() as u64;
        let index_offset = align8(payload_end);
        let header = FileHeader {
            magic: GCS_MAGIC,
            hash_id: hash.id(),
            index_log2_granularity: log2_granularity,
            reserved: [0; 2],
            n_items: buckets_encoded.into(),
            p: p.into(),
            n_buckets: n_buckets.into(),
            payload_bit_len: payload_bits.into(),
            index_entry_count: (anchors.len() as u64).into(),
            index_offset: index_offset.into(),
            payload_offset: payload_offset.into(),
        };

        let mut out = CountingWriter::new(sink);
        out.write_all(header.as_bytes())?;
        out.write_all(&payload)?;
        out.write_all(&[0u8; 8][..(index_offset - payload_end) as usize])?;
        out.write_all(anchors.as_slice().as_bytes())?;
        out.flush()?;

        debug!(
            items_ingested,
            unique_hashes,
            buckets_encoded,
            n_buckets,
            payload_bits,
            anchors = anchors.len(),
            "encoded gap stream"
        );

        Ok(BuildStats {
            items_ingested,
            unique_hashes,
            buckets_encoded,
            n_buckets,
            payload_bits,
            index_entries: anchors.len() as u64,
            bytes_written: out.offset,
        })
    }
}

/// `io::Write` wrapper tracking the output offset for error reports.
struct CountingWriter<W> {
    inner: W,
    offset: u64,
}

impl<W: io::Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.inner
            .write_all(buf)
            .map_err(|err| Error::io(err, self.offset))?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner
            .flush()
            .map_err(|err| Error::io(err, self.offset))
    }
}
