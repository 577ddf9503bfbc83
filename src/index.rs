//! Sparse positional index over the Rice payload.
//!
//! Rice codes are variable-length, so the payload supports no direct
//! indexing. The builder samples an anchor every `2^index_log2_granularity`
//! codes: the bucket value reached and the bit position just past that
//! code. A query then binary-searches the anchor table and decodes at most
//! one stride of codes instead of the whole payload, making lookups
//! $`O(\lg A + 2^g)`$ for $`A`$ anchors.
//!
//! The table is read as a zero-copy [`View`] straight out of the opened
//! file; entries are 16-byte little-endian pairs with no alignment
//! requirement.

use anybytes::View;

use crate::bits::BitReader;
use crate::error::{Error, Result};
use crate::format::IndexEntry;
use crate::rice::RiceDecoder;

/// Binary-searchable anchor table backed by file bytes.
#[derive(Debug, Clone)]
pub struct SparseIndex {
    entries: View<[IndexEntry]>,
}

impl SparseIndex {
    /// Wraps a zero-copy view of anchor entries.
    pub fn new(entries: View<[IndexEntry]>) -> Self {
        Self { entries }
    }

    /// Returns the number of anchors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no anchors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the anchors as a slice.
    pub fn entries(&self) -> &[IndexEntry] {
        self.entries.as_ref()
    }

    /// Returns the last anchor whose value is at most `target`, or [`None`]
    /// when the target precedes every anchor (the caller then starts from
    /// the implicit `(0, 0)`).
    #[inline]
    pub fn locate(&self, target: u64) -> Option<&IndexEntry> {
        let entries = self.entries.as_ref();
        let idx = entries.partition_point(|e| e.value.get() <= target);
        idx.checked_sub(1).map(|i| &entries[i])
    }

    /// Checks the table against the payload it indexes.
    ///
    /// Anchors must be strictly increasing in both fields, stay inside the
    /// bucket universe and the payload, and the one code following each
    /// anchor must decode to a strictly larger running value that is itself
    /// inside the universe. Any violation means the file was not produced
    /// by a conforming builder.
    pub fn validate(
        &self,
        n_buckets: u64,
        payload: &[u8],
        payload_bits: u64,
        decoder: &RiceDecoder,
    ) -> Result<()> {
        let mut reader = BitReader::new(payload, payload_bits);
        let mut prev: Option<&IndexEntry> = None;
        for (i, entry) in self.entries.as_ref().iter().enumerate() {
            let value = entry.value.get();
            let offset = entry.bit_offset.get();
            if value >= n_buckets {
                return Err(Error::inconsistent_index(format!(
                    "anchor {i} value {value} outside bucket universe {n_buckets}"
                )));
            }
            if offset == 0 || offset > payload_bits {
                return Err(Error::inconsistent_index(format!(
                    "anchor {i} bit offset {offset} outside payload of {payload_bits} bits"
                )));
            }
            if let Some(prev) = prev {
                if value <= prev.value.get() || offset <= prev.bit_offset.get() {
                    return Err(Error::inconsistent_index(format!(
                        "anchor {i} does not increase over its predecessor"
                    )));
                }
            }
            if offset < payload_bits {
                reader.seek(offset).expect("offset bounded above");
                let gap = decoder.decode(&mut reader).map_err(|_| {
                    Error::inconsistent_index(format!("code after anchor {i} is truncated"))
                })?;
                if gap == 0 {
                    return Err(Error::inconsistent_index(format!(
                        "anchor {i} is not followed by a larger bucket"
                    )));
                }
                if value.saturating_add(gap) >= n_buckets {
                    return Err(Error::inconsistent_index(format!(
                        "bucket after anchor {i} leaves universe {n_buckets}"
                    )));
                }
            }
            prev = Some(entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;
    use crate::rice::RiceEncoder;
    use anybytes::Bytes;

    fn index_of(entries: Vec<IndexEntry>) -> SparseIndex {
        let raw = zerocopy::IntoBytes::as_bytes(entries.as_slice()).to_vec();
        let view = Bytes::from_source(raw).view::<[IndexEntry]>().unwrap();
        SparseIndex::new(view)
    }

    /// Encodes the gap stream of `buckets` and returns payload, bit length,
    /// and the anchors for the given stride.
    fn encode(buckets: &[u64], p: u64, stride: usize) -> (Vec<u8>, u64, Vec<IndexEntry>) {
        let enc = RiceEncoder::new(p);
        let mut w = BitWriter::new();
        let mut anchors = Vec::new();
        let mut prev = 0;
        for (i, &v) in buckets.iter().enumerate() {
            enc.encode(&mut w, v - prev);
            prev = v;
            let nth = i + 1;
            if nth % stride == 0 && nth < buckets.len() {
                anchors.push(IndexEntry::new(v, w.bit_position()));
            }
        }
        let (bytes, len) = w.finish();
        (bytes, len, anchors)
    }

    #[test]
    fn locate_picks_preceding_anchor() {
        let index = index_of(vec![
            IndexEntry::new(10, 40),
            IndexEntry::new(55, 90),
            IndexEntry::new(300, 200),
        ]);
        assert!(!index.is_empty());
        assert_eq!(index.len(), 3);
        assert!(index.locate(9).is_none());
        assert_eq!(index.locate(10).unwrap().bit_offset.get(), 40);
        assert_eq!(index.locate(54).unwrap().bit_offset.get(), 40);
        assert_eq!(index.locate(55).unwrap().bit_offset.get(), 90);
        assert_eq!(index.locate(299).unwrap().bit_offset.get(), 90);
        assert_eq!(index.locate(u64::MAX).unwrap().bit_offset.get(), 200);
    }

    #[test]
    fn locate_on_empty_table() {
        let index = index_of(Vec::new());
        assert!(index.is_empty());
        assert!(index.locate(0).is_none());
        assert!(index.locate(u64::MAX).is_none());
    }

    #[test]
    fn validate_accepts_conforming_anchors() {
        let buckets = [3u64, 9, 14, 30, 33, 57, 80, 90, 120, 130];
        let (payload, bits, anchors) = encode(&buckets, 16, 4);
        assert_eq!(anchors.len(), 2);
        let index = index_of(anchors);
        index
            .validate(160, &payload, bits, &RiceDecoder::new(16))
            .unwrap();
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let buckets = [3u64, 9, 14, 30, 33, 57, 80, 90, 120, 130];
        let (payload, bits, mut anchors) = encode(&buckets, 16, 4);
        anchors[0] = IndexEntry::new(500, anchors[0].bit_offset.get());
        let err = index_of(anchors)
            .validate(160, &payload, bits, &RiceDecoder::new(16))
            .unwrap_err();
        assert!(matches!(err, Error::InconsistentIndex(_)));
    }

    #[test]
    fn validate_rejects_non_monotone_anchors() {
        let buckets = [3u64, 9, 14, 30, 33, 57, 80, 90, 120, 130];
        let (payload, bits, mut anchors) = encode(&buckets, 16, 4);
        anchors.swap(0, 1);
        let err = index_of(anchors)
            .validate(160, &payload, bits, &RiceDecoder::new(16))
            .unwrap_err();
        assert!(matches!(err, Error::InconsistentIndex(_)));
    }

    #[test]
    fn validate_rejects_anchor_into_truncated_code() {
        let buckets = [3u64, 9, 14, 30, 33, 57, 80, 90, 120, 130];
        let (payload, bits, _) = encode(&buckets, 16, 4);
        // The final code is 5 bits; three bits before the end there is no
        // room left for a full code, so the probe decode runs off the end.
        let anchors = vec![IndexEntry::new(5, bits - 3)];
        let err = index_of(anchors)
            .validate(160, &payload, bits, &RiceDecoder::new(16))
            .unwrap_err();
        assert!(matches!(err, Error::InconsistentIndex(_)));
    }

    #[test]
    fn validate_rejects_anchor_before_zero_gap() {
        // A conforming builder never leaves a zero gap after an anchor; a
        // hand-built payload with one must be rejected by the probe.
        let enc = RiceEncoder::new(16);
        let mut w = BitWriter::new();
        enc.encode(&mut w, 3);
        let anchor = IndexEntry::new(3, w.bit_position());
        enc.encode(&mut w, 0);
        let (payload, bits) = w.finish();
        let err = index_of(vec![anchor])
            .validate(160, &payload, bits, &RiceDecoder::new(16))
            .unwrap_err();
        assert!(matches!(err, Error::InconsistentIndex(_)));
    }
}
