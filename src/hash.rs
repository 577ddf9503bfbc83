//! Hash identities mapping items to buckets.
//!
//! Build and query MUST agree on the hash; a mismatch silently destroys
//! correctness (every probe becomes a coin flip). The identity is therefore
//! a single byte in the file header and an explicit enum here, never an
//! ambient default. Only uniformity over `[0, N)` is required of the hash;
//! none of the identities carries a cryptographic guarantee in this role.

use std::hash::Hasher;

use sha1::{Digest, Sha1};
use siphasher::sip::SipHasher24;
use xxhash_rust::xxh64::xxh64;

use crate::error::{Error, Result};

/// Hash identity recorded in a set file.
///
/// # Examples
///
/// ```
/// use gcset::hash::BucketHash;
///
/// let h = BucketHash::SipHash24;
/// let v = h.bucket(b"item", 1000);
/// assert!(v < 1000);
/// // The same identity always produces the same bucket.
/// assert_eq!(v, BucketHash::from_id(h.id()).unwrap().bucket(b"item", 1000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketHash {
    /// SHA-1, truncated to the first eight digest bytes (big-endian).
    Sha1Trunc64,
    /// SipHash-2-4 with an all-zero 128-bit key.
    #[default]
    SipHash24,
    /// XXH64 with seed 0.
    Xxh64,
}

impl BucketHash {
    /// Returns the identity byte stored in the file header.
    pub const fn id(self) -> u8 {
        match self {
            Self::Sha1Trunc64 => 0,
            Self::SipHash24 => 1,
            Self::Xxh64 => 2,
        }
    }

    /// Resolves a header identity byte.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::Sha1Trunc64),
            1 => Ok(Self::SipHash24),
            2 => Ok(Self::Xxh64),
            other => Err(Error::UnsupportedHash(other)),
        }
    }

    /// Hashes `item` to the full 64-bit range.
    pub fn hash64(self, item: &[u8]) -> u64 {
        match self {
            Self::Sha1Trunc64 => {
                let digest = Sha1::digest(item);
                u64::from_be_bytes(digest[..8].try_into().expect("digest is 20 bytes"))
            }
            Self::SipHash24 => {
                let mut hasher = SipHasher24::new_with_keys(0, 0);
                hasher.write(item);
                hasher.finish()
            }
            Self::Xxh64 => xxh64(item, 0),
        }
    }

    /// Hashes `item` and reduces it to a bucket in `[0, n_buckets)`.
    ///
    /// `n_buckets` must be nonzero; builds and opens enforce that before any
    /// bucket is computed.
    #[inline]
    pub fn bucket(self, item: &[u8], n_buckets: u64) -> u64 {
        self.hash64(item) % n_buckets
    }
}

impl std::fmt::Display for BucketHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sha1Trunc64 => "sha1-trunc64",
            Self::SipHash24 => "siphash-2-4",
            Self::Xxh64 => "xxh64",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip() {
        for h in [BucketHash::Sha1Trunc64, BucketHash::SipHash24, BucketHash::Xxh64] {
            assert_eq!(BucketHash::from_id(h.id()).unwrap(), h);
        }
        assert!(matches!(
            BucketHash::from_id(200),
            Err(Error::UnsupportedHash(200))
        ));
    }

    #[test]
    fn sha1_truncation_is_big_endian_prefix() {
        // SHA-1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
        let h = BucketHash::Sha1Trunc64.hash64(b"abc");
        assert_eq!(h, 0xa999_3e36_4706_816a);
    }

    #[test]
    fn identities_disagree() {
        let item = b"some item";
        let a = BucketHash::Sha1Trunc64.hash64(item);
        let b = BucketHash::SipHash24.hash64(item);
        let c = BucketHash::Xxh64.hash64(item);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn buckets_are_reduced() {
        for n in [1u64, 2, 3, 16, 1_000_003] {
            let v = BucketHash::SipHash24.bucket(b"x", n);
            assert!(v < n);
        }
    }

    #[test]
    fn distribution_is_roughly_uniform() {
        // 8 buckets, 8000 distinct items; each bucket should land near 1000.
        let n = 8u64;
        let mut counts = [0u64; 8];
        for i in 0..8000u32 {
            let item = i.to_le_bytes();
            counts[BucketHash::SipHash24.bucket(&item, n) as usize] += 1;
        }
        for &c in &counts {
            assert!((800..1200).contains(&c), "skewed bucket count {c}");
        }
    }
}
