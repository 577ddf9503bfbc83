//! # Golomb Compressed Sets in Rust
//!
//! A Golomb Compressed Set (GCS) is a static probabilistic membership
//! structure: given $`n`$ items and an inverse false-positive rate $`p`$,
//! it answers *"might this item be in the set?"* with no false negatives
//! and false positives at rate about $`1/p`$, in close to the
//! information-theoretic minimum space — typically noticeably smaller than
//! a Bloom filter of equal accuracy.
//!
//! ## How it works
//!
//! Each item is hashed into a bucket in $`[0, n \cdot p)`$. The sorted
//! bucket list has geometrically distributed gaps with mean $`p`$, which a
//! Rice code (unary quotient, $`\lceil \lg p \rceil`$-bit remainder)
//! compresses to within half a bit per item of optimal. Random access into
//! the resulting variable-length bit stream comes from a sparse anchor
//! table sampled every `2^g` codes, so a membership probe costs one binary
//! search plus at most one stride of sequential decodes.
//!
//! ## Design policy
//!
//! - **Build once, query forever:** sets are immutable after construction.
//!   There is no insert, delete, or member enumeration.
//! - **Zero-copy reads:** an opened file is a memory-mapped
//!   [`anybytes::Bytes`]; the header and anchor table are reinterpreted in
//!   place and queries decode straight out of the mapping.
//! - **Self-describing files:** parameters, hash identity, and section
//!   offsets all live in the header. Corrupt or mismatched files fail at
//!   open with a distinct error; queries on an open set never fail.
//!
//! ## Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use gcset::{GcsBuilder, GolombSet};
//!
//! let mut builder = GcsBuilder::new(1000)?;
//! builder.insert(b"alpha")?;
//! builder.insert(b"beta")?;
//! let mut file = Vec::new();
//! builder.finish(&mut file)?;
//!
//! let set = GolombSet::from_bytes(anybytes::Bytes::from_source(file))?;
//! assert!(set.contains(b"alpha"));
//! assert!(set.contains(b"beta"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Limitation
//!
//! This library is designed to run on 64-bit machines.
#![deny(missing_docs)]

#[cfg(not(target_pointer_width = "64"))]
compile_error!("`target_pointer_width` must be 64");

pub mod bits;
pub mod builder;
pub mod error;
pub mod format;
pub mod hash;
pub mod index;
pub mod input;
pub mod rice;
pub mod set;

pub use builder::{BuildStats, GcsBuilder};
pub use error::{Error, Result};
pub use hash::BucketHash;
pub use input::LineFormat;
pub use set::GolombSet;
