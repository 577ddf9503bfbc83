use anybytes::Bytes;
use proptest::prelude::*;

use gcset::{BucketHash, GcsBuilder, GolombSet};

fn build(items: &[Vec<u8>], p: u64, log2_granularity: u8) -> Vec<u8> {
    let mut builder = GcsBuilder::new(p)
        .unwrap()
        .with_index_log2_granularity(log2_granularity)
        .unwrap();
    for item in items {
        builder.insert(item).unwrap();
    }
    let mut file = Vec::new();
    builder.finish(&mut file).unwrap();
    file
}

proptest! {
    #[test]
    fn no_false_negatives(
        items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 1..200),
        p in 2..2000u64,
        log2_granularity in 0..8u8,
    ) {
        let file = build(&items, p, log2_granularity);
        let set = GolombSet::from_bytes(Bytes::from_source(file)).unwrap();
        for item in &items {
            prop_assert!(set.contains(item));
        }
    }

    #[test]
    fn multiset_and_set_builds_are_byte_identical(
        items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 1..100),
        p in 2..200u64,
    ) {
        let mut doubled: Vec<Vec<u8>> = items.clone();
        doubled.extend(items.iter().cloned());

        let mut unique = items.clone();
        unique.sort();
        unique.dedup();

        prop_assert_eq!(build(&doubled, p, 10), build(&unique, p, 10));
    }

    #[test]
    fn builds_are_deterministic_under_permutation(
        mut items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 1..100),
        p in 2..200u64,
    ) {
        let file = build(&items, p, 10);
        items.reverse();
        prop_assert_eq!(build(&items, p, 10), file);
    }

    #[test]
    fn prehashed_and_item_queries_agree(
        items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 1..100),
        probes in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 1..50),
        p in 2..200u64,
    ) {
        let file = build(&items, p, 4);
        let set = GolombSet::from_bytes(Bytes::from_source(file)).unwrap();
        for probe in &probes {
            let by_item = set.contains(probe);
            let by_hash = set.contains_hash(BucketHash::SipHash24.hash64(probe));
            prop_assert_eq!(by_item, by_hash);
        }
    }

    #[test]
    fn header_counts_are_consistent(
        items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 1..100),
        p in 2..200u64,
    ) {
        let file = build(&items, p, 10);
        let set = GolombSet::from_bytes(Bytes::from_source(file)).unwrap();
        let mut unique = items.clone();
        unique.sort();
        unique.dedup();
        // Bucket collisions can only shrink the encoded count.
        prop_assert!(set.num_items() <= unique.len() as u64);
        prop_assert!(set.num_items() >= 1);
        prop_assert_eq!(set.num_buckets(), unique.len() as u64 * p);
        prop_assert_eq!(set.p(), p);
    }
}
