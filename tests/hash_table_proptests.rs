// ExtendibleHashTable property tests through the public API.
//
// Property 1: model equivalence with std HashMap.
//  - Operations: insert (with update), remove, take, find.
//  - Invariant after each step: len() matches the model, find agrees with the
//    model for the touched key, validate() passes.
//  - Final: every model key is found with its value; every pool key not in
//    the model is absent.
//
// Property 2: counts are net of successful removals.
//  - Insert a set of keys, remove a subset, and check len() equals
//    distinct inserted minus removed, whatever the bucket capacity.
use extendible_hash::{ExtendibleHashTable, SplitPolicy};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn bytes_hash(k: &String) -> u64 {
    // 64-bit FNV-1a.
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in k.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

proptest! {
    #[test]
    fn prop_matches_hashmap(
        capacity in 1usize..=5,
        single_pass in any::<bool>(),
        pool in proptest::collection::vec("[a-z]{0,4}", 1..=16),
        ops in proptest::collection::vec((0u8..=3u8, 0usize..100usize, any::<i16>()), 1..150),
    ) {
        let policy = if single_pass { SplitPolicy::SinglePass } else { SplitPolicy::UntilFit };
        let table = ExtendibleHashTable::builder(capacity)
            .hasher(bytes_hash as fn(&String) -> u64)
            .split_policy(policy)
            .build()
            .unwrap();
        let mut model: HashMap<String, i16> = HashMap::new();

        for (op, raw_k, v) in ops {
            let key = pool[raw_k % pool.len()].clone();
            match op {
                // Insert or update; the previous value must match the model.
                0 | 1 => {
                    let prev = table.insert(key.clone(), v);
                    prop_assert_eq!(prev, model.insert(key.clone(), v));
                }
                // Remove reports presence only.
                2 => {
                    prop_assert_eq!(table.remove(&key), model.remove(&key).is_some());
                }
                // Take hands back the value.
                3 => {
                    prop_assert_eq!(table.take(&key), model.remove(&key));
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(table.len(), model.len());
            prop_assert_eq!(table.find(&key), model.get(&key).copied());
            prop_assert!(table.validate().is_ok());
        }

        for (k, v) in &model {
            prop_assert_eq!(table.find(k), Some(*v));
        }
        for k in &pool {
            if !model.contains_key(k) {
                prop_assert!(!table.contains_key(k));
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_count_is_net_of_removals(
        capacity in 2usize..=4,
        keys in proptest::collection::vec(any::<u32>(), 0..200),
        remove_mask in proptest::collection::vec(any::<bool>(), 200),
    ) {
        let table = ExtendibleHashTable::new(capacity, |k: &u32| u64::from(*k).wrapping_mul(0x2545_F491_4F6C_DD1D));
        let mut distinct = HashSet::new();
        for &k in &keys {
            table.insert(k, ());
            distinct.insert(k);
        }
        prop_assert_eq!(table.len(), distinct.len());

        let mut removed = 0usize;
        for (&k, &drop_it) in distinct.iter().zip(remove_mask.iter()) {
            if drop_it {
                prop_assert!(table.remove(&k));
                removed += 1;
            }
        }
        prop_assert_eq!(table.len(), distinct.len() - removed);
        prop_assert_eq!(table.num_directory_slots(), 1usize << table.global_depth());
        prop_assert!(table.validate().is_ok());
    }
}
