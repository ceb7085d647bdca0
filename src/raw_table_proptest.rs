#![cfg(test)]

// Property tests for RawTable kept inside the crate so they can reach the
// unsynchronized layer and its bucket sizes directly.

use crate::raw_table::{RawTable, SplitPolicy};
use proptest::prelude::*;
use std::collections::HashMap;

const MAX_DEPTH: u32 = 12;

// Hash shapes from friendly to adversarial.
#[derive(Copy, Clone, Debug)]
enum Shape {
    // Distinct low bits for every key in the pool.
    Identity,
    // Multiplicative spread over all 64 bits.
    Spread,
    // Low six bits always zero: every split below depth 6 is one-sided.
    HighBits,
    // Only three distinct hashes: most keys can never be separated.
    FewValues,
}

impl Shape {
    fn hasher(self) -> fn(&u32) -> u64 {
        match self {
            Shape::Identity => |k| u64::from(*k),
            Shape::Spread => |k| u64::from(*k).wrapping_mul(0x9E37_79B9_7F4A_7C15),
            Shape::HighBits => |k| u64::from(*k) << 6,
            Shape::FewValues => |k| u64::from(*k % 3),
        }
    }

    // Whether every pool key has a distinct hash within `MAX_DEPTH` bits.
    fn separable(self) -> bool {
        matches!(self, Shape::Identity | Shape::HighBits)
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Find(usize),
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        Just(Shape::Identity),
        Just(Shape::Spread),
        Just(Shape::HighBits),
        Just(Shape::FewValues),
    ]
}

fn arb_policy() -> impl Strategy<Value = SplitPolicy> {
    prop_oneof![Just(SplitPolicy::UntilFit), Just(SplitPolicy::SinglePass)]
}

// Pool-indexed operations so shrinking moves toward earlier keys and shorter
// op lists.
fn arb_scenario() -> impl Strategy<Value = (Vec<u32>, Vec<Op>)> {
    proptest::collection::vec(0u32..64, 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            1 => idx.clone().prop_map(Op::Remove),
            1 => idx.prop_map(Op::Find),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against std::collections::HashMap.
// After every operation:
// - all structural invariants hold (directory size, local depths, slot
//   reference counts, key placement, uniqueness, key count);
// - len matches the model and every model key is found with its value;
// - with a separable hash under UntilFit, no bucket is over capacity.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(
        capacity in 1usize..=4,
        shape in arb_shape(),
        policy in arb_policy(),
        (pool, ops) in arb_scenario(),
    ) {
        let mut sut = RawTable::new(capacity, shape.hasher(), policy, MAX_DEPTH);
        let mut model: HashMap<u32, i32> = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
                }
                Op::Remove(i) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.remove(&k), model.remove(&k));
                }
                Op::Find(i) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.find(&k), model.get(&k));
                }
            }

            if let Err(e) = sut.validate() {
                prop_assert!(false, "invariant violated: {}", e);
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.num_directory_slots(), 1usize << sut.global_depth());
            for (k, v) in &model {
                prop_assert_eq!(sut.find(k), Some(v));
            }
            if shape.separable() && policy == SplitPolicy::UntilFit {
                prop_assert!(sut.max_bucket_len() <= capacity);
            }
        }
    }
}

// Property: removals never shrink anything. Depth, slot count and bucket
// count are monotone across an arbitrary op sequence.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_is_monotone(
        shape in arb_shape(),
        policy in arb_policy(),
        (pool, ops) in arb_scenario(),
    ) {
        let mut sut = RawTable::new(2, shape.hasher(), policy, MAX_DEPTH);
        let mut last = (0u32, 1usize, 1usize);

        for op in ops {
            match op {
                Op::Insert(i, v) => { let _ = sut.insert(pool[i], v); }
                Op::Remove(i) => { let _ = sut.remove(&pool[i]); }
                Op::Find(i) => { let _ = sut.find(&pool[i]); }
            }
            let now = (sut.global_depth(), sut.num_directory_slots(), sut.num_buckets());
            prop_assert!(now.0 >= last.0 && now.1 >= last.1 && now.2 >= last.2);
            prop_assert!(now.0 <= MAX_DEPTH);
            last = now;
        }
    }
}
