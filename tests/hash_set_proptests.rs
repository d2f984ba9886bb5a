// HashSet property tests against std::collections::HashSet as the model.
//
// Property 1: membership and length match the model after every operation.
//  - Operations: insert, remove, take, find, reserve, shrink, clone-and-swap.
//  - Keys come from a small range so removals and duplicate inserts are
//    frequent, and a low-entropy hasher forces shared chains.
//
// Property 2: iteration yields exactly the survivors, each once.
//  - Insert N distinct keys, erase a subset, compare the sorted iteration
//    with the model. Cursor traversal must agree with `iter`.
//
// Property 3: set equality ignores layout and insertion order.
use core::hash::BuildHasherDefault;
use core::hash::Hasher;
use std::collections::HashSet as ModelSet;

use cellar_hash::HashSet;
use proptest::prelude::*;

/// Keeps only the low bits of the key, so many keys share a home bucket.
#[derive(Default)]
struct LowBitsHasher(u64);

impl Hasher for LowBitsHasher {
    fn finish(&self) -> u64 {
        self.0 & 0x1f
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(byte);
        }
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
}

type Colliding = BuildHasherDefault<LowBitsHasher>;

#[derive(Debug, Clone)]
enum Op {
    Insert(u64),
    Remove(u64),
    Take(u64),
    Find(u64),
    Reserve(usize),
    Shrink,
    CloneSwap,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => (0u64..200).prop_map(Op::Insert),
        4 => (0u64..200).prop_map(Op::Remove),
        2 => (0u64..200).prop_map(Op::Take),
        3 => (0u64..200).prop_map(Op::Find),
        1 => (0usize..300).prop_map(Op::Reserve),
        1 => Just(Op::Shrink),
        1 => Just(Op::CloneSwap),
    ]
}

proptest! {
    #[test]
    fn prop_membership_matches_model(ops in proptest::collection::vec(op_strategy(), 1..300)) {
        let mut set: HashSet<u64, Colliding> = HashSet::default();
        let mut model = ModelSet::new();

        for op in ops {
            match op {
                Op::Insert(k) => {
                    let (cursor, inserted) = set.insert_full(k);
                    prop_assert_eq!(cursor.get(), Some(&k));
                    prop_assert_eq!(inserted, model.insert(k));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(set.erase(&k), usize::from(model.remove(&k)));
                    prop_assert_eq!(set.count(&k), 0);
                }
                Op::Take(k) => {
                    prop_assert_eq!(set.take(&k), model.take(&k));
                }
                Op::Find(k) => {
                    let cursor = set.find(&k);
                    prop_assert_eq!(cursor.get(), model.get(&k));
                    prop_assert_eq!(cursor == set.cursor_end(), !model.contains(&k));
                }
                Op::Reserve(n) => {
                    set.reserve(n);
                    prop_assert!(set.capacity() >= set.len() + n);
                }
                Op::Shrink => set.shrink_to_fit(),
                Op::CloneSwap => {
                    let mut copy = set.clone();
                    core::mem::swap(&mut set, &mut copy);
                    prop_assert_eq!(&set, &copy);
                }
            }

            prop_assert_eq!(set.len(), model.len());
            prop_assert!(set.len() <= set.capacity());
        }

        for k in 0u64..200 {
            prop_assert_eq!(set.contains(&k), model.contains(&k));
        }
    }

    #[test]
    fn prop_iteration_yields_survivors(
        keys in proptest::collection::hash_set(any::<u64>(), 0..400),
        erase_mask in proptest::collection::vec(any::<bool>(), 400),
    ) {
        let mut set: HashSet<u64, Colliding> = keys.iter().copied().collect();
        prop_assert_eq!(set.len(), keys.len());

        let mut survivors = Vec::new();
        for (key, erase) in keys.iter().zip(erase_mask) {
            if erase {
                prop_assert!(set.remove(key));
            } else {
                survivors.push(*key);
            }
        }
        survivors.sort_unstable();

        let mut iterated: Vec<u64> = set.iter().copied().collect();
        iterated.sort_unstable();
        prop_assert_eq!(&iterated, &survivors);

        let mut walked = Vec::new();
        let mut cursor = set.cursor_begin();
        while cursor != set.cursor_end() {
            walked.push(*cursor.get().unwrap());
            cursor.move_next();
        }
        let in_order: Vec<u64> = set.iter().copied().collect();
        prop_assert_eq!(walked, in_order);
    }

    #[test]
    fn prop_equality_ignores_layout(
        keys in proptest::collection::vec(0u64..1000, 0..100),
        capacity in 0usize..500,
    ) {
        let a: HashSet<u64, Colliding> = keys.iter().copied().collect();
        let mut b: HashSet<u64, Colliding> =
            HashSet::with_capacity_and_hasher(capacity, Colliding::default());
        b.extend(keys.iter().rev().copied());

        prop_assert_eq!(&a, &b);

        let extra = keys.iter().max().map_or(0, |max| max + 1);
        b.insert(extra);
        prop_assert_ne!(&a, &b);
    }
}
