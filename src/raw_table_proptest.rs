#![cfg(test)]

// Property tests for RawTable kept inside the crate so they can drive the
// engine directly with a test node type.

use crate::arena::Arena;
use crate::node_pool::NodePool;
use crate::options::TableOptions;
use crate::raw_table::test_support::{insert, remove, TestKey};
use crate::raw_table::{RawCursor, RawTable, Slot};
use hashbrown::HashSet;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    Remove(usize),
    // Mark a live entry empty without touching the table, as a multimap list
    // that lost its last value would look before cleanup.
    Kill(usize),
    Find(usize),
    Iterate,
}

// Few distinct hashes so probe chains collide and wrap.
fn weak_hash(key: &[u8]) -> u64 {
    key.iter().map(|&b| b as u64).sum::<u64>() % 5
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<Op>, f64)> {
    let lf = prop_oneof![Just(0.5), Just(0.75), Just(0.9)];
    (proptest::collection::vec("[a-d]{0,3}", 1..=12), lf).prop_flat_map(|(pool, lf)| {
        let pool: Vec<Vec<u8>> = pool.into_iter().map(String::into_bytes).collect();
        let idx = 0..pool.len();
        let op = prop_oneof![
            3 => idx.clone().prop_map(Op::Insert),
            2 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::Kill),
            2 => idx.clone().prop_map(Op::Find),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops, lf))
    })
}

// Property: the table agrees with a set model under insert/remove/kill, and
// its structural invariants hold after every operation:
// - length is a power of two and occupied + tombstones <= length;
// - at least one slot stays Empty;
// - a RawCursor visits exactly the model's keys.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_table_matches_model((pool, ops, lf) in arb_scenario()) {
        let arena = Arena::new();
        let mut table: RawTable<'_, TestKey> =
            RawTable::with_options(&arena, &TableOptions::new().load_factor(lf)).unwrap();
        let mut nodes = NodePool::with_capacity(0);
        let mut model: HashSet<Vec<u8>> = HashSet::new();

        for op in ops {
            match op {
                Op::Insert(i) => {
                    let k = &pool[i];
                    let fresh = insert(&mut table, &mut nodes, weak_hash(k), k).unwrap();
                    prop_assert_eq!(fresh, model.insert(k.clone()));
                }
                Op::Remove(i) => {
                    let k = &pool[i];
                    let removed = remove(&mut table, &mut nodes, weak_hash(k), k);
                    prop_assert_eq!(removed, model.remove(k));
                }
                Op::Kill(i) => {
                    let k = &pool[i];
                    if let Some((_, h)) = table.find(&nodes, weak_hash(k), k) {
                        nodes.get_mut(h).unwrap().live = false;
                        model.remove(k);
                    }
                }
                Op::Find(i) => {
                    let k = &pool[i];
                    let found = table.find(&nodes, weak_hash(k), k).is_some();
                    prop_assert_eq!(found, model.contains(k));
                }
                Op::Iterate => {
                    let mut cursor = RawCursor::new(&table);
                    let mut seen = HashSet::new();
                    while let Some(h) = cursor.next(&table, &nodes) {
                        let key = nodes.get(h).unwrap().key.clone();
                        prop_assert!(seen.insert(key), "cursor yielded a key twice");
                    }
                    prop_assert_eq!(&seen, &model);
                }
            }

            let len = table.len();
            prop_assert!(len.is_power_of_two());
            prop_assert!(table.occupied() + table.tombstones() <= len);
            prop_assert!((0..len).any(|i| table.slot(i) == Slot::Empty));
            // Killed entries may still occupy slots until a probe or rehash
            // reclaims them, so occupancy only bounds the model from above.
            prop_assert!(table.occupied() >= model.len());
        }
    }
}
