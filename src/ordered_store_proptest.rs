#![cfg(test)]

// Property tests for OrderedStore kept inside the crate so they can reach
// the internal storage layer directly.

use crate::ordered_store::OrderedStore;
use proptest::prelude::*;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Set(usize, String),
    Remove(usize),
    Get(usize),
    Nth(usize),
    Clone,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{1,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            (idx.clone(), "[a-z0-9 ]{0,6}").prop_map(|(i, v)| Op::Set(i, v)),
            idx.clone().prop_map(Op::Remove),
            idx.clone().prop_map(Op::Get),
            (0usize..10).prop_map(Op::Nth),
            Just(Op::Clone),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against an insertion-ordered Vec model.
// Invariants exercised across random operation sequences:
// - `set` returns true iff the key was new; new keys append, overwrites keep
//   their position.
// - `remove` returns the model's value and shifts later positions down.
// - `nth_key(n)` equals the model's n-th key and is None past the end.
// - A clone is independent: mutating the original never changes it.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut = OrderedStore::new();
        let mut model: Vec<(String, String)> = Vec::new();
        let mut snapshot: Option<(OrderedStore, Vec<(String, String)>)> = None;

        for op in ops {
            match op {
                Op::Set(i, v) => {
                    let k = &pool[i];
                    let pos = model.iter().position(|(mk, _)| mk == k);
                    let inserted = sut.set(k, &v);
                    prop_assert_eq!(inserted, pos.is_none());
                    match pos {
                        Some(p) => model[p].1 = v,
                        None => model.push((k.clone(), v)),
                    }
                }
                Op::Remove(i) => {
                    let k = &pool[i];
                    let pos = model.iter().position(|(mk, _)| mk == k);
                    let removed = sut.remove(k);
                    prop_assert_eq!(removed, pos.map(|p| model.remove(p).1));
                }
                Op::Get(i) => {
                    let k = &pool[i];
                    let expected = model.iter().find(|(mk, _)| mk == k).map(|(_, v)| v.as_str());
                    prop_assert_eq!(sut.get(k), expected);
                }
                Op::Nth(n) => {
                    prop_assert_eq!(sut.nth_key(n), model.get(n).map(|(k, _)| k.as_str()));
                }
                Op::Clone => {
                    snapshot = Some((sut.clone(), model.clone()));
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            let listed: Vec<(String, String)> = sut
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            prop_assert_eq!(&listed, &model);
            if let Some((copy, frozen)) = &snapshot {
                let listed: Vec<(String, String)> = copy
                    .iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                prop_assert_eq!(&listed, frozen);
            }
        }
    }
}
